//! Diagnostic texts shared by the scanner and parser.

pub const UNEXPECTED_EOS: &str = "Unexpected end of input";
pub const UNEXPECTED_IDENTIFIER: &str = "Unexpected identifier";
pub const UNEXPECTED_NUMBER: &str = "Unexpected number";
pub const UNEXPECTED_STRING: &str = "Unexpected string";
pub const UNEXPECTED_RESERVED: &str = "Unexpected reserved word";
pub const UNEXPECTED_TOKEN_ILLEGAL: &str = "Unexpected token ILLEGAL";
pub const UNEXPECTED_SUPER: &str = "'super' keyword unexpected here";
pub const UNEXPECTED_NEW_TARGET: &str = "new.target expression is not allowed here";
pub const UNEXPECTED_IMPORT_META: &str = "Cannot use 'import.meta' outside a module";

// ── Scanner ─────────────────────────────────────────────────────────────────

pub const INVALID_HEX_ESCAPE: &str = "Invalid hexadecimal escape sequence";
pub const INVALID_UNICODE_ESCAPE: &str = "Invalid Unicode escape sequence";
pub const INVALID_ESCAPED_RESERVED_WORD: &str = "Keyword must not contain escaped characters";
pub const NUMERIC_SEPARATOR_NOT_ALLOWED: &str = "Numeric separator is not allowed here";
pub const UNTERMINATED_REGEXP: &str = "Invalid regular expression: missing /";
pub const INVALID_REGEXP_FLAGS: &str = "Invalid regular expression flags";
pub const UNTERMINATED_COMMENT: &str = "Unterminated comment";
pub const TEMPLATE_OCTAL_LITERAL: &str = "Octal literals are not allowed in template strings.";
pub const TEMPLATE_ESCAPE_89: &str = "\\8 and \\9 are not allowed in template strings.";

// ── Strict mode ─────────────────────────────────────────────────────────────

pub const STRICT_OCTAL_LITERAL: &str = "Octal literals are not allowed in strict mode.";
pub const STRICT_ESCAPE_89: &str = "\\8 and \\9 are not allowed in strict mode.";
pub const STRICT_DELETE: &str = "Delete of an unqualified identifier in strict mode.";
pub const STRICT_FUNCTION: &str =
    "In strict mode code, functions can only be declared at top level or inside a block";
pub const STRICT_FUNCTION_NAME: &str = "Function name may not be eval or arguments in strict mode";
pub const STRICT_LHS_ASSIGNMENT: &str =
    "Assignment to eval or arguments is not allowed in strict mode";
pub const STRICT_LHS_POSTFIX: &str =
    "Postfix increment/decrement may not have eval or arguments operand in strict mode";
pub const STRICT_LHS_PREFIX: &str =
    "Prefix increment/decrement may not have eval or arguments operand in strict mode";
pub const STRICT_MODE_WITH: &str = "Strict mode code may not include a with statement";
pub const STRICT_PARAM_DUPE: &str = "Strict mode function may not have duplicate parameter names";
pub const STRICT_PARAM_NAME: &str =
    "Parameter name eval or arguments is not allowed in strict mode";
pub const STRICT_RESERVED_WORD: &str = "Use of future reserved word in strict mode";
pub const STRICT_VAR_NAME: &str = "Variable name may not be eval or arguments in strict mode";
pub const STRICT_CATCH_VARIABLE: &str =
    "Catch variable may not be eval or arguments in strict mode";
pub const ILLEGAL_LANGUAGE_MODE_DIRECTIVE: &str =
    "Illegal 'use strict' directive in function with non-simple parameter list";

// ── Statements ──────────────────────────────────────────────────────────────

pub const ILLEGAL_BREAK: &str = "Illegal break statement";
pub const ILLEGAL_CONTINUE: &str = "Illegal continue statement";
pub const ILLEGAL_RETURN: &str = "Illegal return statement";
pub const NEWLINE_AFTER_THROW: &str = "Illegal newline after throw";
pub const NO_CATCH_OR_FINALLY: &str = "Missing catch or finally after try";
pub const MULTIPLE_DEFAULTS_IN_SWITCH: &str = "More than one default clause in switch statement";
pub const LET_IN_LEXICAL_BINDING: &str = "let is disallowed as a lexically bound name";
pub const GENERATOR_IN_LEGACY_CONTEXT: &str =
    "Generator declarations are not allowed in legacy contexts";
pub const INVALID_LHS_IN_ASSIGNMENT: &str = "Invalid left-hand side in assignment";
pub const INVALID_LHS_IN_FOR_IN: &str = "Invalid left-hand side in for-in";
pub const INVALID_LHS_IN_FOR_LOOP: &str = "Invalid left-hand side in for-loop";
pub const ASYNC_FUNCTION_IN_SINGLE_STATEMENT_CONTEXT: &str =
    "Async functions can only be declared at the top level or inside a block";

// ── Functions and classes ───────────────────────────────────────────────────

pub const BAD_GETTER_ARITY: &str = "Getter must not have any formal parameters";
pub const BAD_SETTER_ARITY: &str = "Setter must have exactly one formal parameter";
pub const BAD_SETTER_REST_PARAMETER: &str = "Setter function argument must not be a rest parameter";
pub const PARAMETER_AFTER_REST_PARAMETER: &str = "Rest parameter must be last formal parameter";
pub const DEFAULT_REST_PARAMETER: &str = "Unexpected token =";
pub const DUPLICATE_PARAMETER: &str = "Duplicate parameter name not allowed in this context";
pub const DUPLICATE_PROTO_PROPERTY: &str =
    "Duplicate __proto__ fields are not allowed in object literals";
pub const DUPLICATE_CONSTRUCTOR: &str = "A class may only have one constructor";
pub const CONSTRUCTOR_SPECIAL_METHOD: &str = "Class constructor may not be an accessor";
pub const CONSTRUCTOR_IS_ASYNC: &str = "Class constructor may not be an async method";
pub const CONSTRUCTOR_IS_PRIVATE: &str = "Class constructor may not be a private method";
pub const STATIC_PROTOTYPE: &str = "Classes may not have static property named prototype";
pub const AWAIT_IN_PARAMETERS: &str = "Illegal await-expression in formal parameters";
pub const YIELD_IN_PARAMETERS: &str = "Yield expression not allowed in formal parameter";
pub const INVALID_TAGGED_TEMPLATE_ON_OPTIONAL_CHAIN: &str =
    "Invalid tagged template on optional chain";
pub const UNARY_BEFORE_EXPONENT: &str =
    "Unary operator used immediately before exponentiation expression";
pub const MIXED_COALESCE: &str = "Cannot mix ?? with && or || without parentheses";
pub const PRIVATE_NAME_NOT_ALLOWED: &str = "Private field must be declared in an enclosing class";
pub const DELETE_PRIVATE_FIELD: &str = "Private fields can not be deleted";
pub const CONSTRUCTOR_FIELD: &str = "Classes may not have a field named 'constructor'";
pub const INVALID_OPTIONAL_CHAIN_FROM_NEW: &str =
    "Invalid optional chain from new expression";
pub const BAD_IMPORT_CALL_ARITY: &str =
    "import() requires a specifier and at most one options argument";

// ── Modules ─────────────────────────────────────────────────────────────────

pub const IMPORT_OUTSIDE_MODULE: &str = "Cannot use import statement outside a module";
pub const EXPORT_OUTSIDE_MODULE: &str = "Unexpected token export";
pub const MISSING_FROM_CLAUSE: &str = "Missing from clause";

// ── Dialect ─────────────────────────────────────────────────────────────────

pub const DUPLICATE_FINALIZER: &str = "Only one finalizer block is allowed";
pub const STATIC_LOCAL_OUTSIDE_FUNCTION: &str =
    "Static declarations are only allowed inside function bodies";
pub const INVALID_ATTRIBUTE_TARGET: &str =
    "Attributes may only precede declarations or class members";

// ── Resources ───────────────────────────────────────────────────────────────

pub const NESTING_TOO_DEEP: &str = "Expression nesting exceeds the configured limit";

/// `Unexpected token X`.
pub fn unexpected_token(text: &str) -> String {
    format!("Unexpected token {text}")
}

/// `Unexpected quasi X`.
pub fn unexpected_template(text: &str) -> String {
    format!("Unexpected quasi {text}")
}

/// `Undefined label 'X'`.
pub fn unknown_label(name: &str) -> String {
    format!("Undefined label '{name}'")
}

/// `Label 'X' has already been declared`.
pub fn label_redeclaration(name: &str) -> String {
    format!("Label '{name}' has already been declared")
}

/// `Identifier 'X' has already been declared`.
pub fn duplicate_binding(name: &str) -> String {
    format!("Identifier '{name}' has already been declared")
}

/// `Missing initializer in X declaration`.
pub fn declaration_missing_initializer(kind: &str) -> String {
    format!("Missing initializer in {kind} declaration")
}

/// `X loop variable declaration may not have an initializer`.
pub fn for_in_of_loop_initializer(kind: &str) -> String {
    format!("{kind} loop variable declaration may not have an initializer")
}

/// `Invalid regular expression: /p/f: reason`.
pub fn invalid_regexp(pattern: &str, flags: &str, reason: &str) -> String {
    format!("Invalid regular expression: /{pattern}/{flags}: {reason}")
}

/// Conversion failure for a valid pattern.
pub fn regexp_not_convertible(pattern: &str, flags: &str, reason: &str) -> String {
    format!("Cannot convert regular expression /{pattern}/{flags}: {reason}")
}
