//! `import` and `export` declarations.

use crate::error::{ErrorKind, QuillResult};
use crate::parser::Parser;
use crate::parser::ast::{
    ExportAllDecl, ExportDefaultDecl, ExportDefaultExpr, ExportNamedDecl, ExportSpecifier,
    ImportAttribute, ImportDecl, ImportDefaultSpecifier, ImportNamedSpecifier,
    ImportNamespaceSpecifier, ImportSpecifier, ModuleDecl, ModuleExportName, NodeType, StringLit,
};
use crate::parser::messages;
use crate::parser::token::{Position, TokenKind, TokenValue};

impl<'src> Parser<'src> {
    /// `import …;` at the top level of a module.
    pub(super) fn parse_import_declaration(&mut self) -> QuillResult<ModuleDecl> {
        let start = self.create_node();
        self.expect(TokenKind::Import)?;

        let mut specifiers = Vec::new();
        let source = if self.matches(TokenKind::StringLiteral) {
            self.parse_string_literal()?
        } else {
            match self.lookahead.kind {
                TokenKind::LeftBrace => self.parse_named_imports(&mut specifiers)?,
                TokenKind::Star => specifiers.push(self.parse_import_namespace_specifier()?),
                _ => {
                    let default_start = self.create_node();
                    let local = self.parse_binding_identifier(None)?;
                    let loc = self.finalize(default_start, NodeType::ImportDefaultSpecifier);
                    let specifier = ImportDefaultSpecifier { loc, local };
                    specifiers.push(ImportSpecifier::Default(specifier));
                    if self.matches(TokenKind::Comma) {
                        self.next_token()?;
                        if self.matches(TokenKind::Star) {
                            specifiers.push(self.parse_import_namespace_specifier()?);
                        } else if self.matches(TokenKind::LeftBrace) {
                            self.parse_named_imports(&mut specifiers)?;
                        } else {
                            return Err(self.unexpected(&self.lookahead));
                        }
                    }
                }
            }
            self.expect_from_clause()?;
            self.parse_string_literal()?
        };

        let attributes = self.parse_import_attributes()?;
        self.consume_semicolon()?;
        let loc = self.finalize(start, NodeType::ImportDeclaration);
        Ok(ModuleDecl::Import(ImportDecl {
            loc,
            specifiers,
            source,
            attributes,
        }))
    }

    /// `* as ns`
    fn parse_import_namespace_specifier(&mut self) -> QuillResult<ImportSpecifier> {
        let start = self.create_node();
        self.expect(TokenKind::Star)?;
        self.expect_contextual("as")?;
        let local = self.parse_binding_identifier(None)?;
        let loc = self.finalize(start, NodeType::ImportNamespaceSpecifier);
        Ok(ImportSpecifier::Namespace(ImportNamespaceSpecifier { loc, local }))
    }

    /// `{ a, b as c, "d" as e }`
    fn parse_named_imports(&mut self, specifiers: &mut Vec<ImportSpecifier>) -> QuillResult<()> {
        self.expect(TokenKind::LeftBrace)?;
        while !self.matches(TokenKind::RightBrace) {
            let start = self.create_node();
            let token = self.lookahead.clone();
            let imported = self.parse_module_export_name()?;
            let local = if self.matches_contextual("as") {
                self.next_token()?;
                self.parse_binding_identifier(None)?
            } else {
                match &imported {
                    ModuleExportName::Ident(name) => {
                        self.validate_binding_token(&token, None)?;
                        name.clone()
                    }
                    ModuleExportName::Str(_) => return Err(self.unexpected(&token)),
                }
            };
            let loc = self.finalize(start, NodeType::ImportSpecifier);
            specifiers.push(ImportSpecifier::Named(ImportNamedSpecifier {
                loc,
                imported,
                local,
            }));
            if !self.matches(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(())
    }

    /// `export …` at the top level of a module.
    pub(super) fn parse_export_declaration(&mut self) -> QuillResult<ModuleDecl> {
        let start = self.create_node();
        self.expect(TokenKind::Export)?;
        let kind = self.lookahead.kind;
        match kind {
            TokenKind::Default => self.parse_export_default(start),
            TokenKind::Star => {
                self.next_token()?;
                let exported = if self.matches_contextual("as") {
                    self.next_token()?;
                    Some(self.parse_module_export_name()?)
                } else {
                    None
                };
                self.expect_from_clause()?;
                let source = self.parse_string_literal()?;
                let attributes = self.parse_import_attributes()?;
                self.consume_semicolon()?;
                let loc = self.finalize(start, NodeType::ExportAllDeclaration);
                Ok(ModuleDecl::ExportAll(ExportAllDecl {
                    loc,
                    exported,
                    source,
                    attributes,
                }))
            }
            TokenKind::LeftBrace => {
                let (specifiers, needs_source) = self.parse_export_specifiers()?;
                let mut source = None;
                let mut attributes = Vec::new();
                if self.matches_contextual("from") {
                    self.next_token()?;
                    source = Some(self.parse_string_literal()?);
                    attributes = self.parse_import_attributes()?;
                } else if needs_source {
                    return Err(self.error_at(
                        self.lookahead.span.start,
                        messages::MISSING_FROM_CLAUSE,
                        ErrorKind::Syntax,
                    ));
                }
                self.consume_semicolon()?;
                let loc = self.finalize(start, NodeType::ExportNamedDeclaration);
                Ok(ModuleDecl::ExportNamed(ExportNamedDecl {
                    loc,
                    specifiers,
                    source,
                    declaration: None,
                    attributes,
                }))
            }
            _ => {
                if !self.is_exportable_declaration_start()? {
                    return Err(self.unexpected(&self.lookahead));
                }
                let declaration = self.parse_statement_list_item()?;
                let loc = self.finalize(start, NodeType::ExportNamedDeclaration);
                Ok(ModuleDecl::ExportNamed(ExportNamedDecl {
                    loc,
                    specifiers: Vec::new(),
                    source: None,
                    declaration: Some(Box::new(declaration)),
                    attributes: Vec::new(),
                }))
            }
        }
    }

    fn is_exportable_declaration_start(&mut self) -> QuillResult<bool> {
        let kind = self.lookahead.kind;
        Ok(match kind {
            TokenKind::Var
            | TokenKind::Const
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::At => true,
            TokenKind::Let => matches!(
                self.peek_token()?.kind,
                TokenKind::Identifier | TokenKind::LeftBracket | TokenKind::LeftBrace
            ),
            TokenKind::Identifier => self.is_async_function_start()?,
            _ => false,
        })
    }

    /// `export default function|class|expression`.  The function or class
    /// name is optional here.
    fn parse_export_default(&mut self, start: Position) -> QuillResult<ModuleDecl> {
        self.expect(TokenKind::Default)?;
        let decl_start = self.create_node();
        let attributes = self.parse_attributes()?;
        let kind = self.lookahead.kind;
        let declaration = match kind {
            TokenKind::Function => ExportDefaultExpr::Fn(Box::new(
                self.parse_function_declaration(decl_start, true, attributes)?,
            )),
            TokenKind::Class => ExportDefaultExpr::Class(Box::new(
                self.parse_class_declaration(decl_start, true, attributes)?,
            )),
            TokenKind::Identifier if self.is_async_function_start()? => ExportDefaultExpr::Fn(
                Box::new(self.parse_function_declaration(decl_start, true, attributes)?),
            ),
            _ => {
                if !attributes.is_empty() {
                    self.tolerate_at(
                        decl_start,
                        messages::INVALID_ATTRIBUTE_TARGET,
                        ErrorKind::Syntax,
                    )?;
                }
                if self.matches_contextual("from") {
                    return Err(self.unexpected(&self.lookahead));
                }
                let expr = self.isolate_cover_grammar(|p| p.parse_assignment_expression())?;
                self.consume_semicolon()?;
                ExportDefaultExpr::Expr(Box::new(expr))
            }
        };
        let loc = self.finalize(start, NodeType::ExportDefaultDeclaration);
        Ok(ModuleDecl::ExportDefault(ExportDefaultDecl { loc, declaration }))
    }

    /// `{ a, b as c, d as "e" }`.  Also reports whether a `from` clause is
    /// required: keywords and strings can only be re-exported.
    fn parse_export_specifiers(&mut self) -> QuillResult<(Vec<ExportSpecifier>, bool)> {
        self.expect(TokenKind::LeftBrace)?;
        let mut specifiers = Vec::new();
        let mut needs_source = false;
        while !self.matches(TokenKind::RightBrace) {
            let start = self.create_node();
            let kind = self.lookahead.kind;
            needs_source |= kind.is_keyword() || kind == TokenKind::StringLiteral;
            let local = self.parse_module_export_name()?;
            let exported = if self.matches_contextual("as") {
                self.next_token()?;
                self.parse_module_export_name()?
            } else {
                local.clone()
            };
            let loc = self.finalize(start, NodeType::ExportSpecifier);
            specifiers.push(ExportSpecifier {
                loc,
                local,
                exported,
            });
            if !self.matches(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok((specifiers, needs_source))
    }

    /// An identifier name or a string literal.
    fn parse_module_export_name(&mut self) -> QuillResult<ModuleExportName> {
        if self.matches(TokenKind::StringLiteral) {
            Ok(ModuleExportName::Str(self.parse_string_literal()?))
        } else {
            Ok(ModuleExportName::Ident(self.parse_identifier_name()?))
        }
    }

    fn expect_from_clause(&mut self) -> QuillResult<()> {
        if !self.matches_contextual("from") {
            return Err(self.error_at(
                self.lookahead.span.start,
                messages::MISSING_FROM_CLAUSE,
                ErrorKind::Syntax,
            ));
        }
        self.next_token()?;
        Ok(())
    }

    /// `with { type: "json" }`, or the older `assert { … }` on the same
    /// line.
    fn parse_import_attributes(&mut self) -> QuillResult<Vec<ImportAttribute>> {
        let introduced = self.matches(TokenKind::With)
            || (self.matches_contextual("assert") && !self.has_line_terminator());
        if !introduced {
            return Ok(Vec::new());
        }
        self.next_token()?;
        self.expect(TokenKind::LeftBrace)?;
        let mut attributes = Vec::new();
        while !self.matches(TokenKind::RightBrace) {
            let start = self.create_node();
            let key = self.parse_module_export_name()?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_string_literal()?;
            let loc = self.finalize(start, NodeType::ImportAttribute);
            attributes.push(ImportAttribute { loc, key, value });
            if !self.matches(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(attributes)
    }

    /// A string literal node for module specifiers, attribute values and
    /// source directives.
    pub(super) fn parse_string_literal(&mut self) -> QuillResult<StringLit> {
        let token = self.expect(TokenKind::StringLiteral)?;
        if self.flags.strict && token.octal {
            let message = self.strict_octal_message(&token);
            self.tolerate_at(token.span.start, message, ErrorKind::Strict)?;
        }
        let loc = self.finalize_between(token.span.start, token.span.end, NodeType::Literal);
        let value = match token.value {
            TokenValue::Str(value) => value,
            _ => String::new(),
        };
        Ok(StringLit { loc, value })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::parser::Parser;
    use crate::parser::ast::{
        ExportDefaultExpr, ImportSpecifier, ModuleDecl, ModuleExportName, Program, ProgramItem,
        Stmt,
    };
    use crate::parser::messages;

    fn module(source: &str) -> Program {
        Parser::new(source, ParserOptions::new())
            .parse_module()
            .unwrap_or_else(|e| panic!("{source}: {e}"))
    }

    fn declarations(source: &str) -> Vec<ModuleDecl> {
        module(source)
            .body
            .into_iter()
            .filter_map(|item| match item {
                ProgramItem::ModuleDecl(decl) => Some(decl),
                ProgramItem::Stmt(_) => None,
            })
            .collect()
    }

    fn error(source: &str) -> String {
        let err = Parser::new(source, ParserOptions::new())
            .parse_module()
            .expect_err(source);
        err.as_parse_error().unwrap().description.clone()
    }

    fn export_name(name: &ModuleExportName) -> &str {
        match name {
            ModuleExportName::Ident(id) => &id.name,
            ModuleExportName::Str(s) => &s.value,
        }
    }

    #[test]
    fn test_import_forms() {
        let decls = declarations(
            "import a, * as ns from 'm';
             import {b as c, 'd e' as f, default as g, h} from \"n\";
             import 'side-effect';",
        );
        let ModuleDecl::Import(first) = &decls[0] else { panic!() };
        assert_eq!(first.source.value, "m");
        assert!(matches!(first.specifiers[0], ImportSpecifier::Default(_)));
        let ImportSpecifier::Namespace(ns) = &first.specifiers[1] else { panic!() };
        assert_eq!(ns.local.name, "ns");

        let ModuleDecl::Import(second) = &decls[1] else { panic!() };
        let pairs: Vec<_> = second
            .specifiers
            .iter()
            .map(|s| match s {
                ImportSpecifier::Named(n) => (export_name(&n.imported), n.local.name.as_str()),
                _ => panic!("expected named specifier"),
            })
            .collect();
        assert_eq!(pairs, [("b", "c"), ("d e", "f"), ("default", "g"), ("h", "h")]);

        let ModuleDecl::Import(third) = &decls[2] else { panic!() };
        assert!(third.specifiers.is_empty());
    }

    #[test]
    fn test_import_attributes() {
        let decls = declarations(
            "import data from './data.json' with { type: 'json' };
             export * from './x.json' assert { 'type': 'json' };",
        );
        let ModuleDecl::Import(import) = &decls[0] else { panic!() };
        assert_eq!(import.attributes.len(), 1);
        assert_eq!(export_name(&import.attributes[0].key), "type");
        assert_eq!(import.attributes[0].value.value, "json");
        let ModuleDecl::ExportAll(all) = &decls[1] else { panic!() };
        assert_eq!(all.attributes.len(), 1);
        assert!(all.exported.is_none());
    }

    #[test]
    fn test_export_forms() {
        let decls = declarations(
            "export default function () {}
             export * as ns from 'm';
             export { x as y, z };
             export { default, if as 'if' } from 'n';
             export const k = 1;
             export async function run() {}
             export @Tag class Tagged {}",
        );
        let ModuleDecl::ExportDefault(default) = &decls[0] else { panic!() };
        let ExportDefaultExpr::Fn(f) = &default.declaration else { panic!() };
        assert!(f.id.is_none());
        let ModuleDecl::ExportAll(all) = &decls[1] else { panic!() };
        assert_eq!(all.exported.as_ref().map(export_name), Some("ns"));
        let ModuleDecl::ExportNamed(named) = &decls[2] else { panic!() };
        assert!(named.source.is_none());
        assert_eq!(export_name(&named.specifiers[0].exported), "y");
        assert_eq!(export_name(&named.specifiers[1].exported), "z");
        let ModuleDecl::ExportNamed(reexport) = &decls[3] else { panic!() };
        assert_eq!(reexport.source.as_ref().map(|s| s.value.as_str()), Some("n"));
        let ModuleDecl::ExportNamed(constant) = &decls[4] else { panic!() };
        assert!(matches!(constant.declaration.as_deref(), Some(Stmt::VarDecl(_))));
        let declared_at = constant.declaration.as_ref().map(|d| d.loc().start.offset);
        assert_eq!(declared_at, Some(constant.loc.start.offset + "export ".len()));
        let ModuleDecl::ExportNamed(tagged) = &decls[6] else { panic!() };
        let Some(Stmt::ClassDecl(class)) = tagged.declaration.as_deref() else { panic!() };
        assert_eq!(class.attributes[0].name(), "Tag");
    }

    #[test]
    fn test_export_default_expression() {
        let decls = declarations("export default a + b; export default class {}");
        let ModuleDecl::ExportDefault(expr) = &decls[0] else { panic!() };
        assert!(matches!(expr.declaration, ExportDefaultExpr::Expr(_)));
        let ModuleDecl::ExportDefault(class) = &decls[1] else { panic!() };
        let ExportDefaultExpr::Class(c) = &class.declaration else { panic!() };
        assert!(c.id.is_none());
    }

    #[test]
    fn test_module_errors() {
        assert_eq!(error("export { default };"), messages::MISSING_FROM_CLAUSE);
        assert_eq!(error("export { 'a' };"), messages::MISSING_FROM_CLAUSE);
        assert_eq!(error("import { a } 'm';"), messages::MISSING_FROM_CLAUSE);
        assert_eq!(error("import { 'a' } from 'm';"), messages::UNEXPECTED_STRING);
        assert_eq!(error("import { if } from 'm';"), messages::unexpected_token("if"));
        assert_eq!(error("export 1;"), messages::UNEXPECTED_NUMBER);
        assert_eq!(
            error("function f() { import x from 'm'; }"),
            messages::unexpected_token("import")
        );
    }

    #[test]
    fn test_module_syntax_in_script() {
        let err = Parser::new("import x from 'm';", ParserOptions::new())
            .parse_script(false)
            .unwrap_err();
        assert_eq!(
            err.as_parse_error().unwrap().description,
            messages::IMPORT_OUTSIDE_MODULE
        );

        let mut parser = Parser::new("export const a = 1;", ParserOptions::new().tolerant(true));
        let program = parser.parse_script(false).unwrap();
        assert!(matches!(program.body[0], ProgramItem::ModuleDecl(_)));
        let (_, _, errors) = parser.finish();
        assert_eq!(errors[0].description, messages::EXPORT_OUTSIDE_MODULE);
    }
}
