//! Syntax tree for the Quill dialect.
//!
//! Node shapes follow ESTree, so a tree can be diffed against the output of
//! other JavaScript front ends.  The dialect adds its own nodes on top:
//! `foreach`, source directives, attributes, class and object finalizers,
//! function-local `static` declarations and the `::` / `->` member kinds.
//!
//! Each node stores its `loc`, stamped once by the parser when the node is
//! finalized.  The sum types ([`Stmt`], [`Expr`], [`Pat`], [`ModuleDecl`])
//! answer `loc()` and `node_type()` without the caller matching on them.

use std::fmt;

use num_bigint::BigInt;

use crate::parser::token::Span;

// ─────────────────────────────────────────────────────────────────────────────
// Node metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Source location attached to every AST node: a half-open `[start, end)`
/// span in the source text.
pub type SourceLocation = Span;

/// The ESTree type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Program,
    // Shared
    Identifier,
    PrivateIdentifier,
    Literal,
    TemplateLiteral,
    TemplateElement,
    Attribute,
    // Statements
    BlockStatement,
    VariableDeclaration,
    VariableDeclarator,
    FunctionDeclaration,
    ClassDeclaration,
    ExpressionStatement,
    IfStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    ForEachStatement,
    WhileStatement,
    DoWhileStatement,
    SwitchStatement,
    SwitchCase,
    TryStatement,
    CatchClause,
    ReturnStatement,
    ThrowStatement,
    BreakStatement,
    ContinueStatement,
    LabeledStatement,
    DebuggerStatement,
    WithStatement,
    EmptyStatement,
    IncludeStatement,
    // Classes
    ClassBody,
    MethodDefinition,
    PropertyDefinition,
    StaticBlock,
    FinalizerBlock,
    // Expressions
    ThisExpression,
    Super,
    ArrayExpression,
    ObjectExpression,
    Property,
    SpreadElement,
    FunctionExpression,
    ArrowFunctionExpression,
    ClassExpression,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    LogicalExpression,
    ConditionalExpression,
    AssignmentExpression,
    SequenceExpression,
    MemberExpression,
    CallExpression,
    ChainExpression,
    NewExpression,
    TaggedTemplateExpression,
    YieldExpression,
    AwaitExpression,
    ImportExpression,
    MetaProperty,
    ArrowParameterPlaceholder,
    // Patterns
    ArrayPattern,
    ObjectPattern,
    RestElement,
    AssignmentPattern,
    // Modules
    ImportDeclaration,
    ImportSpecifier,
    ImportDefaultSpecifier,
    ImportNamespaceSpecifier,
    ImportAttribute,
    ExportNamedDeclaration,
    ExportSpecifier,
    ExportDefaultDeclaration,
    ExportAllDeclaration,
}

impl NodeType {
    /// The ESTree spelling of this type.
    pub fn as_str(self) -> &'static str {
        use NodeType::*;
        match self {
            Program => "Program",
            Identifier => "Identifier",
            PrivateIdentifier => "PrivateIdentifier",
            Literal => "Literal",
            TemplateLiteral => "TemplateLiteral",
            TemplateElement => "TemplateElement",
            Attribute => "Attribute",
            BlockStatement => "BlockStatement",
            VariableDeclaration => "VariableDeclaration",
            VariableDeclarator => "VariableDeclarator",
            FunctionDeclaration => "FunctionDeclaration",
            ClassDeclaration => "ClassDeclaration",
            ExpressionStatement => "ExpressionStatement",
            IfStatement => "IfStatement",
            ForStatement => "ForStatement",
            ForInStatement => "ForInStatement",
            ForOfStatement => "ForOfStatement",
            ForEachStatement => "ForEachStatement",
            WhileStatement => "WhileStatement",
            DoWhileStatement => "DoWhileStatement",
            SwitchStatement => "SwitchStatement",
            SwitchCase => "SwitchCase",
            TryStatement => "TryStatement",
            CatchClause => "CatchClause",
            ReturnStatement => "ReturnStatement",
            ThrowStatement => "ThrowStatement",
            BreakStatement => "BreakStatement",
            ContinueStatement => "ContinueStatement",
            LabeledStatement => "LabeledStatement",
            DebuggerStatement => "DebuggerStatement",
            WithStatement => "WithStatement",
            EmptyStatement => "EmptyStatement",
            IncludeStatement => "IncludeStatement",
            ClassBody => "ClassBody",
            MethodDefinition => "MethodDefinition",
            PropertyDefinition => "PropertyDefinition",
            StaticBlock => "StaticBlock",
            FinalizerBlock => "FinalizerBlock",
            ThisExpression => "ThisExpression",
            Super => "Super",
            ArrayExpression => "ArrayExpression",
            ObjectExpression => "ObjectExpression",
            Property => "Property",
            SpreadElement => "SpreadElement",
            FunctionExpression => "FunctionExpression",
            ArrowFunctionExpression => "ArrowFunctionExpression",
            ClassExpression => "ClassExpression",
            UnaryExpression => "UnaryExpression",
            UpdateExpression => "UpdateExpression",
            BinaryExpression => "BinaryExpression",
            LogicalExpression => "LogicalExpression",
            ConditionalExpression => "ConditionalExpression",
            AssignmentExpression => "AssignmentExpression",
            SequenceExpression => "SequenceExpression",
            MemberExpression => "MemberExpression",
            CallExpression => "CallExpression",
            ChainExpression => "ChainExpression",
            NewExpression => "NewExpression",
            TaggedTemplateExpression => "TaggedTemplateExpression",
            YieldExpression => "YieldExpression",
            AwaitExpression => "AwaitExpression",
            ImportExpression => "ImportExpression",
            MetaProperty => "MetaProperty",
            ArrowParameterPlaceholder => "ArrowParameterPlaceholder",
            ArrayPattern => "ArrayPattern",
            ObjectPattern => "ObjectPattern",
            RestElement => "RestElement",
            AssignmentPattern => "AssignmentPattern",
            ImportDeclaration => "ImportDeclaration",
            ImportSpecifier => "ImportSpecifier",
            ImportDefaultSpecifier => "ImportDefaultSpecifier",
            ImportNamespaceSpecifier => "ImportNamespaceSpecifier",
            ImportAttribute => "ImportAttribute",
            ExportNamedDeclaration => "ExportNamedDeclaration",
            ExportSpecifier => "ExportSpecifier",
            ExportDefaultDeclaration => "ExportDefaultDeclaration",
            ExportAllDeclaration => "ExportAllDeclaration",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the per-node callback sees for each finalized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub node_type: NodeType,
    pub loc: SourceLocation,
}

// ─────────────────────────────────────────────────────────────────────────────
// Program
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the source file is a classic script or a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// A classic script: top-level `import`/`export` are not allowed.
    Script,
    /// A module: always strict, `import`/`export` allowed.
    Module,
}

/// The root node of a parsed source file.
#[derive(Debug, Clone)]
pub struct Program {
    pub loc: SourceLocation,
    pub source_type: SourceType,
    /// `true` when the program is strict mode code.
    pub strict: bool,
    /// Statements and module declarations in source order.
    pub body: Vec<ProgramItem>,
}

/// One entry of [`Program::body`].
#[derive(Debug, Clone)]
pub enum ProgramItem {
    Stmt(Stmt),
    /// Only produced when parsing a module.
    ModuleDecl(ModuleDecl),
}

impl ProgramItem {
    pub fn loc(&self) -> SourceLocation {
        match self {
            ProgramItem::Stmt(s) => s.loc(),
            ProgramItem::ModuleDecl(d) => d.loc(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Names and attributes
// ─────────────────────────────────────────────────────────────────────────────

/// An identifier (name, label, or binding).
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub loc: SourceLocation,
    /// The decoded identifier text.
    pub name: String,
}

/// `#name`, declared in a class body and only usable inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateIdent {
    pub loc: SourceLocation,
    /// Without the `#`.
    pub name: String,
}

/// `@Name`, `@a.b.c` or `@Name(args)` in front of a declaration or class
/// member.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub loc: SourceLocation,
    /// Dotted name path; never empty.
    pub path: Vec<Ident>,
    /// Argument list when the attribute is called.
    pub arguments: Option<Vec<Expr>>,
}

impl Attribute {
    /// The dotted name, e.g. `"a.b.c"`.
    pub fn name(&self) -> String {
        self.path
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

/// A statement or declaration.
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(BlockStmt),
    VarDecl(VarDecl),
    FnDecl(Box<FnDecl>),
    ClassDecl(Box<ClassDecl>),
    /// Expression statement (`expr ;`), including directives.
    Expr(ExprStmt),
    If(IfStmt),
    For(ForStmt),
    ForIn(ForInStmt),
    ForOf(ForOfStmt),
    /// `foreach (left in right) body`
    ForEach(ForEachStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    Switch(SwitchStmt),
    Try(TryStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Labeled(LabeledStmt),
    Debugger(DebuggerStmt),
    With(WithStmt),
    Empty(EmptyStmt),
    /// `include "path";`, `require "path";` or `source "path";`
    Include(IncludeStmt),
}

impl Stmt {
    pub fn loc(&self) -> SourceLocation {
        match self {
            Stmt::Block(s) => s.loc,
            Stmt::VarDecl(s) => s.loc,
            Stmt::FnDecl(s) => s.loc,
            Stmt::ClassDecl(s) => s.loc,
            Stmt::Expr(s) => s.loc,
            Stmt::If(s) => s.loc,
            Stmt::For(s) => s.loc,
            Stmt::ForIn(s) => s.loc,
            Stmt::ForOf(s) => s.loc,
            Stmt::ForEach(s) => s.loc,
            Stmt::While(s) => s.loc,
            Stmt::DoWhile(s) => s.loc,
            Stmt::Switch(s) => s.loc,
            Stmt::Try(s) => s.loc,
            Stmt::Return(s) => s.loc,
            Stmt::Throw(s) => s.loc,
            Stmt::Break(s) => s.loc,
            Stmt::Continue(s) => s.loc,
            Stmt::Labeled(s) => s.loc,
            Stmt::Debugger(s) => s.loc,
            Stmt::With(s) => s.loc,
            Stmt::Empty(s) => s.loc,
            Stmt::Include(s) => s.loc,
        }
    }

    /// Returns the ESTree type of this statement.
    pub fn node_type(&self) -> NodeType {
        match self {
            Stmt::Block(_) => NodeType::BlockStatement,
            Stmt::VarDecl(_) => NodeType::VariableDeclaration,
            Stmt::FnDecl(_) => NodeType::FunctionDeclaration,
            Stmt::ClassDecl(_) => NodeType::ClassDeclaration,
            Stmt::Expr(_) => NodeType::ExpressionStatement,
            Stmt::If(_) => NodeType::IfStatement,
            Stmt::For(_) => NodeType::ForStatement,
            Stmt::ForIn(_) => NodeType::ForInStatement,
            Stmt::ForOf(_) => NodeType::ForOfStatement,
            Stmt::ForEach(_) => NodeType::ForEachStatement,
            Stmt::While(_) => NodeType::WhileStatement,
            Stmt::DoWhile(_) => NodeType::DoWhileStatement,
            Stmt::Switch(_) => NodeType::SwitchStatement,
            Stmt::Try(_) => NodeType::TryStatement,
            Stmt::Return(_) => NodeType::ReturnStatement,
            Stmt::Throw(_) => NodeType::ThrowStatement,
            Stmt::Break(_) => NodeType::BreakStatement,
            Stmt::Continue(_) => NodeType::ContinueStatement,
            Stmt::Labeled(_) => NodeType::LabeledStatement,
            Stmt::Debugger(_) => NodeType::DebuggerStatement,
            Stmt::With(_) => NodeType::WithStatement,
            Stmt::Empty(_) => NodeType::EmptyStatement,
            Stmt::Include(_) => NodeType::IncludeStatement,
        }
    }
}

/// `{ … }`; also the body of functions, `catch` and `finally`.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub loc: SourceLocation,
    pub body: Vec<Stmt>,
}

/// An expression terminated by `;` or by semicolon insertion.
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub loc: SourceLocation,
    pub expr: Box<Expr>,
    /// Raw text between the quotes, for directive-prologue entries such as
    /// `"use strict"`.
    pub directive: Option<String>,
}

/// `if (test) consequent [else alternate]`
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub loc: SourceLocation,
    pub test: Box<Expr>,
    pub consequent: Box<Stmt>,
    pub alternate: Option<Box<Stmt>>,
}

/// C-style `for`; each of the three header slots may be empty.
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub loc: SourceLocation,
    pub init: Option<ForInit>,
    pub test: Option<Box<Expr>>,
    pub update: Option<Box<Expr>>,
    pub body: Box<Stmt>,
}

/// First slot of a C-style `for` header.
#[derive(Debug, Clone)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Box<Expr>),
}

/// `for (left in right)`: enumerates the keys of `right`.
#[derive(Debug, Clone)]
pub struct ForInStmt {
    pub loc: SourceLocation,
    pub left: ForInOfLeft,
    pub right: Box<Expr>,
    pub body: Box<Stmt>,
}

/// `for (left of right)`, or `for await` over an async iterable.
#[derive(Debug, Clone)]
pub struct ForOfStmt {
    pub loc: SourceLocation,
    /// Only accepted where `await` is.
    pub is_await: bool,
    pub left: ForInOfLeft,
    pub right: Box<Expr>,
    pub body: Box<Stmt>,
}

/// `foreach (left in right) body`: iterates the values of `right`.
#[derive(Debug, Clone)]
pub struct ForEachStmt {
    pub loc: SourceLocation,
    pub left: ForInOfLeft,
    pub right: Box<Expr>,
    pub body: Box<Stmt>,
}

/// The left-hand side of a `for-in`, `for-of` or `foreach` statement.
#[derive(Debug, Clone)]
pub enum ForInOfLeft {
    /// A single declarator, initialized only in sloppy `for (var x = 1 in o)`.
    VarDecl(VarDecl),
    /// An assignment target or destructuring pattern.
    Pat(Pat),
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub loc: SourceLocation,
    pub test: Box<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct DoWhileStmt {
    pub loc: SourceLocation,
    pub body: Box<Stmt>,
    pub test: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub loc: SourceLocation,
    pub discriminant: Box<Expr>,
    /// At most one of these is `default`.
    pub cases: Vec<SwitchCase>,
}

/// `case test:` or `default:` and the statements under it.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub loc: SourceLocation,
    /// `None` for `default`.
    pub test: Option<Expr>,
    pub consequent: Vec<Stmt>,
}

/// `try` with a `catch` clause, a `finally` block or both.
#[derive(Debug, Clone)]
pub struct TryStmt {
    pub loc: SourceLocation,
    pub block: BlockStmt,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStmt>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub loc: SourceLocation,
    /// `None` for `catch { … }` without a binding.
    pub param: Option<Pat>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub loc: SourceLocation,
    pub argument: Option<Box<Expr>>,
}

#[derive(Debug, Clone)]
pub struct ThrowStmt {
    pub loc: SourceLocation,
    pub argument: Box<Expr>,
}

/// `break [label];`
#[derive(Debug, Clone)]
pub struct BreakStmt {
    pub loc: SourceLocation,
    pub label: Option<Ident>,
}

/// `continue [label];`, which may only name a loop label.
#[derive(Debug, Clone)]
pub struct ContinueStmt {
    pub loc: SourceLocation,
    pub label: Option<Ident>,
}

/// `label: body`; labels chained onto a loop are loop labels.
#[derive(Debug, Clone)]
pub struct LabeledStmt {
    pub loc: SourceLocation,
    pub label: Ident,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct DebuggerStmt {
    pub loc: SourceLocation,
}

/// `with (object) body`, rejected in strict code.
#[derive(Debug, Clone)]
pub struct WithStmt {
    pub loc: SourceLocation,
    pub object: Box<Expr>,
    pub body: Box<Stmt>,
}

/// A lone `;`.
#[derive(Debug, Clone)]
pub struct EmptyStmt {
    pub loc: SourceLocation,
}

/// Which source directive an [`IncludeStmt`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    Include,
    Require,
    Source,
}

impl IncludeKind {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "include" => Some(IncludeKind::Include),
            "require" => Some(IncludeKind::Require),
            "source" => Some(IncludeKind::Source),
            _ => None,
        }
    }
}

/// `include "path";` and friends.
#[derive(Debug, Clone)]
pub struct IncludeStmt {
    pub loc: SourceLocation,
    pub kind: IncludeKind,
    pub source: StringLit,
}

// ─────────────────────────────────────────────────────────────────────────────
// Variable declarations
// ─────────────────────────────────────────────────────────────────────────────

/// `[static] var / let / const declarators`
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub loc: SourceLocation,
    pub kind: VarKind,
    /// Never empty.
    pub declarators: Vec<VarDeclarator>,
    /// `true` for a function-local `static` declaration, whose bindings
    /// keep their values across calls.
    pub is_static: bool,
    /// Attributes preceding the declaration.
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// `id [= init]` inside a [`VarDecl`].
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub loc: SourceLocation,
    pub id: Pat,
    /// Required for `const` and for destructuring, except in `for-in`/`for-of`
    /// heads.
    pub init: Option<Box<Expr>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function declaration, including `export default function`.
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub loc: SourceLocation,
    /// Identifier; `None` only for `export default function () {}`.
    pub id: Option<Ident>,
    pub is_async: bool,
    pub is_generator: bool,
    pub params: Vec<Pat>,
    pub body: BlockStmt,
    /// Attributes preceding the declaration.
    pub attributes: Vec<Attribute>,
}

/// `function [id] (params) { body }` used as an expression, and the value
/// of every method, getter and setter.
#[derive(Debug, Clone)]
pub struct FnExpr {
    pub loc: SourceLocation,
    pub id: Option<Ident>,
    pub is_async: bool,
    pub is_generator: bool,
    pub params: Vec<Pat>,
    pub body: BlockStmt,
}

/// `[async] (params) => body` or `[async] param => body`.
#[derive(Debug, Clone)]
pub struct ArrowExpr {
    pub loc: SourceLocation,
    pub is_async: bool,
    pub params: Vec<Pat>,
    pub body: ArrowBody,
}

#[derive(Debug, Clone)]
pub enum ArrowBody {
    Block(BlockStmt),
    /// `x => x + 1`
    Expr(Box<Expr>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

/// A class declaration, with any attributes written before it.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub loc: SourceLocation,
    /// Class name; `None` only for `export default class {}`.
    pub id: Option<Ident>,
    /// The `extends` clause.
    pub super_class: Option<Box<Expr>>,
    pub body: ClassBody,
    /// Attributes preceding the declaration.
    pub attributes: Vec<Attribute>,
}

/// A class in expression position; attributes do not apply here.
#[derive(Debug, Clone)]
pub struct ClassExpr {
    pub loc: SourceLocation,
    pub id: Option<Ident>,
    pub super_class: Option<Box<Expr>>,
    pub body: ClassBody,
}

#[derive(Debug, Clone)]
pub struct ClassBody {
    pub loc: SourceLocation,
    /// Members: methods, fields, static blocks and the finalizer.
    pub body: Vec<ClassMember>,
}

#[derive(Debug, Clone)]
pub enum ClassMember {
    /// Methods, accessors and the `constructor`.
    Method(MethodDef),
    /// Public or private fields.
    Property(PropertyDef),
    StaticBlock(StaticBlock),
    /// A `finally { … }` finalizer block.
    Finalizer(FinalizerBlock),
}

impl ClassMember {
    pub fn loc(&self) -> SourceLocation {
        match self {
            ClassMember::Method(m) => m.loc,
            ClassMember::Property(p) => p.loc,
            ClassMember::StaticBlock(b) => b.loc,
            ClassMember::Finalizer(f) => f.loc,
        }
    }
}

/// A method, accessor or constructor in a class body.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub loc: SourceLocation,
    pub is_static: bool,
    pub kind: MethodKind,
    pub key: PropKey,
    /// The key was written as `[expr]`.
    pub is_computed: bool,
    pub value: FnExpr,
    /// Attributes preceding the member.
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

/// `[static] key [= value];` field.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub loc: SourceLocation,
    pub is_static: bool,
    pub key: PropKey,
    /// The key was written as `[expr]`.
    pub is_computed: bool,
    pub value: Option<Box<Expr>>,
    /// Attributes preceding the member.
    pub attributes: Vec<Attribute>,
}

/// `static { … }`, run once when the class is evaluated.
#[derive(Debug, Clone)]
pub struct StaticBlock {
    pub loc: SourceLocation,
    pub body: Vec<Stmt>,
}

/// `finally { … }` inside a class body or object literal, run when the
/// owning object is released.
#[derive(Debug, Clone)]
pub struct FinalizerBlock {
    pub loc: SourceLocation,
    pub body: BlockStmt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────────

/// An `import` or `export` at the top level of a module.
#[derive(Debug, Clone)]
pub enum ModuleDecl {
    Import(ImportDecl),
    ExportNamed(ExportNamedDecl),
    ExportDefault(ExportDefaultDecl),
    ExportAll(ExportAllDecl),
}

impl ModuleDecl {
    pub fn loc(&self) -> SourceLocation {
        match self {
            ModuleDecl::Import(d) => d.loc,
            ModuleDecl::ExportNamed(d) => d.loc,
            ModuleDecl::ExportDefault(d) => d.loc,
            ModuleDecl::ExportAll(d) => d.loc,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            ModuleDecl::Import(_) => NodeType::ImportDeclaration,
            ModuleDecl::ExportNamed(_) => NodeType::ExportNamedDeclaration,
            ModuleDecl::ExportDefault(_) => NodeType::ExportDefaultDeclaration,
            ModuleDecl::ExportAll(_) => NodeType::ExportAllDeclaration,
        }
    }
}

/// `import … from "source"`, or the bare `import "source"`.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub loc: SourceLocation,
    /// Empty for the bare form.
    pub specifiers: Vec<ImportSpecifier>,
    pub source: StringLit,
    /// Import attributes (`with { key: "value" }`).
    pub attributes: Vec<ImportAttribute>,
}

#[derive(Debug, Clone)]
pub enum ImportSpecifier {
    Named(ImportNamedSpecifier),
    Default(ImportDefaultSpecifier),
    Namespace(ImportNamespaceSpecifier),
}

/// `{ imported as local }`: named import specifier.
#[derive(Debug, Clone)]
pub struct ImportNamedSpecifier {
    pub loc: SourceLocation,
    /// Name on the exporting side; a string for arbitrary export names.
    pub imported: ModuleExportName,
    pub local: Ident,
}

/// `defaultExport`: default import specifier.
#[derive(Debug, Clone)]
pub struct ImportDefaultSpecifier {
    pub loc: SourceLocation,
    pub local: Ident,
}

/// `* as ns`: namespace import specifier.
#[derive(Debug, Clone)]
pub struct ImportNamespaceSpecifier {
    pub loc: SourceLocation,
    pub local: Ident,
}

/// `key: "value"` inside a `with { … }` clause.
#[derive(Debug, Clone)]
pub struct ImportAttribute {
    pub loc: SourceLocation,
    pub key: ModuleExportName,
    pub value: StringLit,
}

/// `export { … } [from "source"]`, or `export` in front of a declaration.
#[derive(Debug, Clone)]
pub struct ExportNamedDecl {
    pub loc: SourceLocation,
    pub specifiers: Vec<ExportSpecifier>,
    /// Set for re-exports only.
    pub source: Option<StringLit>,
    /// Set when the export wraps a declaration; `specifiers` is then empty.
    pub declaration: Option<Box<Stmt>>,
    /// Import attributes on re-exports.
    pub attributes: Vec<ImportAttribute>,
}

/// `{ local as exported }`: named export specifier.
#[derive(Debug, Clone)]
pub struct ExportSpecifier {
    pub loc: SourceLocation,
    /// A string only when re-exporting from another module.
    pub local: ModuleExportName,
    pub exported: ModuleExportName,
}

#[derive(Debug, Clone)]
pub struct ExportDefaultDecl {
    pub loc: SourceLocation,
    pub declaration: ExportDefaultExpr,
}

#[derive(Debug, Clone)]
pub enum ExportDefaultExpr {
    Fn(Box<FnDecl>),
    Class(Box<ClassDecl>),
    Expr(Box<Expr>),
}

/// Re-export of everything: `export * from "m"` or `export * as ns from "m"`.
#[derive(Debug, Clone)]
pub struct ExportAllDecl {
    pub loc: SourceLocation,
    pub exported: Option<ModuleExportName>,
    pub source: StringLit,
    /// Import attributes.
    pub attributes: Vec<ImportAttribute>,
}

/// An import or export name: an identifier, or a string for names that
/// are not identifiers.
#[derive(Debug, Clone)]
pub enum ModuleExportName {
    Ident(Ident),
    Str(StringLit),
}

impl ModuleExportName {
    pub fn loc(&self) -> SourceLocation {
        match self {
            ModuleExportName::Ident(i) => i.loc,
            ModuleExportName::Str(s) => s.loc,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NullLit {
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct BoolLit {
    pub loc: SourceLocation,
    pub value: bool,
}

/// Any numeric literal; `raw` keeps the original spelling.
#[derive(Debug, Clone)]
pub struct NumLit {
    pub loc: SourceLocation,
    pub value: f64,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct BigIntLit {
    pub loc: SourceLocation,
    /// The parsed value.
    pub value: BigInt,
    /// The raw source text, including the `n`.
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct StringLit {
    pub loc: SourceLocation,
    /// Escapes already decoded.
    pub value: String,
}

/// `/pattern/flags`, plus the host translation when one was requested.
#[derive(Debug, Clone)]
pub struct RegExpLit {
    pub loc: SourceLocation,
    pub pattern: String,
    pub flags: String,
    /// Pattern rewritten for the host engine.
    pub adapted: Option<String>,
    /// Compiled host regex; `None` outside adapt mode or when the pattern
    /// could not be converted.
    pub regex: Option<fancy_regex::Regex>,
    /// Why no compiled regex is available, in adapt mode.
    pub conversion_error: Option<String>,
}

/// `` `quasis ${expressions} quasis` ``: template literal.
#[derive(Debug, Clone)]
pub struct TemplateLit {
    pub loc: SourceLocation,
    /// Always one more than `expressions`.
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expr>,
}

/// A literal fragment between substitutions.
#[derive(Debug, Clone)]
pub struct TemplateElement {
    pub loc: SourceLocation,
    /// Source text with escapes left as written.
    pub raw: String,
    /// `None` after an invalid escape, which only tagged templates allow.
    pub cooked: Option<String>,
    pub tail: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// An expression.  Literals share [`NodeType::Literal`].
#[derive(Debug, Clone)]
pub enum Expr {
    // literals
    Null(NullLit),
    Bool(BoolLit),
    Num(NumLit),
    Str(StringLit),
    BigInt(BigIntLit),
    Regexp(Box<RegExpLit>),
    Template(Box<TemplateLit>),

    // primary
    Ident(Ident),
    /// `#name` on the left of `in`.
    PrivateName(PrivateIdent),
    This(ThisExpr),
    /// `super`, only as the object of a member expression or the callee of
    /// a call.
    Super(SuperExpr),
    Array(Box<ArrayExpr>),
    Object(Box<ObjectExpr>),

    // functions and classes
    Fn(Box<FnExpr>),
    Arrow(Box<ArrowExpr>),
    Class(Box<ClassExpr>),

    // operators
    Unary(Box<UnaryExpr>),
    Update(Box<UpdateExpr>),
    Binary(Box<BinaryExpr>),
    Logical(Box<LogicalExpr>),
    Conditional(Box<ConditionalExpr>),
    Assign(Box<AssignExpr>),
    Sequence(Box<SequenceExpr>),

    // member access and calls
    /// `a.b`, `a[b]`, `a::b`, `a->b`, `a->[b]`, optionally `?.`-linked.
    Member(Box<MemberExpr>),
    /// Plain or optional call.
    Call(Box<CallExpr>),
    /// The outermost link of an optional chain.
    Chain(Box<ChainExpr>),
    New(Box<NewExpr>),
    TaggedTemplate(Box<TaggedTemplateExpr>),
    /// Only inside array literals and argument lists.
    Spread(Box<SpreadElement>),

    // async, generators and meta properties
    Yield(Box<YieldExpr>),
    Await(Box<AwaitExpr>),
    /// `import(source [, options])`
    Import(Box<ImportExpr>),
    MetaProp(MetaPropExpr),

    /// Parenthesized arrow parameters that are not an expression on their
    /// own (`()`, `(a, ...b)`).  Never survives a successful parse.
    #[doc(hidden)]
    ArrowParams(Box<ArrowParamsExpr>),
}

impl Expr {
    pub fn loc(&self) -> SourceLocation {
        match self {
            Expr::Null(e) => e.loc,
            Expr::Bool(e) => e.loc,
            Expr::Num(e) => e.loc,
            Expr::Str(e) => e.loc,
            Expr::BigInt(e) => e.loc,
            Expr::Regexp(e) => e.loc,
            Expr::Template(e) => e.loc,
            Expr::Ident(e) => e.loc,
            Expr::PrivateName(e) => e.loc,
            Expr::This(e) => e.loc,
            Expr::Super(e) => e.loc,
            Expr::Array(e) => e.loc,
            Expr::Object(e) => e.loc,
            Expr::Fn(e) => e.loc,
            Expr::Arrow(e) => e.loc,
            Expr::Class(e) => e.loc,
            Expr::Unary(e) => e.loc,
            Expr::Update(e) => e.loc,
            Expr::Binary(e) => e.loc,
            Expr::Logical(e) => e.loc,
            Expr::Conditional(e) => e.loc,
            Expr::Assign(e) => e.loc,
            Expr::Sequence(e) => e.loc,
            Expr::Member(e) => e.loc,
            Expr::Call(e) => e.loc,
            Expr::Chain(e) => e.loc,
            Expr::New(e) => e.loc,
            Expr::TaggedTemplate(e) => e.loc,
            Expr::Spread(e) => e.loc,
            Expr::Yield(e) => e.loc,
            Expr::Await(e) => e.loc,
            Expr::Import(e) => e.loc,
            Expr::MetaProp(e) => e.loc,
            Expr::ArrowParams(e) => e.loc,
        }
    }

    /// Returns the ESTree type of this expression.
    pub fn node_type(&self) -> NodeType {
        match self {
            Expr::Null(_)
            | Expr::Bool(_)
            | Expr::Num(_)
            | Expr::Str(_)
            | Expr::BigInt(_)
            | Expr::Regexp(_) => NodeType::Literal,
            Expr::Template(_) => NodeType::TemplateLiteral,
            Expr::Ident(_) => NodeType::Identifier,
            Expr::PrivateName(_) => NodeType::PrivateIdentifier,
            Expr::This(_) => NodeType::ThisExpression,
            Expr::Super(_) => NodeType::Super,
            Expr::Array(_) => NodeType::ArrayExpression,
            Expr::Object(_) => NodeType::ObjectExpression,
            Expr::Fn(_) => NodeType::FunctionExpression,
            Expr::Arrow(_) => NodeType::ArrowFunctionExpression,
            Expr::Class(_) => NodeType::ClassExpression,
            Expr::Unary(_) => NodeType::UnaryExpression,
            Expr::Update(_) => NodeType::UpdateExpression,
            Expr::Binary(_) => NodeType::BinaryExpression,
            Expr::Logical(_) => NodeType::LogicalExpression,
            Expr::Conditional(_) => NodeType::ConditionalExpression,
            Expr::Assign(_) => NodeType::AssignmentExpression,
            Expr::Sequence(_) => NodeType::SequenceExpression,
            Expr::Member(_) => NodeType::MemberExpression,
            Expr::Call(_) => NodeType::CallExpression,
            Expr::Chain(_) => NodeType::ChainExpression,
            Expr::New(_) => NodeType::NewExpression,
            Expr::TaggedTemplate(_) => NodeType::TaggedTemplateExpression,
            Expr::Spread(_) => NodeType::SpreadElement,
            Expr::Yield(_) => NodeType::YieldExpression,
            Expr::Await(_) => NodeType::AwaitExpression,
            Expr::Import(_) => NodeType::ImportExpression,
            Expr::MetaProp(_) => NodeType::MetaProperty,
            Expr::ArrowParams(_) => NodeType::ArrowParameterPlaceholder,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThisExpr {
    pub loc: SourceLocation,
}

/// `super`
#[derive(Debug, Clone)]
pub struct SuperExpr {
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ArrayExpr {
    pub loc: SourceLocation,
    /// `None` marks a hole.
    pub elements: Vec<Option<Expr>>,
}

#[derive(Debug, Clone)]
pub struct ObjectExpr {
    pub loc: SourceLocation,
    pub properties: Vec<ObjectProp>,
}

#[derive(Debug, Clone)]
pub enum ObjectProp {
    Prop(Box<Prop>),
    Spread(SpreadElement),
    /// `finally { … }` finalizer block.
    Finalizer(FinalizerBlock),
}

/// A keyed entry of an object literal.
#[derive(Debug, Clone)]
pub struct Prop {
    pub loc: SourceLocation,
    pub key: PropKey,
    /// The key was written as `[expr]`.
    pub is_computed: bool,
    pub value: PropValue,
}

/// Key of an object property, class member or object pattern entry.
#[derive(Debug, Clone)]
pub enum PropKey {
    Ident(Ident),
    /// Class members only.
    Private(PrivateIdent),
    Str(StringLit),
    Num(NumLit),
    BigInt(BigIntLit),
    Computed(Box<Expr>),
}

impl PropKey {
    pub fn loc(&self) -> SourceLocation {
        match self {
            PropKey::Ident(k) => k.loc,
            PropKey::Private(k) => k.loc,
            PropKey::Str(k) => k.loc,
            PropKey::Num(k) => k.loc,
            PropKey::BigInt(k) => k.loc,
            PropKey::Computed(k) => k.loc(),
        }
    }

    /// Returns `true` when this non-computed key spells `name`, either as
    /// an identifier or as a string literal.
    pub fn is_named(&self, name: &str) -> bool {
        match self {
            PropKey::Ident(i) => i.name == name,
            PropKey::Str(s) => s.value == name,
            _ => false,
        }
    }
}

/// What follows a property key.
#[derive(Debug, Clone)]
pub enum PropValue {
    Value(Box<Expr>),
    /// `{ key }`
    Shorthand,
    Get(FnExpr),
    Set(FnExpr),
    Method(FnExpr),
    /// `{ key = default }`, only valid once the object is reinterpreted
    /// as a pattern.
    #[doc(hidden)]
    CoverInitializedName(Box<Expr>),
}

/// `...argument`
#[derive(Debug, Clone)]
pub struct SpreadElement {
    pub loc: SourceLocation,
    pub argument: Box<Expr>,
}

/// `typeof x`, `!x` and the other prefix operators.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub loc: SourceLocation,
    pub op: UnaryOp,
    pub argument: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

/// `++x`, `x--` and friends.
#[derive(Debug, Clone)]
pub struct UpdateExpr {
    pub loc: SourceLocation,
    pub op: UpdateOp,
    pub prefix: bool,
    /// An identifier or member expression.
    pub argument: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// A binary operation other than the logical ones.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub loc: SourceLocation,
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// Operators of [`BinaryExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    BitOr,
    BitXor,
    BitAnd,
    In,
    Instanceof,
}

/// `&&`, `||` or `??`; kept apart from [`BinaryExpr`] as in ESTree.
#[derive(Debug, Clone)]
pub struct LogicalExpr {
    pub loc: SourceLocation,
    pub op: LogicalOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalesce,
}

/// `a ? b : c`
#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub loc: SourceLocation,
    pub test: Box<Expr>,
    pub consequent: Box<Expr>,
    pub alternate: Box<Expr>,
}

/// `left = right` or a compound assignment.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub loc: SourceLocation,
    pub op: AssignOp,
    /// Left-hand side: an identifier, a member expression or (for `=`) a
    /// destructuring pattern.
    pub left: Pat,
    pub right: Box<Expr>,
}

/// `=` and the compound assignments; the logical ones short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    ExpAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    BitOrAssign,
    BitXorAssign,
    BitAndAssign,
    LogicalAndAssign,
    LogicalOrAssign,
    NullishAssign,
}

/// `a, b, c`
#[derive(Debug, Clone)]
pub struct SequenceExpr {
    pub loc: SourceLocation,
    pub expressions: Vec<Expr>,
}

/// How a member expression reaches its property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// `object.property`
    Dot,
    /// `object[expr]`
    Computed,
    /// `object::property`, static-qualified access.
    Static,
    /// `object->property` or `object->[expr]`, object selector.
    Selector,
}

/// A member access.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    pub loc: SourceLocation,
    pub object: Box<Expr>,
    pub property: MemberProp,
    /// The access operator.
    pub kind: MemberKind,
    /// `true` when reached through `?.`.
    pub optional: bool,
}

impl MemberExpr {
    /// `true` for `[expr]` and `->[expr]` access.
    pub fn is_computed(&self) -> bool {
        matches!(self.property, MemberProp::Computed(_))
    }
}

#[derive(Debug, Clone)]
pub enum MemberProp {
    /// After `.`, `::` or `->`.
    Ident(Ident),
    /// After `.` inside a class body.
    Private(PrivateIdent),
    /// After `[` or `->[`.
    Computed(Box<Expr>),
}

/// `callee(arguments)` or `callee?.(arguments)`
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub loc: SourceLocation,
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    /// `true` for `callee?.(…)`.
    pub optional: bool,
}

/// Wrapper around the outermost link of an optional chain.
#[derive(Debug, Clone)]
pub struct ChainExpr {
    pub loc: SourceLocation,
    /// A [`MemberExpr`] or [`CallExpr`] containing at least one optional
    /// link.
    pub expression: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct NewExpr {
    pub loc: SourceLocation,
    pub callee: Box<Expr>,
    /// Empty for `new C` without parentheses.
    pub arguments: Vec<Expr>,
}

/// `` tag`…` ``
#[derive(Debug, Clone)]
pub struct TaggedTemplateExpr {
    pub loc: SourceLocation,
    pub tag: Box<Expr>,
    pub quasi: TemplateLit,
}

/// `yield`, `yield value` or `yield* iterable`.
#[derive(Debug, Clone)]
pub struct YieldExpr {
    pub loc: SourceLocation,
    pub delegate: bool,
    pub argument: Option<Box<Expr>>,
}

#[derive(Debug, Clone)]
pub struct AwaitExpr {
    pub loc: SourceLocation,
    pub argument: Box<Expr>,
}

/// `import(source)`, optionally with an options object.
#[derive(Debug, Clone)]
pub struct ImportExpr {
    pub loc: SourceLocation,
    pub source: Box<Expr>,
    /// Import options (second argument).
    pub options: Option<Box<Expr>>,
}

/// `new.target` or `import.meta`.
#[derive(Debug, Clone)]
pub struct MetaPropExpr {
    pub loc: SourceLocation,
    pub meta: Ident,
    pub property: Ident,
}

#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct ArrowParamsExpr {
    pub loc: SourceLocation,
    pub params: Vec<Expr>,
    pub is_async: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

/// A binding pattern, or an assignment target once an expression has
/// been reinterpreted.
#[derive(Debug, Clone)]
pub enum Pat {
    Ident(Ident),
    Array(Box<ArrayPat>),
    Object(Box<ObjectPat>),
    Rest(Box<RestElement>),
    /// `target = default`
    Assign(Box<AssignPat>),
    /// An assignment target that is not a binding: a member expression,
    /// or any invalid target recovered in tolerant mode.
    Expr(Box<Expr>),
}

impl Pat {
    pub fn loc(&self) -> SourceLocation {
        match self {
            Pat::Ident(p) => p.loc,
            Pat::Array(p) => p.loc,
            Pat::Object(p) => p.loc,
            Pat::Rest(p) => p.loc,
            Pat::Assign(p) => p.loc,
            Pat::Expr(e) => e.loc(),
        }
    }

    /// Returns the ESTree type of this pattern.
    pub fn node_type(&self) -> NodeType {
        match self {
            Pat::Ident(_) => NodeType::Identifier,
            Pat::Array(_) => NodeType::ArrayPattern,
            Pat::Object(_) => NodeType::ObjectPattern,
            Pat::Rest(_) => NodeType::RestElement,
            Pat::Assign(_) => NodeType::AssignmentPattern,
            Pat::Expr(e) => e.node_type(),
        }
    }

    /// Every identifier this pattern binds, in source order.
    pub fn bound_names<'a>(&'a self, out: &mut Vec<&'a Ident>) {
        match self {
            Pat::Ident(i) => out.push(i),
            Pat::Array(a) => {
                for element in a.elements.iter().flatten() {
                    element.bound_names(out);
                }
            }
            Pat::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => kv.value.bound_names(out),
                        ObjectPatProp::Assign(a) => out.push(&a.key),
                        ObjectPatProp::Rest(r) => r.argument.bound_names(out),
                    }
                }
            }
            Pat::Rest(r) => r.argument.bound_names(out),
            Pat::Assign(a) => a.left.bound_names(out),
            Pat::Expr(_) => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrayPat {
    pub loc: SourceLocation,
    /// `None` marks a hole.
    pub elements: Vec<Option<Pat>>,
}

#[derive(Debug, Clone)]
pub struct ObjectPat {
    pub loc: SourceLocation,
    pub properties: Vec<ObjectPatProp>,
}

#[derive(Debug, Clone)]
pub enum ObjectPatProp {
    /// `key: target`
    KeyValue(KeyValuePatProp),
    /// `name` or `name = default`
    Assign(AssignPatProp),
    Rest(RestElement),
}

#[derive(Debug, Clone)]
pub struct KeyValuePatProp {
    pub loc: SourceLocation,
    pub key: PropKey,
    /// The key was written as `[expr]`.
    pub is_computed: bool,
    pub value: Pat,
}

#[derive(Debug, Clone)]
pub struct AssignPatProp {
    pub loc: SourceLocation,
    pub key: Ident,
    pub value: Option<Box<Expr>>,
}

/// `...target`, last in a pattern or parameter list.
#[derive(Debug, Clone)]
pub struct RestElement {
    pub loc: SourceLocation,
    pub argument: Box<Pat>,
}

#[derive(Debug, Clone)]
pub struct AssignPat {
    pub loc: SourceLocation,
    pub left: Box<Pat>,
    pub right: Box<Expr>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::Position;

    fn loc_at(offset: usize, len: usize) -> SourceLocation {
        Span {
            start: Position {
                offset,
                line: 1,
                column: offset as u32 + 1,
            },
            end: Position {
                offset: offset + len,
                line: 1,
                column: (offset + len) as u32 + 1,
            },
        }
    }

    fn ident(name: &str, offset: usize) -> Ident {
        Ident {
            loc: loc_at(offset, name.len()),
            name: name.into(),
        }
    }

    #[test]
    fn test_node_type_names() {
        assert_eq!(NodeType::ForEachStatement.as_str(), "ForEachStatement");
        assert_eq!(NodeType::ChainExpression.to_string(), "ChainExpression");
    }

    #[test]
    fn test_stmt_loc_and_type() {
        let loc = loc_at(0, 10);
        let stmt = Stmt::Include(IncludeStmt {
            loc,
            kind: IncludeKind::Require,
            source: StringLit {
                loc: loc_at(8, 2),
                value: "x".into(),
            },
        });
        assert_eq!(stmt.loc(), loc);
        assert_eq!(stmt.node_type(), NodeType::IncludeStatement);
        assert_eq!(IncludeKind::from_word("source"), Some(IncludeKind::Source));
        assert_eq!(IncludeKind::from_word("import"), None);
    }

    #[test]
    fn test_literal_exprs_share_node_type() {
        let loc = loc_at(0, 1);
        let exprs = [
            Expr::Null(NullLit { loc }),
            Expr::Bool(BoolLit { loc, value: true }),
            Expr::BigInt(BigIntLit {
                loc,
                value: BigInt::from(1),
                raw: "1n".into(),
            }),
        ];
        assert!(exprs.iter().all(|e| e.node_type() == NodeType::Literal));
    }

    #[test]
    fn test_member_kinds() {
        let member = MemberExpr {
            loc: loc_at(0, 6),
            object: Box::new(Expr::Ident(ident("a", 0))),
            property: MemberProp::Computed(Box::new(Expr::Ident(ident("b", 4)))),
            kind: MemberKind::Selector,
            optional: false,
        };
        assert!(member.is_computed());
        assert_eq!(Expr::Member(Box::new(member)).node_type(), NodeType::MemberExpression);
    }

    #[test]
    fn test_pattern_bound_names() {
        // [a, {b, c: d}, ...e] = …
        let pat = Pat::Array(Box::new(ArrayPat {
            loc: loc_at(0, 20),
            elements: vec![
                Some(Pat::Ident(ident("a", 1))),
                None,
                Some(Pat::Object(Box::new(ObjectPat {
                    loc: loc_at(4, 10),
                    properties: vec![
                        ObjectPatProp::Assign(AssignPatProp {
                            loc: loc_at(5, 1),
                            key: ident("b", 5),
                            value: None,
                        }),
                        ObjectPatProp::KeyValue(KeyValuePatProp {
                            loc: loc_at(8, 4),
                            key: PropKey::Ident(ident("c", 8)),
                            is_computed: false,
                            value: Pat::Ident(ident("d", 11)),
                        }),
                    ],
                }))),
                Some(Pat::Rest(Box::new(RestElement {
                    loc: loc_at(15, 4),
                    argument: Box::new(Pat::Ident(ident("e", 18))),
                }))),
            ],
        }));
        let mut names = Vec::new();
        pat.bound_names(&mut names);
        let names: Vec<_> = names.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "d", "e"]);
        assert_eq!(pat.node_type(), NodeType::ArrayPattern);
    }

    #[test]
    fn test_attribute_name() {
        let attr = Attribute {
            loc: loc_at(0, 6),
            path: vec![ident("a", 1), ident("b", 3), ident("c", 5)],
            arguments: None,
        };
        assert_eq!(attr.name(), "a.b.c");
    }

    #[test]
    fn test_prop_key_is_named() {
        let key = PropKey::Str(StringLit {
            loc: loc_at(0, 11),
            value: "__proto__".into(),
        });
        assert!(key.is_named("__proto__"));
        let computed = PropKey::Computed(Box::new(Expr::Ident(ident("__proto__", 1))));
        assert!(!computed.is_named("__proto__"));
    }
}
