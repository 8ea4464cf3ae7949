//! End-to-end parser properties.

use std::cell::RefCell;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::config::ParserOptions;
use crate::error::{ErrorKind, ParseError};
use crate::parser::ast::{
    ArrowBody, Expr, MemberKind, NodeInfo, NodeType, ObjectProp, Pat, ProgramItem, Stmt,
};
use crate::parser::{messages, parse_expression, parse_module, parse_script};

fn expression(source: &str) -> Expr {
    parse_expression(source, ParserOptions::new())
        .unwrap_or_else(|e| panic!("{source}: {e}"))
        .ast
}

fn recorded_nodes(source: &str, options: ParserOptions) -> Vec<NodeInfo> {
    let nodes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&nodes);
    let options = options.on_node(move |info| sink.borrow_mut().push(*info));
    parse_script(source, options).unwrap_or_else(|e| panic!("{source}: {e}"));
    Rc::try_unwrap(nodes)
        .map(RefCell::into_inner)
        .unwrap_or_default()
}

fn fatal(source: &str) -> ParseError {
    parse_script(source, ParserOptions::new())
        .expect_err(source)
        .as_parse_error()
        .cloned()
        .unwrap()
}

const SAMPLE: &str = r#"
'use strict';
// counters
function counter(start = 0, ...rest) {
    static let calls = 0;
    return () => start + ++calls;
}
@Sealed
class Stack extends Base {
    #items = [];
    static { Stack.created = 0; }
    finally { this.#items.length = 0; }
    push(x) { this.#items.push(x); return this; }
    get size() { return this.#items.length; }
}
const { a, b: [c, d = 2] } = load`data/${name}.json`;
foreach (var item in items) total += item?.price ?? 0;
for (let i = 0; i < n; i++) { if (i % 2) continue; else break; }
label: while (x) { try { x = next(x); } catch { break label; } finally { done(); } }
include "lib/util.qs";
value = config::defaults->[key] || /a(b)?c/gi.test(input);
"#;

#[test]
fn test_node_ranges_nest() {
    let nodes = recorded_nodes(SAMPLE, ParserOptions::new());
    let program = nodes.last().copied().unwrap();
    assert_eq!(program.node_type, NodeType::Program);
    assert!(nodes.len() > 100);

    // Nodes are finalized children-first, so every node that started
    // inside a later one must also end inside it.
    for (i, outer) in nodes.iter().enumerate() {
        assert!(outer.loc.start.offset <= outer.loc.end.offset, "{outer:?}");
        for inner in &nodes[..i] {
            let starts_inside = inner.loc.start.offset >= outer.loc.start.offset
                && inner.loc.start.offset < outer.loc.end.offset;
            if starts_inside {
                assert!(
                    inner.loc.end.offset <= outer.loc.end.offset,
                    "{inner:?} escapes {outer:?}"
                );
            }
        }
    }
}

#[test]
fn test_spans_match_source_text() {
    let nodes = recorded_nodes(SAMPLE, ParserOptions::new());
    let text = |info: &NodeInfo| &SAMPLE[info.loc.start.offset..info.loc.end.offset];
    let include = nodes
        .iter()
        .find(|n| n.node_type == NodeType::IncludeStatement)
        .unwrap();
    assert_eq!(text(include), "include \"lib/util.qs\";");
    let foreach = nodes
        .iter()
        .find(|n| n.node_type == NodeType::ForEachStatement)
        .unwrap();
    assert!(text(foreach).starts_with("foreach (var item in items)"));
    assert!(text(foreach).ends_with("?? 0;"));
    let class = nodes
        .iter()
        .find(|n| n.node_type == NodeType::ClassDeclaration)
        .unwrap();
    assert!(text(class).starts_with("@Sealed\nclass Stack"));
    assert_eq!(class.loc.start.line, 8);
    assert_eq!(class.loc.start.column, 1);
}

#[test]
fn test_every_dialect_node_is_produced() {
    let nodes = recorded_nodes(SAMPLE, ParserOptions::new());
    let has = |ty: NodeType| nodes.iter().any(|n| n.node_type == ty);
    for ty in [
        NodeType::ForEachStatement,
        NodeType::IncludeStatement,
        NodeType::FinalizerBlock,
        NodeType::StaticBlock,
        NodeType::Attribute,
        NodeType::TaggedTemplateExpression,
        NodeType::ChainExpression,
        NodeType::ArrowFunctionExpression,
    ] {
        assert!(has(ty), "missing {ty:?}");
    }

    let Expr::Member(selector) = expression("config::defaults->[key]") else {
        panic!()
    };
    assert_eq!(selector.kind, MemberKind::Selector);
    assert!(selector.is_computed());
    let Expr::Member(qualified) = selector.object.as_ref() else { panic!() };
    assert_eq!(qualified.kind, MemberKind::Static);

    let Expr::Object(object) = expression("({ v: 1, finally { release(this); } })") else {
        panic!()
    };
    assert!(matches!(object.properties[1], ObjectProp::Finalizer(_)));
}

#[test]
fn test_cover_grammar_equivalence() {
    let Expr::Sequence(sequence) = expression("(a, b)") else { panic!() };
    assert_eq!(sequence.expressions.len(), 2);

    let Expr::Arrow(arrow) = expression("(a, b) => a + b") else { panic!() };
    let names: Vec<_> = arrow
        .params
        .iter()
        .map(|p| match p {
            Pat::Ident(id) => id.name.as_str(),
            other => panic!("unexpected parameter {other:?}"),
        })
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert!(matches!(arrow.body, ArrowBody::Expr(_)));
}

#[test]
fn test_asi_on_restricted_production() {
    let split = parse_script("function f() { return\na }", ParserOptions::new()).unwrap();
    let joined = parse_script("function f() { return a }", ParserOptions::new()).unwrap();
    let body_len = |item: &ProgramItem| match item {
        ProgramItem::Stmt(Stmt::FnDecl(f)) => f.body.body.len(),
        _ => panic!("expected a function"),
    };
    assert_eq!(body_len(&split.ast.body[0]), 2);
    assert_eq!(body_len(&joined.ast.body[0]), 1);
}

#[test]
fn test_numeric_literals() {
    let number = |source: &str| match expression(source) {
        Expr::Num(n) => n.value,
        other => panic!("{source}: {other:?}"),
    };
    assert_eq!(number("0x1F"), 31.0);
    assert_eq!(number("0b101"), 5.0);
    assert_eq!(number("0o17"), 15.0);
    assert_eq!(number("1_000"), 1000.0);
    assert_eq!(number(&"9".repeat(400)), f64::INFINITY);
    let Expr::BigInt(big) = expression("10n") else { panic!() };
    assert_eq!(big.value, BigInt::from(10));
}

#[test]
fn test_regexp_translation_properties() {
    let regexp = |source: &str| match expression(source) {
        Expr::Regexp(re) => re,
        other => panic!("{source}: {other:?}"),
    };
    let any = regexp("/[^]/");
    assert!(any.regex.as_ref().unwrap().is_match("\n").unwrap());

    let anchors = regexp("/^a$/m");
    let compiled = anchors.regex.as_ref().unwrap();
    for input in ["x\na", "a\u{2028}x", "x\ra\r"] {
        assert!(compiled.is_match(input).unwrap(), "{input:?}");
    }
    assert!(!compiled.is_match("xa").unwrap());

    let forward = regexp("/\\1(a)/");
    assert!(forward.regex.is_none());
    assert!(forward.conversion_error.is_some());
    assert!(regexp("/(a)\\1/").regex.is_some());
}

#[test]
fn test_conversion_failures_are_tolerated() {
    let out = parse_script("x = /\\1(a)/;", ParserOptions::new().tolerant(true)).unwrap();
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].kind, ErrorKind::Conversion);
}

#[test]
fn test_strict_retroactivity() {
    let err = fatal("function f(eval) { \"use strict\" }");
    assert_eq!(err.index, 11);
    assert_eq!(err.kind, ErrorKind::Strict);

    let err = fatal("function f(a, a) { 'use strict'; }");
    assert_eq!(err.index, 14);

    let err = fatal("function f() { '\\07'; 'use strict'; }");
    assert_eq!(err.index, 15);
    assert_eq!(err.description, messages::STRICT_OCTAL_LITERAL);

    let err = fatal("function f() { '\\8'; 'use strict'; }");
    assert_eq!(err.description, messages::STRICT_ESCAPE_89);
    assert!(parse_script("'\\8';", ParserOptions::new()).is_ok());
}

#[test]
fn test_tolerant_resilience() {
    let source = "a = 1 b = 2\nfor (x of ys z\nc();";
    let out = parse_script(source, ParserOptions::new().tolerant(true)).unwrap();
    assert_eq!(out.errors.len(), 2);
    assert_eq!(out.ast.body.len(), 4);
    let ProgramItem::Stmt(Stmt::ForOf(for_of)) = &out.ast.body[2] else { panic!() };
    assert!(matches!(*for_of.body, Stmt::Empty(_)));
    assert!(matches!(out.ast.body[3], ProgramItem::Stmt(Stmt::Expr(_))));

    assert!(parse_script(source, ParserOptions::new()).is_err());
}

fn nested(open: &str, inner: &str, close: &str, depth: usize) -> String {
    format!("x = {}{inner}{};", open.repeat(depth), close.repeat(depth))
}

const NESTING_FORMS: [(&str, &str); 4] = [("(", ")"), ("[", "]"), ("{a: ", "}"), ("f(", ")")];

#[test]
fn test_moderate_nesting_parses_with_default_options() {
    for (open, close) in NESTING_FORMS {
        let source = nested(open, "1", close, 100);
        assert!(parse_script(&source, ParserOptions::new()).is_ok(), "{open}");
    }
}

#[test]
fn test_nesting_near_the_limit_never_exhausts_the_stack() {
    for depth in [255, 300] {
        for (open, close) in NESTING_FORMS {
            let source = nested(open, "1", close, depth);
            match parse_script(&source, ParserOptions::new()) {
                Ok(_) => {}
                Err(e) => {
                    let kind = e.as_parse_error().map(|e| e.kind);
                    assert_eq!(kind, Some(ErrorKind::Limit), "{open} x{depth}: {e}");
                }
            }
        }
    }
}

#[test]
fn test_pathological_nesting_reports_a_positioned_limit_error() {
    let cases = [
        nested("(", "1", ")", 10_000),
        nested("[", "1", "]", 10_000),
        nested("{a: ", "1", "}", 10_000),
        nested("f(", "", ")", 10_000),
        format!("x = {}C;", "new ".repeat(10_000)),
        format!("x = {}B {};", "class extends ".repeat(10_000), "{}".repeat(10_000)),
        format!("var {}a{} = y;", "[".repeat(10_000), "]".repeat(10_000)),
        format!("{}x{}", "{".repeat(10_000), "}".repeat(10_000)),
    ];
    for source in &cases {
        let err = fatal(source);
        assert_eq!(err.kind, ErrorKind::Limit, "{}", &source[..20]);
        assert_eq!(err.line, 1);
        assert!(err.index > 0 && err.index < source.len());
    }
}

#[test]
fn test_unresolved_cover_initializer_points_at_its_equals_sign() {
    for (source, index) in [
        ("x = ({a = 1});", 8),
        ("async({a = 1});", 9),
        ("for ({a = 1};;);", 8),
        ("x = {b: 1, c = 2, d = 3};", 13),
    ] {
        let err = fatal(source);
        assert_eq!(err.description, messages::unexpected_token("="), "{source}");
        assert_eq!((err.index, err.line), (index, 1), "{source}");
        assert_eq!(err.column as usize, index + 1, "{source}");
    }
}

#[test]
fn test_tokens_and_comments_are_collected() {
    let source = "/* head */ let x = 1; // tail\n";
    let out = parse_script(source, ParserOptions::new().tokens(true).comments(true)).unwrap();
    assert_eq!(out.tokens.len(), 5);
    assert_eq!(out.comments.len(), 2);
    assert_eq!(out.comments[0].value, " head ");

    let quiet = parse_script(source, ParserOptions::new()).unwrap();
    assert!(quiet.tokens.is_empty());
    assert!(quiet.comments.is_empty());
}

#[test]
fn test_line_offset_shifts_positions() {
    let err = parse_script("\n)", ParserOptions::new().line_offset(10))
        .unwrap_err()
        .as_parse_error()
        .cloned()
        .unwrap();
    assert_eq!(err.line, 12);
    assert_eq!(err.to_string(), "Line 12: Unexpected token )");
}

#[test]
fn test_modules_are_strict() {
    let out = parse_module("import x from 'x'; export default x;", ParserOptions::new()).unwrap();
    assert!(out.ast.strict);
    assert!(parse_module("with (a) {}", ParserOptions::new()).is_err());
    assert!(parse_module("a <!-- b", ParserOptions::new()).is_ok());
    assert!(parse_script("a <!-- b", ParserOptions::new()).is_ok());
}

#[test]
fn test_return_outside_function_option() {
    assert!(parse_script("return 1;", ParserOptions::new()).is_err());
    let options = ParserOptions::new().allow_return_outside_function(true);
    assert!(parse_script("return 1;", options).is_ok());
}

#[test]
fn test_expression_rejects_trailing_input() {
    assert!(parse_expression("a b", ParserOptions::new()).is_err());
    assert!(parse_expression("a, b", ParserOptions::new()).is_ok());
}
