use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quill_core::config::{ParserOptions, RegExpMode};
use quill_core::parser::regexp::{RegExpFlags, process};
use quill_core::parser::scanner::Scanner;
use quill_core::parser::{parse_module, parse_script};

const UNIT: &str = r#"
'use strict';
function counter(start = 0, ...rest) {
    static let calls = 0;
    return () => start + ++calls;
}
class Stack extends Base {
    #items = [];
    push(x) { this.#items.push(x); return this; }
    get size() { return this.#items.length; }
}
const { a, b: [c, d = 2] } = load`data/${name}.json`;
foreach (var item in items) total += item?.price ?? 0;
for (let i = 0; i < n; i++) { if (i % 2) continue; else break; }
value = config::defaults->[key] || /a(b)?c/gi.test(input);
"#;

fn corpus(copies: usize) -> String {
    UNIT.repeat(copies)
}

// ---------------------------------------------------------------------------
// Scanner throughput
// ---------------------------------------------------------------------------

fn bench_tokenize(c: &mut Criterion) {
    let source = corpus(64);
    let mut group = c.benchmark_group("tokenize");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("tokenize_all", |b| {
        b.iter(|| Scanner::tokenize_all(black_box(&source)));
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Parser throughput
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_script");
    for copies in [1, 16, 128] {
        let source = corpus(copies);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(copies), &source, |b, source| {
            b.iter(|| parse_script(black_box(source), ParserOptions::new()));
        });
    }
    group.finish();

    let source = format!("export const x = 1;\n{}", corpus(16));
    c.bench_function("parse_module_collect_tokens", |b| {
        b.iter(|| {
            parse_module(
                black_box(&source),
                ParserOptions::new().tokens(true).comments(true),
            )
        });
    });

    let source = corpus(16);
    c.bench_function("parse_script_regexp_skip", |b| {
        b.iter(|| parse_script(black_box(&source), ParserOptions::new().regexp(RegExpMode::Skip)));
    });
}

// ---------------------------------------------------------------------------
// Regex translation
// ---------------------------------------------------------------------------

fn bench_regexp(c: &mut Criterion) {
    let patterns = [
        ("literal", "abc", ""),
        ("anchors_multiline", "^foo$", "m"),
        ("named_groups", "(?<year>\\d{4})-(?<month>\\d{2})\\k<year>", "u"),
        ("class_escapes", "[^\\s\\w\\d][\\u{1F600}-\\u{1F64F}]", "u"),
    ];
    let mut group = c.benchmark_group("regexp_adapt");
    for (name, pattern, flags) in patterns {
        let Ok(flags) = RegExpFlags::parse(flags) else {
            continue;
        };
        group.bench_function(name, |b| {
            b.iter(|| process(black_box(pattern), &flags, RegExpMode::Adapt, 1_000_000));
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Group & main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_tokenize, bench_parse, bench_regexp);
criterion_main!(benches);
