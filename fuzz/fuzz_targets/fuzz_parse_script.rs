#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::config::ParserOptions;
use quill_core::parser::parse_script;

// Parse arbitrary input as a script, strict and tolerant.  The parser must
// return either an AST or an error, never panic or overflow the stack.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(out) = parse_script(source, ParserOptions::new()) {
        assert!(out.ast.loc.end.offset <= source.len());
    }
    if let Ok(out) = parse_script(source, ParserOptions::new().tolerant(true)) {
        for error in &out.errors {
            assert!(error.index <= source.len(), "error past end: {error:?}");
        }
    }
});
