#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::config::ParserOptions;
use quill_core::parser::parse_module;

// Modules are always strict; anything that parses must report so.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(out) = parse_module(source, ParserOptions::new().tokens(true)) {
        assert!(out.ast.strict);
        assert!(out.ast.loc.end.offset <= source.len());
    }
});
