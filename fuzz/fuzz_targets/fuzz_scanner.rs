#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::parser::scanner::Scanner;

// Tokenize arbitrary UTF-8 and check that token spans are well formed:
// non-empty, in order, and on character boundaries of the input.
fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(tokens) = Scanner::tokenize_all(source) else {
        return;
    };
    let mut previous_end = 0;
    for token in &tokens {
        let span = token.span;
        assert!(span.start.offset >= previous_end, "tokens overlap");
        assert!(span.start.offset < span.end.offset, "empty token {token:?}");
        assert!(span.end.offset <= source.len());
        assert!(source.is_char_boundary(span.start.offset));
        assert!(source.is_char_boundary(span.end.offset));
        previous_end = span.end.offset;
    }
});
