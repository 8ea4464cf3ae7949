#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::config::RegExpMode;
use quill_core::parser::regexp::{RegExpFlags, process};

// Run arbitrary patterns through validation and translation.
//
// Input layout:
//   byte 0  bit 0 – `u` flag, bit 1 – `v` flag, bit 2 – `s` flag,
//           bit 3 – `m` flag, bit 4 – `i` flag
//   rest    the pattern, as UTF-8
//
// A pattern the validator accepts must either translate to a compiled
// host regex or carry a conversion error, never both.
fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(pattern) = std::str::from_utf8(rest) else {
        return;
    };
    let mut flags = String::new();
    for (bit, flag) in [(0, 'u'), (1, 'v'), (2, 's'), (3, 'm'), (4, 'i')] {
        if selector & (1 << bit) != 0 {
            flags.push(flag);
        }
    }
    let Ok(flags) = RegExpFlags::parse(&flags) else {
        return;
    };
    if let Ok(translation) = process(pattern, &flags, RegExpMode::Adapt, 10_000) {
        assert!(translation.regex.is_some() != translation.conversion_error.is_some());
    }
});
