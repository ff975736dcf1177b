//! Fuzz target for the shsyntax lexer
//!
//! Tokenizes arbitrary input and checks that the tokens tile it with no
//! gaps, overlaps or empty tokens.
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=300

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 1_000_000 {
        return;
    }

    let mut offset = 0;
    for token in shsyntax::parser::lexer::tokenize(input) {
        assert_eq!(token.span.start.offset, offset);
        assert!(!token.text.is_empty());
        assert_eq!(&input[offset..token.span.end.offset], token.text);
        offset = token.span.end.offset;
    }
    assert_eq!(offset, input.len());
});
