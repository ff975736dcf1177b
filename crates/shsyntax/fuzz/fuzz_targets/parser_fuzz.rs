//! Fuzz target for the shsyntax parser
//!
//! Parses arbitrary input and checks that:
//! - parsing never panics or returns `Err`
//! - the tree reproduces the input byte for byte
//! - every marker was closed exactly once
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=300

#![no_main]

use libfuzzer_sys::fuzz_target;
use shsyntax::{Parser, ParserOptions};

/// Keeps guarded recursion well inside the fuzzer's main-thread stack
const FUZZ_MAX_DEPTH: usize = 100;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if input.len() > 64 * 1024 {
        return;
    }

    let options = ParserOptions::new().max_depth(FUZZ_MAX_DEPTH);
    let parse = match Parser::with_options(input, options).parse() {
        Ok(parse) => parse,
        Err(err) => panic!("internal parser error on valid UTF-8: {err}"),
    };
    assert_eq!(parse.tree().root().text(), input);
    assert!(parse.stats().markers.balanced());
});
