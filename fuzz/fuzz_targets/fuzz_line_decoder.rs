//! Fuzz target: `LineDecoder::feed`
//!
//! Drives arbitrary byte sequences into the streaming line decoder and
//! asserts that it never panics, never yields a line over the cap, and
//! yields exactly one line per newline.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use piservo::protocol::codec::{Line, LineDecoder, MAX_LINE_LEN};

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();
    let mut lines = 0_usize;

    decoder.feed(data, |line| {
        lines += 1;
        if let Line::Text(text) = line {
            assert!(text.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            assert!(!text.contains('\n'));
        }
    });

    let newlines = data.iter().filter(|&&b| b == b'\n').count();
    assert_eq!(lines, newlines);
    assert!(decoder.pending() <= MAX_LINE_LEN);

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    decoder.feed(data, |_| {});
});
