//! Property-based tests for the stream parser
//!
//! The parser must be chunking-invariant: however the transport slices
//! the byte stream, the parsed item sequence is the same.

use super::stream::{EventStreamParser, StreamItem};
use proptest::prelude::*;

fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        // Structured content chunk
        "[a-zA-Z0-9 ]{1,20}".prop_map(|s| format!("data: {{\"content\":\"{s}\"}}")),
        // Raw fallback payload
        "[a-zA-Z][a-zA-Z ]{0,19}".prop_map(|s| format!("data: {s}")),
        // Lines without the payload marker are ignored
        Just(": keep-alive".to_string()),
        Just("event: ping".to_string()),
    ]
}

fn arb_stream_and_cuts() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    proptest::collection::vec(arb_line(), 0..8).prop_flat_map(|lines| {
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        let bytes = text.into_bytes();
        let len = bytes.len();
        (
            Just(bytes),
            proptest::collection::vec(0..=len, 0..6),
        )
    })
}

fn parse_chunked(bytes: &[u8], cuts: &[usize]) -> Vec<StreamItem> {
    let mut boundaries: Vec<usize> = cuts.to_vec();
    boundaries.push(0);
    boundaries.push(bytes.len());
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut parser = EventStreamParser::new();
    let mut items = Vec::new();
    for window in boundaries.windows(2) {
        items.extend(parser.feed(&bytes[window[0]..window[1]]));
    }
    items.extend(parser.finish());
    items
}

proptest! {
    #[test]
    fn parsing_is_chunking_invariant((bytes, cuts) in arb_stream_and_cuts()) {
        let whole = parse_chunked(&bytes, &[]);
        let chunked = parse_chunked(&bytes, &cuts);
        prop_assert_eq!(whole, chunked);
    }

    #[test]
    fn done_sentinel_always_terminates(cuts in proptest::collection::vec(0usize..40, 0..6)) {
        let bytes = b"data: {\"content\":\"a\"}\ndata: [DONE]\n";
        let cuts: Vec<usize> = cuts.into_iter().filter(|&c| c <= bytes.len()).collect();
        let items = parse_chunked(bytes, &cuts);
        prop_assert_eq!(items.last(), Some(&StreamItem::Done));
    }
}
