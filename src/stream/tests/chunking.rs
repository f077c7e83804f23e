use proptest::prelude::*;

use super::helpers::{chunked, labels, raws, render_chunks, SAMPLE_REPLY};
use crate::stream::block::{joined_raw, BlockState};

/// The SEARCH marker is the last line the lookahead window reaches.
const AT_LOOKAHEAD_EDGE: &str = "```\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\n\
     <<<<<<< SEARCH\na\n=======\nb\n>>>>>>> REPLACE\n```\n";

/// One filler line more, so the marker falls outside the window.
const PAST_LOOKAHEAD_EDGE: &str = "```\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\nl\n\
     <<<<<<< SEARCH\na\n=======\nb\n>>>>>>> REPLACE\n```\n";

/// Pieces that generated documents are glued from. Each one exercises a
/// different part of the grammar; some are deliberately left open.
const FRAGMENTS: &[&str] = &[
    "Plain prose line.\n",
    "\n",
    "# Heading\n",
    "Setext title\n============\n",
    "Another title\n---\n",
    "- item one\n- item two\n  continued\n",
    "1. first\n2. second\n",
    "```rust\nfn f() {}\n```\n",
    "```diff\n-a\n+b\n```\n",
    "```\nunclosed fence\n",
    "````\nnested ``` fence\n````\n",
    "src/main.rs\n<<<<<<< SEARCH\nold\n=======\nnew\n>>>>>>> REPLACE\n",
    "```\nsrc/lib.rs\n<<<<<<< SEARCH\nx\n=======\ny\n>>>>>>> REPLACE\n```\n",
    "<<<<<<< HEAD\nhalf done\n",
    "=======\n",
    ">>>>>>> REPLACE\n",
    "line with crlf\r\n",
    "\r\n",
    "```py\r\nprint(1)\r\n```\r\n",
    "café ✓ ünïcode\n",
    "trailing partial",
    AT_LOOKAHEAD_EDGE,
    PAST_LOOKAHEAD_EDGE,
];

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 1..8).prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: where a document is cut into chunks never changes the
    /// blocks, before or after completion.
    #[test]
    fn generated_documents_ignore_chunk_boundaries(text in document()) {
        let whole_open = render_chunks(&[text.as_str()], false);
        let whole_done = render_chunks(&[text.as_str()], true);
        prop_assert_eq!(joined_raw(&whole_done), text.as_str());

        for at in (0..=text.len()).filter(|i| text.is_char_boundary(*i)) {
            let (head, tail) = text.split_at(at);
            prop_assert_eq!(
                &render_chunks(&[head, tail], false),
                &whole_open,
                "split at {} before completion",
                at
            );
            prop_assert_eq!(
                &render_chunks(&[head, tail], true),
                &whole_done,
                "split at {} after completion",
                at
            );
        }
        prop_assert_eq!(&render_chunks(&chunked(&text, 1), true), &whole_done);
    }
}

#[test]
fn sample_reply_splits_into_expected_blocks() {
    let blocks = render_chunks(&[SAMPLE_REPLY], true);
    assert_eq!(
        labels(&blocks),
        vec!["prose", "prose", "prose", "code", "prose", "edit", "prose"]
    );
    assert_eq!(blocks[0].raw, "Here is the fix.\n\n");
    assert_eq!(blocks[1].raw, "## Changes\n\n");
    assert_eq!(blocks[2].raw, "- rename the helper\n- tighten the check\n\n");
    assert_eq!(blocks[4].raw, "\n");
    assert_eq!(blocks[6].raw, "\nDone. ✓\n");
    assert!(blocks.iter().all(|b| b.state == BlockState::Finalized));
}

#[test]
fn any_chunk_size_reproduces_the_text() {
    for size in 1..=SAMPLE_REPLY.len() {
        let blocks = render_chunks(&chunked(SAMPLE_REPLY, size), true);
        assert_eq!(joined_raw(&blocks), SAMPLE_REPLY, "chunk size {size}");
    }
}

#[test]
fn two_way_splits_match_single_call() {
    let whole_open = render_chunks(&[SAMPLE_REPLY], false);
    let whole_done = render_chunks(&[SAMPLE_REPLY], true);

    for at in (0..=SAMPLE_REPLY.len()).filter(|i| SAMPLE_REPLY.is_char_boundary(*i)) {
        let (head, tail) = SAMPLE_REPLY.split_at(at);
        assert_eq!(
            render_chunks(&[head, tail], false),
            whole_open,
            "split at {at} before completion"
        );
        assert_eq!(
            render_chunks(&[head, tail], true),
            whole_done,
            "split at {at} after completion"
        );
    }
}

#[test]
fn byte_sized_chunks_match_single_call() {
    let whole = render_chunks(&[SAMPLE_REPLY], true);
    let pieces = chunked(SAMPLE_REPLY, 1);
    assert!(pieces.len() < SAMPLE_REPLY.len(), "multi-byte chars stay whole");
    assert_eq!(render_chunks(&pieces, true), whole);
}

#[test]
fn partial_line_never_starts_a_block() {
    let blocks = render_chunks(&["first\n\nsecond line"], false);
    assert_eq!(raws(&blocks), vec!["first\n\nsecond line"]);
    assert_eq!(blocks[0].state, BlockState::Provisional);

    let blocks = render_chunks(&["first\n\nsecond line"], true);
    assert_eq!(raws(&blocks), vec!["first\n\n", "second line"]);
    assert!(blocks.iter().all(|b| b.is_finalized()));

    let blocks = render_chunks(&["first\n\nsecond line\n"], false);
    assert_eq!(raws(&blocks), vec!["first\n\n", "second line\n"]);
    assert_eq!(blocks[0].state, BlockState::Finalized);
    assert_eq!(blocks[1].state, BlockState::Provisional);
}

#[test]
fn leading_blank_lines_stay_with_following_prose() {
    let blocks = render_chunks(&["```\nx\n```\n", "\n\nafter\n"], true);
    assert_eq!(raws(&blocks), vec!["```\nx\n```\n", "\n\nafter\n"]);
}

#[test]
fn unterminated_fence_is_one_code_block() {
    let text = "intro\n```python\ndef f():\n    return 1\n";
    for size in [1, 3, 7, text.len()] {
        let blocks = render_chunks(&chunked(text, size), true);
        assert_eq!(labels(&blocks), vec!["prose", "code"]);
        let code = blocks[1].as_code().unwrap();
        assert!(!code.closed);
        assert_eq!(code.lang.as_deref(), Some("python"));
        assert_eq!(code.body, "def f():\n    return 1\n");
    }
}

#[test]
fn lookahead_edge_is_decided_the_same_for_any_chunking() {
    for size in [1, 5, 17, AT_LOOKAHEAD_EDGE.len()] {
        let inside = render_chunks(&chunked(AT_LOOKAHEAD_EDGE, size), true);
        assert_eq!(labels(&inside), vec!["edit"], "chunk size {size}");
        let outside = render_chunks(&chunked(PAST_LOOKAHEAD_EDGE, size), true);
        assert_eq!(labels(&outside), vec!["code"], "chunk size {size}");
    }
}
