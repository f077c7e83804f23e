use tokio::runtime::Runtime;

use super::helpers::{chunked, labels, RecordingAdapter, SAMPLE_REPLY};
use crate::core::error::RenderError;
use crate::core::message::MessageKind;
use crate::stream::block::joined_raw;
use crate::stream::compactor::RoundId;
use crate::stream::display::SessionId;
use crate::stream::renderer::RenderOptions;
use crate::stream::session::RenderSession;
use crate::ui::dispatch::{UiHandle, UiThread};

fn setup() -> (Runtime, UiHandle<RecordingAdapter>) {
    let runtime = Runtime::new().unwrap();
    let ui = UiThread::spawn(RecordingAdapter::default()).unwrap();
    (runtime, ui)
}

fn start(runtime: &Runtime, ui: &UiHandle<RecordingAdapter>, id: u64) -> RenderSession {
    RenderSession::spawn(
        SessionId(id),
        MessageKind::Assistant,
        RenderOptions::default(),
        runtime.handle(),
        ui.clone(),
    )
}

#[test]
fn flush_shows_every_appended_chunk() {
    let (runtime, ui) = setup();
    let mut session = start(&runtime, &ui, 1);
    for piece in chunked(SAMPLE_REPLY, 5) {
        session.append(piece);
    }
    session.request_flush().blocking_recv().unwrap();

    let shown = ui.invoke_and_wait(|a| a.blocks(SessionId(1))).unwrap();
    assert_eq!(joined_raw(&shown), SAMPLE_REPLY);
    assert_eq!(session.text(), SAMPLE_REPLY);
}

#[test]
fn session_start_is_seen_before_updates() {
    let (runtime, ui) = setup();
    let mut session = start(&runtime, &ui, 7);
    session.append("hello\n");
    session.request_flush().blocking_recv().unwrap();

    let (started, updates) = ui
        .invoke_and_wait(|a| (a.started.clone(), a.updates))
        .unwrap();
    assert_eq!(started, vec![SessionId(7)]);
    assert_eq!(updates, 1);
}

#[test]
fn complete_then_compact_merges_prose() {
    let (runtime, ui) = setup();
    let mut session = start(&runtime, &ui, 2);
    session.append("Hello ");
    session.append("world");
    session.append(". Done.\n\nSecond paragraph.\n");
    session.complete();
    let outcome = session
        .request_compaction(RoundId::new(1))
        .blocking_recv()
        .unwrap();
    assert!(outcome.is_ok());

    let (blocks, compactions) = ui
        .invoke_and_wait(|a| (a.blocks(SessionId(2)), a.compactions))
        .unwrap();
    assert_eq!(labels(&blocks), vec!["prose"]);
    assert_eq!(blocks[0].raw, "Hello world. Done.\n\nSecond paragraph.\n");
    assert_eq!(compactions, 1);

    // A second round changes nothing and sends nothing.
    let again = session
        .request_compaction(RoundId::new(2))
        .blocking_recv()
        .unwrap();
    assert!(again.is_ok());
    session.request_flush().blocking_recv().unwrap();
    let compactions = ui.invoke_and_wait(|a| a.compactions).unwrap();
    assert_eq!(compactions, 1);
}

#[test]
fn compaction_without_complete_still_shows_final_blocks() {
    let (runtime, ui) = setup();
    let mut session = start(&runtime, &ui, 3);
    session.append("```\nx\n```\n");
    session.append("tail");
    session
        .request_compaction(RoundId::new(1))
        .blocking_recv()
        .unwrap()
        .unwrap();

    let blocks = ui.invoke_and_wait(|a| a.blocks(SessionId(3))).unwrap();
    assert_eq!(labels(&blocks), vec!["code", "prose"]);
    assert!(blocks.iter().all(|b| b.is_finalized()));
}

#[test]
fn shutdown_abandons_waiters() {
    let (runtime, ui) = setup();
    let session = start(&runtime, &ui, 4);
    session.shutdown();
    assert!(session.is_closed());

    let err = runtime.block_on(session.flush_async()).unwrap_err();
    assert!(matches!(err, RenderError::SessionClosed));
}

#[test]
fn async_flush_matches_blocking_flush() {
    let (runtime, ui) = setup();
    let mut session = start(&runtime, &ui, 5);
    session.append("line one\n");
    session.append("line two\n");
    runtime.block_on(session.flush_async()).unwrap();

    let blocks = ui.invoke_and_wait(|a| a.blocks(SessionId(5))).unwrap();
    assert_eq!(joined_raw(&blocks), "line one\nline two\n");
}
