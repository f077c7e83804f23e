//! Per-message render sessions.
//!
//! Each session owns one worker task that drains its command queue in order.
//! The worker is the only writer of the message's blocks; every visual update
//! it produces is posted to the UI thread.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::error::RenderError;
use crate::core::message::MessageKind;
use crate::stream::accumulator::ChunkAccumulator;
use crate::stream::compactor::{CompactionError, RoundId};
use crate::stream::display::{BlockUpdate, DisplayAdapter, SessionId};
use crate::stream::renderer::{CompactFailure, IncrementalRenderer, RenderOptions};
use crate::ui::dispatch::UiHandle;

#[derive(Debug)]
pub(crate) enum Command {
    Chunk(String),
    Complete,
    Compact {
        round: RoundId,
        reply: oneshot::Sender<Result<(), CompactionError>>,
    },
    Flush(oneshot::Sender<()>),
}

#[derive(Debug)]
pub struct RenderSession {
    id: SessionId,
    kind: MessageKind,
    accumulator: ChunkAccumulator,
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
}

impl RenderSession {
    /// Starts the worker for a new message on `runtime`.
    pub fn spawn<A: DisplayAdapter>(
        id: SessionId,
        kind: MessageKind,
        options: RenderOptions,
        runtime: &Handle,
        ui: UiHandle<A>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        ui.post(move |adapter| adapter.session_started(id, kind));
        runtime.spawn(run_worker(
            id,
            IncrementalRenderer::new(options),
            rx,
            ui,
            cancel.clone(),
        ));
        debug!(session = %id, %kind, "render session started");
        Self {
            id,
            kind,
            accumulator: ChunkAccumulator::new(tx.clone()),
            commands: tx,
            cancel,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        self.accumulator.current_text()
    }

    pub fn append(&mut self, chunk: &str) {
        self.accumulator.append(chunk);
    }

    /// Signals that no more text is expected for this message.
    pub fn complete(&self) {
        let _ = self.commands.send(Command::Complete);
    }

    /// Resolves once every command queued before it has been processed and
    /// the resulting updates have been applied on the UI thread.
    pub fn request_flush(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.commands.send(Command::Flush(tx));
        rx
    }

    pub fn flush_async(&self) -> impl Future<Output = Result<(), RenderError>> + Send + 'static {
        let rx = self.request_flush();
        async move { rx.await.map_err(RenderError::from) }
    }

    pub fn request_compaction(
        &self,
        round: RoundId,
    ) -> oneshot::Receiver<Result<(), CompactionError>> {
        let (reply, rx) = oneshot::channel();
        let _ = self.commands.send(Command::Compact { round, reply });
        rx
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }

    /// Stops the worker without waiting for it. Queued chunks are dropped.
    pub fn shutdown(&self) {
        debug!(session = %self.id, "render session shutting down");
        self.cancel.cancel();
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn publish<A: DisplayAdapter>(ui: &UiHandle<A>, id: SessionId, update: BlockUpdate) {
    ui.post(move |adapter| adapter.apply(id, &update));
}

async fn run_worker<A: DisplayAdapter>(
    id: SessionId,
    mut renderer: IncrementalRenderer,
    mut commands: mpsc::UnboundedReceiver<Command>,
    ui: UiHandle<A>,
    cancel: CancellationToken,
) {
    loop {
        let command = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        match command {
            Command::Chunk(text) => {
                if let Some(update) = renderer.process_chunk(&text) {
                    publish(&ui, id, update);
                }
            }
            Command::Complete => {
                if let Some(update) = renderer.complete() {
                    publish(&ui, id, update);
                }
            }
            Command::Compact { round, reply } => match renderer.compact(round) {
                Ok(Some(update)) => {
                    ui.post(move |adapter| {
                        adapter.apply(id, &update);
                        let _ = reply.send(Ok(()));
                    });
                }
                Ok(None) => {
                    let _ = reply.send(Ok(()));
                }
                Err(CompactFailure { error, completion }) => {
                    warn!(%round, session = %id, %error, "compaction skipped; keeping previous blocks");
                    ui.post(move |adapter| {
                        if let Some(update) = completion {
                            adapter.apply(id, &update);
                        }
                        let _ = reply.send(Err(error));
                    });
                }
            },
            Command::Flush(reply) => {
                ui.post(move |_| {
                    let _ = reply.send(());
                });
            }
        }
    }
    debug!(session = %id, "render worker stopped");
}
