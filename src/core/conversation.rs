//! Conversation-level driver for render sessions.
//!
//! Routes appended text to the right message, starts and tears down sessions,
//! and fans flush and compaction requests out to every session.

use std::future::Future;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::core::error::RenderError;
use crate::core::message::{Message, MessageKind};
use crate::stream::compactor::RoundId;
use crate::stream::display::{DisplayAdapter, SessionId};
use crate::stream::renderer::RenderOptions;
use crate::stream::session::RenderSession;
use crate::ui::dispatch::UiHandle;

pub struct Conversation<A: DisplayAdapter> {
    runtime: Handle,
    ui: UiHandle<A>,
    options: RenderOptions,
    sessions: Vec<RenderSession>,
    next_session: u64,
    next_round: RoundId,
    blocking: bool,
}

impl<A: DisplayAdapter> Conversation<A> {
    pub fn new(runtime: Handle, ui: UiHandle<A>, options: RenderOptions) -> Self {
        Self {
            runtime,
            ui,
            options,
            sessions: Vec::new(),
            next_session: 0,
            next_round: RoundId::new(1),
            blocking: false,
        }
    }

    pub fn ui(&self) -> &UiHandle<A> {
        &self.ui
    }

    /// Parsing policy for a message kind: users do not write edit blocks.
    pub fn options_for(&self, kind: MessageKind) -> RenderOptions {
        RenderOptions {
            edit_blocks: self.options.edit_blocks && !kind.is_user(),
            ..self.options.clone()
        }
    }

    /// Appends to the last message if it has the same kind, otherwise
    /// completes it and starts a new message.
    pub fn append(&mut self, text: &str, kind: MessageKind) {
        if text.is_empty() {
            return;
        }
        match self.sessions.last_mut() {
            Some(last) if last.kind() == kind => last.append(text),
            _ => {
                if let Some(previous) = self.sessions.last() {
                    previous.complete();
                }
                self.start_session(kind).append(text);
            }
        }
    }

    fn start_session(&mut self, kind: MessageKind) -> &mut RenderSession {
        let id = SessionId(self.next_session);
        self.next_session += 1;
        let session = RenderSession::spawn(
            id,
            kind,
            self.options_for(kind),
            &self.runtime,
            self.ui.clone(),
        );
        self.sessions.push(session);
        let index = self.sessions.len() - 1;
        &mut self.sessions[index]
    }

    /// Marks every message as complete so trailing blocks are finalized.
    pub fn complete_all(&self) {
        for session in &self.sessions {
            session.complete();
        }
    }

    /// Blocks until all queued chunks are parsed and shown.
    ///
    /// Must not be called on the UI thread or inside the async runtime.
    pub fn flush(&self) -> Result<(), RenderError> {
        assert!(
            !self.ui.is_ui_thread() && Handle::try_current().is_err(),
            "flush must not be called on the UI thread or inside the async runtime"
        );
        let pending: Vec<_> = self.sessions.iter().map(|s| s.request_flush()).collect();
        for rx in pending {
            rx.blocking_recv()?;
        }
        Ok(())
    }

    pub fn flush_async(&self) -> impl Future<Output = Result<(), RenderError>> + Send + 'static {
        let pending: Vec<_> = self.sessions.iter().map(|s| s.request_flush()).collect();
        async move {
            for rx in pending {
                rx.await?;
            }
            Ok(())
        }
    }

    /// Compacts every message. The returned round id tags all log lines of
    /// this pass; the future resolves once each session has answered. A
    /// failing message keeps its previous blocks and the first failure is
    /// reported.
    pub fn compact_all(
        &mut self,
    ) -> (
        RoundId,
        impl Future<Output = Result<(), RenderError>> + Send + 'static,
    ) {
        let round = self.next_round;
        self.next_round = round.next();
        let pending: Vec<_> = self
            .sessions
            .iter()
            .map(|s| (s.id(), s.request_compaction(round)))
            .collect();
        debug!(%round, sessions = pending.len(), "compaction scheduled");

        let done = async move {
            let mut first_error = None;
            for (session, rx) in pending {
                let outcome = match rx.await {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => RenderError::Compaction(err),
                    Err(_) => RenderError::SessionClosed,
                };
                warn!(%round, %session, err = %outcome, "message not compacted");
                first_error.get_or_insert(outcome);
            }
            match first_error {
                Some(err) => Err(err),
                None => {
                    debug!(%round, "compaction finished");
                    Ok(())
                }
            }
        };
        (round, done)
    }

    /// While blocking, `clear` and `set_messages` are ignored. Leaving the
    /// blocking state means streaming stopped, so every message is compacted.
    pub fn set_blocking(&mut self, blocked: bool) {
        let was_blocking = self.blocking;
        self.blocking = blocked;
        if was_blocking && !blocked {
            let (round, done) = self.compact_all();
            self.runtime.spawn(async move {
                if let Err(err) = done.await {
                    warn!(%round, %err, "compaction after streaming failed");
                }
            });
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn clear(&mut self) {
        if self.blocking {
            debug!("ignoring clear while blocking");
            return;
        }
        self.teardown();
        self.ui.post(|adapter| adapter.clear());
    }

    fn teardown(&mut self) {
        for session in self.sessions.drain(..) {
            let id = session.id();
            session.shutdown();
            self.ui.post(move |adapter| adapter.session_closed(id));
        }
    }

    /// Replaces the whole conversation with already-complete messages.
    pub fn set_messages(&mut self, messages: impl IntoIterator<Item = Message>) {
        if self.blocking {
            debug!("ignoring set_messages while blocking");
            return;
        }
        self.teardown();
        self.ui.post(|adapter| adapter.clear());
        for message in messages {
            let session = self.start_session(message.kind);
            session.append(&message.content);
            session.complete();
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.sessions
            .iter()
            .map(|s| Message::new(s.kind(), s.text()))
            .collect()
    }

    /// Raw text of all messages, separated by blank lines.
    pub fn text(&self) -> String {
        self.sessions
            .iter()
            .map(RenderSession::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(RenderSession::id).collect()
    }
}

impl<A: DisplayAdapter> Drop for Conversation<A> {
    fn drop(&mut self) {
        for session in &self.sessions {
            session.shutdown();
        }
    }
}
