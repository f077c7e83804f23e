use tokio::sync::mpsc;
use tracing::debug;

use crate::stream::session::Command;

/// Caller-side buffer for one message. Appending records the text and queues
/// it for the session worker; it never waits on parsing.
#[derive(Debug)]
pub struct ChunkAccumulator {
    text: String,
    queue: mpsc::UnboundedSender<Command>,
}

impl ChunkAccumulator {
    pub(crate) fn new(queue: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            text: String::new(),
            queue,
        }
    }

    pub fn append(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.text.push_str(chunk);
        if self.queue.send(Command::Chunk(chunk.to_owned())).is_err() {
            debug!(len = chunk.len(), "render worker gone; chunk kept in buffer only");
        }
    }

    pub fn current_text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_buffers_and_enqueues() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut acc = ChunkAccumulator::new(tx);
        acc.append("Hello ");
        acc.append("");
        acc.append("world");
        assert_eq!(acc.current_text(), "Hello world");

        let mut queued = Vec::new();
        while let Ok(Command::Chunk(text)) = rx.try_recv() {
            queued.push(text);
        }
        assert_eq!(queued, vec!["Hello ", "world"]);
    }

    #[test]
    fn append_survives_closed_queue() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut acc = ChunkAccumulator::new(tx);
        acc.append("still recorded");
        assert_eq!(acc.current_text(), "still recorded");
    }
}
