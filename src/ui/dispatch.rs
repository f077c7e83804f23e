//! Single-threaded UI-affinity context.
//!
//! The display adapter lives on one dedicated thread. Workers never touch it
//! directly; they post jobs that run there in submission order. A job posted
//! after an update therefore observes that update, which is what `flush`
//! relies on.

use std::io;
use std::thread::{self, ThreadId};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::core::error::RenderError;

type Job<A> = Box<dyn FnOnce(&mut A) + Send + 'static>;

/// Cloneable handle to the UI thread. The thread exits once every handle is
/// dropped and the queue is drained.
pub struct UiHandle<A> {
    tx: mpsc::UnboundedSender<Job<A>>,
    thread_id: ThreadId,
}

impl<A> Clone for UiHandle<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            thread_id: self.thread_id,
        }
    }
}

pub struct UiThread;

impl UiThread {
    pub fn spawn<A: Send + 'static>(adapter: A) -> io::Result<UiHandle<A>> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job<A>>();
        let handle = thread::Builder::new()
            .name("markstream-ui".into())
            .spawn(move || {
                let mut adapter = adapter;
                while let Some(job) = rx.blocking_recv() {
                    job(&mut adapter);
                }
                debug!("ui thread exiting");
            })?;
        Ok(UiHandle {
            tx,
            thread_id: handle.thread().id(),
        })
    }
}

impl<A: Send + 'static> UiHandle<A> {
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queues `job` on the UI thread. Returns false if the thread is gone.
    pub fn post(&self, job: impl FnOnce(&mut A) + Send + 'static) -> bool {
        self.tx.send(Box::new(job)).is_ok()
    }

    /// Queues `job` and hands back a receiver for its result. The receiver
    /// errors if the UI thread went away before running it.
    pub fn call<T: Send + 'static>(
        &self,
        job: impl FnOnce(&mut A) -> T + Send + 'static,
    ) -> oneshot::Receiver<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.post(move |adapter| {
            let _ = reply_tx.send(job(adapter));
        });
        reply_rx
    }

    /// Runs `job` on the UI thread and blocks for its result.
    ///
    /// Must not be called from the UI thread itself (it would wait on its own
    /// queue) nor from inside an async runtime.
    pub fn invoke_and_wait<T: Send + 'static>(
        &self,
        job: impl FnOnce(&mut A) -> T + Send + 'static,
    ) -> Result<T, RenderError> {
        assert!(
            !self.is_ui_thread(),
            "invoke_and_wait must not be called on the UI thread"
        );
        self.call(job)
            .blocking_recv()
            .map_err(|_| RenderError::UiClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_run_in_order_on_one_thread() {
        let ui = UiThread::spawn(Vec::<u32>::new()).unwrap();
        for i in 0..100 {
            ui.post(move |v| v.push(i));
        }
        let seen = ui.invoke_and_wait(|v| v.clone()).unwrap();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn jobs_observe_ui_thread_identity() {
        let ui = UiThread::spawn(()).unwrap();
        let probe = ui.clone();
        let on_ui = ui.invoke_and_wait(move |_| probe.is_ui_thread()).unwrap();
        assert!(on_ui);
        assert!(!ui.is_ui_thread());
    }

    #[test]
    fn call_returns_result_through_receiver() {
        let ui = UiThread::spawn(21u32).unwrap();
        let rx = ui.call(|n| *n * 2);
        assert_eq!(rx.blocking_recv().unwrap(), 42);
    }
}
