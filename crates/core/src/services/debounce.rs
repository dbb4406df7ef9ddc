use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

/// Signal emitted once input has been quiet for the whole window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceEvent {
    /// Dispatch a search for this text.
    Commit(String),
    /// The settled text is empty: drop results, no fetch.
    Clear,
}

/// Cancel-and-restart timer in front of search dispatch.
///
/// Each [`push`](Debouncer::push) aborts the pending timer and arms a new one, so at
/// most one commit is ever pending. Must be used inside a tokio runtime.
pub struct Debouncer {
    window: Duration,
    tx: mpsc::UnboundedSender<DebounceEvent>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> (Self, mpsc::UnboundedReceiver<DebounceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            window,
            tx,
            pending: None,
        };
        (debouncer, rx)
    }

    /// Records a keystroke's full text and restarts the wait.
    pub fn push(&mut self, text: impl Into<String>) {
        self.cancel();

        let text = text.into();
        let tx = self.tx.clone();
        let window = self.window;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let event = if text.is_empty() {
                DebounceEvent::Clear
            } else {
                DebounceEvent::Commit(text)
            };
            // Receiver gone means the search screen is gone.
            let _ = tx.send(event);
        }));
    }

    /// Drops the pending commit, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
