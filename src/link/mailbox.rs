// Single-slot mailbox between a radio callback and the tick loop.
// Posting replaces whatever was there; only the newest value is ever seen.

use std::sync::Arc;
use tokio::sync::watch;

/// Write half, handed to receive callbacks
pub struct Postbox<T> {
    tx: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for Postbox<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> Postbox<T> {
    /// Replace the slot contents in one step. Never blocks.
    pub fn post(&self, value: T) {
        self.tx.send_replace(Some(value));
    }
}

/// Read half, owned by the tick loop. Holds a sender too so the slot
/// stays readable after every postbox is dropped.
pub struct Mailbox<T> {
    rx: watch::Receiver<Option<T>>,
    _tx: Arc<watch::Sender<Option<T>>>,
}

impl<T: Clone> Mailbox<T> {
    pub fn new() -> (Postbox<T>, Mailbox<T>) {
        let (tx, rx) = watch::channel(None);
        let tx = Arc::new(tx);
        (
            Postbox {
                tx: Arc::clone(&tx),
            },
            Mailbox { rx, _tx: tx },
        )
    }

    /// Take the newest value if one arrived since the last take
    pub fn take(&mut self) -> Option<T> {
        if !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        self.rx.borrow_and_update().clone()
    }
}
