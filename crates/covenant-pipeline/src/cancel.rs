//! Cooperative cancellation for pipeline units of work.
//!
//! Cancellation is checked at the next suspension point (model call, SAP
//! call), never by preemptive interruption.

use std::sync::Arc;
use tokio::sync::watch;

/// Create a linked cancel handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelHandle { tx },
        CancelToken {
            rx,
            _keepalive: None,
        },
    )
}

/// Held by the initiator; cancelling is idempotent.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Carried by units of work and checked before each external call.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
    // Keeps the sender alive for tokens that can never cancel
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelToken {
    /// A token that never cancels.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}
