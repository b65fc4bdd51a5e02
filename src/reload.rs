//! Coalescing reload signal
//!
//! `ReloadSignal` is the only handle that may be used off the owning context.
//! Any number of `trigger()` calls made before the owner drains the
//! `ReloadListener` collapse into a single pending reload: the channel has a
//! capacity of one, so a trigger that finds a reload already queued is a no-op.
//! A trigger made after the owner took the pending reload queues a new one.

use async_channel::{Receiver, Sender, TryRecvError, TrySendError};
use tracing::{debug, trace};

/// Cloneable, `Send + Sync` handle that requests a full list rebuild
#[derive(Debug, Clone)]
pub struct ReloadSignal {
    tx: Sender<()>,
}

/// Owning-context end of the reload signal
#[derive(Debug)]
pub struct ReloadListener {
    rx: Receiver<()>,
}

/// Create a connected signal/listener pair
pub fn reload_channel() -> (ReloadSignal, ReloadListener) {
    let (tx, rx) = async_channel::bounded(1);
    (ReloadSignal { tx }, ReloadListener { rx })
}

impl ReloadSignal {
    /// Request a reload from any thread.
    ///
    /// Returns `true` if this call queued a new reload, `false` if it was
    /// coalesced into one already pending (or the listener is gone).
    pub fn trigger(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => {
                debug!(event_type = "saved_searches", "Reload scheduled");
                true
            }
            Err(TrySendError::Full(())) => {
                trace!(event_type = "saved_searches", "Reload already pending, coalesced");
                false
            }
            Err(TrySendError::Closed(())) => {
                debug!(event_type = "saved_searches", "Reload listener dropped, ignoring trigger");
                false
            }
        }
    }
}

impl ReloadListener {
    /// Consume the pending reload, if any. Never blocks.
    pub fn take(&self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => false,
        }
    }

    /// Whether a reload is queued, without consuming it
    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Block until the next reload request.
    ///
    /// Returns `false` once every `ReloadSignal` has been dropped.
    pub fn wait_blocking(&self) -> bool {
        self.rx.recv_blocking().is_ok()
    }
}
