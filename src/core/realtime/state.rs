//! Shared state between the caller and the background reader.
//!
//! The reader closes a session when it stops for any reason, and disconnect
//! closes it once it is done with the transport. Only the reader fires the
//! termination signal, and only on `SessionTerminated`. The caller reads the
//! open flag before each send and waits on the signal at most once, during a
//! graceful disconnect.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::errors::RealtimeError;

/// Fire-once latch signalled when the service acknowledges termination.
///
/// Firing before anyone waits is remembered, and firing twice is a no-op.
#[derive(Debug, Default)]
pub struct TerminationSignal {
    fired: AtomicBool,
    notify: Notify,
}

impl TerminationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the signal had already fired.
    pub fn fire(&self) -> bool {
        let first = !self.fired.swap(true, Ordering::AcqRel);
        if first {
            self.notify.notify_waiters();
        }
        first
    }

    #[inline]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Wait until the signal fires.
    pub async fn wait(&self) {
        // Notified registers on creation, so a fire between the flag check
        // and the await is not lost.
        let notified = self.notify.notified();
        if self.has_fired() {
            return;
        }
        notified.await;
    }

    /// Wait until the signal fires or `cancel` is triggered.
    pub async fn wait_or_cancel(&self, cancel: &CancellationToken) -> Result<(), RealtimeError> {
        tokio::select! {
            biased;
            _ = self.wait() => Ok(()),
            _ = cancel.cancelled() => Err(RealtimeError::Cancelled),
        }
    }
}

/// Open flag and termination signal for one session.
#[derive(Debug, Default)]
pub struct SessionState {
    open: AtomicBool,
    termination: TerminationSignal,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Called by the connector once the handshake succeeds.
    pub(crate) fn mark_open(&self) {
        self.open.store(true, Ordering::Release);
    }

    /// Returns `false` if the session was already closed.
    pub(crate) fn mark_closed(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn termination(&self) -> &TerminationSignal {
        &self.termination
    }
}
