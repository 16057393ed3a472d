//! Interrupting a running session

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Shared flag that a session races its reads and turns against
///
/// The CLI trips it from its Ctrl-C handler. Once tripped it stays tripped;
/// every clone observes the same flag.
#[derive(Clone, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    tripped: AtomicBool,
    wakeup: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.tripped.load(Ordering::SeqCst)
    }

    /// Trip the flag and wake every waiter; later calls do nothing
    pub fn cancel(&self) {
        if !self.shared.tripped.swap(true, Ordering::SeqCst) {
            self.shared.wakeup.notify_waiters();
        }
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let wakeup = self.shared.wakeup.notified();
        tokio::pin!(wakeup);
        // Enlist before reading the flag, or a cancel in between is missed
        wakeup.as_mut().enable();
        if !self.is_cancelled() {
            wakeup.await;
        }
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancellationToken").field(&self.is_cancelled()).finish()
    }
}
