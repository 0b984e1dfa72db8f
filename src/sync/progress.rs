//! Progress notifications and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    /// Human-readable status line.
    pub message: String,
    /// Overall completion, 0-100, when meaningful.
    pub percent: Option<u8>,
}

impl SyncProgress {
    /// Creates a notification.
    #[must_use]
    pub fn new(message: impl Into<String>, percent: Option<u8>) -> Self {
        Self {
            message: message.into(),
            percent,
        }
    }
}

/// Sending half of the progress channel.
///
/// Sending never blocks, and a dropped receiver is ignored, so the engine can
/// emit from any task regardless of what the consumer is doing.
#[derive(Debug, Clone)]
pub struct ProgressSender(mpsc::UnboundedSender<SyncProgress>);

impl ProgressSender {
    /// Creates a connected sender/receiver pair.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Emits a notification.
    pub fn emit(&self, message: impl Into<String>, percent: Option<u8>) {
        let _ = self.0.send(SyncProgress::new(message, percent));
    }
}

impl From<mpsc::UnboundedSender<SyncProgress>> for ProgressSender {
    fn from(tx: mpsc::UnboundedSender<SyncProgress>) -> Self {
        Self(tx)
    }
}

/// Shared cancellation flag, polled before each item.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. The item in flight still completes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Percentage shown while processing item `index` (0-based) of `total`:
/// linear from 10 up to, but excluding, 100.
#[must_use]
pub fn item_percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 10;
    }
    let span = index.min(total).saturating_mul(90) / total;
    u8::try_from(10 + span).unwrap_or(100)
}
