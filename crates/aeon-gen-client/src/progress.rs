//! Batch progress reporting.
//!
//! The poller notifies its observer at most once per completed poll cycle,
//! synchronously, before sleeping. Closures implement `ProgressObserver`
//! directly; `ProgressSender` forwards notifications into a bounded channel
//! for async consumers.

use aeon_models::BatchSummary;
use tokio::sync::mpsc;

/// Progress notification for one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProgress {
    /// Poll cycle that produced this summary (0 when nothing needed polling)
    pub attempt: u32,
    pub summary: BatchSummary,
}

/// Receives batch progress from the poller.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &PollProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&PollProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &PollProgress) {
        self(progress)
    }
}

/// Observer that forwards progress into a channel.
#[derive(Clone)]
pub struct ProgressSender {
    tx: mpsc::Sender<PollProgress>,
}

impl ProgressSender {
    pub fn new(tx: mpsc::Sender<PollProgress>) -> Self {
        Self { tx }
    }
}

impl ProgressObserver for ProgressSender {
    fn on_progress(&self, progress: &PollProgress) {
        // Use try_send to avoid blocking; drop events if channel is full
        let _ = self.tx.try_send(progress.clone());
    }
}

/// Receiving side of a progress channel.
pub struct ProgressReceiver {
    rx: mpsc::Receiver<PollProgress>,
}

impl ProgressReceiver {
    /// Receive the next progress event.
    pub async fn recv(&mut self) -> Option<PollProgress> {
        self.rx.recv().await
    }

    /// Try to receive a progress event without blocking.
    pub fn try_recv(&mut self) -> Option<PollProgress> {
        self.rx.try_recv().ok()
    }
}

/// Create a progress channel pair.
pub fn channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ProgressSender::new(tx), ProgressReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn progress(attempt: u32) -> PollProgress {
        PollProgress {
            attempt,
            summary: BatchSummary::default(),
        }
    }

    #[tokio::test]
    async fn test_progress_channel() {
        let (sender, mut receiver) = channel(8);

        sender.on_progress(&progress(1));
        sender.on_progress(&progress(2));

        assert_eq!(receiver.recv().await.unwrap().attempt, 1);
        assert_eq!(receiver.recv().await.unwrap().attempt, 2);
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_full_channel_drops_events() {
        let (sender, mut receiver) = channel(1);
        sender.on_progress(&progress(1));
        sender.on_progress(&progress(2));

        assert_eq!(receiver.try_recv().unwrap().attempt, 1);
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn test_closure_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = |p: &PollProgress| seen.lock().unwrap().push(p.attempt);

        observer.on_progress(&progress(3));
        observer.on_progress(&progress(4));
        assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
    }
}
