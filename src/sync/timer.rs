//! Tokio-backed reconnect timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::transport::{ReconnectTimer, TimerToken};

/// A one-shot sleep task per schedule. Fired tokens are delivered on a
/// channel; cancelling aborts the task.
#[derive(Debug)]
pub struct TokioTimer {
    fired: mpsc::UnboundedSender<TimerToken>,
    next: u64,
    pending: Option<(TimerToken, JoinHandle<()>)>,
}

impl TokioTimer {
    pub fn new(fired: mpsc::UnboundedSender<TimerToken>) -> Self {
        Self {
            fired,
            next: 0,
            pending: None,
        }
    }
}

impl ReconnectTimer for TokioTimer {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        self.cancel();
        self.next += 1;
        let token = TimerToken(self.next);
        let fired = self.fired.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired.send(token);
        });
        self.pending = Some((token, task));
        token
    }

    fn cancel(&mut self) {
        if let Some((_, task)) = self.pending.take() {
            task.abort();
        }
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn acknowledge(&mut self, token: TimerToken) -> bool {
        let current = matches!(&self.pending, Some((pending, _)) if *pending == token);
        if current {
            self.pending = None;
        }
        current
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);

        let token = timer.schedule(Duration::from_secs(2));
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(rx.try_recv().is_err());

        let fired = rx.recv().await;
        assert_eq!(fired, Some(token));
        assert!(timer.acknowledge(token));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);

        timer.schedule(Duration::from_secs(1));
        timer.cancel();
        assert!(!timer.is_pending());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_supersedes_token() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);

        let first = timer.schedule(Duration::from_secs(1));
        let second = timer.schedule(Duration::from_secs(3));
        assert!(!timer.acknowledge(first));

        assert_eq!(rx.recv().await, Some(second));
        assert!(timer.acknowledge(second));
    }
}
