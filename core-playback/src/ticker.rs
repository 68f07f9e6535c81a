//! # Time-Update Ticker
//!
//! A cancellable interval task that feeds tick messages into the engine
//! mailbox. The ticker itself knows nothing about playback state; the engine
//! gates whether a tick produces a `timeUpdate` event.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Handle to one spawned ticker task.
///
/// At most one ticker exists per playback session. Teardown is
/// cancel-and-await, never fire-and-forget: once [`shutdown`](Self::shutdown)
/// returns, no further tick can reach the mailbox.
pub(crate) struct TimeTicker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl TimeTicker {
    /// Spawn a ticker that sends `make_tick()` into `mailbox` every
    /// `interval`, starting one full interval from now.
    pub(crate) fn spawn<M, F>(
        interval: Duration,
        mailbox: mpsc::Sender<M>,
        make_tick: F,
    ) -> Self
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval's first tick completes immediately; swallow it so the
            // first time update lands one full interval after spawn.
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = timer.tick() => trace!("ticker fired"),
                }

                // The send must also race cancellation: the engine awaits
                // this task during teardown and cannot drain the mailbox,
                // so a send parked on a full channel would deadlock it.
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    result = mailbox.send(make_tick()) => {
                        if result.is_err() {
                            // Engine mailbox gone; nothing left to tick for.
                            break;
                        }
                    }
                }
            }
        });

        Self { token, handle }
    }

    /// Cancel the ticker and wait for the task to finish.
    pub(crate) async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_cadence() {
        let (tx, mut rx) = mpsc::channel::<u32>(8);
        let ticker = TimeTicker::spawn(Duration::from_secs(1), tx, || 1);

        // Nothing before the first full interval elapses.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.recv().await, Some(1));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await, Some(1));

        ticker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_completes_while_send_is_parked() {
        let (tx, mut rx) = mpsc::channel::<u32>(1);
        let ticker = TimeTicker::spawn(Duration::from_millis(1), tx, || 1);

        // Fill the channel and leave the ticker parked inside its send.
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Must return even though nobody drains the channel.
        ticker.shutdown().await;
        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let (tx, mut rx) = mpsc::channel::<u32>(8);
        let ticker = TimeTicker::spawn(Duration::from_secs(1), tx, || 1);

        ticker.shutdown().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
