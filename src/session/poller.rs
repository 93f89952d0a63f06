//! Status poller
//!
//! Cancellable repeating timer that drives the per-tick fetch sequence.
//! `arm` and `disarm` are idempotent; the tick body is supplied by the
//! session controller. Disarming aborts the timer task but cannot cancel a
//! fetch already in flight, so the controller tags every tick with the
//! session id it targets and the reconciliation guard discards late results.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

pub struct StatusPoller {
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start the repeating timer if it is not already running.
    ///
    /// The first interval elapses before the first call to `tick`; the
    /// controller performs its own immediate fetch when a session starts,
    /// so the poller never duplicates it.
    pub fn arm<F, Fut>(&self, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("Poller already armed");
            return;
        }

        let interval = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval's first tick completes immediately; skip it
            timer.tick().await;
            loop {
                timer.tick().await;
                tick().await;
            }
        }));
        debug!("Poller armed (interval {:?})", interval);
    }

    /// Cancel the timer. No-op when not armed.
    pub fn disarm(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            debug!("Poller disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        // teardown must not leave an orphaned timer running
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counting_tick(counter: Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> + Send {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fire_on_interval() {
        let poller = StatusPoller::new(Duration::from_secs(30));
        let counter = Arc::new(AtomicUsize::new(0));
        poller.arm(counting_tick(counter.clone()));

        // nothing before the first interval elapses
        sleep(Duration::from_secs(29)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(62)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_is_idempotent() {
        let poller = StatusPoller::new(Duration::from_secs(30));
        let counter = Arc::new(AtomicUsize::new(0));
        poller.arm(counting_tick(counter.clone()));
        poller.arm(counting_tick(counter.clone()));
        assert!(poller.is_armed());

        sleep(Duration::from_secs(65)).await;
        // one timer, not two
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_ticks_and_is_idempotent() {
        let poller = StatusPoller::new(Duration::from_secs(30));
        let counter = Arc::new(AtomicUsize::new(0));
        poller.arm(counting_tick(counter.clone()));

        sleep(Duration::from_secs(35)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        poller.disarm();
        assert!(!poller.is_armed());
        poller.disarm(); // already disarmed, no-op

        sleep(Duration::from_secs(300)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_after_disarm() {
        let poller = StatusPoller::new(Duration::from_secs(30));
        let counter = Arc::new(AtomicUsize::new(0));
        poller.arm(counting_tick(counter.clone()));
        poller.disarm();

        poller.arm(counting_tick(counter.clone()));
        assert!(poller.is_armed());
        sleep(Duration::from_secs(35)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
