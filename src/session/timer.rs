use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Repeating tick that owns at most one live task.
///
/// `restart` aborts the running task before spawning a new one, so ticks
/// never stack. The tick callback returns `false` to end the task on its own.
pub struct TimerService {
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl TimerService {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Cancel any running tick and start a fresh one; the first tick fires
    /// one period from now.
    pub fn restart<F, Fut>(&mut self, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.cancel();

        let period = self.period;
        // Measured from the restart, not from when the task is first polled
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !on_tick().await {
                    break;
                }
            }

            debug!("Timer task finished");
        });

        self.handle = Some(handle);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.cancel();
    }
}
