// src/refresh/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::Notify;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Performs one refresh. Failures are logged by the scheduler and otherwise ignored.
pub type RefreshFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Polled by the drift loop; `true` asks for an immediate refresh.
pub type TriggerFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Dual-trigger refresh loop.
///
/// One task waits on a deadline of `regular` (restarted after every refresh)
/// or on an early request and runs the refresh. A second task polls `trigger`
/// every `poll` and files early requests. `Notify` keeps at most one pending
/// permit, so bursts of requests collapse into a single refresh.
pub struct RefreshScheduler {
    requests: Arc<Notify>,
    shutdown: CancellationToken,
}

impl RefreshScheduler {
    /// Spawns both loops on the current tokio runtime.
    pub fn start(regular: Duration, poll: Duration, trigger: TriggerFn, refresh: RefreshFn) -> Self {
        let requests = Arc::new(Notify::new());
        let shutdown = CancellationToken::new();

        tokio::spawn(run_refresh_loop(
            regular,
            requests.clone(),
            shutdown.clone(),
            refresh,
        ));
        tokio::spawn(run_drift_loop(poll, requests.clone(), shutdown.clone(), trigger));

        info!(?regular, ?poll, "🔄 Refresh scheduler started");
        Self { requests, shutdown }
    }

    /// Asks for a refresh ahead of the deadline. Coalesces with pending requests.
    pub fn request_refresh(&self) {
        self.requests.notify_one();
    }

    /// Ends both loops. Safe to call any number of times; never waits.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("🔄 Refresh scheduler stopping");
        }
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

async fn run_refresh_loop(
    regular: Duration,
    requests: Arc<Notify>,
    shutdown: CancellationToken,
    refresh: RefreshFn,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = requests.notified() => debug!("refresh requested by drift"),
            _ = sleep(regular) => debug!("refresh interval elapsed"),
        }

        if let Err(e) = refresh().await {
            warn!(error = %e, "snapshot refresh failed, keeping previous snapshot");
        }
    }
    debug!("refresh loop exited");
}

async fn run_drift_loop(
    poll: Duration,
    requests: Arc<Notify>,
    shutdown: CancellationToken,
    trigger: TriggerFn,
) {
    let mut tick = interval(poll);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = tick.tick() => {}
        }

        if trigger() {
            requests.notify_one();
        }
    }
    debug!("drift loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn counting_refresh(runs: Arc<AtomicUsize>) -> RefreshFn {
        Arc::new(move || {
            let runs = runs.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<_, QueueError>(())
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn time_trigger_fires_every_interval() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = RefreshScheduler::start(
            Duration::from_secs(10),
            Duration::from_secs(1),
            Arc::new(|| false),
            counting_refresh(runs.clone()),
        );

        sleep(Duration::from_secs(25)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn drift_requests_collapse_into_one_refresh() {
        let runs = Arc::new(AtomicUsize::new(0));
        let fire = Arc::new(AtomicBool::new(false));
        let trigger: TriggerFn = {
            let fire = fire.clone();
            // one-shot: the condition clears once it has been observed
            Arc::new(move || fire.swap(false, Ordering::SeqCst))
        };
        let scheduler = RefreshScheduler::start(
            Duration::from_secs(3600),
            Duration::from_millis(10),
            trigger,
            counting_refresh(runs.clone()),
        );

        scheduler.request_refresh();
        scheduler.request_refresh();
        scheduler.request_refresh();
        sleep(Duration::from_millis(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        fire.store(true, Ordering::SeqCst);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let runs = Arc::new(AtomicUsize::new(0));
        let refresh: RefreshFn = {
            let runs = runs.clone();
            Arc::new(move || {
                let runs = runs.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(QueueError::UnexpectedReply("boom".into()))
                }
                .boxed()
            })
        };
        let scheduler = RefreshScheduler::start(
            Duration::from_secs(1),
            Duration::from_secs(1),
            Arc::new(|| false),
            refresh,
        );

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_final() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = RefreshScheduler::start(
            Duration::from_secs(1),
            Duration::from_millis(100),
            Arc::new(|| true),
            counting_refresh(runs.clone()),
        );

        scheduler.stop();
        scheduler.stop();
        assert!(scheduler.is_stopped());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
