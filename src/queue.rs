// src/queue.rs
use std::sync::Arc;

use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::config::QueueConfig;
use crate::element::Element;
use crate::error::{QueueError, Result};
use crate::rank::{self, LevelSnapshot};
use crate::refresh::{Activity, ActivityCounters, RefreshFn, RefreshScheduler, TriggerFn};
use crate::store::LevelStore;

struct Shared<S> {
    store: S,
    config: QueueConfig,
    snapshot: watch::Sender<Arc<LevelSnapshot>>,
    activity: ActivityCounters,
    // Serializes refreshes from the scheduler and from explicit `refresh()` calls.
    refresh_lock: Mutex<()>,
}

impl<S: LevelStore> Shared<S> {
    fn current(&self) -> Arc<LevelSnapshot> {
        self.snapshot.borrow().clone()
    }

    async fn refresh(&self) -> Result<Arc<LevelSnapshot>> {
        let _guard = self.refresh_lock.lock().await;
        // Activity recorded during the round trip stays for the next refresh.
        let seen = self.activity.read();
        let lengths = self.store.lengths().await?;
        let generation = self.current().generation + 1;
        let snapshot = Arc::new(LevelSnapshot::from_lengths(&lengths, generation));
        self.snapshot.send_replace(snapshot.clone());
        self.activity.consume(seen);
        debug!(
            base_key = %self.config.base_key,
            generation,
            total = snapshot.total(),
            "snapshot refreshed"
        );
        Ok(snapshot)
    }
}

/// Multi-level priority queue with lazy removal and cached rank estimation.
///
/// Construction spawns the refresh scheduler on the current tokio runtime;
/// it runs until [`PriorityQueue::stop`] is called or the queue is dropped.
/// Share one instance between tasks through an `Arc`.
pub struct PriorityQueue<S: LevelStore + 'static> {
    shared: Arc<Shared<S>>,
    scheduler: RefreshScheduler,
}

impl<S: LevelStore + 'static> PriorityQueue<S> {
    pub fn new(config: QueueConfig, store: S) -> Result<Self> {
        config.validate()?;
        if store.max_level() != config.max_level {
            return Err(QueueError::InvalidConfig(format!(
                "store has {} levels, config expects {}",
                store.max_level(),
                config.max_level
            )));
        }

        let (snapshot, _) = watch::channel(Arc::new(LevelSnapshot::empty(config.max_level)));
        let shared = Arc::new(Shared {
            store,
            config,
            snapshot,
            activity: ActivityCounters::default(),
            refresh_lock: Mutex::new(()),
        });

        let trigger: TriggerFn = {
            let shared = shared.clone();
            let threshold = shared.config.threshold_count;
            Arc::new(move || shared.activity.exceeds(threshold))
        };
        let refresh: RefreshFn = {
            let shared = shared.clone();
            Arc::new(move || {
                let shared = shared.clone();
                async move { shared.refresh().await.map(|_| ()) }.boxed()
            })
        };
        let scheduler = RefreshScheduler::start(
            shared.config.regular_interval,
            shared.config.poll_interval,
            trigger,
            refresh,
        );

        info!(
            base_key = %shared.config.base_key,
            max_level = shared.config.max_level,
            "priority queue started"
        );
        Ok(Self { shared, scheduler })
    }

    pub async fn push<T: Serialize>(&self, level: i64, element: &Element<T>) -> Result<()> {
        self.shared.config.check_level(level)?;
        let payload = element.encode()?;
        let seq = self.shared.store.push(level, &element.id, &payload).await?;
        self.shared.activity.record_push();
        debug!(id = %element.id, level, seq, "pushed");
        Ok(())
    }

    /// Takes the first live element, or `None` when every level is drained.
    pub async fn pop<T: DeserializeOwned>(&self) -> Result<Option<Element<T>>> {
        let Some(payload) = self.shared.store.pop().await? else {
            return Ok(None);
        };
        self.shared.activity.record_pop();
        let element = Element::decode(&payload)?;
        debug!(id = %element.id, "popped");
        Ok(Some(element))
    }

    /// Lazy delete: the record stays in its level until a pop walks past it.
    pub async fn pull(&self, id: &str) -> Result<()> {
        self.shared.store.pull(id).await?;
        debug!(id, "pulled");
        Ok(())
    }

    pub async fn contains(&self, id: &str) -> Result<bool> {
        self.shared.store.contains(id).await
    }

    /// Estimated number of live elements served before `id`.
    ///
    /// The in-level part is exact at call time; the part for other levels comes
    /// from the last snapshot and may lag.
    pub async fn count_before(&self, id: &str) -> Result<i64> {
        let position = self
            .shared
            .store
            .count_within_level(id)
            .await?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        let snapshot = self.shared.current();
        Ok(rank::estimate(
            position.ahead,
            position.level,
            &snapshot,
            self.shared.config.cached_term,
        ))
    }

    /// Physical length of one level, dead records included.
    pub async fn len(&self, level: i64) -> Result<i64> {
        self.shared.config.check_level(level)?;
        self.shared.store.len(level).await
    }

    pub async fn lengths(&self) -> Result<Vec<i64>> {
        self.shared.store.lengths().await
    }

    /// Refreshes the snapshot now, independent of the scheduler.
    pub async fn refresh(&self) -> Result<Arc<LevelSnapshot>> {
        self.shared.refresh().await
    }

    pub fn snapshot(&self) -> Arc<LevelSnapshot> {
        self.shared.current()
    }

    /// Receives every snapshot published after subscribing.
    pub fn subscribe(&self) -> watch::Receiver<Arc<LevelSnapshot>> {
        self.shared.snapshot.subscribe()
    }

    /// Pushes and pops counted since the last refresh.
    pub fn activity(&self) -> Activity {
        self.shared.activity.read()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// Halts the background refresh. Idempotent.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.scheduler.is_stopped()
    }
}

impl<S: LevelStore + 'static> Drop for PriorityQueue<S> {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}
