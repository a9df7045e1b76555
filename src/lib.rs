//! levelq: a multi-level priority queue on Redis.
//!
//! Elements are pushed into one of `max_level` levels (1 is served first) and
//! popped FIFO within a level. Removal by id is lazy and O(1). An element's
//! position is estimated from an exact count inside its own level plus a
//! cached population snapshot of the other levels, refreshed in the
//! background on a timer and whenever push/pop drift grows too large.
//!
//! ```no_run
//! use levelq::{Element, PriorityQueue, QueueConfig, RedisStore};
//!
//! # async fn demo() -> levelq::Result<()> {
//! let config = QueueConfig::new("render-jobs", 3);
//! let store = RedisStore::connect("redis://127.0.0.1:6379", &config.base_key, config.max_level).await?;
//! let queue = PriorityQueue::new(config, store)?;
//!
//! queue.push(2, &Element::new("frame-17", "payload")).await?;
//! let ahead = queue.count_before("frame-17").await?;
//! let next: Option<Element<String>> = queue.pop().await?;
//! # let _ = (ahead, next);
//! queue.stop();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod queue;
pub mod rank;
pub mod refresh;
pub mod store;
pub mod utils;

pub use config::QueueConfig;
pub use element::Element;
pub use error::{QueueError, Result};
pub use queue::PriorityQueue;
pub use rank::{CachedTerm, LevelSnapshot};
pub use refresh::Activity;
pub use store::{LevelPosition, LevelStore, MemoryStore, QueueKeys, RedisStore};
