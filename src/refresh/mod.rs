// src/refresh/mod.rs
pub mod activity;
pub mod scheduler;

pub use activity::{drift_exceeds, Activity, ActivityCounters};
pub use scheduler::{RefreshFn, RefreshScheduler, TriggerFn};
