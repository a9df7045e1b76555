// src/element.rs
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{QueueError, Result};

/// A queued work item. `value` is opaque to the queue and travels as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element<T = serde_json::Value> {
    pub id: String,
    pub value: T,
}

impl<T> Element<T> {
    pub fn new(id: impl Into<String>, value: T) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

impl<T: Serialize> Element<T> {
    pub(crate) fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(QueueError::Serialization)
    }
}

impl<T: DeserializeOwned> Element<T> {
    pub(crate) fn decode(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(QueueError::Deserialization)
    }
}
