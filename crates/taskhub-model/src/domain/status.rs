use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::SystemTime;

use crate::{Component, MessageError, State};

/// Read-only snapshot of a runner, sent as the `r` payload of a `status` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Runner name (task id, or `"hub"`).
    pub name: String,
    pub component: Component,
    pub state: State,
    pub active: bool,
    pub running: bool,
    /// The run loop was detached onto a runtime worker of the owning process.
    pub threaded: bool,
    /// Per-cycle debug tracing is enabled.
    pub debug: bool,
    /// Last time the run loop started.
    #[serde(default, with = "opt_millis", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<SystemTime>,
    /// Last time the run loop was stopped.
    #[serde(default, with = "opt_millis", skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<SystemTime>,
    pub pid: u32,
    pub host: String,
    /// Registered task ids (hub only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<String>,
}

impl Status {
    pub fn to_value(&self) -> Result<Value, MessageError> {
        serde_json::to_value(self).map_err(|e| MessageError::Encode(e.to_string()))
    }
}

/// Timestamps travel as milliseconds since the unix epoch.
mod opt_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => {
                let since_epoch = t
                    .duration_since(UNIX_EPOCH)
                    .map_err(serde::ser::Error::custom)?;
                serializer.serialize_u64(since_epoch.as_millis() as u64)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(|ms| UNIX_EPOCH + Duration::from_millis(ms)))
    }
}
