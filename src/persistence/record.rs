//! Log record type and its persisted JSON shape

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder written where a server timestamp is absent
pub const NO_SERVER_TIME: &str = "N/A";

/// How the record reached its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    /// Logged one by one as events happen
    #[default]
    Immediate,
    /// Delivered as part of a bulk end-of-session handoff
    Final,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Immediate => "IMMEDIATE",
            RecordKind::Final => "FINAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IMMEDIATE" => Some(RecordKind::Immediate),
            "FINAL" => Some(RecordKind::Final),
            _ => None,
        }
    }
}

/// One logged event. Immutable once created; `sequence` is the canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "log_type", default, deserialize_with = "kind_lenient")]
    pub kind: RecordKind,
    pub sequence: u64,
    pub local_time: String,
    #[serde(default, deserialize_with = "server_time_opt")]
    pub server_time: Option<String>,
    #[serde(default, deserialize_with = "message_or_empty")]
    pub message: String,
}

impl LogRecord {
    pub fn new(sequence: u64, local_time: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Immediate,
            sequence,
            local_time: local_time.into(),
            server_time: None,
            message: message.into(),
        }
    }

    /// Copy of this record as received by a server at `server_time`
    pub fn stamped(&self, kind: RecordKind, server_time: &str) -> Self {
        Self {
            kind,
            server_time: Some(server_time.to_string()),
            ..self.clone()
        }
    }

    pub fn server_time_or_placeholder(&self) -> &str {
        self.server_time.as_deref().unwrap_or(NO_SERVER_TIME)
    }
}

// Older buffers wrote the "N/A" placeholder instead of null
fn server_time_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty() && s != NO_SERVER_TIME))
}

// Clients sent lowercase types; unknown or null falls back to the default
fn kind_lenient<'de, D>(deserializer: D) -> Result<RecordKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(RecordKind::from_str)
        .unwrap_or_default())
}

fn message_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}
