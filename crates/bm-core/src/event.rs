//! Timed intervals produced by the tracker.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of host activity an interval measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Unknown,
    Build,
    Cook,
    Package,
    Shader,
}

impl EventKind {
    /// Measurement name written to the backend.
    ///
    /// `uknown_event` is misspelt on purpose: existing dashboards query it.
    #[must_use]
    pub const fn measurement(&self) -> &'static str {
        match self {
            Self::Unknown => "uknown_event",
            Self::Build => "build_event",
            Self::Cook => "cook_event",
            Self::Package => "package_event",
            Self::Shader => "shader_event",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.measurement())
    }
}

/// A completed interval, ready to be encoded.
///
/// `finish_time` is never earlier than `start_time` and `duration_seconds`
/// is never negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// What was measured.
    pub kind: EventKind,
    /// When the interval began.
    pub start_time: DateTime<Utc>,
    /// When the interval ended.
    pub finish_time: DateTime<Utc>,
    /// Length of the interval in seconds.
    pub duration_seconds: f64,
    /// Whether the host reported the activity as successful.
    pub success: bool,
}

impl EventRecord {
    /// Creates a pending record that has only been started.
    pub(crate) const fn started(kind: EventKind, start_time: DateTime<Utc>) -> Self {
        Self {
            kind,
            start_time,
            finish_time: start_time,
            duration_seconds: 0.0,
            success: false,
        }
    }
}

/// A single name/value attribute attached to a host event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
