//! Host metadata attached to every emitted point.

use serde::{Deserialize, Serialize};

/// Placeholder for metadata the host could not report.
const UNKNOWN: &str = "unknown";

/// Immutable snapshot of host and environment tags.
///
/// Gathered once at startup and shared by every encoded line. Tags keep
/// their insertion order so the rendered line is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagContext {
    tags: Vec<(String, String)>,
    username: Option<String>,
}

impl TagContext {
    /// Creates a context from ordered `(name, value)` pairs.
    pub fn new<I, K, V>(tags: I, username: Option<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
            username,
        }
    }

    /// Returns the tags in render order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the value of a tag by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags()
            .find(|(tag, _)| *tag == name)
            .map(|(_, value)| value)
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Metadata describing the machine and host application.
///
/// Empty fields are reported as `unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMetadata {
    pub project_name: String,
    pub cpu_model: String,
    pub cpu_core_count: String,
    pub gpu_model: String,
    /// Total physical memory in bytes.
    pub ram_size: String,
    pub machine_name: String,
    /// Version of the host application emitting events.
    pub host_version: String,
    /// Version of this metrics extension.
    pub extension_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl HostMetadata {
    /// Converts the metadata into the tag set sent with every point.
    ///
    /// The host version is written under `unreal_version`, the key existing
    /// backends already index.
    pub fn into_context(self) -> TagContext {
        let tags = [
            ("project_name", self.project_name),
            ("cpu_model", self.cpu_model),
            ("cpu_core_count", self.cpu_core_count),
            ("gpu_model", self.gpu_model),
            ("ram_size", self.ram_size),
            ("machine_name", self.machine_name),
            ("unreal_version", self.host_version),
            ("extension_version", self.extension_version),
        ]
        .into_iter()
        .map(|(name, value)| {
            if value.trim().is_empty() {
                (name, UNKNOWN.to_string())
            } else {
                (name, value)
            }
        });

        TagContext::new(tags, self.username.filter(|u| !u.is_empty()))
    }
}
