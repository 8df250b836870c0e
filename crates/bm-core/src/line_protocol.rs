//! InfluxDB line-protocol encoding.
//!
//! Each completed interval becomes one point:
//!
//! ```text
//! cook_event,project_name=Game,...,success=True,user=jane event_start=100,event_finish=142,event_duration=42.50 100
//! ```
//!
//! The trailing timestamp is the interval start in seconds, so the backend
//! must be written to with `precision=s`.

use crate::event::EventRecord;
use crate::tags::TagContext;

/// Rendered in place of the username when user logging is off.
const ANONYMOUS_USER: &str = "N/A";

/// Escapes a tag value for the line protocol.
///
/// Spaces would otherwise end the tag set.
pub fn escape_tag_value(value: &str) -> String {
    value.replace(' ', "\\ ")
}

/// Encodes records against a fixed tag context.
///
/// The tag section is rendered once at construction because the context
/// never changes for the life of the process.
#[derive(Debug, Clone)]
pub struct LineEncoder {
    tag_string: String,
    username: Option<String>,
}

impl LineEncoder {
    pub fn new(tags: &TagContext) -> Self {
        let tag_string = tags
            .tags()
            .map(|(name, value)| format!("{name}={}", escape_tag_value(value)))
            .collect::<Vec<_>>()
            .join(",");

        Self {
            tag_string,
            username: tags.username().map(escape_tag_value),
        }
    }

    /// Returns the cached, escaped tag section.
    pub fn tag_string(&self) -> &str {
        &self.tag_string
    }

    /// Renders a record as a single line-protocol point.
    ///
    /// Output depends only on the arguments, so identical input always
    /// produces identical bytes.
    pub fn encode(&self, record: &EventRecord, include_user: bool) -> String {
        let user = match (&self.username, include_user) {
            (Some(username), true) => username.as_str(),
            _ => ANONYMOUS_USER,
        };
        let success = if record.success { "True" } else { "False" };
        let start = record.start_time.timestamp();

        let mut line = String::from(record.kind.measurement());
        if !self.tag_string.is_empty() {
            line.push(',');
            line.push_str(&self.tag_string);
        }
        line.push_str(&format!(
            ",success={success},user={user} event_start={start},event_finish={finish},event_duration={duration:.2} {start}",
            finish = record.finish_time.timestamp(),
            duration = record.duration_seconds,
        ));
        line
    }
}
