//! Core domain logic for build metrics.
//!
//! This crate contains the fundamental types and logic for:
//! - Dispatch: routing named host events to the tracker
//! - Tracking: pairing start/stop signals into completed intervals
//! - Encoding: rendering completed intervals as line-protocol points

pub mod dispatch;
pub mod event;
pub mod line_protocol;
pub mod tags;
pub mod tracker;

pub use dispatch::{Dispatcher, HostEvent, UnknownHostEvent};
pub use event::{Attribute, EventKind, EventRecord};
pub use line_protocol::{LineEncoder, escape_tag_value};
pub use tags::{HostMetadata, TagContext};
pub use tracker::{Clock, EventStateTracker, RecordSink, SystemClock};
