//! InfluxDB delivery for build metrics.
//!
//! Provides:
//! - Backend configuration and write endpoint construction (v1.8 and v2 APIs)
//! - A fire-and-forget HTTP publisher for line-protocol points
//! - A [`bm_core::RecordSink`] that encodes and publishes completed intervals

mod config;
mod publisher;
mod sink;
mod transport;

pub use config::{BackendVersion, ConfigError, Endpoint, InfluxConfig};
pub use publisher::Publisher;
pub use sink::InfluxSink;
pub use transport::{Delivery, HttpTransport, Transport, TransportError, WriteRequest};
