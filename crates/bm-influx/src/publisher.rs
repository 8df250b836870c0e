//! Fire-and-forget delivery of line-protocol points.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::InfluxConfig;
use crate::transport::{Delivery, HttpTransport, Transport, WriteRequest};

/// Sends encoded points to the configured backend.
///
/// Each call to [`Publisher::publish`] issues at most one POST and returns
/// immediately. Outcomes are logged when the request completes; nothing is
/// retried.
pub struct Publisher<T = HttpTransport> {
    config: InfluxConfig,
    transport: Arc<T>,
    runtime: Handle,
}

impl<T> std::fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Publisher<T> {
    /// Creates a publisher that spawns requests onto `runtime`.
    pub fn new(config: InfluxConfig, transport: T, runtime: Handle) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            runtime,
        }
    }

    pub const fn config(&self) -> &InfluxConfig {
        &self.config
    }

    /// Submits one point.
    ///
    /// Returns `None` without touching the network when logging is disabled
    /// or the configuration is incomplete. Otherwise returns the in-flight
    /// request; dropping the handle does not cancel it.
    pub fn publish(&self, line: String) -> Option<JoinHandle<Delivery>> {
        if !self.config.enable_logging {
            return None;
        }

        let endpoint = match self.config.endpoint() {
            Ok(endpoint) => endpoint,
            Err(err) => {
                tracing::error!(error = %err, "cannot log metrics");
                return None;
            }
        };

        tracing::info!(line = %line, url = endpoint.redacted_url(), "logging metric");

        let request = WriteRequest {
            url: endpoint.url().to_string(),
            authorization: endpoint.authorization().map(str::to_string),
            body: line,
        };
        let transport = Arc::clone(&self.transport);
        Some(self.runtime.spawn(async move {
            let delivery = transport.send(request).await;
            report(&delivery);
            delivery
        }))
    }
}

fn report(delivery: &Delivery) {
    if delivery.success {
        tracing::info!(status = ?delivery.status, "metric submitted");
    } else {
        tracing::error!(
            status = ?delivery.status,
            body = %delivery.body,
            "submitting metric failed"
        );
    }
}
