//! Record sink that encodes and publishes completed intervals.

use std::mem;
use std::sync::{Mutex, PoisonError};

use bm_core::{EventRecord, LineEncoder, RecordSink, TagContext};
use tokio::task::JoinHandle;

use crate::publisher::Publisher;
use crate::transport::{Delivery, HttpTransport, Transport};

/// Turns each completed interval into one published point.
///
/// In-flight requests are remembered only so [`InfluxSink::flush`] can wait
/// for them at shutdown; records themselves are never queued.
#[derive(Debug)]
pub struct InfluxSink<T = HttpTransport> {
    encoder: LineEncoder,
    publisher: Publisher<T>,
    in_flight: Mutex<Vec<JoinHandle<Delivery>>>,
}

impl<T: Transport> InfluxSink<T> {
    pub fn new(tags: &TagContext, publisher: Publisher<T>) -> Self {
        Self {
            encoder: LineEncoder::new(tags),
            publisher,
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub const fn publisher(&self) -> &Publisher<T> {
        &self.publisher
    }

    /// Waits for requests that were still outstanding.
    ///
    /// Returns the deliveries of the requests awaited here; requests that
    /// had already finished are not included.
    pub async fn flush(&self) -> Vec<Delivery> {
        let handles = mem::take(&mut *self.lock_in_flight());

        let mut deliveries = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(delivery) => deliveries.push(delivery),
                Err(err) => tracing::warn!(error = %err, "metric delivery task failed"),
            }
        }
        deliveries
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<Delivery>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> RecordSink for InfluxSink<T> {
    fn submit(&self, record: &EventRecord) {
        let config = self.publisher.config();
        if !config.enable_logging {
            return;
        }

        let line = self.encoder.encode(record, config.log_user);
        if let Some(handle) = self.publisher.publish(line) {
            let mut in_flight = self.lock_in_flight();
            in_flight.retain(|handle| !handle.is_finished());
            in_flight.push(handle);
        }
    }
}
