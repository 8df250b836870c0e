//! Per-kind interval tracking.
//!
//! The host reports activity as loose start/stop signals that may repeat or
//! arrive out of order. [`EventStateTracker`] keeps one slot per re-entrant
//! kind (cook, package, shader) and turns well-formed pairs into
//! [`EventRecord`]s. Duplicate starts and unmatched stops are absorbed: an
//! interval that cannot be measured is not reported at all.
//!
//! # Thread Safety
//!
//! All mutating methods take `&mut self`. Drive the tracker from a single
//! thread, or wrap it in a `Mutex` when events arrive from several threads.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::event::{Attribute, EventKind, EventRecord};

const DURATION_ATTRIBUTE: &str = "Duration";
const RESULT_ATTRIBUTE: &str = "Result";
const RESULT_SUCCEEDED: &str = "Succeeded";

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by [`Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Receives completed intervals.
///
/// Implementations must not block: the tracker calls `submit` inline while
/// handling a host event.
pub trait RecordSink {
    fn submit(&self, record: &EventRecord);
}

impl<S: RecordSink + ?Sized> RecordSink for &S {
    fn submit(&self, record: &EventRecord) {
        (**self).submit(record);
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Arc<S> {
    fn submit(&self, record: &EventRecord) {
        (**self).submit(record);
    }
}

impl RecordSink for Sender<EventRecord> {
    fn submit(&self, record: &EventRecord) {
        if self.send(record.clone()).is_err() {
            tracing::debug!(kind = %record.kind, "record receiver dropped");
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    in_progress: bool,
    pending: EventRecord,
}

#[derive(Debug, Default)]
struct Slots {
    cook: Slot,
    package: Slot,
    shader: Slot,
}

impl Slots {
    const fn get(&self, kind: EventKind) -> Option<&Slot> {
        match kind {
            EventKind::Cook => Some(&self.cook),
            EventKind::Package => Some(&self.package),
            EventKind::Shader => Some(&self.shader),
            EventKind::Build | EventKind::Unknown => None,
        }
    }

    const fn get_mut(&mut self, kind: EventKind) -> Option<&mut Slot> {
        match kind {
            EventKind::Cook => Some(&mut self.cook),
            EventKind::Package => Some(&mut self.package),
            EventKind::Shader => Some(&mut self.shader),
            EventKind::Build | EventKind::Unknown => None,
        }
    }
}

/// Pairs start and stop signals into completed [`EventRecord`]s.
#[derive(Debug)]
pub struct EventStateTracker<S, C = SystemClock> {
    sink: S,
    clock: C,
    slots: Slots,
}

impl<S: RecordSink> EventStateTracker<S> {
    /// Creates a tracker that stamps intervals with the wall clock.
    pub fn new(sink: S) -> Self {
        Self::with_clock(sink, SystemClock)
    }
}

impl<S: RecordSink, C: Clock> EventStateTracker<S, C> {
    pub fn with_clock(sink: S, clock: C) -> Self {
        Self {
            sink,
            clock,
            slots: Slots::default(),
        }
    }

    /// Opens an interval for `kind` unless one is already open.
    ///
    /// A second start before the matching stop is ignored and the original
    /// start time is kept.
    pub fn start(&mut self, kind: EventKind) {
        let now = self.clock.now();
        let Some(slot) = self.slots.get_mut(kind) else {
            tracing::trace!(%kind, "ignoring start for kind without interval state");
            return;
        };

        if slot.in_progress {
            tracing::trace!(%kind, "ignoring duplicate start");
            return;
        }

        slot.in_progress = true;
        slot.pending = EventRecord::started(kind, now);
    }

    /// Closes the open interval for `kind` and submits it.
    ///
    /// Does nothing if no interval is open.
    pub fn stop(&mut self, kind: EventKind, success: bool) {
        let now = self.clock.now();
        let Some(slot) = self.slots.get_mut(kind) else {
            tracing::trace!(%kind, "ignoring stop for kind without interval state");
            return;
        };

        if !slot.in_progress {
            tracing::trace!(%kind, "ignoring stop without matching start");
            return;
        }

        slot.in_progress = false;
        let record = &mut slot.pending;
        record.finish_time = now.max(record.start_time);
        record.duration_seconds = elapsed_seconds(record.start_time, record.finish_time);
        record.success = success;

        tracing::debug!(
            %kind,
            duration_seconds = record.duration_seconds,
            success,
            "interval completed"
        );
        self.sink.submit(record);
    }

    /// Builds a record from a recompile event's attributes.
    ///
    /// Recompiles have no start signal, so the host-reported `Duration`
    /// (seconds, possibly fractional) is trusted and the start time is derived
    /// from it. Events without a non-negative numeric duration are dropped.
    pub fn record_build(&mut self, attributes: &[Attribute]) {
        let mut duration = None;
        let mut success = false;
        for attr in attributes {
            tracing::trace!(name = %attr.name, value = %attr.value, "build attribute");
            match attr.name.as_str() {
                DURATION_ATTRIBUTE => duration = Some(attr.value.as_str()),
                RESULT_ATTRIBUTE => success = attr.value == RESULT_SUCCEEDED,
                _ => {}
            }
        }

        let Some(raw) = duration else {
            tracing::trace!("dropping build event without duration");
            return;
        };
        let finish_time = self.clock.now();
        let Some(start_time) =
            parse_duration(raw).and_then(|elapsed| finish_time.checked_sub_signed(elapsed))
        else {
            tracing::trace!(value = raw, "dropping build event with unusable duration");
            return;
        };

        let record = EventRecord {
            kind: EventKind::Build,
            start_time,
            finish_time,
            duration_seconds: elapsed_seconds(start_time, finish_time),
            success,
        };

        tracing::debug!(duration_seconds = record.duration_seconds, success, "build completed");
        self.sink.submit(&record);
    }

    /// Checks whether an open shader interval has finished.
    ///
    /// The host has no "compilation finished" signal, so this is called on
    /// every tick. `is_compiling` is only queried while an interval is open;
    /// the interval closes on the first tick that reports no active job.
    pub fn poll_shader(&mut self, is_compiling: impl FnOnce() -> bool) {
        if !self.slots.shader.in_progress || is_compiling() {
            return;
        }
        self.stop(EventKind::Shader, true);
    }

    /// Returns whether an interval is open for `kind`.
    pub fn is_in_progress(&self, kind: EventKind) -> bool {
        self.slots.get(kind).is_some_and(|slot| slot.in_progress)
    }
}

/// Parses a host-reported duration in seconds.
///
/// Negative, NaN and infinite values are rejected.
fn parse_duration(raw: &str) -> Option<TimeDelta> {
    let seconds = raw.trim().parse::<f64>().ok()?;
    let elapsed = Duration::try_from_secs_f64(seconds).ok()?;
    TimeDelta::from_std(elapsed).ok()
}

fn elapsed_seconds(start: DateTime<Utc>, finish: DateTime<Utc>) -> f64 {
    (finish - start)
        .to_std()
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}
