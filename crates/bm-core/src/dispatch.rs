//! Routing of named host events to the tracker.

use std::fmt;
use std::str::FromStr;

use crate::event::{Attribute, EventKind};
use crate::tracker::{Clock, EventStateTracker, RecordSink, SystemClock};

/// Host events the tracker reacts to.
///
/// Shader compilation has no named event; see
/// [`Dispatcher::shader_compile_started`] and [`Dispatcher::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    Recompile,
    CookStart,
    CookCompleted,
    CookFailed,
    PackageStart,
    PackageCompleted,
    PackageFailed,
}

impl HostEvent {
    /// Looks up the handler for a host event name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Editor.Modules.Recompile" => Some(Self::Recompile),
            "Editor.Cook.Start" => Some(Self::CookStart),
            "Editor.Cook.Completed" => Some(Self::CookCompleted),
            "Editor.Cook.Failed" => Some(Self::CookFailed),
            "Editor.Package.Start" => Some(Self::PackageStart),
            "Editor.Package.Completed" => Some(Self::PackageCompleted),
            "Editor.Package.Failed" => Some(Self::PackageFailed),
            _ => None,
        }
    }

    /// The event name as the host emits it.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Recompile => "Editor.Modules.Recompile",
            Self::CookStart => "Editor.Cook.Start",
            Self::CookCompleted => "Editor.Cook.Completed",
            Self::CookFailed => "Editor.Cook.Failed",
            Self::PackageStart => "Editor.Package.Start",
            Self::PackageCompleted => "Editor.Package.Completed",
            Self::PackageFailed => "Editor.Package.Failed",
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HostEvent {
    type Err = UnknownHostEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownHostEvent(s.to_string()))
    }
}

/// Error type for event names the tracker does not handle.
#[derive(Debug, Clone)]
pub struct UnknownHostEvent(String);

impl fmt::Display for UnknownHostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown host event: {}", self.0)
    }
}

impl std::error::Error for UnknownHostEvent {}

/// Entry point the host wires its event callback and tick source to.
#[derive(Debug)]
pub struct Dispatcher<S, C = SystemClock> {
    tracker: EventStateTracker<S, C>,
}

impl<S: RecordSink> Dispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self::from_tracker(EventStateTracker::new(sink))
    }
}

impl<S: RecordSink, C: Clock> Dispatcher<S, C> {
    pub const fn from_tracker(tracker: EventStateTracker<S, C>) -> Self {
        Self { tracker }
    }

    /// Handles one host event.
    ///
    /// Names outside the recognised set are ignored; the host stream
    /// carries many events that are not interesting here.
    pub fn dispatch(&mut self, name: &str, attributes: &[Attribute], is_json: bool) {
        tracing::trace!(name, is_json, "host event");

        let Some(event) = HostEvent::from_name(name) else {
            return;
        };

        match event {
            HostEvent::Recompile => self.tracker.record_build(attributes),
            HostEvent::CookStart => self.tracker.start(EventKind::Cook),
            HostEvent::CookCompleted => self.tracker.stop(EventKind::Cook, true),
            HostEvent::CookFailed => self.tracker.stop(EventKind::Cook, false),
            HostEvent::PackageStart => self.tracker.start(EventKind::Package),
            HostEvent::PackageCompleted => self.tracker.stop(EventKind::Package, true),
            HostEvent::PackageFailed => self.tracker.stop(EventKind::Package, false),
        }
    }

    /// Notification that a shader compilation batch has begun.
    pub fn shader_compile_started(&mut self) {
        self.tracker.start(EventKind::Shader);
    }

    /// Periodic poll driven by the host's tick source.
    ///
    /// Polling is the only way to observe the end of shader compilation.
    /// Safe to call at any cadence; it does nothing while no batch is open.
    pub fn tick(&mut self, is_compiling: impl FnOnce() -> bool) {
        self.tracker.poll_shader(is_compiling);
    }

    pub const fn tracker(&self) -> &EventStateTracker<S, C> {
        &self.tracker
    }
}
