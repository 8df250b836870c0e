//! Watch command for replaying host events from stdin.
//!
//! Each input line is one JSON object tagged by `kind`:
//!
//! ```text
//! {"kind":"event","name":"Editor.Cook.Start","attributes":[],"json":false}
//! {"kind":"shader_batch_started"}
//! {"kind":"tick","compiling":false}
//! ```
//!
//! Completed intervals are published as they close, or printed with
//! `--dry-run`.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use bm_core::{Attribute, Clock, Dispatcher, EventRecord, LineEncoder, RecordSink, TagContext};
use bm_influx::{HttpTransport, InfluxSink, Publisher};
use serde::Deserialize;

use crate::Config;
use crate::host;

/// One signal from the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostSignal {
    /// A named analytics event.
    Event {
        name: String,
        #[serde(default)]
        attributes: Vec<Attribute>,
        #[serde(default)]
        json: bool,
    },
    /// A shader compilation batch began.
    ShaderBatchStarted,
    /// Periodic tick carrying whether a compile job is running.
    Tick { compiling: bool },
}

/// Counts of processed input lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub signals: usize,
    pub skipped: usize,
}

/// Sink that prints encoded points instead of sending them.
pub struct LineWriter<W> {
    encoder: LineEncoder,
    include_user: bool,
    out: RefCell<W>,
}

impl<W: Write> LineWriter<W> {
    pub fn new(tags: &TagContext, include_user: bool, out: W) -> Self {
        Self {
            encoder: LineEncoder::new(tags),
            include_user,
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> RecordSink for LineWriter<W> {
    fn submit(&self, record: &EventRecord) {
        let line = self.encoder.encode(record, self.include_user);
        if let Err(err) = writeln!(self.out.borrow_mut(), "{line}") {
            tracing::warn!(error = %err, "failed to write metric line");
        }
    }
}

/// Runs the watch loop over stdin until end of input.
pub fn run(config: &Config, dry_run: bool) -> Result<()> {
    let tags = host::gather(&config.host).into_context();
    let stdin = io::stdin().lock();

    if dry_run {
        let sink = LineWriter::new(&tags, config.influx.log_user, io::stdout());
        let mut dispatcher = Dispatcher::new(&sink);
        let stats = replay(stdin, &mut dispatcher)?;
        tracing::debug!(?stats, "replay finished");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let transport = HttpTransport::new().context("failed to build HTTP client")?;
    let publisher = Publisher::new(config.influx.clone(), transport, runtime.handle().clone());
    let sink = InfluxSink::new(&tags, publisher);

    let mut dispatcher = Dispatcher::new(&sink);
    let stats = replay(stdin, &mut dispatcher)?;
    tracing::debug!(?stats, "replay finished");

    let deliveries = runtime.block_on(sink.flush());
    tracing::debug!(pending = deliveries.len(), "waited for outstanding deliveries");
    Ok(())
}

/// Feeds every line of `reader` to the dispatcher.
///
/// Blank lines are ignored and malformed lines are skipped with a warning.
pub fn replay<R, S, C>(reader: R, dispatcher: &mut Dispatcher<S, C>) -> Result<ReplayStats>
where
    R: BufRead,
    S: RecordSink,
    C: Clock,
{
    let mut stats = ReplayStats::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read host events")?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<HostSignal>(&line) {
            Ok(signal) => {
                apply(dispatcher, signal);
                stats.signals += 1;
            }
            Err(err) => {
                tracing::warn!(line = index + 1, error = %err, "skipping malformed host event");
                stats.skipped += 1;
            }
        }
    }
    Ok(stats)
}

fn apply<S: RecordSink, C: Clock>(dispatcher: &mut Dispatcher<S, C>, signal: HostSignal) {
    match signal {
        HostSignal::Event {
            name,
            attributes,
            json,
        } => dispatcher.dispatch(&name, &attributes, json),
        HostSignal::ShaderBatchStarted => dispatcher.shader_compile_started(),
        HostSignal::Tick { compiling } => dispatcher.tick(|| compiling),
    }
}
