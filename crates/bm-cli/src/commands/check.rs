//! Check command for validating the backend configuration.

use std::io::Write;

use anyhow::{Context, Result};
use bm_core::{LineEncoder, TagContext};

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, tags: &TagContext) -> Result<()> {
    let influx = &config.influx;

    writeln!(writer, "Backend: InfluxDB {}", influx.version)?;
    writeln!(
        writer,
        "Logging: {}",
        if influx.enable_logging { "enabled" } else { "disabled" }
    )?;

    let endpoint = influx
        .endpoint()
        .context("backend configuration is incomplete")?;
    writeln!(writer, "Endpoint: {}", endpoint.redacted_url())?;
    if endpoint.authorization().is_some() {
        writeln!(writer, "Authorization: token")?;
    }

    let user = match tags.username() {
        Some(username) if influx.log_user => username,
        _ => "N/A",
    };
    writeln!(writer, "User: {user}")?;
    writeln!(writer, "Tags: {}", LineEncoder::new(tags).tag_string())?;

    Ok(())
}
