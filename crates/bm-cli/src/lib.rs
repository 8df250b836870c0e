//! Build metrics logger CLI library.
//!
//! This crate wires the tracker and publisher to a host event stream.

mod cli;
pub mod commands;
mod config;
pub mod host;

pub use cli::{Cli, Commands};
pub use config::{Config, HostOverrides};
