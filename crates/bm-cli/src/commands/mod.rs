//! Command implementations for the `bm` CLI.

pub mod check;
pub mod watch;
