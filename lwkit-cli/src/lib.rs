//! lw command line client library exports.

pub mod cli;
pub mod commands;
pub mod error;
pub mod format;
pub mod launcher;
pub mod query;
pub mod save_arg;
pub mod telemetry;
pub mod title;
