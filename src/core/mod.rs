//! Shared primitives: configuration, errors, the run journal, the local
//! database connection, table definitions and console helpers.

pub mod config;
pub mod db;
pub mod error;
pub mod journal;
pub mod logging;
pub mod output;
pub mod schemas;
pub mod time;
pub mod tui;
