// Library module for watchfs
// Re-exports modules for use in integration tests and the binary

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod path_utils;
pub mod sync;
pub mod ui;

pub use error::{Result, WatchFsError};
