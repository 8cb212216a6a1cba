//! `weekcast` library crate.
//!
//! The binary (`weekcast`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the HTTP server and console report share one engine
//! - code stays easy to navigate as the project grows

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod report;
pub mod server;
pub mod service;
