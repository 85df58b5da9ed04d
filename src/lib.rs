//! Persistence layer for the HexStrike security assessment platform.
//!
//! The [`db::Database`] handle owns a single SQLite connection and exposes a
//! typed settings store plus lifecycle management for projects, targets,
//! scans, vulnerabilities, tool/agent configuration and the audit trail.

pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;

pub use db::Database;
pub use errors::HexstrikeError;
