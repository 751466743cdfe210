//! Shared plumbing for the Spool crates.
//!
//! Only logging lives here for now: every binary and integration test calls
//! [`observability::init_logging`] once so events land in the same rolling
//! file sink regardless of which crate emitted them.
//!
//! ```rust
//! use spool_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: "json".parse().unwrap(),
//!     ..LogConfig::default()
//! };
//! assert!(matches!(cfg.format, LogFormat::Json));
//! assert_eq!(cfg.app_name, "spool");
//! ```
pub mod observability;
