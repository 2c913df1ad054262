//! # Observability
//!
//! The pipeline reports through `tracing` events only; this module installs
//! the subscriber that turns them into log output.
//!
//! ```text
//! LpgmCalculator ── tracing::info!/warn!/debug! ──▶ registry
//!                                                   ├─ EnvFilter (RUST_LOG / LogConfig)
//!                                                   └─ fmt layer (json | pretty | compact)
//!                                                        └─ stdout or log file
//! ```
//!
//! Nothing is logged on the steady per-sample path; events mark
//! construction, reference capture, class transitions and rejected samples.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
