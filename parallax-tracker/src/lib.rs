//! # Parallax Tracker
//!
//! Receives eye positions from an external eye tracker over UDP and publishes
//! them to a shared [`parallax_core::EyeState`].
//!
//! ## Lifecycle
//!
//! ```text
//!   Idle ──start()──▶ Running ──stop() / drop──▶ Stopped
//!                        │
//!                        ├─ recv (bounded by read timeout)
//!                        ├─ parse ─ reject ─▶ count + warn, keep last value
//!                        ├─ publish both eyes at once
//!                        └─ socket fault ─▶ rebind with backoff
//! ```
//!
//! The receiver never terminates the process. Bind failures at startup are
//! returned to the caller; faults after that are logged, counted and retried.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod receiver;
pub mod retry;
pub mod stats;

pub use config::{TrackerConfig, DEFAULT_BUFFER_SIZE, DEFAULT_PORT};
pub use error::{TrackerError, TrackerResult};
pub use receiver::{EyeTrackingReceiver, ReceiverState};
pub use retry::RetryConfig;
pub use stats::{TrackerStats, TrackerStatsSnapshot};
