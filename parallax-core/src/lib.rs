//! # Parallax Core
//!
//! Shared data model for eye-tracked stereo rendering.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  datagram   ┌──────────────┐  snapshot  ┌───────────────────┐
//! │ Eye tracker      │ ──────────▶ │ protocol     │ ─────────▶ │ EyeState          │
//! │ (external, UDP)  │             │ parse_packet │  publish   │ Arc<RwLock<Pair>> │
//! └──────────────────┘             └──────────────┘            └─────────┬─────────┘
//!                                                                        │ snapshot()
//!                                                                        ▼
//!                                                              projection engine
//! ```
//!
//! This crate performs no I/O beyond reading configuration files.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod eye;
pub mod protocol;
pub mod state;

pub use config::{load_json, DisplayConfig};
pub use error::{ConfigError, ConfigResult, ProtocolError, ProtocolResult};
pub use eye::{Eye, EyePosition};
pub use protocol::{format_packet, parse_packet, EyePacket};
pub use state::{EyePair, EyeState};

/// Parallax core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
