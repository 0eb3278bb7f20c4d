//! # powersense-core
//!
//! Power telemetry for Raspberry Pi class devices.
//!
//! The core is a background poller that shells out to `vcgencmd`, parses its
//! four idiosyncratic one-line output formats into a structured [`Reading`],
//! and keeps the most recent reading behind a concurrency-safe [`StatusCache`]
//! so HTTP readers are answered with bounded latency even when a hardware
//! query hangs or returns garbage.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use powersense_core::{StatusCache, VcgencmdBackend, poll_once, run_poll_loop};
//!
//! # async fn demo() {
//! let backend = VcgencmdBackend::new();
//!
//! // One synchronous cycle seeds the cache so the first reader never
//! // sees an empty slot.
//! let initial = poll_once(&backend, Duration::from_millis(800)).await;
//! let cache = Arc::new(StatusCache::new(initial));
//!
//! // The loop publishes one reading per tick, successful or not.
//! tokio::spawn(run_poll_loop(
//!     backend,
//!     Arc::clone(&cache),
//!     Duration::from_secs(5),
//!     Duration::from_millis(800),
//! ));
//!
//! let latest = cache.snapshot();
//! println!("temp: {} C", latest.reading.temp_c);
//! # }
//! ```
//!
//! ## Architecture
//!
//! Timer tick → dispatch four queries under one shared deadline → parse each
//! raw line → publish the snapshot. Readers only ever clone the last
//! published snapshot out of the cache; they never trigger a query and never
//! wait on an in-flight cycle.

pub mod cache;
pub mod duration;
pub mod engine;
pub mod invoke;
pub mod parse;
pub mod reading;

pub use cache::{CachedReading, StatusCache};
pub use duration::{format_duration, parse_duration};
pub use engine::{poll_once, run_poll_loop};
pub use invoke::{
    InvokeError, PowerQuery, QueryBackend, QueryOutcome, VcgencmdBackend, command_exists,
};
pub use parse::{ParseError, ThrottleBits, parse_clock, parse_temp, parse_throttle_bits, parse_volts};
pub use reading::{DEGRADED_TEMP_LIMIT_C, Reading};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
