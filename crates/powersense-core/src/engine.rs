//! The poll-and-cache engine: dispatch → collect → parse → publish.
//!
//! One cycle issues the four hardware queries under a single shared
//! deadline, feeds each raw line to its parser, and publishes the result —
//! successful or not — so a failing backend becomes immediately visible to
//! readers instead of silently preserving stale good data.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cache::StatusCache;
use crate::duration::format_duration;
use crate::invoke::{PowerQuery, QueryBackend};
use crate::parse;
use crate::reading::Reading;

/// Run one full measurement cycle and return its reading.
///
/// All four queries are dispatched concurrently against one deadline
/// computed at cycle start, so the whole cycle is bounded by `timeout`.
/// A query still running at the deadline is killed and reported as timed
/// out.
///
/// Failure handling is fail-fast with no retries — the next scheduled tick
/// is the retry:
/// - first invocation failure (checked temperature, voltage, throttle,
///   clock) short-circuits with all captured raw output retained;
/// - otherwise the first parse failure (temperature → voltage → clock →
///   throttle) short-circuits, leaving later measurements unparsed.
pub async fn poll_once<B: QueryBackend>(backend: &B, timeout: Duration) -> Reading {
    let started = std::time::Instant::now();
    let deadline = Instant::now() + timeout;

    let (temp, volts, throttle, clock) = tokio::join!(
        backend.invoke(PowerQuery::Temperature, deadline),
        backend.invoke(PowerQuery::Voltage, deadline),
        backend.invoke(PowerQuery::Throttle, deadline),
        backend.invoke(PowerQuery::Clock, deadline),
    );

    let mut reading = Reading::blank(Utc::now(), backend.source());
    reading.raw_temp = temp.text.clone();
    reading.raw_volts = volts.text.clone();
    reading.raw_throttle = throttle.text.clone();
    reading.raw_clock = clock.text.clone();

    // Fixed check order keeps last_error deterministic when several
    // queries fail in the same cycle.
    let first_err = [&temp.status, &volts.status, &throttle.status, &clock.status]
        .into_iter()
        .find_map(|status| status.as_ref().err());
    if let Some(err) = first_err {
        return fail(reading, started, err);
    }

    let temp_c = match parse::parse_temp(&temp.text) {
        Ok(v) => v,
        Err(err) => return fail(reading, started, &err),
    };
    let volt_v = match parse::parse_volts(&volts.text) {
        Ok(v) => v,
        Err(err) => return fail(reading, started, &err),
    };
    let clock_arm_mhz = match parse::parse_clock(&clock.text) {
        Ok(v) => v,
        Err(err) => return fail(reading, started, &err),
    };
    let bits = match parse::parse_throttle_bits(&throttle.text) {
        Ok(v) => v,
        Err(err) => return fail(reading, started, &err),
    };

    reading.temp_c = temp_c;
    reading.volt_v = volt_v;
    reading.clock_arm_mhz = clock_arm_mhz;
    reading.throttle_hex = bits.hex;
    reading.undervoltage = bits.undervoltage;
    reading.freq_capped = bits.freq_capped;
    reading.throttled = bits.throttled;
    reading.last_poll_latency = format_duration(started.elapsed());
    reading
}

/// Stamp a partial reading with the cycle failure. Numeric fields stay at
/// their zero values; whatever raw output was captured is kept.
fn fail(mut reading: Reading, started: std::time::Instant, err: &impl std::fmt::Display) -> Reading {
    reading.last_poll_latency = format_duration(started.elapsed());
    reading.last_error = Some(err.to_string());
    reading.last_error_at = Some(Utc::now());
    reading
}

/// Drive the engine on a fixed cadence, publishing every cycle's reading.
///
/// Ticks are independent of reader traffic and of prior-cycle duration; a
/// cycle that overruns the interval causes the missed tick to be skipped
/// rather than burst-fired. Runs until the task is dropped.
pub async fn run_poll_loop<B: QueryBackend>(
    backend: B,
    cache: Arc<StatusCache>,
    poll_interval: Duration,
    poll_timeout: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let reading = poll_once(&backend, poll_timeout).await;
        match &reading.last_error {
            Some(err) => log::warn!("poll error: {err}"),
            None => log::debug!(
                "polled: temp={:.2}C volt={:.4}V arm={:.1}MHz uv={} thr={} fc={}",
                reading.temp_c,
                reading.volt_v,
                reading.clock_arm_mhz,
                reading.undervoltage,
                reading.throttled,
                reading.freq_capped
            ),
        }
        cache.publish(reading);
    }
}
