//! The structured measurement snapshot produced by one poll cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Temperature above which a reading counts as degraded even when no
/// throttle bit is set. The BCM SoCs soft-throttle at 80 °C; downstream
/// schedulers want to back off well before that.
pub const DEGRADED_TEMP_LIMIT_C: f64 = 70.0;

/// One power telemetry snapshot. Immutable once constructed.
///
/// A reading is either fully populated with `last_error` empty, or it
/// carries `last_error` and any subset of the measurement fields may be
/// zero-valued. Callers must treat a non-empty `last_error` as "do not
/// trust the numeric fields".
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    /// Completion time of the poll cycle that produced this reading.
    pub timestamp: DateTime<Utc>,
    /// SoC temperature in degrees Celsius.
    pub temp_c: f64,
    /// Core voltage in volts.
    pub volt_v: f64,
    /// ARM clock in megahertz, rounded to one decimal.
    pub clock_arm_mhz: f64,
    /// Throttle bitmask exactly as reported (e.g. `"0x50005"`).
    pub throttle_hex: String,
    /// Bit 0 of the bitmask: currently under-voltage.
    pub undervoltage: bool,
    /// Bit 1 of the bitmask: ARM frequency currently capped.
    pub freq_capped: bool,
    /// Bit 2 of the bitmask: currently throttled.
    pub throttled: bool,
    /// Which backend produced this reading (normally `"vcgencmd"`).
    pub source: String,
    /// Humanized duration of the poll cycle.
    pub last_poll_latency: String,

    // Raw command output, kept even on partial failure to aid diagnosis.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw_temp: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw_volts: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw_throttle: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw_clock: String,

    /// Set when any stage of the cycle failed; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_at: Option<DateTime<Utc>>,
}

impl Reading {
    /// An all-zero reading carrying only identity fields. The engine fills
    /// it in as the cycle progresses.
    pub fn blank(timestamp: DateTime<Utc>, source: &str) -> Self {
        Self {
            timestamp,
            temp_c: 0.0,
            volt_v: 0.0,
            clock_arm_mhz: 0.0,
            throttle_hex: String::new(),
            undervoltage: false,
            freq_capped: false,
            throttled: false,
            source: source.to_string(),
            last_poll_latency: String::new(),
            raw_temp: String::new(),
            raw_volts: String::new(),
            raw_throttle: String::new(),
            raw_clock: String::new(),
            last_error: None,
            last_error_at: None,
        }
    }

    /// Whether the cycle that produced this reading completed cleanly.
    pub fn is_ok(&self) -> bool {
        self.last_error.is_none()
    }

    /// Whether the device should be treated as degraded: any current
    /// throttle bit set, or temperature above `temp_limit_c`.
    pub fn degraded(&self, temp_limit_c: f64) -> bool {
        self.undervoltage || self.freq_capped || self.throttled || self.temp_c > temp_limit_c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Reading {
        let mut r = Reading::blank(Utc::now(), "vcgencmd");
        r.temp_c = 53.2;
        r.volt_v = 0.8625;
        r.clock_arm_mhz = 1500.4;
        r.throttle_hex = "0x0".to_string();
        r.last_poll_latency = "12.345ms".to_string();
        r
    }

    #[test]
    fn degraded_false_when_cool_and_unthrottled() {
        assert!(!sample().degraded(DEGRADED_TEMP_LIMIT_C));
    }

    #[test]
    fn degraded_on_any_throttle_bit() {
        let setters: [fn(&mut Reading); 3] = [
            |r| r.undervoltage = true,
            |r| r.freq_capped = true,
            |r| r.throttled = true,
        ];
        for set in setters {
            let mut r = sample();
            set(&mut r);
            assert!(r.degraded(DEGRADED_TEMP_LIMIT_C));
        }
    }

    #[test]
    fn degraded_on_high_temperature() {
        let mut r = sample();
        r.temp_c = 71.5;
        assert!(r.degraded(DEGRADED_TEMP_LIMIT_C));
        r.temp_c = 70.0; // limit itself is still fine
        assert!(!r.degraded(DEGRADED_TEMP_LIMIT_C));
    }

    #[test]
    fn serialization_omits_empty_optional_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("timestamp"));
        assert!(obj.contains_key("temp_c"));
        assert!(obj.contains_key("last_poll_latency"));
        assert!(!obj.contains_key("raw_temp"));
        assert!(!obj.contains_key("last_error"));
        assert!(!obj.contains_key("last_error_at"));
    }

    #[test]
    fn serialization_keeps_raw_fields_when_present() {
        let mut r = sample();
        r.raw_temp = "temp=53.2'C".to_string();
        r.last_error = Some("boom".to_string());
        r.last_error_at = Some(Utc::now());
        let json = serde_json::to_value(r).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["raw_temp"], "temp=53.2'C");
        assert_eq!(obj["last_error"], "boom");
        assert!(obj.contains_key("last_error_at"));
    }

    #[test]
    fn is_ok_tracks_last_error() {
        let mut r = sample();
        assert!(r.is_ok());
        r.last_error = Some("exec failed".to_string());
        assert!(!r.is_ok());
    }
}
