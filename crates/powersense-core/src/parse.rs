//! Line parsers for the vcgencmd micro-formats.
//!
//! Each vcgencmd sub-command prints a single line in its own undocumented
//! format. Isolating each format in its own total function with an explicit
//! failure mode keeps the failure surface auditable and lets the engine
//! attribute a failure to a specific measurement.

use thiserror::Error;

/// A query succeeded but its output did not match the expected micro-format.
///
/// Every variant embeds the raw input so the error string alone is enough
/// to diagnose a firmware format change from the logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("parse temp: expected temp=<n>'C, got {raw:?} (stripped {stripped:?})")]
    Temperature { raw: String, stripped: String },

    #[error("parse volts: expected volt=<n>V, got {raw:?} (stripped {stripped:?})")]
    Voltage { raw: String, stripped: String },

    #[error("parse clock: expected <label>=<hertz>, got {raw:?}")]
    Clock { raw: String },

    #[error("parse throttle bits: expected throttled=0x<hex>, got {raw:?}")]
    Throttle { raw: String },
}

/// Parse `measure_temp` output, e.g. `temp=53.2'C`.
///
/// Both the `temp=` prefix and the `'C` suffix must be present; the
/// remainder must be a decimal number.
pub fn parse_temp(raw: &str) -> Result<f64, ParseError> {
    let stripped = raw
        .strip_prefix("temp=")
        .and_then(|s| s.strip_suffix("'C"))
        .ok_or_else(|| ParseError::Temperature {
            raw: raw.to_string(),
            stripped: raw.to_string(),
        })?;
    stripped.parse::<f64>().map_err(|_| ParseError::Temperature {
        raw: raw.to_string(),
        stripped: stripped.to_string(),
    })
}

/// Parse `measure_volts` output, e.g. `volt=0.8625V`.
pub fn parse_volts(raw: &str) -> Result<f64, ParseError> {
    let stripped = raw
        .strip_prefix("volt=")
        .and_then(|s| s.strip_suffix('V'))
        .ok_or_else(|| ParseError::Voltage {
            raw: raw.to_string(),
            stripped: raw.to_string(),
        })?;
    stripped.parse::<f64>().map_err(|_| ParseError::Voltage {
        raw: raw.to_string(),
        stripped: stripped.to_string(),
    })
}

/// Parse `measure_clock` output, e.g. `frequency(48)=1500398464`.
///
/// The line must contain exactly one `=` with an integer hertz value on the
/// right. Returns megahertz rounded to one decimal, half away from zero.
pub fn parse_clock(raw: &str) -> Result<f64, ParseError> {
    let hz_str = match raw.split_once('=') {
        Some((_, rest)) if !rest.contains('=') => rest,
        _ => return Err(ParseError::Clock { raw: raw.to_string() }),
    };
    let hz: u64 = hz_str
        .parse()
        .map_err(|_| ParseError::Clock { raw: raw.to_string() })?;
    let mhz = hz as f64 / 1e6;
    Ok((mhz * 10.0).round() / 10.0)
}

/// Decoded throttle bitmask: the raw hex string plus the three
/// current-state bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleBits {
    /// Hex string as reported, minus any `throttled=` prefix.
    pub hex: String,
    /// Bit 0: currently under-voltage.
    pub undervoltage: bool,
    /// Bit 1: ARM frequency currently capped.
    pub freq_capped: bool,
    /// Bit 2: currently throttled.
    pub throttled: bool,
}

/// Parse `get_throttled` output, e.g. `throttled=0x50005` or `0x0`.
///
/// Only the low three current-state bits are decoded. The firmware also
/// sets "has occurred since boot" bits at positions 16+; those are
/// deliberately ignored here and left to callers that care about history,
/// which can read them out of `hex`.
pub fn parse_throttle_bits(raw: &str) -> Result<ThrottleBits, ParseError> {
    let hex = raw.strip_prefix("throttled=").unwrap_or(raw);
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    let value = u64::from_str_radix(digits, 16)
        .map_err(|_| ParseError::Throttle { raw: raw.to_string() })?;
    Ok(ThrottleBits {
        hex: hex.to_string(),
        undervoltage: value & (1 << 0) != 0,
        freq_capped: value & (1 << 1) != 0,
        throttled: value & (1 << 2) != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse_temp
    // -----------------------------------------------------------------------

    #[test]
    fn temp_typical() {
        assert_eq!(parse_temp("temp=53.2'C").unwrap(), 53.2);
    }

    #[test]
    fn temp_integer_body() {
        assert_eq!(parse_temp("temp=48'C").unwrap(), 48.0);
    }

    #[test]
    fn temp_missing_prefix_fails() {
        assert!(parse_temp("53.2'C").is_err());
    }

    #[test]
    fn temp_missing_suffix_fails() {
        assert!(parse_temp("temp=53.2").is_err());
    }

    #[test]
    fn temp_non_numeric_body_fails() {
        let err = parse_temp("temp=hot'C").unwrap_err();
        assert_eq!(
            err,
            ParseError::Temperature {
                raw: "temp=hot'C".to_string(),
                stripped: "hot".to_string(),
            }
        );
    }

    #[test]
    fn temp_empty_fails() {
        assert!(parse_temp("").is_err());
    }

    // -----------------------------------------------------------------------
    // parse_volts
    // -----------------------------------------------------------------------

    #[test]
    fn volts_typical() {
        assert_eq!(parse_volts("volt=0.8625V").unwrap(), 0.8625);
    }

    #[test]
    fn volts_missing_prefix_fails() {
        assert!(parse_volts("0.8625V").is_err());
    }

    #[test]
    fn volts_missing_suffix_fails() {
        assert!(parse_volts("volt=0.8625").is_err());
    }

    #[test]
    fn volts_non_numeric_body_fails() {
        assert!(parse_volts("volt=lowV").is_err());
    }

    // -----------------------------------------------------------------------
    // parse_clock
    // -----------------------------------------------------------------------

    #[test]
    fn clock_converts_hertz_to_rounded_megahertz() {
        assert_eq!(parse_clock("frequency(48)=1500398464").unwrap(), 1500.4);
    }

    #[test]
    fn clock_rounds_at_tenths_digit() {
        assert_eq!(parse_clock("frequency(48)=600050001").unwrap(), 600.1);
        assert_eq!(parse_clock("frequency(48)=600049999").unwrap(), 600.0);
    }

    #[test]
    fn clock_zero() {
        assert_eq!(parse_clock("frequency(48)=0").unwrap(), 0.0);
    }

    #[test]
    fn clock_no_separator_fails() {
        assert!(parse_clock("frequency(48) 1500398464").is_err());
    }

    #[test]
    fn clock_two_separators_fail() {
        assert!(parse_clock("frequency(48)=15=00").is_err());
    }

    #[test]
    fn clock_non_integer_rhs_fails() {
        assert!(parse_clock("frequency(48)=fast").is_err());
        assert!(parse_clock("frequency(48)=1.5e9").is_err());
    }

    // -----------------------------------------------------------------------
    // parse_throttle_bits
    // -----------------------------------------------------------------------

    #[test]
    fn throttle_all_clear() {
        let bits = parse_throttle_bits("throttled=0x0").unwrap();
        assert_eq!(bits.hex, "0x0");
        assert!(!bits.undervoltage);
        assert!(!bits.freq_capped);
        assert!(!bits.throttled);
    }

    #[test]
    fn throttle_bits_zero_and_two_set() {
        // 0x50005 = bits 0, 2, 16, 18. Only the current-state bits 0-2 are
        // decoded; the historical bits 16/18 stay in the hex string.
        let bits = parse_throttle_bits("throttled=0x50005").unwrap();
        assert_eq!(bits.hex, "0x50005");
        assert!(bits.undervoltage);
        assert!(!bits.freq_capped);
        assert!(bits.throttled);
    }

    #[test]
    fn throttle_all_current_bits_set() {
        let bits = parse_throttle_bits("throttled=0x7").unwrap();
        assert!(bits.undervoltage && bits.freq_capped && bits.throttled);
    }

    #[test]
    fn throttle_prefixes_are_optional() {
        assert_eq!(
            parse_throttle_bits("0x50005").unwrap(),
            parse_throttle_bits("throttled=0x50005").unwrap()
        );
        // Bare hex digits parse too; the hex field keeps what was reported.
        let bits = parse_throttle_bits("50005").unwrap();
        assert_eq!(bits.hex, "50005");
        assert!(bits.undervoltage);
    }

    #[test]
    fn throttle_non_hex_fails() {
        assert!(parse_throttle_bits("throttled=0xZZ").is_err());
        assert!(parse_throttle_bits("").is_err());
    }

    #[test]
    fn throttle_historical_bits_alone_decode_clear() {
        // Under-voltage has occurred (bit 16) but is not current.
        let bits = parse_throttle_bits("throttled=0x10000").unwrap();
        assert!(!bits.undervoltage);
        assert!(!bits.freq_capped);
        assert!(!bits.throttled);
    }
}
