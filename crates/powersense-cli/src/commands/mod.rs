pub mod poll;
pub mod serve;

use std::time::Duration;

/// Initialize env_logger. `--debug` or `LOG_LEVEL=DEBUG` raises the
/// default filter to debug; `RUST_LOG` still overrides everything.
pub(crate) fn init_logging(debug: bool) {
    let debug = debug
        || std::env::var("LOG_LEVEL").is_ok_and(|v| v.eq_ignore_ascii_case("debug"));
    let default = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
    if debug {
        log::debug!("debug logging enabled");
    }
}

pub(crate) fn parse_duration_or_exit(s: &str) -> Duration {
    powersense_core::parse_duration(s).unwrap_or_else(|err| {
        eprintln!("{err}");
        std::process::exit(1);
    })
}
