use powersense_core::{VcgencmdBackend, poll_once};

pub fn run(poll_timeout: &str, pretty: bool, debug: bool) {
    super::init_logging(debug);
    let poll_timeout = super::parse_duration_or_exit(poll_timeout);

    let backend = VcgencmdBackend::new();
    if !backend.is_available() {
        log::warn!("vcgencmd not found in PATH");
    }

    let rt = tokio::runtime::Runtime::new().unwrap();
    let reading = rt.block_on(poll_once(&backend, poll_timeout));

    let json = if pretty {
        serde_json::to_string_pretty(&reading)
    } else {
        serde_json::to_string(&reading)
    }
    .unwrap();
    println!("{json}");

    if !reading.is_ok() {
        std::process::exit(1);
    }
}
