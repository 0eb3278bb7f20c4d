use std::sync::Arc;

use powersense_core::{StatusCache, VcgencmdBackend, poll_once, run_poll_loop};

pub fn run(listen: &str, poll_interval: &str, poll_timeout: &str, debug: bool) {
    super::init_logging(debug);
    let poll_interval = super::parse_duration_or_exit(poll_interval);
    let poll_timeout = super::parse_duration_or_exit(poll_timeout);

    let backend = VcgencmdBackend::new();
    if !backend.is_available() {
        log::warn!(
            "vcgencmd not found in PATH; every reading will carry last_error until it appears. \
             It ships with Raspberry Pi OS — in a container, mount it from the host or run the \
             agent on the host."
        );
    }

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        // Seed the cache with one synchronous cycle so the first HTTP
        // request never sees an empty slot. A failed initial poll is
        // published too: /power shows last_error instead of nothing.
        let initial = poll_once(&backend, poll_timeout).await;
        if let Some(err) = &initial.last_error {
            log::warn!("initial poll failed: {err}");
        }
        let cache = Arc::new(StatusCache::new(initial));

        tokio::spawn(run_poll_loop(
            backend,
            Arc::clone(&cache),
            poll_interval,
            poll_timeout,
        ));

        log::info!(
            "powersense v{} starting on {listen} (poll={poll_interval:?}, timeout={poll_timeout:?})",
            powersense_core::VERSION
        );
        if let Err(err) = powersense_server::run_server(cache, listen).await {
            log::error!("server error: {err}");
            std::process::exit(1);
        }
    });
}
