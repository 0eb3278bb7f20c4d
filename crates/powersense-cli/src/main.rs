//! powersense — power telemetry agent for Raspberry Pi class devices.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "powersense")]
#[command(about = "Poll vcgencmd power telemetry and serve the latest reading over HTTP")]
#[command(version = powersense_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling agent and HTTP status server
    Serve {
        /// HTTP listen address
        #[arg(long, default_value = "0.0.0.0:8085")]
        listen: String,

        /// Hardware poll interval (e.g. "5s", "500ms")
        #[arg(long, default_value = "5s")]
        poll_interval: String,

        /// Shared deadline for the four hardware queries of one cycle
        #[arg(long, default_value = "800ms")]
        poll_timeout: String,

        /// Enable verbose debug logging (or set LOG_LEVEL=DEBUG)
        #[arg(long)]
        debug: bool,
    },

    /// Run one poll cycle and print the reading as JSON
    Poll {
        /// Shared deadline for the four hardware queries
        #[arg(long, default_value = "800ms")]
        poll_timeout: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Enable verbose debug logging (or set LOG_LEVEL=DEBUG)
        #[arg(long)]
        debug: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            poll_interval,
            poll_timeout,
            debug,
        } => commands::serve::run(&listen, &poll_interval, &poll_timeout, debug),
        Commands::Poll {
            poll_timeout,
            pretty,
            debug,
        } => commands::poll::run(&poll_timeout, pretty, debug),
    }
}
