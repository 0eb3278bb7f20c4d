//! External query invocation: the injectable backend capability and the
//! real vcgencmd implementation.
//!
//! The engine depends on [`QueryBackend`] rather than on `vcgencmd` itself
//! so cycle logic can be exercised deterministically with a mock backend.

use std::future::Future;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::Instant;

/// Program queried for power telemetry on Raspberry Pi OS.
pub const VCGENCMD: &str = "vcgencmd";

/// One of the four fixed hardware measurements taken per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerQuery {
    Temperature,
    Voltage,
    Clock,
    Throttle,
}

impl PowerQuery {
    /// Sub-command argv passed to the backend program.
    pub fn args(self) -> &'static [&'static str] {
        match self {
            Self::Temperature => &["measure_temp"],
            Self::Voltage => &["measure_volts"],
            Self::Clock => &["measure_clock", "arm"],
            Self::Throttle => &["get_throttled"],
        }
    }

    /// Human-readable measurement name for logs and errors.
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Voltage => "voltage",
            Self::Clock => "clock",
            Self::Throttle => "throttle",
        }
    }
}

/// The external command could not produce usable output.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The process could not be started at all.
    #[error("exec failed: {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited non-zero.
    #[error("exec failed: {command}: exit status {status}; output: {output:?}")]
    Exit {
        command: String,
        status: i32,
        output: String,
    },

    /// The shared cycle deadline expired with the process still running.
    /// The child is killed rather than left to finish in the background.
    #[error("exec timed out: {command}")]
    Timeout { command: String },
}

/// Raw result of one external query: whatever text was captured (possibly
/// partial on failure) plus the invocation status.
#[derive(Debug)]
pub struct QueryOutcome {
    /// Trimmed combined stdout and stderr.
    pub text: String,
    pub status: Result<(), InvokeError>,
}

/// Injectable capability: how the engine runs one hardware query.
pub trait QueryBackend: Send + Sync {
    /// Run one query, bounded by the shared cycle deadline. Never panics;
    /// all failure modes are reported through [`QueryOutcome::status`].
    fn invoke(
        &self,
        query: PowerQuery,
        deadline: Instant,
    ) -> impl Future<Output = QueryOutcome> + Send;

    /// Tag recorded in the `source` field of every reading.
    fn source(&self) -> &str;
}

/// Real backend that shells out to `vcgencmd`.
pub struct VcgencmdBackend {
    program: String,
}

impl VcgencmdBackend {
    pub fn new() -> Self {
        Self {
            program: VCGENCMD.to_string(),
        }
    }

    /// Use a different program binary. Tests point this at shell utilities.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Preflight check: is the backend program on PATH at all?
    ///
    /// A missing program is not fatal — every cycle will publish a reading
    /// carrying `last_error` — but it is worth a startup warning.
    pub fn is_available(&self) -> bool {
        command_exists(&self.program)
    }
}

impl Default for VcgencmdBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBackend for VcgencmdBackend {
    fn invoke(
        &self,
        query: PowerQuery,
        deadline: Instant,
    ) -> impl Future<Output = QueryOutcome> + Send {
        run_with_deadline(&self.program, query.args(), deadline)
    }

    fn source(&self) -> &str {
        &self.program
    }
}

/// Check if a command exists by running `which`.
pub fn command_exists(name: &str) -> bool {
    std::process::Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run a subprocess with a hard deadline, capturing combined stdout/stderr.
///
/// `kill_on_drop` terminates the child when the deadline expires, bounding
/// resource usage under repeated timeouts.
async fn run_with_deadline(program: &str, args: &[&str], deadline: Instant) -> QueryOutcome {
    let command = format!("{program} {}", args.join(" "));
    log::debug!("exec: {command}");

    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

    let output = match tokio::time::timeout_at(deadline, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            let err = InvokeError::Spawn { command, source };
            log::warn!("{err}");
            return QueryOutcome {
                text: String::new(),
                status: Err(err),
            };
        }
        Err(_) => {
            let err = InvokeError::Timeout { command };
            log::warn!("{err}");
            return QueryOutcome {
                text: String::new(),
                status: Err(err),
            };
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let text = text.trim().to_string();

    if !output.status.success() {
        let err = InvokeError::Exit {
            command,
            status: output.status.code().unwrap_or(-1),
            output: text.clone(),
        };
        log::warn!("{err}");
        return QueryOutcome {
            text,
            status: Err(err),
        };
    }

    log::debug!("exec ok: {command} -> {text:?}");
    QueryOutcome {
        text,
        status: Ok(()),
    }
}
