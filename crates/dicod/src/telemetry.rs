//! Log subscriber setup for `dicod`.
//!
//! The filter comes from `log_filter`. When `transcript` is on, the
//! transcript target is raised to `debug` on top of that filter so protocol
//! lines show up without hand-editing the directive.

use std::io::{self, IsTerminal};

use dico::stream::TRANSCRIPT_TARGET;
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt;

use dico_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Proof that the global subscriber is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Subscriber setup failures.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A filter directive does not parse.
    #[error("invalid log filter '{directive}': {message}")]
    Filter {
        /// Offending directive.
        directive: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another subscriber already owns the process.
    #[error("cannot install the log subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber for `config`.
///
/// Only the first call has an effect; later calls return a handle without
/// looking at their configuration.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = server_filter(config)?;
    let ansi = io::stderr().is_terminal();
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn filter_error(directive: &str, error: &impl ToString) -> TelemetryError {
    TelemetryError::Filter {
        directive: directive.to_owned(),
        message: error.to_string(),
    }
}

/// Filter for `config`: `log_filter`, plus transcript lines at `debug` when
/// transcripts are enabled.
fn server_filter(config: &Config) -> Result<EnvFilter, TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|error| filter_error(&config.log_filter, &error))?;
    if !config.transcript {
        return Ok(filter);
    }
    let directive = format!("{TRANSCRIPT_TARGET}=debug");
    let transcript: Directive = directive
        .parse()
        .map_err(|error| filter_error(&directive, &error))?;
    Ok(filter.add_directive(transcript))
}
