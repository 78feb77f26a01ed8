#![deny(unused_crate_dependencies)]

//! Logging setup shared by the deployer crates.
//!
//! The macros behave like `tracing::warn`, `tracing::info` and friends. The `warn` and
//! `error` macros additionally record the file, line and column of the call site.
//!
//! Logs are written to `stderr`: `stdout` is reserved for the deployment report.
//! The format is `plain` or `json` and is set by the `MISC_LOG_FORMAT` env variable.
//!
//! Errors can be forwarded to sentry by setting `MISC_SENTRY_URL`
//! <https://docs.sentry.io/platforms/rust/>

use std::{backtrace::Backtrace, borrow::Cow, str::FromStr};

use sentry::{types::Dsn, ClientInitGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use sentry as __sentry;
pub use tracing as __tracing;
pub use tracing::{debug, info, trace};

const LOG_FORMAT_VAR: &str = "MISC_LOG_FORMAT";
const SENTRY_URL_VAR: &str = "MISC_SENTRY_URL";
const SENTRY_ENVIRONMENT_VAR: &str = "MISC_SENTRY_ENVIRONMENT";

/// Logging setup errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `MISC_LOG_FORMAT` holds something other than `plain` or `json`.
    #[error("MISC_LOG_FORMAT has an unexpected value {0}")]
    UnknownLogFormat(String),

    /// A global subscriber has already been installed.
    #[error(transparent)]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Plain,
    /// One JSON object per line, with file and line numbers.
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(Error::UnknownLogFormat(other.to_string())),
        }
    }
}

impl LogFormat {
    /// Read the format from `MISC_LOG_FORMAT`, falling back to [`LogFormat::Plain`].
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var(LOG_FORMAT_VAR) {
            Ok(format) => format.parse(),
            Err(_) => Ok(Self::default()),
        }
    }
}

fn get_sentry_url() -> Option<Dsn> {
    std::env::var(SENTRY_URL_VAR)
        .ok()
        .and_then(|url| Dsn::from_str(url.as_str()).ok())
}

/// Logs an error with the location of the call site.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::__tracing::error!(
            file = file!(),
            line = line!(),
            column = column!(),
            $($arg)+
        )
    };
}

/// Logs a warning with the location of the call site.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__tracing::warn!(
            file = file!(),
            line = line!(),
            column = column!(),
            $($arg)+
        )
    };
}

/// Initialize logging with tracing and set up log format.
///
/// If the sentry URL is provided via an environment variable, this function will also
/// initialize sentry and return its client guard. The guard has to be kept alive for
/// events to be delivered:
/// <https://docs.sentry.io/platforms/rust/#configure>
pub fn init() -> Result<Option<ClientInitGuard>, Error> {
    match LogFormat::from_env()? {
        LogFormat::Plain => {
            tracing_subscriber::registry()
                .with(fmt::Layer::default().with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .try_init()?;
        }
        LogFormat::Json => {
            let timer = fmt::time::UtcTime::rfc_3339();
            // must be set before sentry hook for sentry to function
            install_pretty_panic_hook();

            tracing_subscriber::registry()
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_file(true)
                        .with_line_number(true)
                        .with_timer(timer)
                        .json(),
                )
                .with(EnvFilter::from_default_env())
                .try_init()?;
        }
    };

    Ok(get_sentry_url().map(|sentry_url| {
        let options = sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var(SENTRY_ENVIRONMENT_VAR).ok().map(Cow::from),
            attach_stacktrace: true,
            ..Default::default()
        };

        sentry::init((sentry_url, options))
    }))
}

/// Format panics like `tracing::error` in json mode.
fn install_pretty_panic_hook() {
    // Installed instead of chaining to the default hook, otherwise every panic is
    // printed twice.
    std::panic::set_hook(Box::new(move |panic_info| {
        let backtrace = Backtrace::capture();
        let timestamp = chrono::Utc::now();
        let panic_message = if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else {
            "Panic occurred without additional info"
        };

        let panic_location = panic_info
            .location()
            .map(|val| val.to_string())
            .unwrap_or_else(|| "Unknown location".to_owned());

        eprintln!(
            "{}",
            serde_json::json!({
                "timestamp": timestamp.format("%Y-%m-%dT%H:%M:%S%.fZ").to_string(),
                "level": "CRITICAL",
                "fields": {
                    "message": panic_message,
                    "location": panic_location,
                    "backtrace": backtrace.to_string(),
                }
            })
        );
    }));
}
