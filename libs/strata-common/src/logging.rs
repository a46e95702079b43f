//! Logging initialisation for services embedding Strata
//!
//! Installs a global `tracing` subscriber with either the bracketed-level
//! text format or JSON lines. `RUST_LOG` overrides the configured level.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::error::{CommonError, Result};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Custom event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-01-01T00:00:00.000000Z [INFO] Rule evaluated`
pub struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Output encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info,strata_rules=debug`
    pub level: String,
    pub format: LogFormat,
    /// Colour the level tag in text output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            ansi: true,
        }
    }
}

static INITIALIZED: OnceLock<()> = OnceLock::new();

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directive = std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());
    EnvFilter::try_new(&directive)
        .map_err(|e| CommonError::Logging(format!("invalid filter '{}': {}", directive, e)))
}

/// Install the global subscriber
///
/// # Returns
/// * `Ok(true)` - Subscriber installed by this call
/// * `Ok(false)` - A subscriber was already installed; nothing changed
/// * `Err(CommonError::Logging)` - The filter directive is invalid
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    if INITIALIZED.get().is_some() {
        return Ok(false);
    }

    let filter = build_filter(config)?;

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_level(true)
            .with_target(true)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_ansi(config.ansi)
            .event_format(BracketedLevelFormat)
            .boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .is_ok();

    let _ = INITIALIZED.set(());
    if installed {
        tracing::debug!(level = %config.level, format = ?config.format, "Logging initialised");
    }
    Ok(installed)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_bracketed_format() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .event_format(BracketedLevelFormat)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(rule = "zone-temp", "Series stale");
        });

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let (timestamp, rest) = output.split_once(' ').unwrap();
        assert!(timestamp.ends_with('Z'));
        assert_eq!(timestamp.len(), "2025-01-01T00:00:00.000000Z".len());
        assert!(rest.starts_with("[WARN] Series stale"));
        assert!(rest.contains("rule=\"zone-temp\""));
    }

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "info,strata=verbose".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(build_filter(&config), Err(CommonError::Logging(_))));
    }

    #[test]
    fn test_init_twice_is_not_an_error() {
        let config = LoggingConfig {
            ansi: false,
            ..LoggingConfig::default()
        };
        init_logging(&config).unwrap();
        assert!(!init_logging(&config).unwrap());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: LoggingConfig = serde_json::from_str(r#"{ "format": "json" }"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(config.ansi);
    }
}
