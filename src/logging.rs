//! Logging configuration for named-injector
//!
//! Every event of this crate is emitted under the `named_injector`
//! target: registrations and boot at `DEBUG`, cache misses and
//! resolutions at `TRACE`.
//!
//! # Features
//!
//! - `logging` - Emit tracing events (default)
//! - `logging-json` - Install a JSON subscriber (recommended for production)
//! - `logging-pretty` - Install a colorful subscriber (recommended for development)
//!
//! # Example
//!
//! ```rust,ignore
//! use named_injector::logging;
//!
//! // Initialize with default settings (JSON if logging-json, pretty if logging-pretty)
//! logging::init();
//!
//! // Or use builder for custom configuration
//! logging::builder()
//!     .trace()
//!     .injector_only()
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Target of every event emitted by this crate
pub const TARGET: &str = "named_injector";

/// Logging format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Pretty multi-line output
    Pretty,
    /// Compact single-line output
    #[default]
    Compact,
}

/// Builder for the tracing subscriber
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    from_env: bool,
    with_file: bool,
    with_line_number: bool,
    with_thread_names: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: if cfg!(feature = "logging-json") {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            target: None,
            from_env: false,
            with_file: false,
            with_line_number: false,
            with_thread_names: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a new logging builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum log level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Show resolutions and cache misses
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Show registrations and boot
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Show warnings only
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show events of this crate
    pub fn injector_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Let `RUST_LOG` override the configured filter when it is set
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Include file names and line numbers in log output
    pub fn with_location(mut self) -> Self {
        self.with_file = true;
        self.with_line_number = true;
        self
    }

    /// Include thread names in log output
    pub fn with_thread_names(mut self) -> Self {
        self.with_thread_names = true;
        self
    }

    /// Use JSON structured logging format
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty logging format
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line logging format
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// The filter directive this builder installs, e.g. `named_injector=trace`.
    pub fn directive(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber as the global default.
    ///
    /// Does nothing if a global subscriber is already set, beyond a
    /// `DEBUG` event. Requires `logging-json` or `logging-pretty` to have
    /// any effect.
    pub fn init(self) {
        #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
        {
            if let Err(error) = self.try_init() {
                tracing::debug!(
                    target: TARGET,
                    error = %error,
                    "Logging already initialized, keeping existing subscriber"
                );
            }
        }
    }

    /// Install the subscriber, failing if one is already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn try_init(self) -> Result<(), tracing_subscriber::util::TryInitError> {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

        let filter = if self.from_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()))
        } else {
            EnvFilter::new(self.directive())
        };

        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_names(self.with_thread_names)
            .with_target(true);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => layer.json().boxed(),
            // Without the json formatter, fall back to pretty
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => layer.pretty().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings
///
/// Uses JSON format if `logging-json` is enabled, pretty output otherwise.
/// `RUST_LOG` takes precedence when set.
pub fn init() {
    builder().from_env().init();
}

/// Initialize logging for this crate only, at `TRACE`
///
/// # Example output
/// ```text
///   2024-01-01T00:00:00.000Z TRACE named_injector: Resolving dependency, name: "db", cached: false
/// ```
pub fn init_injector_only() {
    builder().trace().injector_only().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert!(builder.target.is_none());
        assert!(!builder.from_env);
        assert_eq!(builder.directive(), "debug");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .compact()
            .with_location()
            .injector_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Compact);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert_eq!(builder.directive(), "named_injector=trace");
    }

    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    #[test]
    fn test_second_init_is_reported_not_fatal() {
        builder().init();

        assert!(builder().compact().try_init().is_err());
        // Logged at debug, no panic
        builder().compact().init();
    }
}
