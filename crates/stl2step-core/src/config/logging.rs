//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Subscriber output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human output.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Diagnostic logging, written to stderr.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"warn"` or
    /// `"stl2step_freecad=debug,info"`.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}
