use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[observability.logging]`. `RUST_LOG` replaces `level` and `directives`
/// when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Off when the log collector stamps lines itself.
    pub timestamps: bool,
    /// Source file and line on every event.
    pub source_location: bool,
    /// Attach the active spans to JSON lines. The request span holds the
    /// correlation uuid.
    pub span_context: bool,
    /// Extra `EnvFilter` directives, e.g. `sqlx=info,tower_http=debug`.
    pub directives: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            timestamps: true,
            source_location: false,
            span_context: true,
            directives: None,
        }
    }
}

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is unset. Without extra directives the
    /// HTTP and database crates are held at `warn`.
    pub fn filter_directives(&self) -> String {
        let level = self.level.as_str();
        match &self.directives {
            Some(extra) => format!("{level},{extra}"),
            None => format!("{level},hyper=warn,h2=warn,tower=info,sqlx=warn"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Multi-line, for local runs.
    Pretty,
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}
