//! Error types for the errbrake client
//!
//! Configuration failures are the only errors a caller of the notifier ever
//! sees as `Err`; transport problems are folded into a `DeliveryResult` by the
//! client, but they are still modeled here so the client can categorize them.

use std::path::PathBuf;
use thiserror::Error;

/// Main library error type
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {field} {message}")]
    Configuration { field: String, message: String },

    #[error("Invalid collector endpoint: {url}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unknown configuration key: {key}")]
    UnknownConfigKey { key: String },

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidConfigValue {
        key: String,
        value: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Network and HTTP errors
    #[error("HTTP request failed: {method} {url}")]
    HttpRequest {
        method: String,
        url: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Network timeout after {timeout_ms} ms")]
    NetworkTimeout { timeout_ms: u64 },

    #[error("HTTP {status_code}: {reason}")]
    HttpStatus { status_code: u16, reason: String },

    #[error("HTTP client error: {message}")]
    HttpClient {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Sink errors
    #[error("Sink '{sink}' failed: {message}")]
    Sink {
        sink: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("No async runtime available for '{operation}'")]
    NoRuntime { operation: String },

    // I/O errors
    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Serialization errors
    #[error("JSON serialization error: {context}")]
    JsonSerialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("JSON deserialization error: {context}")]
    JsonDeserialization {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("TOML parsing error: {context}")]
    TomlParsing {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a Configuration error for a specific field
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Configuration error for a required field left empty
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::configuration(field, "must not be empty")
    }

    /// Create a Sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            sink: sink.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a Sink error with source
    pub fn sink_with_source(
        sink: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Sink {
            sink: sink.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new I/O error with source
    pub fn io_with_source(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Name of the offending field for configuration errors
    pub fn config_field(&self) -> Option<&str> {
        match self {
            Self::Configuration { field, .. } => Some(field),
            Self::InvalidEndpoint { .. } => Some("endpoint"),
            Self::UnknownConfigKey { key } | Self::InvalidConfigValue { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. }
            | Self::InvalidEndpoint { .. }
            | Self::UnknownConfigKey { .. }
            | Self::InvalidConfigValue { .. } => "config",
            Self::HttpRequest { .. }
            | Self::NetworkTimeout { .. }
            | Self::HttpStatus { .. }
            | Self::HttpClient { .. } => "network",
            Self::Sink { .. } | Self::NoRuntime { .. } => "sink",
            Self::Io { .. } => "io",
            Self::JsonSerialization { .. }
            | Self::JsonDeserialization { .. }
            | Self::TomlParsing { .. } => "serialization",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let operation = match err.kind() {
            std::io::ErrorKind::NotFound => "file not found",
            std::io::ErrorKind::PermissionDenied => "permission denied",
            std::io::ErrorKind::BrokenPipe => "broken pipe",
            std::io::ErrorKind::TimedOut => "timeout",
            _ => "I/O operation",
        }
        .to_string();

        Self::Io {
            path: PathBuf::from("unknown"),
            operation,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() {
            Self::JsonDeserialization {
                context: format!(
                    "JSON syntax error at line {} column {}",
                    err.line(),
                    err.column()
                ),
                source: Some(Box::new(err)),
            }
        } else if err.is_data() {
            Self::JsonDeserialization {
                context: "JSON data error".to_string(),
                source: Some(Box::new(err)),
            }
        } else if err.is_eof() {
            Self::JsonDeserialization {
                context: "Unexpected end of JSON input".to_string(),
                source: Some(Box::new(err)),
            }
        } else {
            Self::JsonSerialization {
                context: "JSON serialization error".to_string(),
                source: Some(Box::new(err)),
            }
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlParsing {
            context: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        Self::TomlParsing {
            context: format!("failed to serialize config: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        if err.is_timeout() {
            // reqwest does not expose the configured timeout here
            Self::NetworkTimeout { timeout_ms: 0 }
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                status_code: status.as_u16(),
                reason: err.to_string(),
            }
        } else if err.is_builder() {
            Self::HttpClient {
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        } else {
            Self::HttpRequest {
                method: "POST".to_string(),
                url,
                source: Some(Box::new(err)),
            }
        }
    }
}
