//! Error types for tdv-core.

use thiserror::Error;

/// Result type alias using tdv-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for orchestration operations.
///
/// Every variant except `Io`/`Config`/`Serialization` maps to one step of
/// the start sequence; the first failure aborts the whole sequence.
/// Dependency-service trouble is deliberately not represented here -- it
/// downgrades to a warning (see `compose::DependencyServiceStatus`).
#[derive(Error, Debug)]
pub enum Error {
    // Prerequisite errors
    #[error("Required tool not found: {tool}. Install it and re-run `tdv start`.")]
    MissingTool { tool: String },

    // Environment provisioning errors
    #[error("Virtualenv provisioning failed: {0}")]
    Provision(String),

    #[error("Dependency install failed: {0}")]
    DependencyInstall(String),

    // Config seeding errors
    #[error("Config seeding failed: {0}")]
    ConfigSeed(String),

    // Managed process errors
    #[error("Failed to spawn {name}: {reason}")]
    Spawn { name: String, reason: String },

    #[error("Health check failed for {service} at {url}: {reason}")]
    HealthCheck {
        service: String,
        url: String,
        reason: String,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_message() {
        let err = Error::MissingTool {
            tool: "python3".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("python3"));
        assert!(msg.contains("tdv start"));
    }

    #[test]
    fn test_health_check_message() {
        let err = Error::HealthCheck {
            service: "backend".to_string(),
            url: "http://localhost:8000/health".to_string(),
            reason: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("backend"));
        assert!(msg.contains("http://localhost:8000/health"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json");
        let err: Error = bad.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
