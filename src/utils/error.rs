use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl EnrichError {
    /// 給使用者的修正建議
    pub fn recovery_suggestion(&self) -> String {
        match self {
            EnrichError::IoError(_) => "Check that the file exists and is readable".to_string(),
            EnrichError::HttpClientError(_) => {
                "Check TLS support and the HTTP client settings".to_string()
            }
            EnrichError::ConfigError { .. } => "Check the TOML syntax of the config file".to_string(),
            EnrichError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the config file", field)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;

/// Failure raised by a single enrichment service invocation.
///
/// Only the `Display` text of this error leaves the orchestrator; it becomes
/// the `error` field of the service's outcome.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{message}")]
    Upstream { message: String },

    #[error("{message}")]
    NoData { message: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Failed { message: String },
}

impl ServiceError {
    pub fn failed(message: impl Into<String>) -> Self {
        ServiceError::Failed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display_is_bare_message() {
        let err = ServiceError::Upstream {
            message: "Overpass API error: Too Many Requests".to_string(),
        };
        assert_eq!(err.to_string(), "Overpass API error: Too Many Requests");
        assert_eq!(ServiceError::failed("boom").to_string(), "boom");
    }

    #[test]
    fn test_io_error_converts_with_suggestion() {
        let err: EnrichError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "enrich.toml").into();
        assert!(matches!(err, EnrichError::IoError(_)));
        assert_eq!(
            err.recovery_suggestion(),
            "Check that the file exists and is readable"
        );
    }

    #[test]
    fn test_recovery_suggestion_names_field() {
        let err = EnrichError::InvalidConfigValueError {
            field: "orchestrator.concurrency".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert!(err.recovery_suggestion().contains("orchestrator.concurrency"));
        assert_eq!(
            err.to_string(),
            "Invalid value '0' for orchestrator.concurrency: Value must be at least 1"
        );
    }
}
