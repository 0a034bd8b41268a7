use thiserror::Error;

/// Failures of the platform location service.
#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location service unavailable")]
    ServiceUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Location error: {0}")]
    Other(String),
}

/// Failures reported by the device message bridge.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Device disconnected")]
    Disconnected,

    #[error("Message rejected by device: {0}")]
    Rejected(String),

    #[error("Bridge IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Response is not valid JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl RelayError {
    /// A transport failure never produced a response; the cycle simply ends.
    pub fn is_transport(&self) -> bool {
        matches!(self, RelayError::ApiError(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(
            self,
            RelayError::ConfigError { .. }
                | RelayError::InvalidConfigValueError { .. }
                | RelayError::MissingConfigError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RelayError::Location(LocationError::PermissionDenied) => {
                "Location access was denied; no poem can be requested".to_string()
            }
            RelayError::Location(e) => format!("Could not determine the current position: {}", e),
            RelayError::ApiError(_) => "The poem server could not be reached".to_string(),
            RelayError::ParseError(_) => "The poem server returned an unreadable response".to_string(),
            RelayError::Send(e) => format!("Could not deliver the poem to the watch: {}", e),
            RelayError::IoError(e) => format!("IO failure: {}", e),
            RelayError::ConfigError { message } => format!("Configuration problem: {}", message),
            RelayError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            RelayError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_classified() {
        let err = RelayError::MissingConfigError {
            field: "location.latitude".to_string(),
        };
        assert!(err.is_config());
        assert!(!err.is_transport());
        assert_eq!(err.user_friendly_message(), "Setting 'location.latitude' is required");
    }

    #[test]
    fn test_location_error_converts() {
        let err: RelayError = LocationError::Timeout.into();
        assert!(matches!(err, RelayError::Location(LocationError::Timeout)));
        assert_eq!(err.to_string(), "Location error: Location request timed out");
    }

    #[test]
    fn test_parse_error_is_not_transport() {
        let parse = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: RelayError = parse.into();
        assert!(!err.is_transport());
        assert!(!err.is_config());
    }
}
