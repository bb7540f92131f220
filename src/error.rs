//! Error types and handling for `PlaceFinder`

use thiserror::Error;

use crate::orchestrator::FALLBACK_DEPENDENCY;

/// Main error type for the `PlaceFinder` library
#[derive(Error, Debug)]
pub enum PlaceFinderError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A primary or fallback place source failed
    #[error("{dependency} source failed: {message}")]
    Dependency { dependency: String, message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The cache backend could not be opened or used
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl PlaceFinderError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new dependency failure for the named source
    pub fn dependency<D: Into<String>, S: Into<String>>(dependency: D, message: S) -> Self {
        Self::Dependency {
            dependency: dependency.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// True for failures of an outbound place source.
    #[must_use]
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, Self::Dependency { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlaceFinderError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            PlaceFinderError::Dependency {
                dependency,
                message,
            } if dependency == FALLBACK_DEPENDENCY => format!("Fallback API failed: {message}"),
            PlaceFinderError::Dependency { message, .. } => {
                format!("Failed to fetch places: {message}")
            }
            PlaceFinderError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            PlaceFinderError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = PlaceFinderError::config("missing API key");
        assert!(matches!(config_err, PlaceFinderError::Config { .. }));

        let dep_err = PlaceFinderError::dependency("primary", "connection failed");
        assert!(dep_err.is_dependency_failure());

        let validation_err = PlaceFinderError::validation("invalid coordinates");
        assert!(matches!(validation_err, PlaceFinderError::Validation { .. }));
        assert!(!validation_err.is_dependency_failure());
    }

    #[test]
    fn test_user_messages() {
        let config_err = PlaceFinderError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let dep_err = PlaceFinderError::dependency("primary", "HTTP 503");
        assert_eq!(dep_err.user_message(), "Failed to fetch places: HTTP 503");
        assert_eq!(dep_err.to_string(), "primary source failed: HTTP 503");

        let validation_err = PlaceFinderError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_fallback_failure_message() {
        let err = PlaceFinderError::dependency(FALLBACK_DEPENDENCY, "HTTP 504");
        assert_eq!(err.user_message(), "Fallback API failed: HTTP 504");
    }

    #[test]
    fn test_cache_error() {
        let err = PlaceFinderError::cache("lock held by another process");
        assert!(!err.is_dependency_failure());
        assert_eq!(err.to_string(), "Cache error: lock held by another process");
        assert!(err.user_message().contains("clear your cache"));
    }
}
