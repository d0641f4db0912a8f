//! Unified error type for the barbershop core.
//!
//! Business failures are split into three kinds that callers map to
//! distinct responses: [`Error::NotFound`], [`Error::Validation`] and
//! [`Error::Conflict`]. Everything else is infrastructure.

use thiserror::Error;

/// Errors produced by the core operations, configuration and storage layers.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced entity does not exist (or is not usable, e.g. an inactive barber)
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// Identifier that failed to resolve
        id: i64,
    },

    /// Malformed input
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Operation blocked by existing dependent state
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable reason
        message: String,
    },

    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Storage layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Output serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    #[must_use]
    pub const fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::not_found("Barber", 7).to_string(),
            "Barber not found: 7"
        );
        assert_eq!(
            Error::conflict("3 live subscriptions").to_string(),
            "Conflict: 3 live subscriptions"
        );
        assert_eq!(
            Error::validation("bad").to_string(),
            "Validation error: bad"
        );
    }
}
