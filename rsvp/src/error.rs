//! Registration error taxonomy.
//!
//! [`RegistrationError`] is carried inside reducer actions, so it stays
//! `Clone + PartialEq` and keeps storage failures as plain strings.

use rsvp_runtime::StoreError;
use rsvp_web::AppError;
use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Coarse error class used to pick an HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced event does not exist
    NotFound,
    /// Caller input or business rule rejected the request
    Validation,
    /// Storage or runtime failure
    Internal,
}

/// Errors produced by catalog, ledger and registration operations.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    /// Event id does not match any event
    #[error("Event not found")]
    EventNotFound,

    /// Attendee already holds a registration for the event
    #[error("Attendee already registered for this event.")]
    DuplicateRegistration,

    /// Event has reached its capacity
    #[error("Event is already full.")]
    EventFull,

    /// A request field failed validation
    #[error("{message}")]
    InvalidInput {
        /// Offending field
        field: &'static str,
        /// User-facing message
        message: String,
    },

    /// Backing store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Registration pipeline did not answer
    #[error("Registration unavailable: {0}")]
    Unavailable(String),
}

impl RegistrationError {
    /// Build an [`RegistrationError::InvalidInput`].
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EventNotFound => ErrorKind::NotFound,
            Self::DuplicateRegistration | Self::EventFull | Self::InvalidInput { .. } => {
                ErrorKind::Validation
            },
            Self::Storage(_) | Self::Unavailable(_) => ErrorKind::Internal,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EventNotFound => "event_not_found",
            Self::DuplicateRegistration => "duplicate",
            Self::EventFull => "full",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Storage(_) => "storage",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<sqlx::Error> for RegistrationError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for RegistrationError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match &err {
            RegistrationError::EventNotFound => Self::not_found(err.to_string()),
            RegistrationError::DuplicateRegistration
            | RegistrationError::EventFull
            | RegistrationError::InvalidInput { .. } => Self::bad_request(err.to_string()),
            RegistrationError::Storage(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            },
            RegistrationError::Unavailable(_) => {
                Self::unavailable("Registration is temporarily unavailable")
                    .with_source(anyhow::Error::new(err))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn messages_match_api_contract() {
        assert_eq!(RegistrationError::EventNotFound.to_string(), "Event not found");
        assert_eq!(
            RegistrationError::DuplicateRegistration.to_string(),
            "Attendee already registered for this event."
        );
        assert_eq!(RegistrationError::EventFull.to_string(), "Event is already full.");
        assert_eq!(
            RegistrationError::invalid("email", "Enter a valid email address.").to_string(),
            "Enter a valid email address."
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(RegistrationError::EventNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(RegistrationError::EventFull.kind(), ErrorKind::Validation);
        assert_eq!(
            RegistrationError::Storage("boom".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn app_error_statuses() {
        let not_found = AppError::from(RegistrationError::EventNotFound);
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.message(), "Event not found");

        let full = AppError::from(RegistrationError::EventFull);
        assert_eq!(full.status(), StatusCode::BAD_REQUEST);

        let storage = AppError::from(RegistrationError::Storage("pool timed out".into()));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!storage.message().contains("pool"));

        let unavailable = AppError::from(RegistrationError::from(StoreError::Timeout));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
