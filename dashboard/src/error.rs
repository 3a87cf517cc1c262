//! Dashboard error types.

use crate::identity::Role;
use marketplace_api::{ApiError, BookingId, BookingStatus};
use thiserror::Error;

/// Result alias used across the dashboard
pub type Result<T> = std::result::Result<T, DashboardError>;

/// How an error is surfaced to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Blocks the screen: page-level error with a retry control
    Fatal,
    /// Per-record or per-section; the screen still renders
    Degraded,
    /// A user action failed; toast, form stays open
    Recoverable,
}

/// Errors produced by the orchestration layer
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    /// No account of the requested role exists for this email
    #[error("No {role} account found for {email}")]
    IdentityNotFound {
        /// Email that was looked up
        email: String,
        /// Role that was requested
        role: Role,
    },

    /// Identity lookup failed for a reason other than "not found"
    #[error("Could not resolve your account: {0}")]
    IdentityLookup(ApiError),

    /// The raw booking list could not be fetched
    #[error("Could not load bookings: {0}")]
    BookingsUnavailable(ApiError),

    /// Reviews could not be fetched; review flags default to false
    #[error("Reviews are temporarily unavailable: {0}")]
    ReviewsUnavailable(ApiError),

    /// The provider or its services could not be fetched
    #[error("Could not load services: {0}")]
    CatalogUnavailable(ApiError),

    /// An operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// The booking is not in the local collection
    #[error("Booking {0} is not on this dashboard")]
    UnknownBooking(BookingId),

    /// The requested status change breaks the booking lifecycle
    #[error("A {from} booking cannot become {to}")]
    InvalidTransition {
        /// Current status
        from: BookingStatus,
        /// Requested status
        to: BookingStatus,
    },

    /// User input was rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// A create/update request was rejected by the server or transport
    #[error("{}", .0.user_message())]
    Request(ApiError),
}

impl DashboardError {
    /// How this error should be surfaced
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::IdentityNotFound { .. }
            | Self::IdentityLookup(_)
            | Self::BookingsUnavailable(_)
            | Self::NotSignedIn => Severity::Fatal,
            Self::ReviewsUnavailable(_) | Self::CatalogUnavailable(_) => Severity::Degraded,
            Self::UnknownBooking(_)
            | Self::InvalidTransition { .. }
            | Self::Validation(_)
            | Self::Request(_) => Severity::Recoverable,
        }
    }

    /// Structured server error code, when the failure came from the API
    #[must_use]
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::IdentityLookup(error)
            | Self::BookingsUnavailable(error)
            | Self::ReviewsUnavailable(error)
            | Self::CatalogUnavailable(error)
            | Self::Request(error) => error.code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        let not_found = DashboardError::IdentityNotFound {
            email: "ada@example.com".to_string(),
            role: Role::Customer,
        };
        assert_eq!(not_found.severity(), Severity::Fatal);
        assert_eq!(
            DashboardError::ReviewsUnavailable(ApiError::Unauthorized).severity(),
            Severity::Degraded
        );
        assert_eq!(
            DashboardError::Validation("Pick a time".to_string()).severity(),
            Severity::Recoverable
        );
    }

    #[test]
    fn test_request_error_shows_server_message() {
        let error = DashboardError::Request(ApiError::Api {
            status: 409,
            code: Some("SLOT_TAKEN".to_string()),
            message: "That slot was just booked".to_string(),
        });

        assert_eq!(error.to_string(), "That slot was just booked");
        assert_eq!(error.api_code(), Some("SLOT_TAKEN"));
    }

    #[test]
    fn test_identity_not_found_message() {
        let error = DashboardError::IdentityNotFound {
            email: "bob@example.com".to_string(),
            role: Role::Provider,
        };
        assert_eq!(error.to_string(), "No provider account found for bob@example.com");
    }
}
