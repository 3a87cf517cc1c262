//! Review workflow for completed bookings.

use crate::error::{DashboardError, Result};
use marketplace_api::{BookingId, CreateReviewRequest, CustomerId, MarketplaceApi, Review};

/// Comment stored when the customer leaves the comment blank
pub const REVIEW_PLACEHOLDER: &str = "No comment provided.";

/// Lowest accepted rating
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating
pub const MAX_RATING: u8 = 5;

/// Check a rating is between 1 and 5
///
/// # Errors
///
/// `DashboardError::Validation` when missing or out of range.
pub fn validate_rating(rating: Option<u8>) -> Result<u8> {
    match rating {
        Some(rating) if (MIN_RATING..=MAX_RATING).contains(&rating) => Ok(rating),
        Some(rating) => Err(DashboardError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        ))),
        None => Err(DashboardError::Validation("Choose a rating".to_string())),
    }
}

/// Trimmed comment, or [`REVIEW_PLACEHOLDER`] when blank
#[must_use]
pub fn normalize_comment(comment: &str) -> String {
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        REVIEW_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Submit a review for a booking
///
/// Rating aggregates are not touched here; they refresh on the next full load.
///
/// # Errors
///
/// - `DashboardError::Validation` for an out-of-range rating (no request is made)
/// - `DashboardError::Request` when the server rejects the review
pub async fn submit_review(
    api: &dyn MarketplaceApi,
    customer_id: CustomerId,
    booking_id: BookingId,
    rating: Option<u8>,
    comment: &str,
) -> Result<Review> {
    let rating = validate_rating(rating)?;
    let request = CreateReviewRequest {
        customer_id,
        booking_id,
        rating,
        comment: normalize_comment(comment),
    };

    let review = api
        .create_review(request)
        .await
        .map_err(DashboardError::Request)?;

    tracing::info!(%booking_id, rating, "Review submitted");
    Ok(review)
}

/// Review form input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewDraft {
    /// Reviewed booking
    pub booking_id: BookingId,
    /// Chosen rating
    pub rating: Option<u8>,
    /// Comment as typed
    pub comment: String,
}

/// Review form state
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ReviewPhase {
    /// Form closed
    #[default]
    Closed,
    /// Collecting input
    Editing,
    /// Request in flight
    Submitting,
    /// Request failed; input kept
    Failed {
        /// Why it failed
        error: DashboardError,
    },
}

/// Review form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReviewForm {
    /// Input, present while the form is open
    pub draft: Option<ReviewDraft>,
    /// Where the form is in the flow
    pub phase: ReviewPhase,
    /// Inline error
    pub inline_error: Option<String>,
}

impl ReviewForm {
    /// Open the form for a booking
    #[must_use]
    pub const fn open(booking_id: BookingId) -> Self {
        Self {
            draft: Some(ReviewDraft {
                booking_id,
                rating: None,
                comment: String::new(),
            }),
            phase: ReviewPhase::Editing,
            inline_error: None,
        }
    }

    /// Whether the user can still change input
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self.phase, ReviewPhase::Editing | ReviewPhase::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_comment_uses_placeholder() {
        assert_eq!(normalize_comment(""), REVIEW_PLACEHOLDER);
        assert_eq!(normalize_comment("   \n"), REVIEW_PLACEHOLDER);
        assert_eq!(normalize_comment(" Lovely job "), "Lovely job");
    }

    #[test]
    fn test_rating_bounds() {
        assert_eq!(validate_rating(Some(1)), Ok(1));
        assert_eq!(validate_rating(Some(5)), Ok(5));
        assert!(validate_rating(Some(0)).is_err());
        assert!(validate_rating(Some(6)).is_err());
        assert!(validate_rating(None).is_err());
    }

    #[test]
    fn test_form_editable_until_submitted() {
        let mut form = ReviewForm::open(BookingId(3));
        assert!(form.is_editable());

        form.phase = ReviewPhase::Submitting;
        assert!(!form.is_editable());
    }
}
