//! Review form for completed bookings.

use super::{Effects, in_session, notify};
use crate::actions::DashboardAction;
use crate::environment::DashboardEnvironment;
use crate::error::DashboardError;
use crate::identity::AccountIdentity;
use crate::notifications::ToastKind;
use crate::review::{ReviewForm, ReviewPhase, submit_review, validate_rating};
use crate::state::DashboardState;
use marketplace_api::{BookingId, BookingStatus};
use marketplace_core::{SmallVec, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Review reducer
///
/// Submitting a review marks the booking as reviewed locally; the average
/// rating is left alone until the next full load.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReviewReducer;

impl ReviewReducer {
    fn reviewable(state: &DashboardState, booking_id: BookingId) -> Result<(), String> {
        if state.identity.as_ref().and_then(AccountIdentity::customer_id).is_none() {
            return Err("Only customers can leave reviews".to_string());
        }
        let booking = state
            .booking(booking_id)
            .ok_or_else(|| DashboardError::UnknownBooking(booking_id).to_string())?;
        if booking.status() != BookingStatus::Completed {
            return Err("Only completed bookings can be reviewed".to_string());
        }
        if booking.has_review() {
            return Err("You have already reviewed this booking".to_string());
        }
        Ok(())
    }

    fn submit(state: &mut DashboardState, env: &DashboardEnvironment) -> Effects {
        if !state.review.is_editable() {
            return SmallVec::new();
        }
        let Some(draft) = state.review.draft.clone() else {
            return SmallVec::new();
        };
        let Some(customer_id) = state.identity.as_ref().and_then(AccountIdentity::customer_id) else {
            state.review.inline_error = Some(DashboardError::NotSignedIn.to_string());
            return SmallVec::new();
        };
        if let Err(error) = validate_rating(draft.rating) {
            state.review.inline_error = Some(error.to_string());
            return SmallVec::new();
        }

        state.review.phase = ReviewPhase::Submitting;
        state.review.inline_error = None;

        let api = Arc::clone(&env.api);
        smallvec![in_session(env, async move {
            match submit_review(api.as_ref(), customer_id, draft.booking_id, draft.rating, &draft.comment).await {
                Ok(review) => DashboardAction::ReviewSubmitted { review },
                Err(error) => DashboardAction::ReviewFailed { error },
            }
        })]
    }
}

impl Reducer for ReviewReducer {
    type State = DashboardState;
    type Action = DashboardAction;
    type Environment = DashboardEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            DashboardAction::OpenReview { booking_id } => {
                if state.review.phase == ReviewPhase::Submitting {
                    return SmallVec::new();
                }
                if let Err(message) = Self::reviewable(state, booking_id) {
                    return smallvec![notify(state, env, ToastKind::Warning, message, None)];
                }
                state.review = ReviewForm::open(booking_id);
                SmallVec::new()
            },

            DashboardAction::SetReviewRating { rating } => {
                let editable = state.review.is_editable();
                if let Some(draft) = state.review.draft.as_mut().filter(|_| editable) {
                    draft.rating = Some(rating);
                    state.review.inline_error = None;
                }
                SmallVec::new()
            },

            DashboardAction::SetReviewComment { comment } => {
                let editable = state.review.is_editable();
                if let Some(draft) = state.review.draft.as_mut().filter(|_| editable) {
                    draft.comment = comment;
                }
                SmallVec::new()
            },

            DashboardAction::SubmitReview => Self::submit(state, env),

            DashboardAction::CloseReview => {
                if state.review.phase != ReviewPhase::Submitting {
                    state.review = ReviewForm::default();
                }
                SmallVec::new()
            },

            DashboardAction::ReviewSubmitted { review } => {
                if state.review.phase != ReviewPhase::Submitting {
                    return SmallVec::new();
                }

                let booking_id = review.booking_id;
                if let Some(booking) = state.booking_mut(booking_id) {
                    booking.review = Some(review);
                }
                state.review = ReviewForm::default();

                smallvec![notify(state, env, ToastKind::Success, "Thanks for your review", None)]
            },

            DashboardAction::ReviewFailed { error } => {
                if state.review.phase != ReviewPhase::Submitting {
                    return SmallVec::new();
                }

                tracing::warn!(%error, "Review submission failed");
                let message = error.to_string();
                state.review.inline_error = Some(message.clone());
                state.review.phase = ReviewPhase::Failed { error };
                smallvec![notify(state, env, ToastKind::Error, message, None)]
            },

            _ => SmallVec::new(),
        }
    }
}
