//! Booking status changes: customer cancellation and provider transitions.

use super::{Effects, in_session, notify};
use crate::actions::DashboardAction;
use crate::environment::DashboardEnvironment;
use crate::error::DashboardError;
use crate::identity::Role;
use crate::lifecycle::CancellationPhase;
use crate::notifications::ToastKind;
use crate::state::DashboardState;
use marketplace_api::{Booking, BookingId, BookingStatus};
use marketplace_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Booking status reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingStatusReducer;

impl BookingStatusReducer {
    /// Reject a transition the local copy of the booking cannot make
    fn check_transition(state: &DashboardState, booking_id: BookingId, to: BookingStatus) -> Result<(), DashboardError> {
        let booking = state
            .booking(booking_id)
            .ok_or(DashboardError::UnknownBooking(booking_id))?;
        let from = booking.status();
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(DashboardError::InvalidTransition { from, to })
        }
    }

    fn update_status(
        env: &DashboardEnvironment,
        booking_id: BookingId,
        status: BookingStatus,
        on_success: fn(Booking) -> DashboardAction,
        on_failure: fn(BookingId, DashboardError) -> DashboardAction,
    ) -> Effect<DashboardAction> {
        let api = Arc::clone(&env.api);
        in_session(env, async move {
            match api.update_booking_status(booking_id, status).await {
                Ok(booking) => on_success(booking),
                Err(error) => on_failure(booking_id, DashboardError::Request(error)),
            }
        })
    }

    /// Replace the server-owned part of a booking; returns its previous status
    fn patch_booking(state: &mut DashboardState, booking: Booking) -> Option<BookingStatus> {
        let enriched = state.booking_mut(booking.booking_id)?;
        let previous = enriched.status();
        enriched.booking = booking;
        Some(previous)
    }
}

impl Reducer for BookingStatusReducer {
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
            DashboardAction::RequestCancellation { booking_id } => {
                if matches!(state.cancellation, CancellationPhase::Cancelling { .. }) {
                    return SmallVec::new();
                }
                if let Err(error) = Self::check_transition(state, booking_id, BookingStatus::Cancelled) {
                    return smallvec![notify(state, env, ToastKind::Warning, error.to_string(), None)];
                }
                state.cancellation = CancellationPhase::Confirming { booking_id };
                SmallVec::new()
            },

            DashboardAction::DismissCancellation => {
                if !matches!(state.cancellation, CancellationPhase::Cancelling { .. }) {
                    state.cancellation = CancellationPhase::Idle;
                }
                SmallVec::new()
            },

            DashboardAction::ConfirmCancellation => {
                let booking_id = match state.cancellation {
                    CancellationPhase::Confirming { booking_id }
                    | CancellationPhase::Failed { booking_id, .. } => booking_id,
                    CancellationPhase::Idle | CancellationPhase::Cancelling { .. } => {
                        return SmallVec::new();
                    },
                };

                state.cancellation = CancellationPhase::Cancelling { booking_id };
                smallvec![Self::update_status(
                    env,
                    booking_id,
                    BookingStatus::Cancelled,
                    |booking| DashboardAction::BookingCancelled { booking },
                    |booking_id, error| DashboardAction::CancellationFailed { booking_id, error },
                )]
            },

            DashboardAction::BookingCancelled { booking } => {
                let booking_id = booking.booking_id;
                if state.cancellation != (CancellationPhase::Cancelling { booking_id }) {
                    return SmallVec::new();
                }
                state.cancellation = CancellationPhase::Idle;

                let status = booking.status;
                match Self::patch_booking(state, booking) {
                    Some(previous) if status == BookingStatus::Cancelled => {
                        state.stats.apply_cancellation(previous);
                    },
                    Some(_) => {
                        tracing::warn!(%booking_id, %status, "Server returned an unexpected status after cancel");
                        state.recompute_stats(env.today());
                    },
                    None => return SmallVec::new(),
                }

                tracing::info!(%booking_id, "Booking cancelled");
                smallvec![notify(
                    state,
                    env,
                    ToastKind::Success,
                    format!("Booking {booking_id} cancelled"),
                    None,
                )]
            },

            DashboardAction::CancellationFailed { booking_id, error } => {
                if state.cancellation != (CancellationPhase::Cancelling { booking_id }) {
                    return SmallVec::new();
                }
                tracing::warn!(%booking_id, %error, "Cancellation failed");
                let message = error.to_string();
                state.cancellation = CancellationPhase::Failed { booking_id, error };
                smallvec![notify(state, env, ToastKind::Error, message, None)]
            },

            DashboardAction::UpdateStatus { booking_id, status } => {
                if state.role() != Some(Role::Provider) {
                    return smallvec![notify(
                        state,
                        env,
                        ToastKind::Warning,
                        "Only providers can change a booking's status",
                        None,
                    )];
                }
                if state.status_updates.contains(&booking_id) {
                    return SmallVec::new();
                }
                if let Err(error) = Self::check_transition(state, booking_id, status) {
                    return smallvec![notify(state, env, ToastKind::Error, error.to_string(), None)];
                }

                state.status_updates.insert(booking_id);
                smallvec![Self::update_status(
                    env,
                    booking_id,
                    status,
                    |booking| DashboardAction::StatusUpdated { booking },
                    |booking_id, error| DashboardAction::StatusUpdateFailed { booking_id, error },
                )]
            },

            DashboardAction::StatusUpdated { booking } => {
                let booking_id = booking.booking_id;
                if !state.status_updates.remove(&booking_id) {
                    return SmallVec::new();
                }

                let status = booking.status;
                if Self::patch_booking(state, booking).is_none() {
                    return SmallVec::new();
                }
                state.recompute_stats(env.today());

                tracing::info!(%booking_id, %status, "Booking status updated");
                smallvec![notify(
                    state,
                    env,
                    ToastKind::Success,
                    format!("Booking {booking_id} is now {status}"),
                    None,
                )]
            },

            DashboardAction::StatusUpdateFailed { booking_id, error } => {
                if !state.status_updates.remove(&booking_id) {
                    return SmallVec::new();
                }
                tracing::warn!(%booking_id, %error, "Status update failed");
                smallvec![notify(state, env, ToastKind::Error, error.to_string(), None)]
            },

            _ => SmallVec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::reducers::test_support::{customer_user, enriched, provider_user, test_env, today};
    use marketplace_testing::{ReducerTest, assertions};

    fn customer_with(bookings: &[(i64, BookingStatus)]) -> DashboardState {
        let mut state = DashboardState {
            user: Some(customer_user()),
            bookings: bookings.iter().map(|&(id, status)| enriched(id, status)).collect(),
            ..DashboardState::default()
        };
        state.recompute_stats(today());
        state
    }

    #[test]
    fn test_completed_booking_cannot_be_cancelled() {
        ReducerTest::new(BookingStatusReducer)
            .with_env(test_env())
            .given_state(customer_with(&[(1, BookingStatus::Completed)]))
            .when_action(DashboardAction::RequestCancellation {
                booking_id: BookingId(1),
            })
            .then_state(|state| {
                assert_eq!(state.cancellation, CancellationPhase::Idle);
                assert_eq!(state.notifications.of_kind(ToastKind::Warning).count(), 1);
            })
            .run();
    }

    #[test]
    fn test_confirm_cancellation_issues_request() {
        ReducerTest::new(BookingStatusReducer)
            .with_env(test_env())
            .given_state(customer_with(&[(1, BookingStatus::Confirmed)]))
            .given_action(DashboardAction::RequestCancellation {
                booking_id: BookingId(1),
            })
            .when_action(DashboardAction::ConfirmCancellation)
            .then_state(|state| {
                assert_eq!(
                    state.cancellation,
                    CancellationPhase::Cancelling {
                        booking_id: BookingId(1)
                    }
                );
            })
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn test_cancelled_result_adjusts_counters() {
        let mut state = customer_with(&[(1, BookingStatus::Confirmed), (2, BookingStatus::Pending)]);
        state.cancellation = CancellationPhase::Cancelling {
            booking_id: BookingId(1),
        };
        let mut cancelled = state.bookings[0].booking.clone();
        cancelled.status = BookingStatus::Cancelled;

        ReducerTest::new(BookingStatusReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::BookingCancelled { booking: cancelled })
            .then_state(|state| {
                assert_eq!(state.stats.total, 2);
                assert_eq!(state.stats.active, 1);
                assert_eq!(state.stats.cancelled, 1);
                assert!(state.stats.is_consistent());
                assert_eq!(state.cancellation, CancellationPhase::Idle);
                assert_eq!(state.booking(BookingId(1)).unwrap().status(), BookingStatus::Cancelled);
            })
            .run();
    }

    #[test]
    fn test_customer_cannot_change_status() {
        ReducerTest::new(BookingStatusReducer)
            .with_env(test_env())
            .given_state(customer_with(&[(1, BookingStatus::Pending)]))
            .when_action(DashboardAction::UpdateStatus {
                booking_id: BookingId(1),
                status: BookingStatus::Confirmed,
            })
            .then_state(|state| assert!(state.status_updates.is_empty()))
            .run();
    }

    #[test]
    fn test_provider_invalid_transition_makes_no_request() {
        let mut state = customer_with(&[(1, BookingStatus::Pending)]);
        state.user = Some(provider_user());

        ReducerTest::new(BookingStatusReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::UpdateStatus {
                booking_id: BookingId(1),
                status: BookingStatus::Completed,
            })
            .then_state(|state| {
                assert!(state.status_updates.is_empty());
                assert_eq!(state.notifications.of_kind(ToastKind::Error).count(), 1);
            })
            .then_effects(|effects| {
                assert!(effects.iter().all(|effect| !matches!(effect, Effect::Future(_))));
            })
            .run();
    }

    #[test]
    fn test_provider_confirms_pending_booking() {
        let mut state = customer_with(&[(1, BookingStatus::Pending)]);
        state.user = Some(provider_user());

        ReducerTest::new(BookingStatusReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::UpdateStatus {
                booking_id: BookingId(1),
                status: BookingStatus::Confirmed,
            })
            .then_state(|state| assert!(state.status_updates.contains(&BookingId(1))))
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }
}
