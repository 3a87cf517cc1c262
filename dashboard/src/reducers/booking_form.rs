//! Booking creation: form input, confirmation gate and submission.

use super::{Effects, in_session, notify};
use crate::actions::DashboardAction;
use crate::availability::next_weekday;
use crate::enrichment::EnrichedBooking;
use crate::environment::DashboardEnvironment;
use crate::error::{DashboardError, Result, Severity};
use crate::identity::{AccountIdentity, Role};
use crate::lifecycle::{BookingDraft, BookingForm, CreationPhase};
use crate::notifications::{Shortcut, ToastKind};
use crate::state::DashboardState;
use chrono::NaiveDate;
use marketplace_core::{SmallVec, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Booking form reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingFormReducer;

impl BookingFormReducer {
    fn select_date(state: &mut DashboardState, env: &DashboardEnvironment, date: NaiveDate) -> Effects {
        if state.form.context.is_none() || state.form.is_submitting() {
            return SmallVec::new();
        }

        let today = env.today();
        if date < today {
            return smallvec![notify(
                state,
                env,
                ToastKind::Warning,
                "Bookings cannot be made for past dates",
                None,
            )];
        }

        let mut effects = Effects::new();
        let weekday = next_weekday(date);
        if weekday != date {
            effects.push(notify(
                state,
                env,
                ToastKind::Warning,
                format!("Weekends are unavailable; moved to {}", weekday.format("%A %d %B")),
                None,
            ));
        }

        let date = weekday;
        state.form.select_date(date, env.availability.slots(date));
        if state.form.available_slots.is_empty() {
            state.form.inline_error = Some(format!("No times available on {date}"));
        }
        effects
    }

    fn confirm(state: &mut DashboardState, env: &DashboardEnvironment) -> Effects {
        if !matches!(
            state.form.phase,
            CreationPhase::AwaitingConfirmation | CreationPhase::Failed { .. }
        ) {
            tracing::debug!(phase = ?state.form.phase, "Ignoring confirmation");
            return SmallVec::new();
        }

        let Some(submission) = state.form.submission() else {
            state.form.inline_error = Some("Choose a date and time first".to_string());
            return SmallVec::new();
        };
        let Some(user) = state.user.clone() else {
            let error = DashboardError::NotSignedIn;
            state.form.inline_error = Some(error.to_string());
            state.form.phase = CreationPhase::Failed { error };
            return SmallVec::new();
        };
        if user.role != Role::Customer {
            let error = DashboardError::Validation("Only customers can book services".to_string());
            state.form.inline_error = Some(error.to_string());
            state.form.phase = CreationPhase::Failed { error };
            return SmallVec::new();
        }

        state.form.phase = CreationPhase::Submitting;
        state.form.inline_error = None;

        let known = state.identity.as_ref().and_then(AccountIdentity::customer_id);
        let resolver = env.resolver();
        let api = Arc::clone(&env.api);
        smallvec![in_session(env, async move {
            let created: Result<EnrichedBooking> = async {
                let customer_id = match known {
                    Some(customer_id) => customer_id,
                    None => resolver
                        .resolve(&user.email, Role::Customer)
                        .await?
                        .customer_id()
                        .ok_or(DashboardError::NotSignedIn)?,
                };
                submission.submit(api.as_ref(), customer_id).await
            }
            .await;

            match created {
                Ok(booking) => DashboardAction::BookingCreated { booking },
                Err(error) => DashboardAction::BookingCreationFailed { error },
            }
        })]
    }
}

impl Reducer for BookingFormReducer {
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
            DashboardAction::OpenBookingForm { context } => {
                if state.form.is_submitting() {
                    return SmallVec::new();
                }
                state.form = BookingForm::open(context);
                SmallVec::new()
            },

            DashboardAction::CloseBookingForm => {
                if !state.form.is_submitting() {
                    state.form = BookingForm::default();
                }
                SmallVec::new()
            },

            DashboardAction::SelectDate { date } => Self::select_date(state, env, date),

            DashboardAction::SelectSlot { slot } => {
                if state.form.is_submitting() {
                    return SmallVec::new();
                }
                if let Err(error) = state.form.select_slot(slot) {
                    state.form.inline_error = Some(error.to_string());
                }
                SmallVec::new()
            },

            DashboardAction::SetNotes { notes } => {
                if state.form.is_submitting() {
                    return SmallVec::new();
                }
                state.form.draft.notes = notes;
                state.form.refresh_phase();
                SmallVec::new()
            },

            DashboardAction::SubmitBooking => {
                match state.form.phase {
                    CreationPhase::FormFilled => state.form.phase = CreationPhase::AwaitingConfirmation,
                    CreationPhase::Idle => {
                        state.form.inline_error = Some("Choose a date and time first".to_string());
                    },
                    _ => {},
                }
                SmallVec::new()
            },

            DashboardAction::BackToForm => {
                if matches!(
                    state.form.phase,
                    CreationPhase::AwaitingConfirmation | CreationPhase::Failed { .. }
                ) {
                    state.form.refresh_phase();
                }
                SmallVec::new()
            },

            DashboardAction::ConfirmBooking => Self::confirm(state, env),

            DashboardAction::BookingCreated { booking } => {
                if !state.form.is_submitting() {
                    tracing::debug!(booking_id = %booking.id(), "Creation result arrived after the form closed");
                    return SmallVec::new();
                }

                let booking_id = booking.id();
                let status = booking.status();
                state.bookings.push(booking);
                state.recompute_stats(env.today());
                state.form.phase = CreationPhase::Succeeded { booking_id };
                state.form.draft = BookingDraft::default();
                state.form.available_slots.clear();

                smallvec![notify(
                    state,
                    env,
                    ToastKind::Success,
                    format!("Booking {booking_id} created ({status})"),
                    Some(Shortcut::ViewBookings),
                )]
            },

            DashboardAction::BookingCreationFailed { error } => {
                if !state.form.is_submitting() {
                    return SmallVec::new();
                }

                tracing::warn!(%error, "Booking creation failed");
                if error.severity() == Severity::Fatal {
                    state.banner = Some(error.clone().into());
                }
                state.form.inline_error = Some(error.to_string());
                let message = error.to_string();
                state.form.phase = CreationPhase::Failed { error };
                smallvec![notify(state, env, ToastKind::Error, message, None)]
            },

            _ => SmallVec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::availability::TimeSlot;
    use crate::reducers::test_support::{booking_context, customer_identity, customer_user, date, test_env};
    use marketplace_testing::{ReducerTest, assertions};

    fn open_form() -> DashboardState {
        DashboardState {
            user: Some(customer_user()),
            identity: Some(customer_identity()),
            form: BookingForm::open(booking_context()),
            ..DashboardState::default()
        }
    }

    fn filled_form() -> DashboardState {
        let mut state = open_form();
        let nine = TimeSlot::at_hour(9).unwrap();
        state.form.select_date(date(2024, 6, 17), vec![nine]);
        state.form.select_slot(nine).unwrap();
        state
    }

    #[test]
    fn test_weekend_moves_to_monday() {
        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(open_form())
            .when_action(DashboardAction::SelectDate {
                date: date(2024, 6, 15),
            })
            .then_state(|state| {
                assert_eq!(state.form.draft.date, Some(date(2024, 6, 17)));
                assert_eq!(state.notifications.of_kind(ToastKind::Warning).count(), 1);
            })
            .run();
    }

    #[test]
    fn test_past_date_is_rejected() {
        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(open_form())
            .when_action(DashboardAction::SelectDate {
                date: date(2024, 6, 11),
            })
            .then_state(|state| {
                assert_eq!(state.form.draft.date, None);
                assert_eq!(state.notifications.of_kind(ToastKind::Warning).count(), 1);
            })
            .run();
    }

    #[test]
    fn test_first_submit_only_asks_for_confirmation() {
        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(filled_form())
            .when_action(DashboardAction::SubmitBooking)
            .then_state(|state| {
                assert_eq!(state.form.phase, CreationPhase::AwaitingConfirmation);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_submit_without_slot_shows_inline_error() {
        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(open_form())
            .when_action(DashboardAction::SubmitBooking)
            .then_state(|state| {
                assert_eq!(state.form.phase, CreationPhase::Idle);
                assert!(state.form.inline_error.is_some());
            })
            .run();
    }

    #[test]
    fn test_confirm_submits_once() {
        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(filled_form())
            .given_action(DashboardAction::SubmitBooking)
            .given_action(DashboardAction::ConfirmBooking)
            .when_action(DashboardAction::ConfirmBooking)
            .then_state(|state| assert!(state.form.is_submitting()))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_editing_invalidates_confirmation() {
        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(filled_form())
            .given_action(DashboardAction::SubmitBooking)
            .when_action(DashboardAction::SetNotes {
                notes: "Ring twice".to_string(),
            })
            .then_state(|state| assert_eq!(state.form.phase, CreationPhase::FormFilled))
            .run();
    }

    #[test]
    fn test_failure_keeps_input_for_retry() {
        let mut state = filled_form();
        state.form.phase = CreationPhase::Submitting;

        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::BookingCreationFailed {
                error: DashboardError::Request(marketplace_api::ApiError::RequestFailed(
                    "connection reset".to_string(),
                )),
            })
            .then_state(|state| {
                assert!(matches!(state.form.phase, CreationPhase::Failed { .. }));
                assert!(state.form.draft.starts_at().is_some());
                assert!(state.form.inline_error.is_some());
                assert!(state.banner.is_none());
            })
            .run();
    }

    #[test]
    fn test_identity_failure_on_confirm_raises_banner() {
        let mut state = filled_form();
        state.identity = None;
        state.form.phase = CreationPhase::Submitting;

        ReducerTest::new(BookingFormReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::BookingCreationFailed {
                error: DashboardError::IdentityNotFound {
                    email: "ada@example.com".to_string(),
                    role: Role::Customer,
                },
            })
            .then_state(|state| {
                let banner = state.banner.as_ref().unwrap();
                assert!(matches!(banner.error, DashboardError::IdentityNotFound { .. }));
                assert!(matches!(state.form.phase, CreationPhase::Failed { .. }));
                assert!(state.form.inline_error.is_some());
            })
            .then_effects(|effects| assertions::assert_has_delay_effect(effects))
            .run();
    }
}
