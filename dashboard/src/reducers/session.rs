//! Sign-in, dashboard loading, sign-out and catalog browsing.

use super::{Effects, in_session, notify};
use crate::actions::DashboardAction;
use crate::aggregator::AggregatedBookings;
use crate::catalog::load_catalog;
use crate::environment::DashboardEnvironment;
use crate::error::{DashboardError, Result};
use crate::identity::{AccountIdentity, Role};
use crate::notifications::{PageStatus, ToastKind};
use crate::state::{DashboardState, SignedInUser};
use marketplace_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::sync::Arc;

/// Session reducer
///
/// Owns the page status, the identity and the booking collection as loaded
/// from the server. Every load bumps `generation`; results of older loads are
/// dropped when they arrive.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    fn sign_in(state: &mut DashboardState, env: &DashboardEnvironment, email: &str, role: Role) -> Effects {
        let email = email.trim();
        if email.is_empty() {
            let error = DashboardError::Validation("Enter an email address".to_string());
            state.banner = Some(error.clone().into());
            state.status = PageStatus::Failed { error };
            return SmallVec::new();
        }

        let switching = state
            .user
            .as_ref()
            .is_some_and(|user| !user.email.eq_ignore_ascii_case(email));
        if switching {
            tracing::info!("Different user signing in, clearing session");
            env.session.clear();
            *state = DashboardState {
                generation: state.generation,
                ..DashboardState::default()
            };
        }

        state.user = Some(SignedInUser {
            email: email.to_string(),
            role,
        });
        state.identity = None;
        smallvec![Self::begin_load(state, env)]
    }

    fn begin_load(state: &mut DashboardState, env: &DashboardEnvironment) -> Effect<DashboardAction> {
        let Some(user) = state.user.clone() else {
            let error = DashboardError::NotSignedIn;
            state.banner = Some(error.clone().into());
            state.status = PageStatus::Failed { error };
            return Effect::None;
        };

        state.generation += 1;
        let generation = state.generation;
        state.status = PageStatus::Loading;
        state.banner = None;

        let resolver = env.resolver();
        let aggregator = env.aggregator();
        in_session(env, async move {
            let loaded: Result<(AccountIdentity, AggregatedBookings)> = async {
                let identity = resolver.resolve(&user.email, user.role).await?;
                let aggregated = aggregator.load(&identity).await?;
                Ok((identity, aggregated))
            }
            .await;

            match loaded {
                Ok((identity, AggregatedBookings { bookings, warnings })) => DashboardAction::DashboardLoaded {
                    generation,
                    identity,
                    bookings,
                    warnings,
                },
                Err(error) => DashboardAction::DashboardLoadFailed { generation, error },
            }
        })
    }
}

impl Reducer for SessionReducer {
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
            DashboardAction::SignIn { email, role } => Self::sign_in(state, env, &email, role),

            DashboardAction::LoadDashboard => smallvec![Self::begin_load(state, env)],

            DashboardAction::DashboardLoaded {
                generation,
                identity,
                bookings,
                warnings,
            } => {
                if generation != state.generation {
                    tracing::debug!(generation, current = state.generation, "Dropping stale load");
                    return SmallVec::new();
                }

                let degraded = bookings.iter().filter(|booking| booking.is_degraded()).count();
                state.identity = Some(identity);
                state.bookings = bookings;
                state.recompute_stats(env.today());
                state.status = PageStatus::Ready;

                tracing::info!(
                    bookings = state.bookings.len(),
                    active = state.stats.active,
                    "Dashboard ready"
                );

                let mut expiries: Vec<_> = warnings
                    .iter()
                    .map(|warning| notify(state, env, ToastKind::Warning, warning.to_string(), None))
                    .collect();
                if degraded > 0 {
                    expiries.push(notify(
                        state,
                        env,
                        ToastKind::Warning,
                        format!("Some details could not be loaded for {degraded} booking(s)"),
                        None,
                    ));
                }
                smallvec![Effect::merge(expiries)]
            },

            DashboardAction::DashboardLoadFailed { generation, error } => {
                if generation != state.generation {
                    tracing::debug!(generation, current = state.generation, "Dropping stale failure");
                    return SmallVec::new();
                }

                tracing::error!(%error, "Dashboard load failed");
                state.banner = Some(error.clone().into());
                state.status = PageStatus::Failed { error };
                SmallVec::new()
            },

            DashboardAction::SignOut => {
                env.session.clear();
                *state = DashboardState {
                    generation: state.generation + 1,
                    ..DashboardState::default()
                };
                tracing::info!("Signed out");
                SmallVec::new()
            },

            DashboardAction::DismissBanner => {
                state.banner = None;
                SmallVec::new()
            },

            DashboardAction::DismissToast { id } => {
                state.notifications.dismiss(id);
                SmallVec::new()
            },

            DashboardAction::LoadCatalog { provider_id } => {
                let api = Arc::clone(&env.api);
                let session = Arc::clone(&env.session);
                smallvec![in_session(env, async move {
                    match load_catalog(api.as_ref(), &session, provider_id).await {
                        Ok(contexts) => DashboardAction::CatalogLoaded { provider_id, contexts },
                        Err(error) => DashboardAction::CatalogLoadFailed { provider_id, error },
                    }
                })]
            },

            DashboardAction::CatalogLoaded { contexts, .. } => {
                state.catalog = contexts;
                SmallVec::new()
            },

            DashboardAction::CatalogLoadFailed { provider_id, error } => {
                tracing::warn!(%provider_id, %error, "Catalog unavailable");
                state.catalog.clear();
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
    use crate::enrichment::Snapshot;
    use crate::reducers::test_support::{customer_identity, enriched, test_env};
    use marketplace_api::{ApiError, BookingStatus};
    use marketplace_testing::{ReducerTest, assertions};

    #[test]
    fn test_sign_in_starts_load() {
        ReducerTest::new(SessionReducer)
            .with_env(test_env())
            .given_state(DashboardState::default())
            .when_action(DashboardAction::SignIn {
                email: " ada@example.com ".to_string(),
                role: Role::Customer,
            })
            .then_state(|state| {
                assert_eq!(state.status, PageStatus::Loading);
                assert_eq!(state.generation, 1);
                assert_eq!(state.user.as_ref().unwrap().email, "ada@example.com");
            })
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn test_load_without_user_fails() {
        ReducerTest::new(SessionReducer)
            .with_env(test_env())
            .given_state(DashboardState::default())
            .when_action(DashboardAction::LoadDashboard)
            .then_state(|state| {
                assert_eq!(
                    state.status,
                    PageStatus::Failed {
                        error: DashboardError::NotSignedIn
                    }
                );
                assert!(state.banner.is_some());
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let state = DashboardState {
            generation: 3,
            status: PageStatus::Loading,
            ..DashboardState::default()
        };

        ReducerTest::new(SessionReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::DashboardLoaded {
                generation: 2,
                identity: customer_identity(),
                bookings: Vec::new(),
                warnings: Vec::new(),
            })
            .then_state(|state| {
                assert_eq!(state.status, PageStatus::Loading);
                assert!(state.identity.is_none());
            })
            .run();
    }

    #[test]
    fn test_load_warnings_become_toasts() {
        let state = DashboardState {
            generation: 1,
            ..DashboardState::default()
        };
        let mut degraded = enriched(1, BookingStatus::Confirmed);
        degraded.service = Snapshot::Unavailable {
            reason: ApiError::RequestFailed("connection reset".to_string()),
        };

        ReducerTest::new(SessionReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::DashboardLoaded {
                generation: 1,
                identity: customer_identity(),
                bookings: vec![degraded, enriched(2, BookingStatus::Pending)],
                warnings: vec![DashboardError::ReviewsUnavailable(ApiError::Unauthorized)],
            })
            .then_state(|state| {
                assert_eq!(state.status, PageStatus::Ready);
                assert_eq!(state.notifications.of_kind(ToastKind::Warning).count(), 2);
                assert!(state.stats.is_consistent());
            })
            .then_effects(|effects| {
                // Both expiries travel in one merged effect
                assertions::assert_effects_count(effects, 1);
                assert!(matches!(effects[0], Effect::Parallel(_)));
                assert_eq!(assertions::count_delays(effects), 2);
            })
            .run();
    }

    #[test]
    fn test_sign_out_resets_state() {
        let state = DashboardState {
            generation: 4,
            identity: Some(customer_identity()),
            status: PageStatus::Ready,
            ..DashboardState::default()
        };

        ReducerTest::new(SessionReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(DashboardAction::SignOut)
            .then_state(|state| {
                assert_eq!(state.generation, 5);
                assert!(state.identity.is_none());
                assert_eq!(state.status, PageStatus::Idle);
            })
            .run();
    }
}
