//! Dashboard reducers.
//!
//! One reducer per workflow, all over [`DashboardState`] and
//! [`DashboardAction`]. Each ignores actions outside its workflow, so
//! [`combine_reducers`] can run them in sequence.

pub mod booking_form;
pub mod booking_status;
pub mod review;
pub mod session;

pub use booking_form::BookingFormReducer;
pub use booking_status::BookingStatusReducer;
pub use review::ReviewReducer;
pub use session::SessionReducer;

use crate::actions::DashboardAction;
use crate::environment::DashboardEnvironment;
use crate::notifications::{Shortcut, ToastKind};
use crate::state::DashboardState;
use marketplace_core::composition::{CombinedReducer, SharedReducer, combine_reducers};
use marketplace_core::{SmallVec, effect::Effect, reducer::Reducer};
use std::future::Future;
use std::sync::Arc;

/// Effects returned by every dashboard reducer
pub type Effects = SmallVec<[Effect<DashboardAction>; 4]>;

/// Unified dashboard reducer
///
/// Combines the session, booking form, booking status and review workflows.
#[derive(Clone)]
pub struct DashboardReducer {
    inner: CombinedReducer<DashboardState, DashboardAction, DashboardEnvironment>,
}

impl DashboardReducer {
    /// Create the combined reducer
    #[must_use]
    pub fn new() -> Self {
        let reducers: Vec<SharedReducer<DashboardState, DashboardAction, DashboardEnvironment>> = vec![
            Arc::new(SessionReducer),
            Arc::new(BookingFormReducer),
            Arc::new(BookingStatusReducer),
            Arc::new(ReviewReducer),
        ];
        Self {
            inner: combine_reducers(reducers),
        }
    }
}

impl Default for DashboardReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for DashboardReducer {
    type State = DashboardState;
    type Action = DashboardAction;
    type Environment = DashboardEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        self.inner.reduce(state, action, env)
    }
}

/// Show a toast; returns the effect that dismisses it once its lifetime ends
pub(crate) fn notify(
    state: &mut DashboardState,
    env: &DashboardEnvironment,
    kind: ToastKind,
    message: impl Into<String>,
    shortcut: Option<Shortcut>,
) -> Effect<DashboardAction> {
    let id = state.notifications.push(kind, message, shortcut);
    match env.toast_ttl {
        Some(duration) if !duration.is_zero() => Effect::Delay {
            duration,
            action: Box::new(DashboardAction::DismissToast { id }),
        },
        _ => Effect::None,
    }
}

/// Run a request as part of the session
///
/// Signing out aborts it; an aborted request feeds nothing back.
pub(crate) fn in_session<F>(env: &DashboardEnvironment, future: F) -> Effect<DashboardAction>
where
    F: Future<Output = DashboardAction> + Send + 'static,
{
    let session = Arc::clone(&env.session);
    Effect::future(async move { session.run(future).await })
}
