//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax,
//! plus helpers that execute the returned effects without a `Store`.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use futures::future::BoxFuture;
use marketplace_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use marketplace_testing::ReducerTest;
///
/// ReducerTest::new(BookingFormReducer)
///     .with_env(test_environment())
///     .given_state(state_with_filled_form())
///     .when_action(DashboardAction::SubmitBooking)
///     .then_state(|state| {
///         assert_eq!(state.form.phase, CreationPhase::AwaitingConfirmation);
///     })
///     .then_effects(|effects| {
///         assertions::assert_no_effects(effects);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Apply an action before the one under test (Given)
    ///
    /// Effects returned for these actions are discarded.
    #[must_use]
    pub fn given_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the action to test (When)
    ///
    /// Effect assertions only see the effects of this last action.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        assert!(
            !self.actions.is_empty(),
            "Action must be set with when_action()"
        );

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Execute effects inline and collect the actions they produce
///
/// Delays resolve immediately and nested effects run in order, so a reducer's
/// follow-up actions can be inspected without spinning up a `Store`.
pub async fn resolve_effects<A>(effects: Vec<Effect<A>>) -> Vec<A>
where
    A: Send + 'static,
{
    let mut actions = Vec::new();
    for effect in effects {
        actions.extend(resolve_effect(effect).await);
    }
    actions
}

fn resolve_effect<A>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>>
where
    A: Send + 'static,
{
    Box::pin(async move {
        match effect {
            Effect::None => Vec::new(),
            Effect::Future(future) => future.await.into_iter().collect(),
            Effect::Delay { action, .. } => vec![*action],
            Effect::Parallel(effects) => resolve_effects(effects).await,
        }
    })
}

/// Helper assertions for effects
pub mod assertions {
    use marketplace_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect would do something when executed.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one Delay effect, looking inside
    /// merged effects
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            count_delays(effects) > 0,
            "Expected at least one Delay effect, but none found"
        );
    }

    /// Number of Delay effects, counting those inside merged effects
    #[must_use]
    pub fn count_delays<A>(effects: &[Effect<A>]) -> usize {
        effects
            .iter()
            .map(|effect| match effect {
                Effect::Delay { .. } => 1,
                Effect::Parallel(inner) => count_delays(inner),
                Effect::None | Effect::Future(_) => 0,
            })
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use marketplace_core::{SmallVec, smallvec};
    use std::time::Duration;

    #[derive(Clone, Debug, Default)]
    struct SlotState {
        held: Vec<u32>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum SlotAction {
        Hold(u32),
        Release(u32),
        Held(u32),
    }

    struct SlotReducer;

    impl Reducer for SlotReducer {
        type State = SlotState;
        type Action = SlotAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SlotAction::Hold(hour) => {
                    smallvec![Effect::future(async move { Some(SlotAction::Held(hour)) })]
                },
                SlotAction::Held(hour) => {
                    state.held.push(hour);
                    smallvec![Effect::Delay {
                        duration: Duration::from_secs(60),
                        action: Box::new(SlotAction::Release(hour)),
                    }]
                },
                SlotAction::Release(hour) => {
                    state.held.retain(|held| *held != hour);
                    smallvec![Effect::None]
                },
            }
        }
    }

    #[test]
    fn test_reducer_test_when_action() {
        ReducerTest::new(SlotReducer)
            .with_env(())
            .given_state(SlotState::default())
            .when_action(SlotAction::Held(9))
            .then_state(|state| assert_eq!(state.held, vec![9]))
            .then_effects(|effects| assertions::assert_has_delay_effect(effects))
            .run();
    }

    #[test]
    fn test_reducer_test_given_actions_accumulate() {
        ReducerTest::new(SlotReducer)
            .with_env(())
            .given_state(SlotState::default())
            .given_action(SlotAction::Held(9))
            .given_action(SlotAction::Held(10))
            .when_action(SlotAction::Release(9))
            .then_state(|state| assert_eq!(state.held, vec![10]))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_resolve_effects_runs_futures_and_skips_delays() {
        let mut state = SlotState::default();
        let effects = SlotReducer.reduce(&mut state, SlotAction::Hold(11), &()).into_vec();
        assertions::assert_has_future_effect(&effects);

        let actions = tokio_test::block_on(resolve_effects(effects));
        assert_eq!(actions, vec![SlotAction::Held(11)]);

        let effects = SlotReducer.reduce(&mut state, SlotAction::Held(11), &()).into_vec();
        let actions = tokio_test::block_on(resolve_effects(effects));
        assert_eq!(actions, vec![SlotAction::Release(11)]);
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<SlotAction>::None], 1);
        assertions::assert_effects_count::<SlotAction>(&[], 0);
        assertions::assert_no_effects::<SlotAction>(&[Effect::merge(vec![Effect::None])]);
    }
}
