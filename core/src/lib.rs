//! # Wizard Core
//!
//! Core traits and types for building step-by-step flows with the reducer
//! pattern.
//!
//! ## Core Concepts
//!
//! - **State**: Everything a feature needs to render its current step
//! - **Action**: All inputs to a reducer (user commands and effect results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Description of a side effect, executed later by the runtime
//! - **Environment**: Injected dependencies (storage, gateways, clocks)
//!
//! Reducers never perform I/O that can suspend. Anything asynchronous is
//! returned as an [`Effect`](effect::Effect) and its outcome comes back as a
//! new action.
//!
//! ## Example
//!
//! ```
//! use wizard_core::{effect::Effect, reducer::Reducer, Effects, SmallVec};
//!
//! #[derive(Default)]
//! struct StepState {
//!     step: u8,
//! }
//!
//! enum StepAction {
//!     Next,
//! }
//!
//! struct StepReducer;
//!
//! impl Reducer for StepReducer {
//!     type State = StepState;
//!     type Action = StepAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut StepState, action: StepAction, _env: &()) -> Effects<StepAction> {
//!         match action {
//!             StepAction::Next => state.step = state.step.saturating_add(1),
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let mut state = StepState::default();
//! let effects = StepReducer.reduce(&mut state, StepAction::Next, &());
//! assert_eq!(state.step, 1);
//! assert!(effects.is_empty());
//! ```

pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Effects returned from a single reducer call.
///
/// Most actions produce zero or one effect, so four inline slots avoid a heap
/// allocation in practically every case.
pub type Effects<Action> = SmallVec<[effect::Effect<Action>; 4]>;

/// Reducer module - The core trait for business logic
pub mod reducer {
    use super::Effects;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;
        /// The action type this reducer processes
        type Action;
        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Implementations validate the action, update `state` in place and
        /// return descriptions of any side effects. They must not block on
        /// network I/O; that belongs in an [`Effect::Future`](crate::effect::Effect::Future).
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Effects<Self::Action>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. The runtime decides when and where to
/// run them.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,
        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),
        /// Run effects sequentially, each one finishing before the next starts
        Sequential(Vec<Effect<Action>>),
        /// Dispatch an action after a delay
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },
        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation whose result is fed back as an action
        #[must_use]
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns true for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time for production environments
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};
    use std::time::Duration;

    #[test]
    fn merge_and_chain_wrap_effects() {
        let merged = Effect::<u8>::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref inner) if inner.len() == 2));

        let chained = Effect::<u8>::chain(vec![Effect::None]);
        assert!(matches!(chained, Effect::Sequential(ref inner) if inner.len() == 1));
    }

    #[test]
    fn debug_output_hides_future_body() {
        let effect = Effect::<u8>::future(async { Some(1) });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");

        let delay = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(3_u8),
        };
        assert!(format!("{delay:?}").contains("Effect::Delay"));
    }

    #[test]
    fn future_effect_resolves_to_action() {
        let Effect::Future(fut) = Effect::<u8>::future(async { Some(7) }) else {
            unreachable!("future() always builds Effect::Future");
        };
        assert_eq!(tokio_test::block_on(fut), Some(7));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn is_none_only_matches_none() {
        assert!(Effect::<u8>::None.is_none());
        assert!(!Effect::<u8>::merge(vec![]).is_none());
    }
}
