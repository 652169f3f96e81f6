//! Rule and policy types consulted by the engine.
//!
//! A machine is driven by three immutable tables, all populated once at
//! construction:
//! - the action table: `(state, event)` → [`Rule`]
//! - the entry/exit table: `state` → [`Hooks`]
//! - the error policy table: `state` → [`Recovery`]

use crate::core::{Event, State};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by effects.
///
/// Every effect - transition action, entry/exit hook, recovery action -
/// is uniformly fallible. A failure never escapes the engine; it is
/// converted into a deterministic fallback via the error policy table.
#[derive(Debug, Error)]
pub enum EffectError {
    /// A required external handle or parameter was absent.
    #[error("missing dependency: {0}")]
    MissingDependency(&'static str),

    /// The effect ran and failed.
    #[error("effect failed: {0}")]
    Failed(String),
}

/// Signature shared by every effect.
///
/// Effects receive the mutable context, the triggering event, and the state
/// captured when the engine invoked them. The state argument is
/// informational (tracing only) - effect logic must never branch on it;
/// branching belongs in the tables.
pub type Action<S, E, C> = Arc<dyn Fn(&mut C, &E, &S) -> Result<(), EffectError> + Send + Sync>;

/// How a machine handles one `(state, event)` pair.
///
/// Absence of a rule means the event is illegal in that state and the
/// error policy applies.
pub enum Rule<S: State, E: Event, C> {
    /// Consume the event without leaving the state. Entry and exit hooks
    /// do not run.
    Remain { action: Option<Action<S, E, C>> },

    /// Leave the current state for `next`, running the exit hook, the
    /// action, and the entry hook in that order.
    Transition {
        action: Option<Action<S, E, C>>,
        next: S,
    },
}

/// Entry and exit hooks for a single state.
///
/// Hooks run only when a rule actually changes state, never on
/// [`Rule::Remain`].
pub struct Hooks<S: State, E: Event, C> {
    pub on_entry: Option<Action<S, E, C>>,
    pub on_exit: Option<Action<S, E, C>>,
}

impl<S: State, E: Event, C> Default for Hooks<S, E, C> {
    fn default() -> Self {
        Self {
            on_entry: None,
            on_exit: None,
        }
    }
}

/// Error policy for a single state: the action to run and the state to
/// fall back to when an event is illegal or an effect fails.
pub struct Recovery<S: State, E: Event, C> {
    pub action: Option<Action<S, E, C>>,
    pub fallback: S,
}
