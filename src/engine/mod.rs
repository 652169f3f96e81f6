//! The imperative half of the machine.
//!
//! This module executes events against the immutable rule tables:
//!
//! - **Rules**: per `(state, event)` handling as a tagged sum -
//!   remain in place or transition with ordered side effects
//! - **Machine**: the engine applying one event at a time behind an
//!   `Idle | Processing` re-entrancy guard
//! - **Effects**: uniformly fallible closures over a caller-supplied
//!   context; failures never escape the engine
//!
//! States and events themselves are pure values defined in [`crate::core`].

mod machine;
mod rules;

pub use machine::{Machine, StepOutcome};
pub use rules::{Action, EffectError, Hooks, Recovery, Rule};
