//! Core `State` and `Event` traits.
//!
//! Machine states and events are plain enumerations. These traits capture
//! the bounds the rule tables need (hashable keys, cloneable values,
//! serde support for the transition log) plus a `name()` for tracing.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state machine states.
///
/// States are immutable values describing the current position in a
/// machine. They key the entry/exit and error-policy tables, so they must
/// be hashable and comparable.
///
/// # Example
///
/// ```rust
/// use tether::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum LinkState {
///     Down,
///     Probing,
///     Up,
/// }
///
/// impl State for LinkState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Down => "Down",
///             Self::Probing => "Probing",
///             Self::Up => "Up",
///         }
///     }
/// }
///
/// assert_eq!(LinkState::Probing.name(), "Probing");
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

/// Trait for state machine events.
///
/// Events are transient occurrences consumed exactly once. Together with a
/// [`State`] they key the action table, so the same bounds apply.
pub trait Event:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Get the event's name for display/logging.
    fn name(&self) -> &str;
}
