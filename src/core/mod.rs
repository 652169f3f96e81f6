//! Core state machine types.
//!
//! This module contains the pure side of the machine:
//! - State and event definitions via the [`State`] and [`Event`] traits
//! - Immutable transition logging
//!
//! Nothing in this module performs side effects; the imperative half lives
//! in [`crate::engine`].

mod history;
mod state;

pub use history::{TransitionLog, TransitionRecord};
pub use state::{Event, State};
