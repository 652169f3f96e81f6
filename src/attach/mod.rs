//! The attachment domain.
//!
//! A concrete machine over [`AttachState`] and [`AttachEvent`] driving the
//! scan → retrieve → connect → ready pipeline, owned by a [`Coordinator`]
//! that bridges hardware occurrences into events and implements the
//! table's effects against the injected radio manager and store.

mod coordinator;
mod effects;
mod state;
mod tables;

pub use coordinator::{Coordinator, CoordinatorBuilder, OccurrenceSink};
pub use state::{AttachEvent, AttachState};

use serde::{Deserialize, Serialize};

/// Status notification published to subscribers.
///
/// Emitted whenever the radio power condition changes and when the
/// machine reaches `Ready`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Status {
    Online,
    Offline,
    Ready,
}
