//! Transition log.
//!
//! Immutable record of the state changes a machine has performed, kept for
//! diagnostics. Only completed transitions are recorded; events handled in
//! place and rejected events never appear here.

use super::state::{Event, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single completed transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionRecord<S: State, E: Event> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// The event that triggered the transition
    pub event: E,
    /// When the transition completed
    pub at: DateTime<Utc>,
}

/// Ordered log of completed transitions.
///
/// The log is immutable - [`record`](TransitionLog::record) returns a new
/// log with the record appended.
///
/// # Example
///
/// ```rust
/// use tether::core::{TransitionLog, TransitionRecord};
/// use tether::{event_enum, state_enum};
/// use chrono::Utc;
///
/// state_enum! {
///     pub enum Door {
///         Closed,
///         Open,
///     }
/// }
///
/// event_enum! {
///     pub enum Knob {
///         Turn,
///     }
/// }
///
/// let log = TransitionLog::new();
/// let log = log.record(TransitionRecord {
///     from: Door::Closed,
///     to: Door::Open,
///     event: Knob::Turn,
///     at: Utc::now(),
/// });
///
/// assert_eq!(log.path(), vec![&Door::Closed, &Door::Open]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionLog<S: State, E: Event> {
    records: Vec<TransitionRecord<S, E>>,
}

impl<S: State, E: Event> Default for TransitionLog<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, E: Event> TransitionLog<S, E> {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a transition, returning a new log.
    pub fn record(&self, record: TransitionRecord<S, E>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// Get the path of states traversed: the initial `from`, then the `to`
    /// state of each record.
    pub fn path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            path.push(&first.from);
        }
        for record in &self.records {
            path.push(&record.to);
        }
        path
    }

    /// Total duration from first to last recorded transition, or `None`
    /// when the log is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            let duration = last.at.signed_duration_since(first.at);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// All records, in order.
    pub fn records(&self) -> &[TransitionRecord<S, E>] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Start,
        Middle,
        End,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Middle => "Middle",
                Self::End => "End",
            }
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestEvent {
        Step,
    }

    impl Event for TestEvent {
        fn name(&self) -> &str {
            match self {
                Self::Step => "Step",
            }
        }
    }

    fn record(from: TestState, to: TestState) -> TransitionRecord<TestState, TestEvent> {
        TransitionRecord {
            from,
            to,
            event: TestEvent::Step,
            at: Utc::now(),
        }
    }

    #[test]
    fn new_log_is_empty() {
        let log: TransitionLog<TestState, TestEvent> = TransitionLog::new();
        assert!(log.records().is_empty());
        assert!(log.path().is_empty());
        assert!(log.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let log = TransitionLog::new();
        let updated = log.record(record(TestState::Start, TestState::Middle));

        assert_eq!(log.records().len(), 0);
        assert_eq!(updated.records().len(), 1);
    }

    #[test]
    fn path_returns_state_sequence() {
        let log = TransitionLog::new()
            .record(record(TestState::Start, TestState::Middle))
            .record(record(TestState::Middle, TestState::End));

        let path = log.path();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], &TestState::Start);
        assert_eq!(path[1], &TestState::Middle);
        assert_eq!(path[2], &TestState::End);
    }

    #[test]
    fn duration_covers_first_to_last() {
        let log = TransitionLog::new().record(record(TestState::Start, TestState::Middle));
        std::thread::sleep(Duration::from_millis(10));
        let log = log.record(record(TestState::Middle, TestState::End));

        let duration = log.duration().unwrap();
        assert!(duration >= Duration::from_millis(10));
    }

    #[test]
    fn log_serializes_correctly() {
        let log = TransitionLog::new().record(record(TestState::Start, TestState::Middle));

        let json = serde_json::to_string(&log).unwrap();
        let deserialized: TransitionLog<TestState, TestEvent> =
            serde_json::from_str(&json).unwrap();

        assert_eq!(log.records().len(), deserialized.records().len());
    }
}
