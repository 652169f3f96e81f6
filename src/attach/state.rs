//! States and events of the attachment machine.

crate::state_enum! {
    /// Lifecycle states of the attachment pipeline.
    ///
    /// Exactly one is current between events; `Start` is both the initial
    /// state and the fallback every error policy lands in.
    pub enum AttachState {
        Start,
        Scanning,
        Retrieving,
        Ready,
    }
}

crate::event_enum! {
    /// Occurrences the attachment machine consumes.
    pub enum AttachEvent {
        /// The radio transport is powered on and available.
        RadioOnline,
        /// The radio transport is not available (several possible reasons).
        RadioOffline,
        Scan,
        ScanSucceeded,
        Retrieve,
        RetrieveFailed,
        ConnectSucceeded,
        ConnectFailed,
        Disconnected,
        DisconnectedWithError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, State};

    #[test]
    fn names_match_variants() {
        assert_eq!(AttachState::Retrieving.name(), "Retrieving");
        assert_eq!(AttachEvent::ScanSucceeded.name(), "ScanSucceeded");
        assert_eq!(
            AttachEvent::DisconnectedWithError.name(),
            "DisconnectedWithError"
        );
    }
}
