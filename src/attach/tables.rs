//! The attachment machine's rule, hook, and error-policy tables.

use crate::attach::coordinator::Context;
use crate::attach::effects;
use crate::attach::state::{AttachEvent, AttachState};
use crate::builder::{BuildError, MachineBuilder};
use crate::engine::Machine;

/// Build the attachment machine.
///
/// `RadioOnline` is accepted everywhere as an informational no-op so
/// duplicate power callbacks cannot reset the pipeline, and
/// `Ready + ConnectSucceeded` is accepted so connect completions landing
/// after the scan path already reached `Ready` do not trip the error
/// policy. Every other absent pair is an illegal event and falls back to
/// `Start`.
pub(crate) fn attach_machine() -> Result<Machine<AttachState, AttachEvent, Context>, BuildError> {
    use AttachEvent::*;
    use AttachState::*;

    MachineBuilder::new()
        .initial(Start)
        // Start
        .transition(Start, Scan, Scanning)
        .transition(Start, Retrieve, Retrieving)
        .remain(Start, RadioOffline)
        .remain(Start, RadioOnline)
        // Scanning
        .transition_with(Scanning, ScanSucceeded, Ready, effects::perform_connect)
        .transition(Scanning, RadioOffline, Start)
        .remain(Scanning, RadioOnline)
        // Retrieving
        .transition(Retrieving, RetrieveFailed, Scanning)
        .transition(Retrieving, ConnectSucceeded, Ready)
        .transition(Retrieving, ConnectFailed, Start)
        .transition(Retrieving, RadioOffline, Start)
        .remain(Retrieving, RadioOnline)
        // Ready
        .transition(Ready, RadioOffline, Start)
        .remain(Ready, Disconnected)
        .remain(Ready, DisconnectedWithError)
        .remain(Ready, ConnectSucceeded)
        .remain(Ready, RadioOnline)
        // State entry effects
        .on_entry(Scanning, effects::perform_scan)
        .on_entry(Retrieving, effects::perform_retrieve)
        .on_entry(Ready, effects::perform_notify_attached)
        // Error policy: everything falls back to Start
        .recover_with(Start, Start, effects::trace_recovery)
        .recover_with(Scanning, Start, effects::trace_recovery)
        .recover_with(Retrieving, Start, effects::trace_recovery)
        .recover_with(Ready, Start, effects::trace_recovery)
        .build()
}
