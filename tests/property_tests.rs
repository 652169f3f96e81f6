//! Property-based tests for the machine engine.
//!
//! These tests use proptest to verify engine invariants hold across many
//! randomly generated event sequences.

use proptest::prelude::*;
use tether::{event_enum, state_enum, Machine, MachineBuilder, StepOutcome};

state_enum! {
    pub enum LinkState {
        Down,
        Probing,
        Up,
    }
}

event_enum! {
    pub enum LinkEvent {
        Probe,
        ProbeSucceeded,
        ProbeFailed,
        Reset,
    }
}

fn link_machine() -> Machine<LinkState, LinkEvent, ()> {
    MachineBuilder::new()
        .initial(LinkState::Down)
        .transition(LinkState::Down, LinkEvent::Probe, LinkState::Probing)
        .transition(LinkState::Probing, LinkEvent::ProbeSucceeded, LinkState::Up)
        .transition(LinkState::Probing, LinkEvent::ProbeFailed, LinkState::Down)
        .transition(LinkState::Up, LinkEvent::Reset, LinkState::Down)
        .remain(LinkState::Up, LinkEvent::ProbeSucceeded)
        .recover(LinkState::Probing, LinkState::Down)
        .recover(LinkState::Up, LinkState::Down)
        .build()
        .unwrap()
}

prop_compose! {
    fn arbitrary_event()(variant in 0..4u8) -> LinkEvent {
        match variant {
            0 => LinkEvent::Probe,
            1 => LinkEvent::ProbeSucceeded,
            2 => LinkEvent::ProbeFailed,
            _ => LinkEvent::Reset,
        }
    }
}

proptest! {
    #[test]
    fn machine_always_settles(events in prop::collection::vec(arbitrary_event(), 0..32)) {
        let machine = link_machine();

        for event in events {
            let outcome = machine.handle_event(event, &mut ());
            prop_assert!(machine.state().is_some());
            prop_assert!(!matches!(outcome, StepOutcome::Discarded));
        }
    }

    #[test]
    fn illegal_events_always_land_in_fallback(
        events in prop::collection::vec(arbitrary_event(), 0..32)
    ) {
        let machine = link_machine();

        for event in events {
            let before = machine.state().unwrap();
            match machine.handle_event(event, &mut ()) {
                StepOutcome::Rejected { from, fallback } => {
                    prop_assert_eq!(from, before);
                    // Every policy in this machine falls back to Down.
                    prop_assert_eq!(fallback, LinkState::Down);
                    prop_assert_eq!(machine.state().unwrap(), LinkState::Down);
                }
                StepOutcome::Handled(state) => {
                    prop_assert_eq!(state, before);
                    prop_assert_eq!(machine.state().unwrap(), before);
                }
                StepOutcome::Transitioned { from, to } => {
                    prop_assert_eq!(from, before);
                    prop_assert_eq!(machine.state().unwrap(), to);
                }
                outcome => prop_assert!(false, "unexpected outcome {:?}", outcome),
            }
        }
    }

    #[test]
    fn replay_is_deterministic(events in prop::collection::vec(arbitrary_event(), 0..32)) {
        let first = link_machine();
        let second = link_machine();

        let outcomes_a: Vec<_> = events
            .iter()
            .map(|event| first.handle_event(*event, &mut ()))
            .collect();
        let outcomes_b: Vec<_> = events
            .iter()
            .map(|event| second.handle_event(*event, &mut ()))
            .collect();

        prop_assert_eq!(outcomes_a, outcomes_b);
        prop_assert_eq!(first.state(), second.state());
    }

    #[test]
    fn log_grows_only_on_transitions(events in prop::collection::vec(arbitrary_event(), 0..32)) {
        let machine = link_machine();
        let mut transitions = 0usize;

        for event in events {
            if matches!(
                machine.handle_event(event, &mut ()),
                StepOutcome::Transitioned { .. }
            ) {
                transitions += 1;
            }
        }

        prop_assert_eq!(machine.log().records().len(), transitions);
    }
}
