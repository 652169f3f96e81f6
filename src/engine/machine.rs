//! The machine engine.
//!
//! [`Machine`] applies one event at a time against its tables. Processing
//! is strictly serialized: the current state is taken out of an
//! `Idle | Processing` cell for the duration of [`Machine::handle_event`],
//! so a nested invocation finds no state to act on and is discarded
//! instead of corrupting the step in flight.

use crate::core::{Event, State, TransitionLog, TransitionRecord};
use crate::engine::rules::{Action, EffectError, Hooks, Recovery, Rule};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Engine phase. `Idle` holds the externally visible state; while an event
/// is being processed the machine has no visible state at all.
#[derive(Debug)]
enum Phase<S> {
    Idle(S),
    Processing,
}

/// Observable report of a single [`Machine::handle_event`] call.
///
/// No error type escapes the engine; every outcome, including illegal
/// events and effect failures, is reported through this enum.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome<S> {
    /// A transition rule matched; exit hook, action, and entry hook ran in
    /// order and the machine settled in `to`.
    Transitioned { from: S, to: S },

    /// A remain rule matched; the event was consumed in place without
    /// entry/exit hooks.
    Handled(S),

    /// No rule matched `(from, event)`; the error policy ran and the
    /// machine settled in `fallback`.
    Rejected { from: S, fallback: S },

    /// An effect failed mid-step; the error policy ran and the machine
    /// settled in `fallback`.
    Recovered { from: S, fallback: S },

    /// `handle_event` was entered while another event was in flight; the
    /// nested event was dropped without running anything.
    Discarded,
}

/// A table-driven state machine.
///
/// Built once via [`crate::builder::MachineBuilder`]; the tables are
/// immutable afterwards. `handle_event` is the sole entry point and must
/// be driven from a single serialized caller - the phase cell exists to
/// detect violations of that contract, not to invite concurrent use.
pub struct Machine<S: State, E: Event, C> {
    rules: HashMap<(S, E), Rule<S, E, C>>,
    hooks: HashMap<S, Hooks<S, E, C>>,
    recovery: HashMap<S, Recovery<S, E, C>>,
    fallback: S,
    phase: Mutex<Phase<S>>,
    log: Mutex<TransitionLog<S, E>>,
}

impl<S: State, E: Event, C> Machine<S, E, C> {
    pub(crate) fn assemble(
        initial: S,
        rules: HashMap<(S, E), Rule<S, E, C>>,
        hooks: HashMap<S, Hooks<S, E, C>>,
        recovery: HashMap<S, Recovery<S, E, C>>,
    ) -> Self {
        Self {
            rules,
            hooks,
            recovery,
            fallback: initial.clone(),
            phase: Mutex::new(Phase::Idle(initial)),
            log: Mutex::new(TransitionLog::new()),
        }
    }

    /// The current state, or `None` while an event is being processed.
    pub fn state(&self) -> Option<S> {
        let phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match &*phase {
            Phase::Idle(state) => Some(state.clone()),
            Phase::Processing => None,
        }
    }

    /// Snapshot of the transition log.
    pub fn log(&self) -> TransitionLog<S, E> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Process one event against the tables.
    ///
    /// Rule semantics:
    /// - no rule for `(state, event)` - the event is illegal; the error
    ///   policy action runs and the machine falls back
    /// - [`Rule::Remain`] - the action (if any) runs; the state is
    ///   restored; no entry/exit hooks run
    /// - [`Rule::Transition`] - exit hook of the departing state, then the
    ///   action, then the entry hook of the arriving state, each if
    ///   present; the completed transition is recorded in the log
    ///
    /// Any effect failure along the way lands in the error policy of the
    /// state that was current when the event arrived.
    pub fn handle_event(&self, event: E, ctx: &mut C) -> StepOutcome<S> {
        let Some(current) = self.take_state() else {
            tracing::error!(event = event.name(), "nested event discarded");
            return StepOutcome::Discarded;
        };

        let Some(rule) = self.rules.get(&(current.clone(), event.clone())) else {
            tracing::error!(
                state = current.name(),
                event = event.name(),
                "event is illegal in this state"
            );
            let fallback = self.recover(&current, &event, ctx);
            self.settle(fallback.clone());
            return StepOutcome::Rejected {
                from: current,
                fallback,
            };
        };

        match rule {
            Rule::Remain { action } => {
                if let Some(action) = action.as_deref() {
                    if let Err(error) = action(ctx, &event, &current) {
                        return self.fail(current, event, error, ctx);
                    }
                }
                tracing::debug!(
                    state = current.name(),
                    event = event.name(),
                    "event handled in place"
                );
                self.settle(current.clone());
                StepOutcome::Handled(current)
            }
            Rule::Transition { action, next } => {
                if let Err(error) = self.run_step(&current, next, action, &event, ctx) {
                    return self.fail(current, event, error, ctx);
                }
                tracing::debug!(
                    from = current.name(),
                    to = next.name(),
                    event = event.name(),
                    "transitioned"
                );
                self.record(current.clone(), next.clone(), event);
                self.settle(next.clone());
                StepOutcome::Transitioned {
                    from: current,
                    to: next.clone(),
                }
            }
        }
    }

    /// Exit hook of `from`, then the action, then the entry hook of `next`.
    fn run_step(
        &self,
        from: &S,
        next: &S,
        action: &Option<Action<S, E, C>>,
        event: &E,
        ctx: &mut C,
    ) -> Result<(), EffectError> {
        if let Some(on_exit) = self.hooks.get(from).and_then(|h| h.on_exit.as_deref()) {
            on_exit(ctx, event, from)?;
        }
        if let Some(action) = action.as_deref() {
            action(ctx, event, from)?;
        }
        if let Some(on_entry) = self.hooks.get(next).and_then(|h| h.on_entry.as_deref()) {
            on_entry(ctx, event, next)?;
        }
        Ok(())
    }

    fn fail(&self, current: S, event: E, error: EffectError, ctx: &mut C) -> StepOutcome<S> {
        tracing::error!(
            state = current.name(),
            event = event.name(),
            %error,
            "effect failed"
        );
        let fallback = self.recover(&current, &event, ctx);
        self.settle(fallback.clone());
        StepOutcome::Recovered {
            from: current,
            fallback,
        }
    }

    /// Run the error policy for `from` and return the state to settle in.
    /// A state with no policy entry falls back to the initial state.
    fn recover(&self, from: &S, event: &E, ctx: &mut C) -> S {
        let policy = self.recovery.get(from);
        let fallback = policy
            .map(|p| p.fallback.clone())
            .unwrap_or_else(|| self.fallback.clone());
        if let Some(action) = policy.and_then(|p| p.action.as_deref()) {
            if let Err(error) = action(ctx, event, from) {
                tracing::warn!(
                    state = from.name(),
                    event = event.name(),
                    %error,
                    "recovery action failed"
                );
            }
        }
        fallback
    }

    /// Take the state out of the phase cell, leaving `Processing` behind.
    /// Returns `None` when an event is already in flight. The lock is
    /// never held while effects run, so a nested call on the same thread
    /// observes `Processing` instead of deadlocking.
    fn take_state(&self) -> Option<S> {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *phase, Phase::Processing) {
            Phase::Idle(state) => Some(state),
            Phase::Processing => None,
        }
    }

    fn settle(&self, state: S) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        *phase = Phase::Idle(state);
    }

    fn record(&self, from: S, to: S, event: E) {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let updated = log.record(TransitionRecord {
            from,
            to,
            event,
            at: Utc::now(),
        });
        *log = updated;
    }
}
