//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::core::{Event, State};
use crate::engine::{EffectError, Hooks, Machine, Recovery, Rule};
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for constructing machines with a fluent API.
///
/// The three tables - rules, entry/exit hooks, error policies - are
/// populated here and frozen at [`build`](MachineBuilder::build). A
/// duplicate `(state, event)` rule is rejected rather than silently
/// overwritten.
pub struct MachineBuilder<S: State, E: Event, C> {
    initial: Option<S>,
    rules: HashMap<(S, E), Rule<S, E, C>>,
    hooks: HashMap<S, Hooks<S, E, C>>,
    recovery: HashMap<S, Recovery<S, E, C>>,
    duplicates: Vec<(S, E)>,
}

impl<S: State, E: Event, C> MachineBuilder<S, E, C> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            rules: HashMap::new(),
            hooks: HashMap::new(),
            recovery: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Set the initial state (required). The initial state doubles as the
    /// fallback for states without an explicit error policy.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Consume `event` in `state` without leaving it. No entry/exit hooks
    /// run for this rule.
    pub fn remain(self, state: S, event: E) -> Self {
        self.rule(state, event, Rule::Remain { action: None })
    }

    /// Like [`remain`](MachineBuilder::remain), with a transition-level
    /// action.
    pub fn remain_with<F>(self, state: S, event: E, action: F) -> Self
    where
        F: Fn(&mut C, &E, &S) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.rule(
            state,
            event,
            Rule::Remain {
                action: Some(Arc::new(action)),
            },
        )
    }

    /// Move from `from` to `next` on `event`, running exit and entry hooks.
    pub fn transition(self, from: S, event: E, next: S) -> Self {
        self.rule(from, event, Rule::Transition { action: None, next })
    }

    /// Like [`transition`](MachineBuilder::transition), with a
    /// transition-level action between the exit and entry hooks.
    pub fn transition_with<F>(self, from: S, event: E, next: S, action: F) -> Self
    where
        F: Fn(&mut C, &E, &S) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.rule(
            from,
            event,
            Rule::Transition {
                action: Some(Arc::new(action)),
                next,
            },
        )
    }

    /// Set the entry hook for `state`.
    pub fn on_entry<F>(mut self, state: S, action: F) -> Self
    where
        F: Fn(&mut C, &E, &S) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.hooks.entry(state).or_default().on_entry = Some(Arc::new(action));
        self
    }

    /// Set the exit hook for `state`.
    pub fn on_exit<F>(mut self, state: S, action: F) -> Self
    where
        F: Fn(&mut C, &E, &S) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.hooks.entry(state).or_default().on_exit = Some(Arc::new(action));
        self
    }

    /// Set the error policy for `state`: fall back to `fallback` when an
    /// event is illegal or an effect fails there.
    pub fn recover(mut self, state: S, fallback: S) -> Self {
        self.recovery.insert(
            state,
            Recovery {
                action: None,
                fallback,
            },
        );
        self
    }

    /// Like [`recover`](MachineBuilder::recover), with a policy action run
    /// before falling back.
    pub fn recover_with<F>(mut self, state: S, fallback: S, action: F) -> Self
    where
        F: Fn(&mut C, &E, &S) -> Result<(), EffectError> + Send + Sync + 'static,
    {
        self.recovery.insert(
            state,
            Recovery {
                action: Some(Arc::new(action)),
                fallback,
            },
        );
        self
    }

    /// Build the machine.
    /// Returns an error if required pieces are missing or a rule was
    /// defined twice.
    pub fn build(self) -> Result<Machine<S, E, C>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if let Some((state, event)) = self.duplicates.into_iter().next() {
            return Err(BuildError::DuplicateRule {
                state: state.name().to_string(),
                event: event.name().to_string(),
            });
        }

        if self.rules.is_empty() {
            return Err(BuildError::NoRules);
        }

        Ok(Machine::assemble(
            initial,
            self.rules,
            self.hooks,
            self.recovery,
        ))
    }

    fn rule(mut self, state: S, event: E, rule: Rule<S, E, C>) -> Self {
        if self.rules.contains_key(&(state.clone(), event.clone())) {
            self.duplicates.push((state, event));
        } else {
            self.rules.insert((state, event), rule);
        }
        self
    }
}

impl<S: State, E: Event, C> Default for MachineBuilder<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}
