//! Tether: a table-driven state machine for attaching to remote radio
//! peripherals.
//!
//! The machine core is split into a pure half and an imperative shell.
//! States, events, and the transition log carry no side effects; the
//! engine executes uniformly fallible effects against three immutable
//! tables - per-`(state, event)` rules, per-state entry/exit hooks, and a
//! per-state error policy - behind an `Idle | Processing` re-entrancy
//! guard.
//!
//! On top of the generic engine, [`attach`] provides the concrete
//! scan → retrieve → connect → ready pipeline: a [`Coordinator`] that
//! serializes hardware occurrences onto a single command queue, drives
//! the machine, and publishes `Online` / `Offline` / `Ready` status
//! notifications to subscribers.
//!
//! # Core Concepts
//!
//! - **State / Event**: type-safe enums via the [`core::State`] and
//!   [`core::Event`] traits
//! - **Rules**: tagged `(state, event)` entries - remain in place, or
//!   transition with ordered exit/action/entry effects
//! - **Error policy**: illegal events and effect failures land in a
//!   deterministic per-state fallback; nothing panics, nothing escapes
//!
//! # Example
//!
//! ```rust
//! use tether::{event_enum, state_enum, MachineBuilder, StepOutcome};
//!
//! state_enum! {
//!     pub enum Door {
//!         Closed,
//!         Open,
//!     }
//! }
//!
//! event_enum! {
//!     pub enum Knob {
//!         Turn,
//!     }
//! }
//!
//! let machine = MachineBuilder::<Door, Knob, ()>::new()
//!     .initial(Door::Closed)
//!     .transition(Door::Closed, Knob::Turn, Door::Open)
//!     .build()?;
//!
//! let outcome = machine.handle_event(Knob::Turn, &mut ());
//! assert_eq!(
//!     outcome,
//!     StepOutcome::Transitioned {
//!         from: Door::Closed,
//!         to: Door::Open,
//!     }
//! );
//! # Ok::<(), tether::BuildError>(())
//! ```

pub mod attach;
pub mod builder;
pub mod core;
pub mod engine;
pub mod radio;
pub mod store;

// Re-export commonly used types
pub use attach::{AttachEvent, AttachState, Coordinator, CoordinatorBuilder, OccurrenceSink, Status};
pub use builder::{BuildError, MachineBuilder};
pub use core::{Event, State, TransitionLog, TransitionRecord};
pub use engine::{Action, EffectError, Machine, StepOutcome};
pub use radio::{
    DeviceId, Occurrence, Peripheral, RadioError, RadioManager, RadioPower, ServiceId,
};
pub use store::{AttachedRecord, AttachedStore, JsonStore, MemoryStore, StoreError};
