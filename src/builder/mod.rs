//! Builder API for ergonomic machine construction.
//!
//! [`MachineBuilder`] populates the rule, hook, and error-policy tables
//! with construction-time validation; the [`crate::state_enum!`] and
//! [`crate::event_enum!`] macros cut the boilerplate of declaring the
//! enums that drive a machine.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;
