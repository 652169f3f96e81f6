//! Build errors for machine construction.

use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("No rules defined. Add at least one rule")]
    NoRules,

    #[error("Duplicate rule for state '{state}' and event '{event}'")]
    DuplicateRule { state: String, event: String },
}
