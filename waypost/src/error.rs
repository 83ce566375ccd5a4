//! Errors raised while declaring, registering and invoking controllers.

use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Shared pointer to an arbitrary error. Handler failures are reported using this type, so any
/// error can travel through the middleware chain and the error-wrapping adapter.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Declaration-time inconsistencies detected while registering a controller. These are surfaced
/// immediately at startup.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ConfigurationError {
    #[error("No routing metadata declared for controller: {0}")]
    MissingMetadata(String),
    #[error("Route '{member}' of controller {controller} has no HTTP verb")]
    MissingVerb { controller: String, member: String },
    #[error("Route '{member}' of controller {controller} binds slot {slot} more than once")]
    DuplicateSlot {
        controller: String,
        member: String,
        slot: usize,
    },
    #[error(
        "Route '{member}' of controller {controller} binds slot {slot}, but the handler takes {arity} arguments"
    )]
    SlotOutOfRange {
        controller: String,
        member: String,
        slot: usize,
        arity: usize,
    },
    #[error("Route '{member}' of controller {controller} never binds slot {slot}")]
    UnboundSlot {
        controller: String,
        member: String,
        slot: usize,
    },
    #[error("Route '{member}' of controller {controller} is declared as both {first} and {second}")]
    ConflictingVerbs {
        controller: String,
        member: String,
        first: String,
        second: String,
    },
    #[error("Invalid error status code: {0}")]
    InvalidErrorStatus(u16),
}

/// Errors raised when a compiled route calls into its controller.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InvocationError {
    #[error("Controller has no handler named '{0}'")]
    UnknownMember(String),
    #[error("Cannot pass argument {slot} to '{member}': expected {expected}, found {found}")]
    ArgumentMismatch {
        member: String,
        slot: usize,
        expected: &'static str,
        found: &'static str,
    },
}
