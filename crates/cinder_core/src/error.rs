//! # Object Error Types
//!
//! Every contract violation in the lifecycle manager surfaces as one of these.

use thiserror::Error;

use crate::object::{ObjectRef, ObjectType};

/// Errors that can occur in the object factory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// The handle is null, stale, or its object was already collected.
    #[error("no such entity: {0}")]
    NoSuchEntity(ObjectRef),

    /// The object is checked out of its slot while it runs its own update
    /// or constructor.
    #[error("entity {0} is busy running its own update")]
    Busy(ObjectRef),

    /// Typed access with a type whose tag differs from the object's tag.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// The tag the caller asked for.
        expected: ObjectType,
        /// The tag the object carries.
        actual: ObjectType,
    },

    /// No creator is registered for the tag.
    #[error("no creator registered for {0}")]
    UnknownType(ObjectType),

    /// A creator is already registered for the tag.
    #[error("creator already registered for {0}")]
    DuplicateCreator(ObjectType),

    /// Every pool slot is in use.
    #[error("object pool exhausted: capacity {capacity}")]
    PoolExhausted {
        /// Fixed pool capacity.
        capacity: usize,
    },

    /// Decrement of a reference count that is already zero.
    #[error("entity {0} is already disposed")]
    AlreadyDisposed(ObjectRef),

    /// The creator rejected the construction arguments.
    #[error("invalid arguments for {tag}: {reason}")]
    InvalidArguments {
        /// Tag being constructed.
        tag: ObjectType,
        /// Why the arguments were rejected.
        reason: String,
    },

    /// An operation that must not nest was called from inside `tick()` or
    /// `collect()`.
    #[error("{operation} called during {phase}")]
    Reentrant {
        /// The rejected operation.
        operation: &'static str,
        /// The phase the factory was in.
        phase: &'static str,
    },
}

/// Result type for object operations.
pub type ObjectResult<T> = Result<T, ObjectError>;
