//! Generic snapshot-based undo/redo.
//!
//! A target exposes its mutable state through [`Snapshot`]; commands mutate
//! the target through [`Command::apply`]; [`CommandManager`] records a
//! `(before, after)` state pair for every successful command.

mod manager;

pub use manager::CommandManager;

use std::any::Any;
use std::fmt;

use crate::error::Result;

/// Save/restore contract of a command target.
pub trait Snapshot {
    /// Full copy of the target's restorable state.
    type State: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Captures the current state.
    fn snapshot(&self) -> Self::State;

    /// Overwrites the current state.
    fn restore(&mut self, state: Self::State);
}

/// A replayable mutation of a target `T`.
pub trait Command<T>: fmt::Debug + Send + Sync {
    /// Applies the mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation cannot be performed. The target may
    /// be partially modified; [`CommandManager`] restores it.
    fn apply(&self, target: &mut T) -> Result<()>;

    /// Human-readable description for history listings.
    fn describe(&self) -> String;

    /// Whether applying this command takes noticeable time.
    fn is_slow(&self) -> bool {
        false
    }

    /// Tries to absorb `next` (already applied) into this command so both
    /// form one undo step. Returns `true` on success.
    fn join(&mut self, _next: &dyn Command<T>) -> bool {
        false
    }

    /// Type-erased view used by [`Command::join`] implementations to downcast.
    fn as_any(&self) -> &dyn Any;
}
