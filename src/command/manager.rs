use tracing::debug;

use super::{Command, Snapshot};
use crate::error::Result;

struct HistoryEntry<T: Snapshot> {
    command: Box<dyn Command<T>>,
    before: T::State,
    after: T::State,
}

/// Linear undo/redo history over an external target.
///
/// The manager never owns the target; every operation receives it by mutable
/// reference. Executing a new command discards the redo branch.
pub struct CommandManager<T: Snapshot> {
    undo_stack: Vec<HistoryEntry<T>>,
    redo_stack: Vec<HistoryEntry<T>>,
}

impl<T: Snapshot> Default for CommandManager<T> {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }
}

impl<T: Snapshot> std::fmt::Debug for CommandManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .finish()
    }
}

impl<T: Snapshot> CommandManager<T> {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `command` to `target` and records it.
    ///
    /// # Errors
    ///
    /// Propagates the command's error. The target is restored to its state
    /// before the call and the history is left untouched.
    pub fn execute<C>(&mut self, target: &mut T, command: C) -> Result<()>
    where
        C: Command<T> + 'static,
    {
        self.execute_boxed(target, Box::new(command), false)
    }

    /// Like [`execute`](Self::execute), but merges the command into the
    /// previous history entry when that entry's command accepts it.
    ///
    /// # Errors
    ///
    /// Propagates the command's error; see [`execute`](Self::execute).
    pub fn execute_joined<C>(&mut self, target: &mut T, command: C) -> Result<()>
    where
        C: Command<T> + 'static,
    {
        self.execute_boxed(target, Box::new(command), true)
    }

    /// Applies an already boxed command.
    ///
    /// # Errors
    ///
    /// Propagates the command's error; see [`execute`](Self::execute).
    pub fn execute_boxed(
        &mut self,
        target: &mut T,
        command: Box<dyn Command<T>>,
        join: bool,
    ) -> Result<()> {
        let before = target.snapshot();
        if let Err(err) = command.apply(target) {
            debug!(command = %command.describe(), error = %err, "command failed, state restored");
            target.restore(before);
            return Err(err);
        }
        let after = target.snapshot();
        self.redo_stack.clear();

        if join {
            if let Some(top) = self.undo_stack.last_mut() {
                if top.command.join(command.as_ref()) {
                    debug!(command = %top.command.describe(), "command joined with previous");
                    top.after = after;
                    return Ok(());
                }
            }
        }

        debug!(command = %command.describe(), "command executed");
        self.undo_stack.push(HistoryEntry {
            command,
            before,
            after,
        });
        Ok(())
    }

    /// Restores the state before the last command. Returns `false` (and does
    /// nothing) if there is nothing to undo.
    pub fn undo(&mut self, target: &mut T) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        debug!(command = %entry.command.describe(), "undo");
        target.restore(entry.before.clone());
        self.redo_stack.push(entry);
        true
    }

    /// Re-applies the last undone command. Returns `false` (and does nothing)
    /// if there is nothing to redo.
    pub fn redo(&mut self, target: &mut T) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        debug!(command = %entry.command.describe(), "redo");
        target.restore(entry.after.clone());
        self.undo_stack.push(entry);
        true
    }

    /// Returns `true` if [`undo`](Self::undo) would do something.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if [`redo`](Self::redo) would do something.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The command that [`undo`](Self::undo) would revert.
    #[must_use]
    pub fn last_command(&self) -> Option<&dyn Command<T>> {
        self.undo_stack.last().map(|e| e.command.as_ref())
    }

    /// The command that [`redo`](Self::redo) would re-apply.
    #[must_use]
    pub fn next_command(&self) -> Option<&dyn Command<T>> {
        self.redo_stack.last().map(|e| e.command.as_ref())
    }

    /// Number of undoable steps.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable steps.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Descriptions of the undoable steps, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.undo_stack.iter().map(|e| e.command.describe()).collect()
    }

    /// Forgets the whole history without touching any target.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::error::{Error, GeometryError};

    #[derive(Debug, Default)]
    struct Counter {
        values: Vec<i64>,
    }

    impl Snapshot for Counter {
        type State = Vec<i64>;

        fn snapshot(&self) -> Vec<i64> {
            self.values.clone()
        }

        fn restore(&mut self, state: Vec<i64>) {
            self.values = state;
        }
    }

    #[derive(Debug)]
    struct Push(i64);

    impl Command<Counter> for Push {
        fn apply(&self, target: &mut Counter) -> Result<()> {
            target.values.push(self.0);
            Ok(())
        }

        fn describe(&self) -> String {
            format!("push {}", self.0)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Adds to the last value; consecutive adds join into one step.
    #[derive(Debug)]
    struct AddToLast(i64);

    impl Command<Counter> for AddToLast {
        fn apply(&self, target: &mut Counter) -> Result<()> {
            let last = target.values.last_mut().ok_or(GeometryError::ZeroVector)?;
            *last += self.0;
            Ok(())
        }

        fn describe(&self) -> String {
            format!("add {}", self.0)
        }

        fn join(&mut self, next: &dyn Command<Counter>) -> bool {
            match next.as_any().downcast_ref::<Self>() {
                Some(other) => {
                    self.0 += other.0;
                    true
                }
                None => false,
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Mutates the target and then fails.
    #[derive(Debug)]
    struct Broken;

    impl Command<Counter> for Broken {
        fn apply(&self, target: &mut Counter) -> Result<()> {
            target.values.clear();
            target.values.push(-1);
            Err(GeometryError::Degenerate("broken".into()).into())
        }

        fn describe(&self) -> String {
            "broken".into()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn n_commands_then_n_undos_restore_initial_state() {
        let mut target = Counter { values: vec![7] };
        let initial = target.snapshot();
        let mut manager = CommandManager::new();
        for i in 0..10 {
            manager.execute(&mut target, Push(i)).unwrap();
        }
        assert_eq!(target.values.len(), 11);
        for _ in 0..10 {
            assert!(manager.undo(&mut target));
        }
        assert_eq!(target.snapshot(), initial);
        assert!(!manager.can_undo());
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_are_noops() {
        let mut target = Counter { values: vec![1, 2] };
        let mut manager: CommandManager<Counter> = CommandManager::new();
        assert!(!manager.undo(&mut target));
        assert!(!manager.redo(&mut target));
        assert_eq!(target.values, vec![1, 2]);
    }

    #[test]
    fn redo_reapplies_after_state() {
        let mut target = Counter::default();
        let mut manager = CommandManager::new();
        manager.execute(&mut target, Push(1)).unwrap();
        manager.execute(&mut target, Push(2)).unwrap();
        manager.undo(&mut target);
        manager.undo(&mut target);
        assert!(target.values.is_empty());
        assert_eq!(manager.redo_len(), 2);
        assert!(manager.redo(&mut target));
        assert_eq!(target.values, vec![1]);
        assert_eq!(manager.next_command().unwrap().describe(), "push 2");
        assert!(manager.redo(&mut target));
        assert_eq!(target.values, vec![1, 2]);
        assert!(!manager.can_redo());
    }

    #[test]
    fn new_command_discards_redo_branch() {
        let mut target = Counter::default();
        let mut manager = CommandManager::new();
        manager.execute(&mut target, Push(1)).unwrap();
        manager.execute(&mut target, Push(2)).unwrap();
        manager.undo(&mut target);
        assert!(manager.can_redo());
        manager.execute(&mut target, Push(3)).unwrap();
        assert!(!manager.can_redo());
        assert_eq!(target.values, vec![1, 3]);
        assert_eq!(manager.history(), vec!["push 1", "push 3"]);
    }

    #[test]
    fn failed_command_restores_target_and_is_not_recorded() {
        let mut target = Counter { values: vec![4, 5] };
        let mut manager = CommandManager::new();
        manager.execute(&mut target, Push(6)).unwrap();
        manager.undo(&mut target);

        let result = manager.execute(&mut target, Broken);
        assert!(matches!(result, Err(Error::Geometry(GeometryError::Degenerate(_)))));
        assert_eq!(target.values, vec![4, 5]);
        assert_eq!(manager.undo_len(), 0);
        assert!(manager.can_redo());
    }

    #[test]
    fn joined_commands_form_one_step() {
        let mut target = Counter { values: vec![0] };
        let mut manager = CommandManager::new();
        manager.execute(&mut target, Push(10)).unwrap();
        manager.execute_joined(&mut target, AddToLast(1)).unwrap();
        manager.execute_joined(&mut target, AddToLast(2)).unwrap();
        manager.execute_joined(&mut target, AddToLast(3)).unwrap();

        assert_eq!(target.values, vec![0, 16]);
        assert_eq!(manager.undo_len(), 2);
        assert_eq!(manager.last_command().unwrap().describe(), "add 6");

        manager.undo(&mut target);
        assert_eq!(target.values, vec![0, 10]);
        manager.redo(&mut target);
        assert_eq!(target.values, vec![0, 16]);
    }

    #[test]
    fn clear_forgets_history() {
        let mut target = Counter::default();
        let mut manager = CommandManager::new();
        manager.execute(&mut target, Push(1)).unwrap();
        manager.clear();
        assert!(!manager.can_undo());
        assert_eq!(target.values, vec![1]);
    }
}
