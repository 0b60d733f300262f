use super::{Command, CommandResult, Replay};
use crate::error::StateError;
use crate::store::GuideStore;

/// Manages the history of executed commands for undo/redo functionality
#[derive(Debug, Default)]
pub struct CommandHistory {
    /// Stack of commands that can be undone
    undo_stack: Vec<Command>,
    /// Stack of commands that can be redone
    redo_stack: Vec<Command>,
}

impl CommandHistory {
    /// Creates a new empty command history
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a command and add it to the history if successful
    pub fn execute(&mut self, command: Command, store: &mut GuideStore) -> CommandResult {
        command.apply(store, Replay::No)?;

        log::debug!("executed: {}", command.label());
        self.undo_stack.push(command);
        // History is linear: a new edit discards anything that was undone
        self.redo_stack.clear();
        Ok(())
    }

    /// Undo the last executed command, returning it
    pub fn undo(&mut self, store: &mut GuideStore) -> CommandResult<Command> {
        let command = self.undo_stack.pop().ok_or(StateError::NothingToUndo)?;
        if let Err(err) = command.revert(store) {
            self.undo_stack.push(command);
            return Err(err.into());
        }
        log::debug!("undone: {}", command.label());
        self.redo_stack.push(command.clone());
        Ok(command)
    }

    /// Redo the last undone command, returning it
    pub fn redo(&mut self, store: &mut GuideStore) -> CommandResult<Command> {
        let command = self.redo_stack.pop().ok_or(StateError::NothingToRedo)?;
        if let Err(err) = command.apply(store, Replay::Yes) {
            self.redo_stack.push(command);
            return Err(err.into());
        }
        log::debug!("redone: {}", command.label());
        self.undo_stack.push(command.clone());
        Ok(command)
    }

    /// Returns true if there are commands that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are commands that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_stack(&self) -> &[Command] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[Command] {
        &self.redo_stack
    }
}
