use core_object::{GraphicsLayers, GraphicsStack, GraphicsStackEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Graphics-side machine state: the object table, the recorded graphics
/// command stack, and a handful of display flags. Rendering itself happens
/// in the compositor collaborator, which reads this state between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsState {
    pub layers: GraphicsLayers,
    stack: GraphicsStack,
    /// Stack contents captured at the last savepoint.
    saved_stack: GraphicsStack,
    pub interface_hidden: bool,
    /// Window subtitle, used for save headers.
    pub window_subtitle: String,
}

impl GraphicsState {
    pub fn with_object_ceiling(ceiling: usize) -> Self {
        Self {
            layers: GraphicsLayers::with_ceiling(ceiling),
            ..Self::default()
        }
    }

    /// Record a stack-building graphics command for replay on load.
    pub fn record_command(&mut self, entry: GraphicsStackEntry) {
        debug!(target: "object", command = %entry.command, "graphics stack record");
        self.stack.push(entry);
    }

    pub fn pop_newest_command(&mut self) {
        self.stack.pop_newest();
    }

    pub fn stack(&self) -> &GraphicsStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut GraphicsStack {
        &mut self.stack
    }

    /// Capture the stack for the savepoint snapshot.
    pub fn take_savepoint_snapshot(&mut self) {
        self.saved_stack = self.stack.clone();
    }

    pub fn saved_stack(&self) -> &GraphicsStack {
        &self.saved_stack
    }

    pub fn replace_stack(&mut self, stack: GraphicsStack) {
        self.stack = stack;
    }

    /// Full reset: free all objects and clear both stacks.
    pub fn reset(&mut self) {
        self.layers.clear_all();
        self.stack.clear();
        self.saved_stack.clear();
        self.interface_hidden = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savepoint_snapshot_freezes_the_stack() {
        let mut state = GraphicsState::default();
        state.record_command(GraphicsStackEntry::new("grpLoad"));
        state.take_savepoint_snapshot();
        state.record_command(GraphicsStackEntry::new("objMove"));

        assert_eq!(state.stack().len(), 2);
        assert_eq!(state.saved_stack().len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = GraphicsState::default();
        state.record_command(GraphicsStackEntry::new("grpLoad"));
        state.interface_hidden = true;
        state.reset();
        assert!(state.stack().is_empty());
        assert!(!state.interface_hidden);
    }
}
