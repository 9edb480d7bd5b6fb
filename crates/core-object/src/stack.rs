use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Cap on recorded graphics commands; the oldest entry drops when a new
/// one would exceed it.
pub const GRAPHICS_STACK_CAP: usize = 127;

/// One positional argument of a recorded command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicsStackValue {
    Int(i32),
    Str(String),
}

/// One recorded stack-building graphics command.
///
/// Entries round-trip semantically, not byte-exactly: the operation key,
/// its name and the evaluated arguments are enough to re-dispatch the
/// command against a fresh machine during load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsStackEntry {
    pub command: String,
    /// (module-type, module-id, opcode, overload) of the recording op.
    #[serde(default)]
    pub key: Option<(i32, i32, i32, u8)>,
    #[serde(default)]
    pub args: Vec<GraphicsStackValue>,
}

impl GraphicsStackEntry {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            key: None,
            args: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: (i32, i32, i32, u8)) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_args(mut self, args: Vec<GraphicsStackValue>) -> Self {
        self.args = args;
        self
    }

    pub fn push_int(&mut self, value: i32) {
        self.args.push(GraphicsStackValue::Int(value));
    }

    pub fn push_str(&mut self, value: impl Into<String>) {
        self.args.push(GraphicsStackValue::Str(value.into()));
    }
}

/// Bounded record of the graphics operations that built the current scene.
///
/// The live call stack is not serialized into save slots; instead this
/// deque is replayed against a fresh machine to rebuild graphics state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsStack {
    entries: VecDeque<GraphicsStackEntry>,
}

impl GraphicsStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: GraphicsStackEntry) {
        self.entries.push_back(entry);
        if self.entries.len() > GRAPHICS_STACK_CAP {
            self.entries.pop_front();
        }
    }

    /// Drop the most recent entry (used when a recorded command is undone
    /// by a follow-up operation).
    pub fn pop_newest(&mut self) {
        self.entries.pop_back();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &GraphicsStackEntry> {
        self.entries.iter()
    }

    /// Take all entries in replay order, leaving the stack empty.
    pub fn drain(&mut self) -> Vec<GraphicsStackEntry> {
        self.entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_past_the_cap() {
        let mut stack = GraphicsStack::new();
        for i in 0..(GRAPHICS_STACK_CAP + 10) {
            stack.push(GraphicsStackEntry::new(format!("cmd{i}")));
        }
        assert_eq!(stack.len(), GRAPHICS_STACK_CAP);
        assert_eq!(stack.iter().next().unwrap().command, "cmd10");
    }

    #[test]
    fn drain_preserves_replay_order() {
        let mut stack = GraphicsStack::new();
        stack.push(GraphicsStackEntry::new("first"));
        stack.push(GraphicsStackEntry::new("second"));
        let drained = stack.drain();
        assert!(stack.is_empty());
        assert_eq!(drained[0].command, "first");
        assert_eq!(drained[1].command, "second");
    }

    #[test]
    fn entries_round_trip_through_serde() {
        let mut entry = GraphicsStackEntry::new("objOfFile").with_key((1, 81, 1000, 0));
        entry.push_int(4);
        entry.push_str("bg01");
        let json = serde_json::to_string(&entry).unwrap();
        let back: GraphicsStackEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
        assert_eq!(
            back.args,
            vec![
                GraphicsStackValue::Int(4),
                GraphicsStackValue::Str("bg01".into())
            ]
        );
    }
}
