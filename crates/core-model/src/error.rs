use thiserror::Error;

/// The closed set of runtime error kinds.
///
/// The dispatcher's propagation policy keys off these variants: inside a
/// `step`, `UnimplementedOpcode` is logged and skipped, every other variant
/// is logged with the current (scenario, line) tag and execution continues.
/// Only `UserPresentable` is allowed to bubble out of the host run loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Out-of-range access into a memory bank.
    #[error("index {index} out of range for bank {bank} (size {size})")]
    BadIndex {
        bank: String,
        index: usize,
        size: usize,
    },

    /// Stack-bank mutation attempted with no real call frame on the stack.
    #[error("no stack frame available for stack-bank mutation")]
    NoStackFrame,

    /// An expression was evaluated at the wrong value type.
    #[error("type mismatch: {0}")]
    TypeMismatch(&'static str),

    /// Assignment through an expression node that is not an l-value.
    #[error("expression is not an l-value")]
    NotAnLvalue,

    /// Pop from an empty call stack.
    #[error("cannot pop from an empty call stack")]
    StackUnderflow,

    /// Operation requires the call stack to be unlocked (or it is already
    /// locked and a second lock was requested).
    #[error("call stack is locked")]
    Locked,

    /// Two modules registered under the same (module-type, module-id) key.
    #[error("module hash clash: {module_type},{module_id}")]
    DuplicateModule { module_type: i32, module_id: i32 },

    /// A command resolved to no registered operation. Non-fatal: the
    /// dispatcher records it and advances the instruction pointer.
    #[error("unimplemented opcode <{module_type}:{module_id}:{opcode},{overload}>{name}")]
    UnimplementedOpcode {
        module_type: i32,
        module_id: i32,
        opcode: i32,
        overload: u8,
        name: String,
    },

    /// A save payload failed to decode; the save directory has been moved
    /// aside for forensics.
    #[error("corrupted save data: {0}")]
    CorruptedSave(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed external data (CGM table, audio spec mismatch, bad
    /// serialized expression, ...).
    #[error("bad format: {0}")]
    BadFormat(String),

    /// An error that must surface to the user as a modal dialog. The
    /// `informative` flag distinguishes "something you did" from "something
    /// broke".
    #[error("{message}")]
    UserPresentable { message: String, informative: bool },
}

impl RuntimeError {
    pub fn user<S: Into<String>>(message: S) -> Self {
        RuntimeError::UserPresentable {
            message: message.into(),
            informative: false,
        }
    }

    /// True when the step loop may swallow this error and continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RuntimeError::UserPresentable { .. })
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unimplemented_opcode_formats_identity() {
        let err = RuntimeError::UnimplementedOpcode {
            module_type: 0,
            module_id: 1,
            opcode: 234,
            overload: 2,
            name: "grpBuffer".into(),
        };
        let text = err.to_string();
        assert!(text.contains("<0:1:234,2>"));
        assert!(text.contains("grpBuffer"));
    }

    #[test]
    fn only_user_presentable_is_fatal() {
        assert!(RuntimeError::NoStackFrame.is_recoverable());
        assert!(RuntimeError::StackUnderflow.is_recoverable());
        assert!(!RuntimeError::user("boom").is_recoverable());
    }
}
