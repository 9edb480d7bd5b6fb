//! Expression trees, bytecode elements and script-source diagnostics.
//!
//! The expression engine is a tagged sum evaluated by pattern matching —
//! no virtual dispatch. Every node owns its children; evaluation runs
//! against a [`core_memory::MemoryAccess`] so the same tree works over the
//! live machine, a savepoint replay, or a test harness.

mod command;
mod diagnostics;
mod expr;
mod ops;
mod parser;

pub use command::{CommandElement, Instruction};
pub use diagnostics::{ErrorFormatter, SourceBuffer};
pub use expr::{BankRef, Expr, ReferenceCursor, ValueType};
pub use ops::{apply_binary, apply_unary, BinaryOp, UnaryOp};
pub use parser::parse_serialized;
