//! The bytecode execution engine.
//!
//! A [`Machine`] advances by one unit of work per [`Machine::step`]: either
//! one resolved bytecode instruction, or one tick of the topmost long
//! operation. Everything time- or input-driven (waits, pauses, typewriter
//! text, selections) is a [`LongOperation`] stacked as a call frame; the
//! call stack defers structural mutation while a long operation runs so
//! the operation may itself push or pop frames safely.

mod call_stack;
mod environment;
mod graphics;
mod longop;
pub mod longops;
mod machine;
pub mod modules;
mod registry;
mod scriptor;

pub use call_stack::{CallStack, FrameKind, SavedFrame, StackFrame};
pub use environment::{Generics, MachineEnvironment, SyscomEntryState, SyscomTable, TimerBank};
pub use graphics::GraphicsState;
pub use longop::{AfterLongOpDecorator, LongOperation, PageFinalizer};
pub use machine::{Machine, MachineParts, MachineStateSnapshot};
pub use registry::{
    Arg, Module, ModuleRegistry, OpHandler, OpProperty, Operation, ParamShape, RegisteredOp,
    SpecialCaseOperation,
};
pub use scriptor::{MemoryScriptor, Scriptor};
