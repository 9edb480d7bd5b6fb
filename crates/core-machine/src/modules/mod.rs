//! Built-in operation modules.
//!
//! Each module groups handlers under one (module-type, module-id) key and
//! registers them opcode by opcode, mirroring the layout of the original
//! command set. The full table is enormous; the modules here cover the
//! control-flow, memory, message, selection, object and system families
//! the core exercises, plus named `Unsupported` placeholders showing how
//! unimplemented opcodes stay visible to the trace log.

mod grp;
mod jmp;
mod mem;
mod msg;
mod obj;
mod sel;
mod sys;

use crate::registry::ModuleRegistry;
use core_model::RuntimeResult;

pub use sel::default_button_hit_test;

/// Build the standard registry. Called once at startup; the result is
/// shared immutably by every machine.
pub fn standard_registry() -> RuntimeResult<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    registry.attach_module(jmp::module()?)?;
    registry.attach_module(mem::module()?)?;
    registry.attach_module(msg::module()?)?;
    registry.attach_module(sel::module()?)?;
    registry.attach_module(sys::module()?)?;
    registry.attach_module(grp::module()?)?;
    registry.attach_module(obj::creation_module(core_object::Layer::Foreground)?)?;
    registry.attach_module(obj::creation_module(core_object::Layer::Background)?)?;
    registry.attach_module(obj::management_module(core_object::Layer::Foreground)?)?;
    registry.attach_module(obj::management_module(core_object::Layer::Background)?)?;
    Ok(registry)
}
