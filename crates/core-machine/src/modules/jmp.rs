use crate::call_stack::FrameKind;
use crate::machine::Machine;
use crate::registry::{Module, OpHandler, SpecialCaseOperation};
use core_model::{RuntimeError, RuntimeResult};
use core_script::CommandElement;

/// Flow-control module. Every operation here is a special case: jumps and
/// calls own the instruction pointer outright.

fn int_param(machine: &mut Machine, command: &CommandElement, index: usize) -> RuntimeResult<i32> {
    command
        .params
        .get(index)
        .ok_or(RuntimeError::TypeMismatch("missing jump parameter"))?
        .int_value(machine)
}

struct Goto;

impl SpecialCaseOperation for Goto {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        let target = int_param(machine, command, 0)?;
        machine.jump_to_offset(target.max(0) as usize)
    }
}

/// goto_if jumps when the condition holds, goto_unless when it does not.
struct GotoIf {
    negate: bool,
}

impl SpecialCaseOperation for GotoIf {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        let condition = int_param(machine, command, 0)? != 0;
        let target = int_param(machine, command, 1)?;
        if condition != self.negate {
            machine.jump_to_offset(target.max(0) as usize)
        } else {
            machine.advance_ip();
            Ok(())
        }
    }
}

struct Gosub;

impl SpecialCaseOperation for Gosub {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        let target = int_param(machine, command, 0)?;
        let scenario = machine.scene_number();
        // The caller's frame advances first so returning resumes after the
        // call site.
        machine.advance_ip();
        let location = machine.scriptor().load(scenario, target.max(0) as usize)?;
        machine.push_call_frame(location, FrameKind::Gosub);
        Ok(())
    }
}

struct Ret;

impl SpecialCaseOperation for Ret {
    fn execute(&self, machine: &mut Machine, _command: &CommandElement) -> RuntimeResult<()> {
        machine.return_from_call()
    }
}

struct Jump;

impl SpecialCaseOperation for Jump {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        let scenario = int_param(machine, command, 0)?;
        let entry = if command.params.len() > 1 {
            int_param(machine, command, 1)?
        } else {
            0
        };
        let location = if entry == 0 {
            machine.scriptor().load_begin(scenario)?
        } else {
            machine.scriptor().load_entry(scenario, entry)?
        };
        if let Some(frame) = machine.call_stack_mut().top_real_frame_mut() {
            frame.pos = location;
        }
        // Landing at the top of a scenario is a savepoint moment when the
        // archive flags it.
        if machine.scriptor().scenario_config(scenario).enable_seentop_savepoint {
            machine.mark_savepoint_implicit()?;
        }
        Ok(())
    }
}

struct Farcall;

impl SpecialCaseOperation for Farcall {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        let scenario = int_param(machine, command, 0)?;
        let entry = if command.params.len() > 1 {
            int_param(machine, command, 1)?
        } else {
            0
        };
        machine.advance_ip();
        let location = if entry == 0 {
            machine.scriptor().load_begin(scenario)?
        } else {
            machine.scriptor().load_entry(scenario, entry)?
        };
        machine.push_call_frame(location, FrameKind::Farcall);
        Ok(())
    }
}

pub fn module() -> RuntimeResult<Module> {
    let mut module = Module::new("Jmp", 0, 1);
    module.add_opcode(0, 0, "goto", OpHandler::Special(Box::new(Goto)))?;
    module.add_opcode(
        1,
        0,
        "goto_if",
        OpHandler::Special(Box::new(GotoIf { negate: false })),
    )?;
    module.add_opcode(
        2,
        0,
        "goto_unless",
        OpHandler::Special(Box::new(GotoIf { negate: true })),
    )?;
    module.add_opcode(5, 0, "gosub", OpHandler::Special(Box::new(Gosub)))?;
    module.add_opcode(10, 0, "ret", OpHandler::Special(Box::new(Ret)))?;
    module.add_opcode(11, 0, "jump", OpHandler::Special(Box::new(Jump)))?;
    module.add_opcode(12, 0, "farcall", OpHandler::Special(Box::new(Farcall)))?;
    module.add_opcode(13, 0, "rtl", OpHandler::Special(Box::new(Ret)))?;
    // Computed jumps exist in the wild but are not needed yet.
    module.add_unsupported(3, 0, "goto_on")?;
    module.add_unsupported(4, 0, "goto_case")?;
    module.add_unsupported(8, 0, "gosub_on")?;
    Ok(module)
}
