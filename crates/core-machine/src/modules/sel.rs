use crate::longops::{
    ButtonObjectSelectLongOperation, SelectBtnLongOperation, SelectLongOperation, SelectOption,
};
use crate::machine::Machine;
use crate::registry::{Module, OpHandler, SpecialCaseOperation};
use core_model::{Point, Rect, RuntimeResult};
use core_object::{Drawer, GraphicsObject};
use core_script::CommandElement;

/// Selection command family. These are special cases: the instruction
/// pointer advances before the modal long operation is pushed, so the
/// machine resumes on the instruction after the selection once the choice
/// lands in the store register.

fn options_from_params(
    machine: &mut Machine,
    command: &CommandElement,
    skip: usize,
) -> RuntimeResult<Vec<SelectOption>> {
    let mut options = Vec::new();
    for param in command.params.iter().skip(skip) {
        options.push(SelectOption {
            text: param.str_value(machine)?,
            enabled: true,
        });
    }
    Ok(options)
}

struct Select;

impl SpecialCaseOperation for Select {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        if machine.scenario_config().enable_selcom_savepoint {
            machine.mark_savepoint_implicit()?;
        }
        let options = options_from_params(machine, command, 0)?;
        machine.advance_ip();
        machine.push_long_operation(Box::new(SelectLongOperation::new(options)));
        Ok(())
    }
}

struct SelectBtn;

impl SpecialCaseOperation for SelectBtn {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        if machine.scenario_config().enable_selcom_savepoint {
            machine.mark_savepoint_implicit()?;
        }
        let set = command
            .params
            .first()
            .map(|param| param.int_value(machine))
            .transpose()?
            .unwrap_or(0);
        let options = options_from_params(machine, command, 1)?;
        let config = machine
            .config()
            .selbtns
            .get(&set)
            .cloned()
            .unwrap_or_default();
        machine.advance_ip();
        machine.push_long_operation(Box::new(SelectBtnLongOperation::new(
            &config, &options, true,
        )));
        Ok(())
    }
}

/// Core-side hit approximation for button objects: the object's own clip
/// region when set, otherwise a nominal box at its position. Hosts with a
/// renderer push an operation carrying pixel-accurate testing instead.
pub fn default_button_hit_test(object: &GraphicsObject, pos: Point) -> bool {
    let area = object.params.own_clip.or(object.params.clip).unwrap_or({
        match &object.drawer {
            Some(Drawer::ColourFilter { rect }) => *rect,
            _ => Rect::rec(object.params.x, object.params.y, 96, 32),
        }
    });
    area.contains(pos)
}

struct ObjBtnSelect;

impl SpecialCaseOperation for ObjBtnSelect {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()> {
        let group = command
            .params
            .first()
            .map(|param| param.int_value(machine))
            .transpose()?
            .unwrap_or(0);
        let cancellable = command
            .params
            .get(1)
            .map(|param| param.int_value(machine))
            .transpose()?
            .unwrap_or(1)
            != 0;
        machine.advance_ip();
        machine.push_long_operation(Box::new(ButtonObjectSelectLongOperation::new(
            group,
            cancellable,
            Box::new(default_button_hit_test),
        )));
        Ok(())
    }
}

pub fn module() -> RuntimeResult<Module> {
    let mut module = Module::new("Sel", 0, 2);
    module.add_opcode(1, 0, "select", OpHandler::Special(Box::new(Select)))?;
    module.add_opcode(2, 0, "select_s", OpHandler::Special(Box::new(Select)))?;
    module.add_opcode(3, 0, "select_btn", OpHandler::Special(Box::new(SelectBtn)))?;
    module.add_opcode(
        20,
        0,
        "objbtn_select",
        OpHandler::Special(Box::new(ObjBtnSelect)),
    )?;
    module.add_unsupported(4, 0, "select_w")?;
    Ok(module)
}
