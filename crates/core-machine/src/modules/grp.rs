use crate::machine::Machine;
use crate::registry::{Arg, Module, OpHandler, Operation, ParamShape};
use core_model::RuntimeResult;
use core_object::GraphicsStackValue;

/// Screen-composition module. The pixel work happens in the compositor;
/// the core records the stack-building commands for replay and drives the
/// wipe-copy promotion that underpins scene transitions.

/// Load a background image into a display context. Recorded; the
/// compositor resolves the filename when it consumes the state.
struct GrpLoad {
    onto_background: bool,
}

impl Operation for GrpLoad {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::StrConstant,
            ParamShape::DefaultInt(0),
            ParamShape::DefaultInt(255),
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let filename = args[0].as_str()?.to_string();
        let dc = args[1].as_int()?;
        let opacity = args[2].as_int()?;
        machine.record_graphics_command(vec![
            GraphicsStackValue::Str(filename),
            GraphicsStackValue::Int(if self.onto_background { 1 } else { dc }),
            GraphicsStackValue::Int(opacity),
        ]);
        Ok(None)
    }
}

/// Scene transition: promote background objects into the foreground,
/// clearing foreground objects without wipe-copy.
struct GrpWipe;

impl Operation for GrpWipe {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::DefaultInt(0),
            ParamShape::DefaultInt(0),
            ParamShape::DefaultInt(0),
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.graphics.layers.clear_and_promote();
        let values = args
            .iter()
            .map(|arg| Ok(GraphicsStackValue::Int(arg.as_int()?)))
            .collect::<RuntimeResult<Vec<_>>>()?;
        machine.record_graphics_command(values);
        Ok(None)
    }
}

/// Drop the newest recorded command (issued by effects that supersede the
/// command they follow).
struct StackPop;

impl Operation for StackPop {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.graphics.pop_newest_command();
        Ok(None)
    }
}

/// Clear recorded graphics state entirely.
struct StackClear;

impl Operation for StackClear {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.graphics.stack_mut().clear();
        Ok(None)
    }
}

pub fn module() -> RuntimeResult<Module> {
    let mut module = Module::new("Grp", 1, 33);
    module.add_opcode(
        1049,
        0,
        "grpLoad",
        OpHandler::Normal(Box::new(GrpLoad {
            onto_background: false,
        })),
    )?;
    module.add_opcode(
        1050,
        0,
        "recLoad",
        OpHandler::Normal(Box::new(GrpLoad {
            onto_background: true,
        })),
    )?;
    module.add_opcode(73, 0, "wipe", OpHandler::Normal(Box::new(GrpWipe)))?;
    module.add_opcode(
        30,
        0,
        "grpStackPop",
        OpHandler::Normal(Box::new(StackPop)),
    )?;
    module.add_opcode(
        31,
        0,
        "grpStackClear",
        OpHandler::Normal(Box::new(StackClear)),
    )?;
    module.add_unsupported(1056, 0, "grpFill")?;
    module.add_unsupported(400, 0, "grpSwap")?;
    Ok(module)
}
