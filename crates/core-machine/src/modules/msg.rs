use crate::longop::{AfterLongOpDecorator, PageFinalizer};
use crate::longops::PauseLongOperation;
use crate::machine::Machine;
use crate::registry::{Arg, Module, OpHandler, Operation, ParamShape};
use core_model::RuntimeResult;

/// Message-window module: text stops, page control, and typewriter speed.

struct Pause {
    finalizer: Option<PageFinalizer>,
}

impl Operation for Pause {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let pause = Box::new(PauseLongOperation::new(machine));
        match self.finalizer {
            Some(finalizer) => machine
                .push_long_operation(Box::new(AfterLongOpDecorator::new(pause, finalizer))),
            None => machine.push_long_operation(pause),
        }
        Ok(None)
    }
}

struct HardBrake;

impl Operation for HardBrake {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.text_mut().page().hard_brake();
        Ok(None)
    }
}

struct TextWindow;

impl Operation for TextWindow {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::DefaultInt(0)];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let window = args[0].as_int()?;
        machine.text_mut().new_page_on_window(window);
        Ok(None)
    }
}

struct MsgHide;

impl Operation for MsgHide {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.text_mut().hide_all_text_windows();
        Ok(None)
    }
}

struct SetMessageSpeed;

impl Operation for SetMessageSpeed {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let speed = args[0].as_int()?.max(0) as u32;
        machine.text_mut().globals_mut().message_speed = speed;
        Ok(None)
    }
}

struct SetScriptNowait {
    nowait: bool,
}

impl Operation for SetScriptNowait {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.text_mut().set_script_message_nowait(self.nowait);
        Ok(None)
    }
}

pub fn module() -> RuntimeResult<Module> {
    let mut module = Module::new("Msg", 0, 3);
    module.add_opcode(
        3,
        0,
        "par",
        OpHandler::Normal(Box::new(Pause {
            finalizer: Some(PageFinalizer::NewParagraph),
        })),
    )?;
    module.add_opcode(
        17,
        0,
        "page",
        OpHandler::Normal(Box::new(Pause {
            finalizer: Some(PageFinalizer::NewPage),
        })),
    )?;
    module.add_opcode(
        151,
        0,
        "spause",
        OpHandler::Normal(Box::new(Pause { finalizer: None })),
    )?;
    module.add_opcode(201, 0, "br", OpHandler::Normal(Box::new(HardBrake)))?;
    module.add_opcode(102, 0, "TextWindow", OpHandler::Normal(Box::new(TextWindow)))?;
    module.add_opcode(324, 0, "msgHide", OpHandler::Normal(Box::new(MsgHide)))?;
    module.add_opcode(
        120,
        0,
        "SetMessageSpeed",
        OpHandler::Normal(Box::new(SetMessageSpeed)),
    )?;
    module.add_opcode(
        310,
        0,
        "NoWaitOn",
        OpHandler::Normal(Box::new(SetScriptNowait { nowait: true })),
    )?;
    module.add_opcode(
        311,
        0,
        "NoWaitOff",
        OpHandler::Normal(Box::new(SetScriptNowait { nowait: false })),
    )?;
    module.add_unsupported(105, 0, "TextWindowClear")?;
    module.add_unsupported(330, 0, "FaceOpen")?;
    Ok(module)
}
