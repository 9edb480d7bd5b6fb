use crate::environment::SyscomEntryState;
use crate::longops::WaitLongOperation;
use crate::machine::Machine;
use crate::registry::{Arg, Module, OpHandler, Operation, ParamShape};
use core_model::RuntimeResult;

/// System module: waits, timers, cursor/click state, savepoint control,
/// the generic flags and the syscom table.

struct Wait {
    break_on_clicks: bool,
}

impl Operation for Wait {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let ms = args[0].as_int()?.max(0) as u64;
        let mut wait = WaitLongOperation::new(machine).wait_milliseconds(machine, ms);
        if self.break_on_clicks {
            wait = wait.break_on_clicks();
        }
        machine.push_long_operation(Box::new(wait));
        Ok(None)
    }
}

struct GetCursorPos;

impl Operation for GetCursorPos {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntReference, ParamShape::IntReference];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let pos = machine.input().mouse_pos;
        args[0].as_int_ref()?.write_int(machine, pos.x)?;
        args[1].as_int_ref()?.write_int(machine, pos.y)?;
        Ok(None)
    }
}

struct FlushClick;

impl Operation for FlushClick {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.input_mut().flush_mouse_clicks();
        Ok(None)
    }
}

struct Savepoint;

impl Operation for Savepoint {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.mark_savepoint()?;
        Ok(None)
    }
}

struct SetAutoSavepoints {
    enabled: bool,
}

impl Operation for SetAutoSavepoints {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.set_mark_savepoints(self.enabled);
        Ok(None)
    }
}

struct ResetTimer {
    layer: i32,
}

impl Operation for ResetTimer {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::DefaultInt(0)];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let counter = args[0].as_int()?;
        let now = machine.now();
        machine.env_mut().timers.reset(self.layer, counter, now);
        Ok(None)
    }
}

struct ReadTimer {
    layer: i32,
}

impl Operation for ReadTimer {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::DefaultInt(0)];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let counter = args[0].as_int()?;
        let now = machine.now();
        Ok(Some(machine.env().timers.read(self.layer, counter, now) as i32))
    }
}

struct SceneNum;

impl Operation for SceneNum {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        Ok(Some(machine.scene_number()))
    }
}

struct SetGeneric {
    slot: u8,
}

impl Operation for SetGeneric {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let value = args[0].as_int()?;
        let generics = &mut machine.env_mut().generics;
        if self.slot == 1 {
            generics.val1 = value;
        } else {
            generics.val2 = value;
        }
        Ok(None)
    }
}

struct GetGeneric {
    slot: u8,
}

impl Operation for GetGeneric {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let generics = machine.env().generics;
        Ok(Some(if self.slot == 1 {
            generics.val1
        } else {
            generics.val2
        }))
    }
}

struct SetSyscom;

impl Operation for SetSyscom {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntConstant, ParamShape::IntConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let index = args[0].as_int()?.max(0) as usize;
        let state = SyscomEntryState::from_int(args[1].as_int()?);
        machine.env_mut().syscom.set(index, state);
        Ok(None)
    }
}

struct GetSyscom;

impl Operation for GetSyscom {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let index = args[0].as_int()?.max(0) as usize;
        Ok(Some(machine.env().syscom.get(index).as_int()))
    }
}

struct SetSkipMode {
    enabled: bool,
}

impl Operation for SetSkipMode {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.set_forced_fast_forward(self.enabled);
        Ok(None)
    }
}

struct AutoMode {
    enabled: bool,
}

impl Operation for AutoMode {
    fn execute(&self, machine: &mut Machine, _args: &[Arg]) -> RuntimeResult<Option<i32>> {
        machine.text_mut().globals_mut().auto_mode = self.enabled;
        Ok(None)
    }
}

pub fn module() -> RuntimeResult<Module> {
    let mut module = Module::new("Sys", 0, 4);
    module.add_opcode(
        100,
        0,
        "wait",
        OpHandler::Normal(Box::new(Wait {
            break_on_clicks: false,
        })),
    )?;
    module.add_opcode(
        101,
        0,
        "waitC",
        OpHandler::Normal(Box::new(Wait {
            break_on_clicks: true,
        })),
    )?;
    module.add_opcode(
        110,
        0,
        "ResetTimer",
        OpHandler::Normal(Box::new(ResetTimer { layer: 0 })),
    )?;
    module.add_opcode(
        114,
        0,
        "Timer",
        OpHandler::Normal(Box::new(ReadTimer { layer: 0 })),
    )?;
    module.add_opcode(
        120,
        0,
        "ResetExTimer",
        OpHandler::Normal(Box::new(ResetTimer { layer: 1 })),
    )?;
    module.add_opcode(
        124,
        0,
        "ExTimer",
        OpHandler::Normal(Box::new(ReadTimer { layer: 1 })),
    )?;
    module.add_opcode(331, 0, "FlushClick", OpHandler::Normal(Box::new(FlushClick)))?;
    module.add_opcode(
        352,
        0,
        "GetCursorPos",
        OpHandler::Normal(Box::new(GetCursorPos)),
    )?;
    module.add_opcode(516, 0, "SceneNum", OpHandler::Normal(Box::new(SceneNum)))?;
    module.add_opcode(
        1130,
        0,
        "DefaultGrp",
        OpHandler::Unsupported,
    )?;
    module.add_opcode(3500, 0, "Savepoint", OpHandler::Normal(Box::new(Savepoint)))?;
    module.add_opcode(
        3501,
        0,
        "EnableAutoSavepoints",
        OpHandler::Normal(Box::new(SetAutoSavepoints { enabled: true })),
    )?;
    module.add_opcode(
        3502,
        0,
        "DisableAutoSavepoints",
        OpHandler::Normal(Box::new(SetAutoSavepoints { enabled: false })),
    )?;
    module.add_opcode(
        1200,
        0,
        "SetGeneric1",
        OpHandler::Normal(Box::new(SetGeneric { slot: 1 })),
    )?;
    module.add_opcode(
        1201,
        0,
        "Generic1",
        OpHandler::Normal(Box::new(GetGeneric { slot: 1 })),
    )?;
    module.add_opcode(
        1202,
        0,
        "SetGeneric2",
        OpHandler::Normal(Box::new(SetGeneric { slot: 2 })),
    )?;
    module.add_opcode(
        1203,
        0,
        "Generic2",
        OpHandler::Normal(Box::new(GetGeneric { slot: 2 })),
    )?;
    module.add_opcode(
        2260,
        0,
        "SetSyscom",
        OpHandler::Normal(Box::new(SetSyscom)),
    )?;
    module.add_opcode(2261, 0, "Syscom", OpHandler::Normal(Box::new(GetSyscom)))?;
    module.add_opcode(
        320,
        0,
        "SkipOn",
        OpHandler::Normal(Box::new(SetSkipMode { enabled: true })),
    )?;
    module.add_opcode(
        321,
        0,
        "SkipOff",
        OpHandler::Normal(Box::new(SetSkipMode { enabled: false })),
    )?;
    module.add_opcode(
        340,
        0,
        "AutoMode",
        OpHandler::Normal(Box::new(AutoMode { enabled: true })),
    )?;
    module.add_opcode(
        341,
        0,
        "AutoModeOff",
        OpHandler::Normal(Box::new(AutoMode { enabled: false })),
    )?;
    module.add_unsupported(204, 0, "ShowWeather")?;
    module.add_unsupported(1222, 0, "TestDll")?;
    Ok(module)
}
