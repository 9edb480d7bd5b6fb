use crate::machine::Machine;
use crate::registry::{Arg, Module, OpHandler, Operation, ParamShape};
use core_model::RuntimeResult;

/// Bulk memory operations: the reference-iterator consumers.

struct SetArray;

impl Operation for SetArray {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::IntReference,
            ParamShape::Argc(&ParamShape::IntConstant),
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let cursor = args[0].as_int_ref()?;
        for (offset, value) in args[1].as_list()?.iter().enumerate() {
            cursor.offset(offset).write_int(machine, value.as_int()?)?;
        }
        Ok(None)
    }
}

struct SetRng;

impl Operation for SetRng {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::IntReference,
            ParamShape::IntConstant,
            ParamShape::DefaultInt(0),
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let cursor = args[0].as_int_ref()?;
        let count = args[1].as_int()?.max(0) as usize;
        let value = args[2].as_int()?;
        for offset in 0..count {
            cursor.offset(offset).write_int(machine, value)?;
        }
        Ok(None)
    }
}

struct CpyRng;

impl Operation for CpyRng {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::IntReference,
            ParamShape::IntReference,
            ParamShape::IntConstant,
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let src = args[0].as_int_ref()?;
        let dst = args[1].as_int_ref()?;
        let count = args[2].as_int()?.max(0) as usize;
        for offset in 0..count {
            let value = src.offset(offset).read_int(machine)?;
            dst.offset(offset).write_int(machine, value)?;
        }
        Ok(None)
    }
}

/// Sums a cell range into the store register.
struct Sum;

impl Operation for Sum {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntReference, ParamShape::IntConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let cursor = args[0].as_int_ref()?;
        let count = args[1].as_int()?.max(0) as usize;
        let mut total: i32 = 0;
        for offset in 0..count {
            total = total.wrapping_add(cursor.offset(offset).read_int(machine)?);
        }
        Ok(Some(total))
    }
}

struct SetName {
    global: bool,
}

impl Operation for SetName {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntConstant, ParamShape::StrConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let index = args[0].as_int()?.max(0) as usize;
        let name = args[1].as_str()?.to_string();
        let names = if self.global {
            &mut machine.memory_mut().global_mut().global_names
        } else {
            &mut machine.memory_mut().local_mut().local_names
        };
        if names.len() <= index {
            names.resize(index + 1, String::new());
        }
        names[index] = name;
        Ok(None)
    }
}

pub fn module() -> RuntimeResult<Module> {
    let mut module = Module::new("Mem", 1, 11);
    module.add_opcode(0, 0, "setarray", OpHandler::Normal(Box::new(SetArray)))?;
    module.add_opcode(1, 0, "setrng", OpHandler::Normal(Box::new(SetRng)))?;
    module.add_opcode(2, 0, "cpyrng", OpHandler::Normal(Box::new(CpyRng)))?;
    module.add_opcode(3, 0, "sum", OpHandler::Normal(Box::new(Sum)))?;
    module.add_opcode(
        10,
        0,
        "SetName",
        OpHandler::Normal(Box::new(SetName { global: false })),
    )?;
    module.add_opcode(
        11,
        0,
        "SetGlobalName",
        OpHandler::Normal(Box::new(SetName { global: true })),
    )?;
    module.add_unsupported(4, 0, "cpyvars")?;
    Ok(module)
}
