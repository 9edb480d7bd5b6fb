use crate::machine::Machine;
use crate::registry::{Arg, Module, OpHandler, OpProperty, Operation, ParamShape};
use core_model::RuntimeResult;
use core_object::{
    AfterAction, Animator, Drawer, GraphicsStackValue, InterpolationMode, Layer, MutatorTarget,
    ObjectMutator, ParamId,
};

/// Object modules. Foreground and background register the same handlers
/// under different module ids; each handler carries its layer, matching
/// the registration-time layer property.

fn layer_module_id(layer: Layer) -> i32 {
    match layer {
        Layer::Foreground => 81,
        Layer::Background => 82,
    }
}

fn layer_creation_module_id(layer: Layer) -> i32 {
    match layer {
        Layer::Foreground => 71,
        Layer::Background => 72,
    }
}

fn layer_property(layer: Layer) -> Vec<(OpProperty, i32)> {
    vec![(
        OpProperty::ObjLayer,
        match layer {
            Layer::Background => 0,
            Layer::Foreground => 1,
        },
    )]
}

const SIG_INT1: &[ParamShape] = &[ParamShape::IntConstant];
const SIG_INT2: &[ParamShape] = &[ParamShape::IntConstant, ParamShape::IntConstant];
const SIG_INT3: &[ParamShape] = &[
    ParamShape::IntConstant,
    ParamShape::IntConstant,
    ParamShape::IntConstant,
];
const SIG_INT4: &[ParamShape] = &[
    ParamShape::IntConstant,
    ParamShape::IntConstant,
    ParamShape::IntConstant,
    ParamShape::IntConstant,
];

/// The scalar/tuple parameter adapter: one opcode writing N parameters of
/// one object, each from one integer argument after the object number.
struct SetParams {
    layer: Layer,
    params: &'static [ParamId],
    signature: &'static [ParamShape],
    /// Record onto the graphics stack for replay.
    record: bool,
}

impl Operation for SetParams {
    fn signature(&self) -> &'static [ParamShape] {
        self.signature
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let object = machine.graphics.layers.object_mut(self.layer, buf)?;
        for (param, arg) in self.params.iter().zip(&args[1..]) {
            param.set(&mut object.params, arg.as_int()?);
        }
        if self.record {
            let values = args
                .iter()
                .map(|arg| Ok(GraphicsStackValue::Int(arg.as_int()?)))
                .collect::<RuntimeResult<Vec<_>>>()?;
            machine.record_graphics_command(values);
        }
        Ok(None)
    }
}

/// Repetition-indexed adapter: object number, repetition slot, then one
/// value per parameter.
struct SetRepnoParams {
    layer: Layer,
    params: &'static [ParamId],
}

impl Operation for SetRepnoParams {
    fn signature(&self) -> &'static [ParamShape] {
        &SIG_INT4[..self.params.len() + 2]
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let repno = args[1].as_int()?.max(0) as usize;
        let object = machine.graphics.layers.object_mut(self.layer, buf)?;
        for (param, arg) in self.params.iter().zip(&args[2..]) {
            let id = match param {
                ParamId::AdjustX(_) => ParamId::AdjustX(repno),
                ParamId::AdjustY(_) => ParamId::AdjustY(repno),
                ParamId::AdjustAlpha(_) => ParamId::AdjustAlpha(repno),
                other => *other,
            };
            id.set(&mut object.params, arg.as_int()?);
        }
        Ok(None)
    }
}

/// Read one parameter into the store register.
struct GetParam {
    layer: Layer,
    param: ParamId,
}

impl Operation for GetParam {
    fn signature(&self) -> &'static [ParamShape] {
        SIG_INT1
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let value = machine
            .graphics
            .layers
            .object(self.layer, buf)
            .map(|object| self.param.get(&object.params))
            .unwrap_or(0);
        Ok(Some(value))
    }
}

/// Read position into two integer references.
struct GetPos {
    layer: Layer,
}

impl Operation for GetPos {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::IntConstant,
            ParamShape::IntReference,
            ParamShape::IntReference,
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let (x, y) = machine
            .graphics
            .layers
            .object(self.layer, buf)
            .map(|object| (object.params.x, object.params.y))
            .unwrap_or((0, 0));
        args[1].as_int_ref()?.write_int(machine, x)?;
        args[2].as_int_ref()?.write_int(machine, y)?;
        Ok(None)
    }
}

/// Attach a file drawer (the basic object creation command).
struct OfFile {
    layer: Layer,
}

impl Operation for OfFile {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::IntConstant,
            ParamShape::StrConstant,
            ParamShape::DefaultInt(0),
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let filename = args[1].as_str()?.to_string();
        let visible = args[2].as_int()? != 0;

        let object = machine.graphics.layers.object_mut(self.layer, buf)?;
        object.free();
        object.params.visible = visible;
        object.drawer = Some(Drawer::File {
            filename: filename.clone(),
            pattern_count: 1,
        });

        machine.record_graphics_command(vec![
            GraphicsStackValue::Int(buf as i32),
            GraphicsStackValue::Str(filename),
            GraphicsStackValue::Int(visible as i32),
        ]);
        Ok(None)
    }
}

/// Attach a text drawer rendering the object's text properties.
struct OfText {
    layer: Layer,
}

impl Operation for OfText {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[ParamShape::IntConstant, ParamShape::StrConstant];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let value = args[1].as_str()?.to_string();
        let object = machine.graphics.layers.object_mut(self.layer, buf)?;
        object.free();
        object.params.text.value = value.clone();
        object.drawer = Some(Drawer::Text);
        machine.record_graphics_command(vec![
            GraphicsStackValue::Int(buf as i32),
            GraphicsStackValue::Str(value),
        ]);
        Ok(None)
    }
}

/// Attach an animation drawer with a uniform frame-time table.
struct OfAnimation {
    layer: Layer,
    after_action: AfterAction,
}

impl Operation for OfAnimation {
    fn signature(&self) -> &'static [ParamShape] {
        const SIG: &[ParamShape] = &[
            ParamShape::IntConstant,
            ParamShape::StrConstant,
            ParamShape::IntConstant,
            ParamShape::IntConstant,
        ];
        SIG
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let filename = args[1].as_str()?.to_string();
        let frames = args[2].as_int()?.max(1) as usize;
        let frame_time = args[3].as_int()?.max(1) as u32;

        let now = machine.now();
        let object = machine.graphics.layers.object_mut(self.layer, buf)?;
        object.free();
        object.params.visible = true;
        let mut animator = Animator::new(vec![frame_time; frames], self.after_action);
        animator.play(now);
        object.drawer = Some(Drawer::Animation { filename, animator });
        Ok(None)
    }
}

struct ClearObject {
    layer: Layer,
}

impl Operation for ClearObject {
    fn signature(&self) -> &'static [ParamShape] {
        SIG_INT1
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        machine.graphics.layers.object_mut(self.layer, buf)?.free();
        Ok(None)
    }
}

/// Attach an interpolating mutator over one or two parameters.
struct Mutate {
    layer: Layer,
    name: &'static str,
    params: &'static [ParamId],
}

impl Operation for Mutate {
    fn signature(&self) -> &'static [ParamShape] {
        // object, one target value per parameter, duration, delay, mode
        const SIG1: &[ParamShape] = &[
            ParamShape::IntConstant,
            ParamShape::IntConstant,
            ParamShape::IntConstant,
            ParamShape::DefaultInt(0),
            ParamShape::DefaultInt(0),
        ];
        const SIG2: &[ParamShape] = &[
            ParamShape::IntConstant,
            ParamShape::IntConstant,
            ParamShape::IntConstant,
            ParamShape::IntConstant,
            ParamShape::DefaultInt(0),
            ParamShape::DefaultInt(0),
        ];
        if self.params.len() == 2 {
            SIG2
        } else {
            SIG1
        }
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        let value_count = self.params.len();
        let duration = args[1 + value_count].as_int()?.max(0) as u64;
        let delay = args[2 + value_count].as_int()?.max(0) as u64;
        let mode = InterpolationMode::from_code(args[3 + value_count].as_int()?)?;

        let now = machine.now();
        let object = machine.graphics.layers.object_mut(self.layer, buf)?;
        let targets = self
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                Ok(MutatorTarget {
                    param: *param,
                    start: param.get(&object.params),
                    end: args[1 + i].as_int()?,
                })
            })
            .collect::<RuntimeResult<Vec<_>>>()?;
        object.attach_mutator(ObjectMutator::new(
            -1, self.name, now, duration, delay, mode, targets,
        ));
        Ok(None)
    }
}

/// Snap a named mutator family to its end values.
struct EndMutation {
    layer: Layer,
    name: &'static str,
}

impl Operation for EndMutation {
    fn signature(&self) -> &'static [ParamShape] {
        SIG_INT1
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        machine
            .graphics
            .layers
            .object_mut(self.layer, buf)?
            .end_mutations(-1, self.name);
        Ok(None)
    }
}

struct SetWipeCopy {
    layer: Layer,
    wipe_copy: bool,
}

impl Operation for SetWipeCopy {
    fn signature(&self) -> &'static [ParamShape] {
        SIG_INT1
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>> {
        let buf = args[0].as_int()?.max(0) as usize;
        machine
            .graphics
            .layers
            .object_mut(self.layer, buf)?
            .params
            .wipe_copy = self.wipe_copy;
        Ok(None)
    }
}

pub fn creation_module(layer: Layer) -> RuntimeResult<Module> {
    let name = match layer {
        Layer::Foreground => "ObjFgCreation",
        Layer::Background => "ObjBgCreation",
    };
    let mut module = Module::new(name, 1, layer_creation_module_id(layer));
    module.add_opcode_with_properties(
        1000,
        0,
        "objOfFile",
        OpHandler::Normal(Box::new(OfFile { layer })),
        layer_property(layer),
    )?;
    module.add_opcode(1200, 0, "objOfText", OpHandler::Normal(Box::new(OfText { layer })))?;
    module.add_opcode(
        1100,
        0,
        "objOfAnm",
        OpHandler::Normal(Box::new(OfAnimation {
            layer,
            after_action: AfterAction::Loop,
        })),
    )?;
    module.add_opcode(
        1101,
        0,
        "objOfAnmOnce",
        OpHandler::Normal(Box::new(OfAnimation {
            layer,
            after_action: AfterAction::Stop,
        })),
    )?;
    module.add_opcode(110, 0, "objClear", OpHandler::Normal(Box::new(ClearObject { layer })))?;
    module.add_unsupported(1404, 0, "objOfArea")?;
    Ok(module)
}

pub fn management_module(layer: Layer) -> RuntimeResult<Module> {
    let name = match layer {
        Layer::Foreground => "ObjFg",
        Layer::Background => "ObjBg",
    };
    let mut module = Module::new(name, 1, layer_module_id(layer));

    module.add_opcode_with_properties(
        1000,
        0,
        "objMove",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::X, ParamId::Y],
            signature: SIG_INT3,
            record: true,
        })),
        layer_property(layer),
    )?;
    module.add_opcode(
        1001,
        0,
        "objLeft",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::X],
            signature: SIG_INT2,
            record: true,
        })),
    )?;
    module.add_opcode(
        1002,
        0,
        "objTop",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::Y],
            signature: SIG_INT2,
            record: true,
        })),
    )?;
    module.add_opcode(
        1003,
        0,
        "objShow",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::Visible],
            signature: SIG_INT2,
            record: true,
        })),
    )?;
    module.add_opcode(
        1008,
        0,
        "objAlpha",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::AlphaSource],
            signature: SIG_INT2,
            record: false,
        })),
    )?;
    module.add_opcode(
        1016,
        0,
        "objPattNo",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::PatternNo],
            signature: SIG_INT2,
            record: false,
        })),
    )?;
    module.add_opcode(
        1034,
        0,
        "objZOrder",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::ZOrder],
            signature: SIG_INT2,
            record: false,
        })),
    )?;
    module.add_opcode(
        1046,
        0,
        "objAdjust",
        OpHandler::Normal(Box::new(SetRepnoParams {
            layer,
            params: &[ParamId::AdjustX(0), ParamId::AdjustY(0)],
        })),
    )?;
    module.add_opcode(
        1021,
        0,
        "objComposite",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::CompositeMode],
            signature: SIG_INT2,
            record: false,
        })),
    )?;
    module.add_opcode(
        1019,
        0,
        "objLight",
        OpHandler::Normal(Box::new(SetParams {
            layer,
            params: &[ParamId::LightLevel],
            signature: SIG_INT2,
            record: false,
        })),
    )?;
    module.add_opcode(
        1064,
        0,
        "objGetPos",
        OpHandler::Normal(Box::new(GetPos { layer })),
    )?;
    module.add_opcode(
        1062,
        0,
        "objGetAlpha",
        OpHandler::Normal(Box::new(GetParam {
            layer,
            param: ParamId::AlphaSource,
        })),
    )?;
    module.add_opcode(
        2000,
        0,
        "objEveMove",
        OpHandler::Normal(Box::new(Mutate {
            layer,
            name: "objEveMove",
            params: &[ParamId::X, ParamId::Y],
        })),
    )?;
    module.add_opcode(
        2008,
        0,
        "objEveAlpha",
        OpHandler::Normal(Box::new(Mutate {
            layer,
            name: "objEveAlpha",
            params: &[ParamId::AlphaSource],
        })),
    )?;
    module.add_opcode(
        4000,
        0,
        "objEveMoveEnd",
        OpHandler::Normal(Box::new(EndMutation {
            layer,
            name: "objEveMove",
        })),
    )?;
    module.add_opcode(
        4008,
        0,
        "objEveAlphaEnd",
        OpHandler::Normal(Box::new(EndMutation {
            layer,
            name: "objEveAlpha",
        })),
    )?;
    module.add_opcode(
        3030,
        0,
        "objWipeCopyOn",
        OpHandler::Normal(Box::new(SetWipeCopy {
            layer,
            wipe_copy: true,
        })),
    )?;
    module.add_opcode(
        3031,
        0,
        "objWipeCopyOff",
        OpHandler::Normal(Box::new(SetWipeCopy {
            layer,
            wipe_copy: false,
        })),
    )?;
    module.add_unsupported(1039, 0, "objScale")?;
    module.add_unsupported(1064, 1, "objGetDims")?;
    Ok(module)
}
