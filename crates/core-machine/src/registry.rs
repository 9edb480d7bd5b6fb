use crate::machine::Machine;
use core_model::{Rect, RgbaColour, RuntimeError, RuntimeResult};
use core_script::{CommandElement, Expr, ReferenceCursor};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Declarative parameter shapes. An operation's signature is a list of
/// these; the dispatcher walks the list against the parsed expressions and
/// produces one [`Arg`] per shape.
#[derive(Debug, Clone, Copy)]
pub enum ParamShape {
    IntConstant,
    IntReference,
    StrConstant,
    StrReference,
    /// Three integer components, opaque alpha.
    Rgb,
    /// Three integer components plus optional alpha (defaults opaque).
    Rgba,
    /// (x1, y1, x2, y2)
    RectGrp,
    /// (x, y, w, h)
    RectRec,
    DefaultInt(i32),
    DefaultStr(&'static str),
    /// Consumes all remaining parameters as repetitions of the inner
    /// shape. Only legal as the final shape.
    Argc(&'static ParamShape),
    /// The parameter must be a complex expression whose children match the
    /// inner shape list.
    Complex(&'static [ParamShape]),
    /// The parameter must be a special (tagged) expression; the tag picks
    /// the matching sub-shape list.
    Special(&'static [(i32, &'static [ParamShape])]),
}

/// A parsed argument handed to an operation.
#[derive(Debug, Clone)]
pub enum Arg {
    Int(i32),
    Str(String),
    IntRef(ReferenceCursor),
    StrRef(ReferenceCursor),
    Colour(RgbaColour),
    Rect(Rect),
    List(Vec<Arg>),
    Tuple(Vec<Arg>),
    Tagged(i32, Vec<Arg>),
}

impl Arg {
    pub fn as_int(&self) -> RuntimeResult<i32> {
        match self {
            Arg::Int(value) => Ok(*value),
            _ => Err(RuntimeError::TypeMismatch("expected integer argument")),
        }
    }

    pub fn as_str(&self) -> RuntimeResult<&str> {
        match self {
            Arg::Str(value) => Ok(value),
            _ => Err(RuntimeError::TypeMismatch("expected string argument")),
        }
    }

    pub fn as_int_ref(&self) -> RuntimeResult<ReferenceCursor> {
        match self {
            Arg::IntRef(cursor) => Ok(*cursor),
            _ => Err(RuntimeError::TypeMismatch(
                "expected integer reference argument",
            )),
        }
    }

    pub fn as_str_ref(&self) -> RuntimeResult<ReferenceCursor> {
        match self {
            Arg::StrRef(cursor) => Ok(*cursor),
            _ => Err(RuntimeError::TypeMismatch(
                "expected string reference argument",
            )),
        }
    }

    pub fn as_list(&self) -> RuntimeResult<&[Arg]> {
        match self {
            Arg::List(items) | Arg::Tuple(items) => Ok(items),
            _ => Err(RuntimeError::TypeMismatch("expected aggregate argument")),
        }
    }
}

fn next_expr<'a>(
    params: &'a [Expr],
    position: &mut usize,
) -> RuntimeResult<&'a Expr> {
    let expr = params.get(*position).ok_or(RuntimeError::TypeMismatch(
        "operation invoked with too few parameters",
    ))?;
    *position += 1;
    Ok(expr)
}

fn parse_one(
    machine: &mut Machine,
    shape: &ParamShape,
    params: &[Expr],
    position: &mut usize,
) -> RuntimeResult<Arg> {
    match shape {
        ParamShape::IntConstant => {
            let expr = next_expr(params, position)?;
            Ok(Arg::Int(expr.int_value(machine)?))
        }
        ParamShape::StrConstant => {
            let expr = next_expr(params, position)?;
            Ok(Arg::Str(expr.str_value(machine)?))
        }
        ParamShape::IntReference => {
            let expr = next_expr(params, position)?;
            Ok(Arg::IntRef(expr.reference(machine)?))
        }
        ParamShape::StrReference => {
            let expr = next_expr(params, position)?;
            Ok(Arg::StrRef(expr.reference(machine)?))
        }
        ParamShape::Rgb => {
            let r = next_expr(params, position)?.int_value(machine)?;
            let g = next_expr(params, position)?.int_value(machine)?;
            let b = next_expr(params, position)?.int_value(machine)?;
            Ok(Arg::Colour(RgbaColour::rgb(
                r.clamp(0, 255) as u8,
                g.clamp(0, 255) as u8,
                b.clamp(0, 255) as u8,
            )))
        }
        ParamShape::Rgba => {
            let r = next_expr(params, position)?.int_value(machine)?;
            let g = next_expr(params, position)?.int_value(machine)?;
            let b = next_expr(params, position)?.int_value(machine)?;
            let a = if *position < params.len() {
                next_expr(params, position)?.int_value(machine)?
            } else {
                255
            };
            Ok(Arg::Colour(RgbaColour::rgba(
                r.clamp(0, 255) as u8,
                g.clamp(0, 255) as u8,
                b.clamp(0, 255) as u8,
                a.clamp(0, 255) as u8,
            )))
        }
        ParamShape::RectGrp => {
            let x1 = next_expr(params, position)?.int_value(machine)?;
            let y1 = next_expr(params, position)?.int_value(machine)?;
            let x2 = next_expr(params, position)?.int_value(machine)?;
            let y2 = next_expr(params, position)?.int_value(machine)?;
            Ok(Arg::Rect(Rect::grp(x1, y1, x2, y2)))
        }
        ParamShape::RectRec => {
            let x = next_expr(params, position)?.int_value(machine)?;
            let y = next_expr(params, position)?.int_value(machine)?;
            let w = next_expr(params, position)?.int_value(machine)?;
            let h = next_expr(params, position)?.int_value(machine)?;
            Ok(Arg::Rect(Rect::rec(x, y, w, h)))
        }
        ParamShape::DefaultInt(default) => {
            if *position < params.len() {
                let expr = next_expr(params, position)?;
                Ok(Arg::Int(expr.int_value(machine)?))
            } else {
                Ok(Arg::Int(*default))
            }
        }
        ParamShape::DefaultStr(default) => {
            if *position < params.len() {
                let expr = next_expr(params, position)?;
                Ok(Arg::Str(expr.str_value(machine)?))
            } else {
                Ok(Arg::Str((*default).to_string()))
            }
        }
        ParamShape::Argc(inner) => {
            let mut items = Vec::new();
            while *position < params.len() {
                items.push(parse_one(machine, inner, params, position)?);
            }
            Ok(Arg::List(items))
        }
        ParamShape::Complex(inner_shapes) => {
            let expr = next_expr(params, position)?;
            if !expr.is_complex() {
                return Err(RuntimeError::TypeMismatch(
                    "expected a complex parameter",
                ));
            }
            let children: Vec<Expr> = expr.children().to_vec();
            let mut inner_pos = 0usize;
            let mut items = Vec::new();
            for inner in *inner_shapes {
                items.push(parse_one(machine, inner, &children, &mut inner_pos)?);
            }
            Ok(Arg::Tuple(items))
        }
        ParamShape::Special(alternatives) => {
            let expr = next_expr(params, position)?;
            let tag = expr.overload_tag().ok_or(RuntimeError::TypeMismatch(
                "expected a special (tagged) parameter",
            ))?;
            let shapes = alternatives
                .iter()
                .find(|(t, _)| *t == tag)
                .map(|(_, shapes)| *shapes)
                .ok_or(RuntimeError::TypeMismatch(
                    "special parameter tag has no matching shape",
                ))?;
            let children: Vec<Expr> = expr.children().to_vec();
            let mut inner_pos = 0usize;
            let mut items = Vec::new();
            for inner in shapes {
                items.push(parse_one(machine, inner, &children, &mut inner_pos)?);
            }
            Ok(Arg::Tagged(tag, items))
        }
    }
}

/// Parse a full parameter list against a signature.
pub fn parse_signature(
    machine: &mut Machine,
    signature: &[ParamShape],
    params: &[Expr],
) -> RuntimeResult<Vec<Arg>> {
    let mut position = 0usize;
    let mut args = Vec::with_capacity(signature.len());
    for shape in signature {
        args.push(parse_one(machine, shape, params, &mut position)?);
    }
    Ok(args)
}

/// A stateless opcode handler with a declared signature.
///
/// Returning `Some(value)` writes the store register (the store-opcode
/// flavour); `None` leaves it untouched. The dispatcher advances the
/// instruction pointer after a successful call.
pub trait Operation: Send + Sync {
    fn signature(&self) -> &'static [ParamShape] {
        &[]
    }

    fn execute(&self, machine: &mut Machine, args: &[Arg]) -> RuntimeResult<Option<i32>>;
}

/// A handler with full control of dispatch: raw access to the command
/// element, no parameter conversion, and no implicit instruction-pointer
/// advancement. Control flow (jumps, calls, selects) lives here.
pub trait SpecialCaseOperation: Send + Sync {
    fn execute(&self, machine: &mut Machine, command: &CommandElement) -> RuntimeResult<()>;
}

pub enum OpHandler {
    Normal(Box<dyn Operation>),
    Special(Box<dyn SpecialCaseOperation>),
    /// Registered placeholder that raises `UnimplementedOpcode` with its
    /// full identity for the trace log.
    Unsupported,
}

/// Numeric properties attachable to operations at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpProperty {
    /// Which object layer (foreground/background) the op targets.
    ObjLayer,
    /// Which object parameter set the op belongs to.
    ObjSet,
}

pub struct RegisteredOp {
    pub name: String,
    pub handler: OpHandler,
    properties: Vec<(OpProperty, i32)>,
}

impl RegisteredOp {
    pub fn property(&self, property: OpProperty) -> Option<i32> {
        self.properties
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, value)| *value)
    }
}

/// A module: a named group of operations under one (type, id) key.
pub struct Module {
    name: &'static str,
    module_type: i32,
    module_id: i32,
    ops: BTreeMap<(i32, u8), RegisteredOp>,
}

impl Module {
    pub fn new(name: &'static str, module_type: i32, module_id: i32) -> Self {
        Self {
            name,
            module_type,
            module_id,
            ops: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn module_type(&self) -> i32 {
        self.module_type
    }

    pub fn module_id(&self) -> i32 {
        self.module_id
    }

    pub fn add_opcode(
        &mut self,
        opcode: i32,
        overload: u8,
        name: &str,
        handler: OpHandler,
    ) -> RuntimeResult<&mut Self> {
        self.add_opcode_with_properties(opcode, overload, name, handler, Vec::new())
    }

    pub fn add_opcode_with_properties(
        &mut self,
        opcode: i32,
        overload: u8,
        name: &str,
        handler: OpHandler,
        properties: Vec<(OpProperty, i32)>,
    ) -> RuntimeResult<&mut Self> {
        if self.ops.contains_key(&(opcode, overload)) {
            return Err(RuntimeError::BadFormat(format!(
                "duplicate opcode in {}: {opcode},{overload}",
                self
            )));
        }
        self.ops.insert(
            (opcode, overload),
            RegisteredOp {
                name: name.to_string(),
                handler,
                properties,
            },
        );
        Ok(self)
    }

    /// Register a named placeholder for an opcode the runtime does not
    /// implement.
    pub fn add_unsupported(
        &mut self,
        opcode: i32,
        overload: u8,
        name: &str,
    ) -> RuntimeResult<&mut Self> {
        self.add_opcode(opcode, overload, name, OpHandler::Unsupported)
    }

    pub fn op(&self, opcode: i32, overload: u8) -> Option<&RegisteredOp> {
        self.ops.get(&(opcode, overload))
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mod<{},{}:{}>",
            self.name, self.module_type, self.module_id
        )
    }
}

/// The operation registry: (module-type, module-id) → module.
///
/// Populated once by a startup routine and then shared immutably by the
/// machine; there are no static constructors involved.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<(i32, i32), Module>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_module(&mut self, module: Module) -> RuntimeResult<()> {
        let key = (module.module_type(), module.module_id());
        if self.modules.contains_key(&key) {
            return Err(RuntimeError::DuplicateModule {
                module_type: key.0,
                module_id: key.1,
            });
        }
        self.modules.insert(key, module);
        Ok(())
    }

    pub fn module(&self, module_type: i32, module_id: i32) -> Option<&Module> {
        self.modules.get(&(module_type, module_id))
    }

    /// Resolve a command to its registered operation, if any.
    pub fn resolve(&self, command: &CommandElement) -> Option<&RegisteredOp> {
        self.module(command.module_type, command.module_id)?
            .op(command.opcode, command.overload)
    }

    /// Human-readable name for a command, for diagnostics and tracing.
    pub fn command_name(&self, command: &CommandElement) -> Option<&str> {
        self.resolve(command).map(|op| op.name.as_str())
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn into_shared(self) -> Arc<ModuleRegistry> {
        Arc::new(self)
    }
}
