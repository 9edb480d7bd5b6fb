use crate::expr::Expr;
use std::fmt;

/// A decoded command element: the four-part operation key plus the parsed
/// parameter expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandElement {
    pub module_type: i32,
    pub module_id: i32,
    pub opcode: i32,
    pub overload: u8,
    pub params: Vec<Expr>,
}

impl CommandElement {
    pub fn new(module_type: i32, module_id: i32, opcode: i32, overload: u8) -> Self {
        Self {
            module_type,
            module_id,
            opcode,
            overload,
            params: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: Vec<Expr>) -> Self {
        self.params = params;
        self
    }

    pub fn key(&self) -> (i32, i32, i32, u8) {
        (self.module_type, self.module_id, self.opcode, self.overload)
    }
}

impl fmt::Display for CommandElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "op<{}:{:03}:{:05}, {}>(",
            self.module_type, self.module_id, self.opcode, self.overload
        )?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.debug_string())?;
        }
        write!(f, ")")
    }
}

/// One resolved unit of bytecode, as handed back by the scriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Already-read marker at a text boundary.
    Kidoku(i32),
    /// Source line marker.
    Line(i32),
    /// A command dispatched through the operation registry.
    Command(CommandElement),
    /// A bare expression evaluated for its side effect.
    Expression(Expr),
    /// Text fed to the text collaborator.
    Textout(String),
    /// End of scenario; halts the machine.
    End,
}
