use crate::ops::{apply_binary, apply_unary, BinaryOp, UnaryOp};
use core_memory::{
    bank_code_is_string, IntMemoryLocation, MemoryAccess, StrMemoryLocation,
};
use core_model::{RuntimeError, RuntimeResult};
use std::fmt::Write as _;

/// Value type of an expression: integer or string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    String,
}

/// A decoded memory-bank reference, carrying the raw bytecode bank code so
/// serialization can reproduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankRef {
    Int { code: i32 },
    Str { code: i32 },
}

impl BankRef {
    pub fn from_code(code: i32) -> Self {
        if bank_code_is_string(code) {
            BankRef::Str { code }
        } else {
            BankRef::Int { code }
        }
    }

    pub fn is_string(self) -> bool {
        matches!(self, BankRef::Str { .. })
    }

    fn int_location(self, index: i32) -> RuntimeResult<IntMemoryLocation> {
        match self {
            BankRef::Int { code } => IntMemoryLocation::from_code(code, index.max(0) as usize),
            BankRef::Str { .. } => Err(RuntimeError::TypeMismatch(
                "string bank used as integer reference",
            )),
        }
    }

    fn str_location(self, index: i32) -> RuntimeResult<StrMemoryLocation> {
        match self {
            BankRef::Str { code } => StrMemoryLocation::from_code(code, index.max(0) as usize),
            BankRef::Int { .. } => Err(RuntimeError::TypeMismatch(
                "integer bank used as string reference",
            )),
        }
    }

    fn display_name(self) -> String {
        match self {
            BankRef::Int { code } => {
                match IntMemoryLocation::from_code(code, 0) {
                    Ok(loc) if loc.bitwidth == 32 => format!("int{}", loc.bank.letter()),
                    Ok(loc) => format!("int{}{}b", loc.bank.letter(), loc.bitwidth),
                    Err(_) => format!("int?{code}"),
                }
            }
            BankRef::Str { code } => match StrMemoryLocation::from_code(code, 0) {
                Ok(loc) => format!("str{}", loc.bank.letter()),
                Err(_) => format!("str?{code}"),
            },
        }
    }
}

/// An expression tree node. Each node owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntConst(i32),
    StrConst(String),
    /// The machine's single implicit result register.
    StoreRegister,
    /// Bank reference with a computed index.
    MemoryRef { bank: BankRef, index: Box<Expr> },
    /// Bank reference with a literal index, the common case in compiled
    /// parameter lists.
    SimpleMemRef { bank: BankRef, index: i32 },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Pre-folded `bank[index] = value` with all parts literal.
    SimpleAssign {
        bank: BankRef,
        index: i32,
        value: i32,
    },
    /// Ordered tuple of sub-expressions (complex parameter).
    Complex(Vec<Expr>),
    /// Overload-tagged parameter; the tag selects which sub-shape the
    /// operation's signature applies.
    Special { tag: i32, exprs: Vec<Expr> },
}

impl Expr {
    pub fn int(value: i32) -> Expr {
        Expr::IntConst(value)
    }

    pub fn str<S: Into<String>>(value: S) -> Expr {
        Expr::StrConst(value.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn memory_ref(code: i32, index: Expr) -> Expr {
        Expr::MemoryRef {
            bank: BankRef::from_code(code),
            index: Box::new(index),
        }
    }

    pub fn simple_ref(code: i32, index: i32) -> Expr {
        Expr::SimpleMemRef {
            bank: BankRef::from_code(code),
            index,
        }
    }

    /// Value type of this expression. Complex/special containers are
    /// transparent when they hold exactly one child.
    pub fn value_type(&self) -> ValueType {
        match self {
            Expr::StrConst(_) => ValueType::String,
            Expr::MemoryRef { bank, .. } | Expr::SimpleMemRef { bank, .. } => {
                if bank.is_string() {
                    ValueType::String
                } else {
                    ValueType::Integer
                }
            }
            Expr::Complex(children) | Expr::Special { exprs: children, .. }
                if children.len() == 1 =>
            {
                children[0].value_type()
            }
            _ => ValueType::Integer,
        }
    }

    pub fn is_memory_reference(&self) -> bool {
        matches!(
            self,
            Expr::StoreRegister | Expr::MemoryRef { .. } | Expr::SimpleMemRef { .. }
        )
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Expr::Complex(_))
    }

    pub fn is_special(&self) -> bool {
        matches!(self, Expr::Special { .. })
    }

    pub fn overload_tag(&self) -> Option<i32> {
        match self {
            Expr::Special { tag, .. } => Some(*tag),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Complex(children) | Expr::Special { exprs: children, .. } => children,
            _ => &[],
        }
    }

    /// Evaluate for side effect only, picking the value-type path from the
    /// assignment target. Bare expression instructions run through here.
    pub fn execute(&self, ctx: &mut dyn MemoryAccess) -> RuntimeResult<()> {
        if let Expr::Binary { op, left, right } = self {
            if *op == BinaryOp::Assign && left.value_type() == ValueType::String {
                let value = right.str_value(ctx)?;
                return left.assign_str(ctx, value);
            }
        }
        self.int_value(ctx).map(|_| ())
    }

    /// Evaluate to an integer. Fails with `TypeMismatch` for string-valued
    /// nodes. Assignment-flavoured operators perform their store as a side
    /// effect and return the assigned value.
    pub fn int_value(&self, ctx: &mut dyn MemoryAccess) -> RuntimeResult<i32> {
        match self {
            Expr::IntConst(value) => Ok(*value),
            Expr::StrConst(_) => Err(RuntimeError::TypeMismatch(
                "string expression evaluated as integer",
            )),
            Expr::StoreRegister => Ok(ctx.store_register()),
            Expr::MemoryRef { bank, index } => {
                let index = index.int_value(ctx)?;
                ctx.read_int(bank.int_location(index)?)
            }
            Expr::SimpleMemRef { bank, index } => ctx.read_int(bank.int_location(*index)?),
            Expr::Unary { op, operand } => Ok(apply_unary(*op, operand.int_value(ctx)?)),
            Expr::Binary { op, left, right } => {
                if let Some(base) = op.compound_base() {
                    // Read-modify-write: the left side's current value is
                    // read before the right side is evaluated.
                    let lhs = left.int_value(ctx)?;
                    let rhs = right.int_value(ctx)?;
                    let value = apply_binary(base, lhs, rhs);
                    left.assign_int(ctx, value)?;
                    Ok(value)
                } else if *op == BinaryOp::Assign {
                    let value = right.int_value(ctx)?;
                    left.assign_int(ctx, value)?;
                    Ok(value)
                } else {
                    let lhs = left.int_value(ctx)?;
                    let rhs = right.int_value(ctx)?;
                    Ok(apply_binary(*op, lhs, rhs))
                }
            }
            Expr::SimpleAssign { bank, index, value } => {
                ctx.write_int(bank.int_location(*index)?, *value)?;
                Ok(*value)
            }
            Expr::Complex(children) | Expr::Special { exprs: children, .. } => {
                if children.len() == 1 {
                    children[0].int_value(ctx)
                } else {
                    Err(RuntimeError::TypeMismatch(
                        "aggregate expression has no scalar integer value",
                    ))
                }
            }
        }
    }

    /// Evaluate to a string. Fails with `TypeMismatch` for integer-only
    /// expressions.
    pub fn str_value(&self, ctx: &mut dyn MemoryAccess) -> RuntimeResult<String> {
        match self {
            Expr::StrConst(value) => Ok(value.clone()),
            Expr::MemoryRef { bank, index } => {
                let index = index.int_value(ctx)?;
                ctx.read_str(bank.str_location(index)?)
            }
            Expr::SimpleMemRef { bank, index } => ctx.read_str(bank.str_location(*index)?),
            Expr::Complex(children) | Expr::Special { exprs: children, .. }
                if children.len() == 1 =>
            {
                children[0].str_value(ctx)
            }
            _ => Err(RuntimeError::TypeMismatch(
                "integer expression evaluated as string",
            )),
        }
    }

    /// Store an integer through this node. Only l-values accept this.
    pub fn assign_int(&self, ctx: &mut dyn MemoryAccess, value: i32) -> RuntimeResult<()> {
        match self {
            Expr::StoreRegister => {
                ctx.set_store_register(value);
                Ok(())
            }
            Expr::MemoryRef { bank, index } => {
                let index = index.int_value(ctx)?;
                ctx.write_int(bank.int_location(index)?, value)
            }
            Expr::SimpleMemRef { bank, index } => {
                ctx.write_int(bank.int_location(*index)?, value)
            }
            _ => Err(RuntimeError::NotAnLvalue),
        }
    }

    /// Store a string through this node. Only string l-values accept this.
    pub fn assign_str(&self, ctx: &mut dyn MemoryAccess, value: String) -> RuntimeResult<()> {
        match self {
            Expr::MemoryRef { bank, index } => {
                let index = index.int_value(ctx)?;
                ctx.write_str(bank.str_location(index)?, value)
            }
            Expr::SimpleMemRef { bank, index } => {
                ctx.write_str(bank.str_location(*index)?, value)
            }
            _ => Err(RuntimeError::NotAnLvalue),
        }
    }

    /// A cursor to the referenced cell, usable for bulk copies during
    /// save-flag replay. Only memory references produce one.
    pub fn reference(&self, ctx: &mut dyn MemoryAccess) -> RuntimeResult<ReferenceCursor> {
        match self {
            Expr::StoreRegister => Ok(ReferenceCursor::Store),
            Expr::MemoryRef { bank, index } => {
                let index = index.int_value(ctx)?;
                self.cursor_for(*bank, index)
            }
            Expr::SimpleMemRef { bank, index } => self.cursor_for(*bank, *index),
            _ => Err(RuntimeError::NotAnLvalue),
        }
    }

    fn cursor_for(&self, bank: BankRef, index: i32) -> RuntimeResult<ReferenceCursor> {
        Ok(match bank {
            BankRef::Int { .. } => ReferenceCursor::Int(bank.int_location(index)?),
            BankRef::Str { .. } => ReferenceCursor::Str(bank.str_location(index)?),
        })
    }

    /// Canonical byte form equivalent to the in-archive encoding, with all
    /// references flattened to their current values. Used when the current
    /// state of an expression must be embedded into persisted bytecode
    /// fragments (savepoint selection snapshots).
    pub fn serialized(&self, ctx: &mut dyn MemoryAccess) -> RuntimeResult<Vec<u8>> {
        match self {
            Expr::StrConst(_) => Ok(quote_bytes(&self.str_value(ctx)?)),
            Expr::MemoryRef { bank, .. } | Expr::SimpleMemRef { bank, .. }
                if bank.is_string() =>
            {
                Ok(quote_bytes(&self.str_value(ctx)?))
            }
            Expr::Complex(children) => {
                let mut out = vec![b'('];
                for child in children {
                    out.push(b'(');
                    out.extend(child.serialized(ctx)?);
                    out.push(b')');
                }
                out.push(b')');
                Ok(out)
            }
            Expr::Special { tag, exprs } => {
                let mut out = vec![b'a', *tag as u8];
                if exprs.len() > 1 {
                    out.push(b'(');
                }
                for child in exprs {
                    out.extend(child.serialized(ctx)?);
                }
                if exprs.len() > 1 {
                    out.push(b')');
                }
                Ok(out)
            }
            _ => Ok(int_to_bytecode(self.int_value(ctx)?)),
        }
    }

    /// Human-readable form for trace logs.
    pub fn debug_string(&self) -> String {
        match self {
            Expr::IntConst(value) => value.to_string(),
            Expr::StrConst(value) => format!("\"{value}\""),
            Expr::StoreRegister => "<store>".to_string(),
            Expr::MemoryRef { bank, index } => {
                format!("{}[{}]", bank.display_name(), index.debug_string())
            }
            Expr::SimpleMemRef { bank, index } => {
                format!("{}[{}]", bank.display_name(), index)
            }
            Expr::Unary { op: UnaryOp::Minus, operand } => format!("-{}", operand.debug_string()),
            Expr::Binary { op, left, right } => {
                format!("{} {} {}", left.debug_string(), op, right.debug_string())
            }
            Expr::SimpleAssign { bank, index, value } => {
                format!("{}[{}] = {}", bank.display_name(), index, value)
            }
            Expr::Complex(children) => {
                let mut out = String::from("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&child.debug_string());
                }
                out.push(')');
                out
            }
            Expr::Special { tag, exprs } => {
                let mut out = String::new();
                let _ = write!(out, "{tag}:{{");
                for (i, child) in exprs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&child.debug_string());
                }
                out.push('}');
                out
            }
        }
    }
}

/// Bytecode spelling of an integer constant: `$ FF` then four LE bytes.
pub(crate) fn int_to_bytecode(value: i32) -> Vec<u8> {
    let mut out = vec![b'$', 0xFF];
    out.extend_from_slice(&value.to_le_bytes());
    out
}

fn quote_bytes(value: &str) -> Vec<u8> {
    let mut out = vec![b'"'];
    out.extend_from_slice(value.as_bytes());
    out.push(b'"');
    out
}

/// A resolved pointer-like handle to one addressable cell, advanceable for
/// bulk copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceCursor {
    Store,
    Int(IntMemoryLocation),
    Str(StrMemoryLocation),
}

impl ReferenceCursor {
    /// The cursor `offset` cells further along the same bank. The store
    /// register is a single cell and does not advance.
    pub fn offset(self, offset: usize) -> ReferenceCursor {
        match self {
            ReferenceCursor::Store => ReferenceCursor::Store,
            ReferenceCursor::Int(loc) => ReferenceCursor::Int(IntMemoryLocation {
                index: loc.index + offset,
                ..loc
            }),
            ReferenceCursor::Str(loc) => ReferenceCursor::Str(StrMemoryLocation {
                index: loc.index + offset,
                ..loc
            }),
        }
    }

    pub fn read_int(&self, ctx: &mut dyn MemoryAccess) -> RuntimeResult<i32> {
        match self {
            ReferenceCursor::Store => Ok(ctx.store_register()),
            ReferenceCursor::Int(loc) => ctx.read_int(*loc),
            ReferenceCursor::Str(_) => Err(RuntimeError::TypeMismatch(
                "string cursor read as integer",
            )),
        }
    }

    pub fn write_int(&self, ctx: &mut dyn MemoryAccess, value: i32) -> RuntimeResult<()> {
        match self {
            ReferenceCursor::Store => {
                ctx.set_store_register(value);
                Ok(())
            }
            ReferenceCursor::Int(loc) => ctx.write_int(*loc, value),
            ReferenceCursor::Str(_) => Err(RuntimeError::TypeMismatch(
                "string cursor written as integer",
            )),
        }
    }

    pub fn read_str(&self, ctx: &mut dyn MemoryAccess) -> RuntimeResult<String> {
        match self {
            ReferenceCursor::Str(loc) => ctx.read_str(*loc),
            _ => Err(RuntimeError::TypeMismatch("integer cursor read as string")),
        }
    }

    pub fn write_str(&self, ctx: &mut dyn MemoryAccess, value: String) -> RuntimeResult<()> {
        match self {
            ReferenceCursor::Str(loc) => ctx.write_str(*loc, value),
            _ => Err(RuntimeError::TypeMismatch(
                "integer cursor written as string",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_memory::{FramelessMemory, Memory};

    fn with_ctx<R>(f: impl FnOnce(&mut dyn MemoryAccess) -> R) -> R {
        let mut memory = Memory::default();
        let mut ctx = FramelessMemory {
            memory: &mut memory,
            store_register: 0,
        };
        f(&mut ctx)
    }

    // intA full-width bank code.
    const INT_A: i32 = 0;
    // strS bank code.
    const STR_S: i32 = 0x12;

    #[test]
    fn literals_evaluate_to_themselves() {
        with_ctx(|ctx| {
            assert_eq!(Expr::int(42).int_value(ctx).unwrap(), 42);
            assert_eq!(Expr::str("hi").str_value(ctx).unwrap(), "hi");
        });
    }

    #[test]
    fn type_mismatch_is_reported() {
        with_ctx(|ctx| {
            assert!(matches!(
                Expr::str("hi").int_value(ctx),
                Err(RuntimeError::TypeMismatch(_))
            ));
            assert!(matches!(
                Expr::int(1).str_value(ctx),
                Err(RuntimeError::TypeMismatch(_))
            ));
        });
    }

    #[test]
    fn assignment_returns_assigned_value() {
        with_ctx(|ctx| {
            let assign = Expr::binary(BinaryOp::Assign, Expr::simple_ref(INT_A, 0), Expr::int(7));
            assert_eq!(assign.int_value(ctx).unwrap(), 7);
            assert_eq!(Expr::simple_ref(INT_A, 0).int_value(ctx).unwrap(), 7);
        });
    }

    #[test]
    fn compound_assignment_reads_left_then_right() {
        with_ctx(|ctx| {
            Expr::simple_ref(INT_A, 0).assign_int(ctx, 10).unwrap();
            // intA[0] += (intA[0] = 5): left read (10) happens before the
            // right side overwrites the cell, so the result is 10 + 5.
            let inner = Expr::binary(BinaryOp::Assign, Expr::simple_ref(INT_A, 0), Expr::int(5));
            let compound =
                Expr::binary(BinaryOp::AddAssign, Expr::simple_ref(INT_A, 0), inner);
            assert_eq!(compound.int_value(ctx).unwrap(), 15);
            assert_eq!(Expr::simple_ref(INT_A, 0).int_value(ctx).unwrap(), 15);
        });
    }

    #[test]
    fn store_register_is_an_lvalue() {
        with_ctx(|ctx| {
            Expr::StoreRegister.assign_int(ctx, 3).unwrap();
            assert_eq!(Expr::StoreRegister.int_value(ctx).unwrap(), 3);
            assert!(matches!(
                Expr::int(1).assign_int(ctx, 0),
                Err(RuntimeError::NotAnLvalue)
            ));
        });
    }

    #[test]
    fn division_by_zero_inside_expression_yields_zero() {
        with_ctx(|ctx| {
            let div = Expr::binary(BinaryOp::Div, Expr::int(100), Expr::int(0));
            assert_eq!(div.int_value(ctx).unwrap(), 0);
        });
    }

    #[test]
    fn execute_routes_string_assignment() {
        with_ctx(|ctx| {
            let assign = Expr::binary(
                BinaryOp::Assign,
                Expr::simple_ref(STR_S, 0),
                Expr::str("saved"),
            );
            assign.execute(ctx).unwrap();
            assert_eq!(Expr::simple_ref(STR_S, 0).str_value(ctx).unwrap(), "saved");
        });
    }

    #[test]
    fn string_bank_round_trip() {
        with_ctx(|ctx| {
            Expr::simple_ref(STR_S, 2)
                .assign_str(ctx, "hello".into())
                .unwrap();
            assert_eq!(Expr::simple_ref(STR_S, 2).str_value(ctx).unwrap(), "hello");
        });
    }

    #[test]
    fn single_child_containers_are_transparent() {
        with_ctx(|ctx| {
            let complex = Expr::Complex(vec![Expr::int(9)]);
            assert_eq!(complex.int_value(ctx).unwrap(), 9);
            let wide = Expr::Complex(vec![Expr::int(1), Expr::int(2)]);
            assert!(wide.int_value(ctx).is_err());
        });
    }

    #[test]
    fn reference_cursor_walks_a_bank() {
        with_ctx(|ctx| {
            for i in 0..4 {
                Expr::simple_ref(INT_A, i)
                    .assign_int(ctx, i * 10)
                    .unwrap();
            }
            let cursor = Expr::simple_ref(INT_A, 0).reference(ctx).unwrap();
            for i in 0..4usize {
                assert_eq!(cursor.offset(i).read_int(ctx).unwrap(), i as i32 * 10);
            }
        });
    }

    #[test]
    fn debug_strings_are_readable() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::simple_ref(INT_A, 3),
            Expr::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(Expr::int(4)),
            },
        );
        assert_eq!(expr.debug_string(), "intA[3] + -4");
    }
}
