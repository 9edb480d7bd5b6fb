use crate::expr::Expr;
use core_model::{RuntimeError, RuntimeResult};

/// Parse the serialized (value-flattened) expression encoding produced by
/// [`Expr::serialized`].
///
/// Serialization replaces every reference and operator node with its
/// current value, so the grammar here is the literal subset: integer
/// constants (`$ FF` + LE bytes), quoted strings, parenthesized complex
/// tuples and tagged specials. Re-parsing a serialized expression yields a
/// tree with an equivalent evaluation under the same memory state.
pub fn parse_serialized(input: &[u8]) -> RuntimeResult<Expr> {
    let mut cursor = Cursor { input, pos: 0 };
    let expr = cursor.parse_one()?;
    if cursor.pos != input.len() {
        return Err(RuntimeError::BadFormat(format!(
            "trailing bytes at offset {} in serialized expression",
            cursor.pos
        )));
    }
    Ok(expr)
}

struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> RuntimeResult<u8> {
        let byte = self
            .peek()
            .ok_or_else(|| RuntimeError::BadFormat("unexpected end of serialized expression".into()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn parse_one(&mut self) -> RuntimeResult<Expr> {
        match self.bump()? {
            b'$' => self.parse_int_constant(),
            b'"' => self.parse_string_constant(),
            b'(' => self.parse_complex(),
            b'a' => self.parse_special(),
            other => Err(RuntimeError::BadFormat(format!(
                "unexpected byte 0x{other:02X} in serialized expression"
            ))),
        }
    }

    fn parse_int_constant(&mut self) -> RuntimeResult<Expr> {
        let marker = self.bump()?;
        if marker != 0xFF {
            return Err(RuntimeError::BadFormat(format!(
                "expected literal marker 0xFF after '$', found 0x{marker:02X}"
            )));
        }
        if self.pos + 4 > self.input.len() {
            return Err(RuntimeError::BadFormat(
                "truncated integer constant in serialized expression".into(),
            ));
        }
        let bytes: [u8; 4] = self.input[self.pos..self.pos + 4].try_into().unwrap();
        self.pos += 4;
        Ok(Expr::IntConst(i32::from_le_bytes(bytes)))
    }

    fn parse_string_constant(&mut self) -> RuntimeResult<Expr> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == b'"' {
                let text = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                self.pos += 1;
                return Ok(Expr::StrConst(text));
            }
            self.pos += 1;
        }
        Err(RuntimeError::BadFormat(
            "unterminated string constant in serialized expression".into(),
        ))
    }

    fn parse_complex(&mut self) -> RuntimeResult<Expr> {
        let mut children = Vec::new();
        loop {
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Expr::Complex(children));
                }
                Some(b'(') => {
                    self.pos += 1;
                    let child = self.parse_one()?;
                    if self.bump()? != b')' {
                        return Err(RuntimeError::BadFormat(
                            "missing ')' after complex element".into(),
                        ));
                    }
                    children.push(child);
                }
                _ => {
                    return Err(RuntimeError::BadFormat(
                        "malformed complex expression".into(),
                    ))
                }
            }
        }
    }

    fn parse_special(&mut self) -> RuntimeResult<Expr> {
        let tag = self.bump()? as i32;
        let mut exprs = Vec::new();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            while self.peek() != Some(b')') {
                exprs.push(self.parse_one()?);
            }
            self.pos += 1;
        } else if self.peek().is_some() {
            exprs.push(self.parse_one()?);
        }
        Ok(Expr::Special { tag, exprs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_memory::{FramelessMemory, Memory};

    fn serialize_in_fresh_ctx(expr: &Expr) -> Vec<u8> {
        let mut memory = Memory::default();
        let mut ctx = FramelessMemory {
            memory: &mut memory,
            store_register: 0,
        };
        expr.serialized(&mut ctx).unwrap()
    }

    fn eval_int(expr: &Expr) -> i32 {
        let mut memory = Memory::default();
        let mut ctx = FramelessMemory {
            memory: &mut memory,
            store_register: 0,
        };
        expr.int_value(&mut ctx).unwrap()
    }

    #[test]
    fn int_constant_round_trip() {
        for value in [0, 1, -1, 12345, i32::MIN, i32::MAX] {
            let bytes = serialize_in_fresh_ctx(&Expr::int(value));
            let parsed = parse_serialized(&bytes).unwrap();
            assert_eq!(parsed, Expr::IntConst(value));
        }
    }

    #[test]
    fn simple_memory_reference_round_trips_to_its_value() {
        let mut memory = Memory::default();
        let mut ctx = FramelessMemory {
            memory: &mut memory,
            store_register: 0,
        };
        let target = Expr::simple_ref(0, 4);
        target.assign_int(&mut ctx, 777).unwrap();

        let bytes = target.serialized(&mut ctx).unwrap();
        let parsed = parse_serialized(&bytes).unwrap();
        // The reference flattens to its current value; evaluation under the
        // same memory state is equivalent.
        assert_eq!(
            parsed.int_value(&mut ctx).unwrap(),
            target.int_value(&mut ctx).unwrap()
        );
    }

    #[test]
    fn string_constant_round_trip() {
        let bytes = serialize_in_fresh_ctx(&Expr::str("selection A"));
        assert_eq!(
            parse_serialized(&bytes).unwrap(),
            Expr::StrConst("selection A".into())
        );
    }

    #[test]
    fn complex_round_trip() {
        let expr = Expr::Complex(vec![Expr::int(1), Expr::int(2), Expr::str("x")]);
        let bytes = serialize_in_fresh_ctx(&expr);
        let parsed = parse_serialized(&bytes).unwrap();
        assert_eq!(
            parsed,
            Expr::Complex(vec![Expr::int(1), Expr::int(2), Expr::str("x")])
        );
    }

    #[test]
    fn special_round_trip_preserves_tag() {
        let expr = Expr::Special {
            tag: 3,
            exprs: vec![Expr::int(10), Expr::int(20)],
        };
        let bytes = serialize_in_fresh_ctx(&expr);
        let parsed = parse_serialized(&bytes).unwrap();
        assert_eq!(parsed.overload_tag(), Some(3));
        assert_eq!(parsed.children().len(), 2);
    }

    #[test]
    fn binary_expression_flattens_to_result() {
        use crate::ops::BinaryOp;
        let expr = Expr::binary(BinaryOp::Mul, Expr::int(6), Expr::int(7));
        let bytes = serialize_in_fresh_ctx(&expr);
        let parsed = parse_serialized(&bytes).unwrap();
        assert_eq!(eval_int(&parsed), 42);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_serialized(b"zzz").is_err());
        assert!(parse_serialized(b"$\x00\x01\x02\x03\x04").is_err());
        assert!(parse_serialized(b"\"unterminated").is_err());
    }
}
