//! Linear opcode listing used by `esbc disasm`.
//!
//! One instruction per line, indented by block nesting. Unlike the decompiler
//! this never builds a tree, so it still shows the shape of streams that are
//! structurally wrong (as long as every opcode and operand is readable).

use core::fmt::Write;

use crate::{
    isa::{Format, Op, Shape},
    ByteReader, DecodeError, DecodeResult, StringTable, FUNC_MAIN,
};

/// Renders a stream as an opcode listing.
pub fn listing(bytes: &[u8]) -> DecodeResult<String> {
    let mut out = String::new();
    let mut r = ByteReader::new(bytes);
    let strings = StringTable::read_header(&mut r)?;

    if !strings.is_empty() {
        let _ = writeln!(out, ";; strings ({})", strings.len());
        for (id, s) in strings.iter() {
            let _ = writeln!(out, ";;   [{id}] {s:?}");
        }
    }

    let mut depth = 0usize;
    while !r.is_at_end() {
        let at = r.offset();
        let op = r.read_op()?;
        if op == Op::StrTab {
            return Err(DecodeError::UnexpectedOpcode { offset: at, byte: op.byte(), context: "listing" });
        }
        if op == Op::End {
            depth = depth.saturating_sub(1);
        }
        let pad = if op == Op::Else { depth.saturating_sub(1) } else { depth };
        let operands = operands(op, &mut r, &strings)?;
        let _ = if operands.is_empty() {
            writeln!(out, "{at:04} | {:width$}{op}", "", width = pad * 2)
        } else {
            writeln!(out, "{at:04} | {:width$}{op} {operands}", "", width = pad * 2)
        };
        if op.opens_block() {
            depth += 1;
        }
    }
    Ok(out)
}

fn operands(op: Op, r: &mut ByteReader<'_>, strings: &StringTable) -> DecodeResult<String> {
    Ok(match op.shape() {
        Shape::None | Shape::Table => String::new(),
        Shape::I16 => r.read_i16_be()?.to_string(),
        Shape::Str8 => format!("{:?}", r.read_str8()?),
        Shape::U8 => {
            let v = r.read_u8()?;
            match op {
                Op::SRef => match strings.get(v) {
                    Some(s) => format!("{v} ;; {s:?}"),
                    None => format!("{v} ;; <missing>"),
                },
                _ => v.to_string(),
            }
        }
        Shape::U8U8 => {
            let a = r.read_u8()?;
            let b = r.read_u8()?;
            match op {
                Op::Def | Op::DefX if a == FUNC_MAIN => format!("main nparams={b}"),
                Op::Def | Op::DefX => format!("f{a} nparams={b}"),
                Op::Call if a == FUNC_MAIN => format!("main argc={b}"),
                Op::Call => format!("f{a} argc={b}"),
                Op::Printf => match Format::from_id(a) {
                    Some(fmt) => format!("\"{}\" argc={b}", fmt.literal()),
                    None => format!("fmt#{a} argc={b}"),
                },
                _ => format!("{a} {b}"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_nested_blocks() -> DecodeResult<()> {
        // fn main() { for i := 1..=3 { print(i) } }
        let bytes = [0x01, 0xFF, 0x00, 0x10, 0x70, 0x01, 0x70, 0x03, 0x30, 0x74, 0x03, 0x03];
        let text = listing(&bytes)?;
        assert_eq!(
            text,
            "0000 | DEF main nparams=0\n\
             0003 |   FOR\n\
             0004 |     INT 1\n\
             0006 |     INT 3\n\
             0008 |     PRINT\n\
             0009 |     LVAR\n\
             0010 |   END\n\
             0011 | END\n"
        );
        Ok(())
    }

    #[test]
    fn shows_strings_and_else() -> DecodeResult<()> {
        let bytes = [0x00, 0x01, 0x02, b'o', b'k', 0x01, 0xFF, 0x00, 0x12, 0x70, 0x01, 0x30, 0x7B, 0x00, 0x13, 0x21, 0x03, 0x03];
        let text = listing(&bytes)?;
        assert!(text.starts_with(";; strings (1)\n;;   [0] \"ok\"\n"));
        assert!(text.contains("|     SREF 0 ;; \"ok\"\n"));
        assert!(text.contains("|   ELSE\n"));
        Ok(())
    }

    #[test]
    fn truncated_operand_is_an_error() {
        assert_eq!(listing(&[0x01, 0xFF]), Err(DecodeError::UnexpectedEof { offset: 2, needed: 1 }));
    }
}
