//! Function-body decoder.
//!
//! Turns a raw byte stream into structured [`Instruction`] records with
//! validated block nesting. Validation stops there on purpose: type checking,
//! index bounds and execution belong to other tools entirely.

use crate::instr::{FuncBody, Imm, Instruction, LocalEntry};
use crate::opcodes::{ImmKind, Opcode};
use crate::types::{BlockType, ValType};
use crate::{ByteReader, CoreError, CoreResult};

/// Open structural frame tracked while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Implicit frame wrapping the whole body.
    Func,
    /// `block` / `loop` frame.
    Plain,
    /// `if` frame, consequent arm.
    If,
    /// `if` frame, alternative arm (after `else`).
    Else,
}

/// Decodes the expression part of a function body.
///
/// The stream must consist of well-formed instructions and be terminated by
/// the `end` that closes the implicit function frame. Enter/leave markers must
/// pair up; a stray `end` or `else`, a missing terminator, or bytes past the
/// terminator are errors.
pub fn decode_bytecode(data: &[u8]) -> CoreResult<Vec<Instruction>> {
    let mut r = ByteReader::new(data);
    decode_expr(&mut r)
}

/// Decodes a full function body: run-length local declarations followed by
/// the instruction sequence.
pub fn decode_func_body(data: &[u8]) -> CoreResult<FuncBody> {
    let mut r = ByteReader::new(data);
    let locals = decode_locals(&mut r)?;
    let instrs = decode_expr(&mut r)?;
    Ok(FuncBody { locals, instrs })
}

fn decode_locals(r: &mut ByteReader<'_>) -> CoreResult<Vec<LocalEntry>> {
    let entry_count = r.read_u32_leb()?;
    let mut locals = Vec::new();
    for _ in 0..entry_count {
        let count = r.read_u32_leb()?;
        let ty = ValType::from_byte(r.read_u8()?)?;
        locals.push(LocalEntry { count, ty });
    }
    Ok(locals)
}

fn decode_expr(r: &mut ByteReader<'_>) -> CoreResult<Vec<Instruction>> {
    let mut instrs = Vec::new();
    let mut frames = vec![Frame::Func];

    loop {
        let at = r.offset();
        let opcode = Opcode::from_byte(r.read_u8()?)?;
        let imm = decode_imm(r, opcode)?;

        if opcode.enters_block() {
            frames.push(if opcode == Opcode::If { Frame::If } else { Frame::Plain });
        } else if opcode.is_else() {
            match frames.last_mut() {
                Some(top) if *top == Frame::If => *top = Frame::Else,
                _ => return Err(CoreError::UnbalancedBlock { at }),
            }
        } else if opcode.leaves_block() {
            frames.pop();
        }

        instrs.push(Instruction { opcode, imm });

        if frames.is_empty() {
            // function terminator consumed; nothing may follow
            if !r.is_empty() {
                return Err(CoreError::TrailingBytes { at: r.offset() });
            }
            return Ok(instrs);
        }
    }
}

fn decode_imm(r: &mut ByteReader<'_>, opcode: Opcode) -> CoreResult<Imm> {
    Ok(match opcode.imm_kind() {
        ImmKind::None => Imm::None,
        ImmKind::Block => Imm::Block(BlockType::from_byte(r.read_u8()?)?),
        ImmKind::Depth => Imm::Depth(r.read_u32_leb()?),
        ImmKind::BrTable => {
            let count = r.read_u32_leb()?;
            // each entry occupies at least one byte, so the remaining input
            // bounds how much is worth reserving up front
            let mut depths = Vec::with_capacity((count as usize).min(r.remaining()));
            for _ in 0..count {
                depths.push(r.read_u32_leb()?);
            }
            let default = r.read_u32_leb()?;
            Imm::BrTable { depths, default }
        }
        ImmKind::Func => Imm::FuncIdx(r.read_u32_leb()?),
        ImmKind::CallIndirect => {
            let type_idx = r.read_u32_leb()?;
            let _table = r.read_u8()?; // reserved in the MVP encoding
            Imm::CallIndirect { type_idx }
        }
        ImmKind::Local => Imm::LocalIdx(r.read_u32_leb()?),
        ImmKind::Global => Imm::GlobalIdx(r.read_u32_leb()?),
        ImmKind::Mem => {
            let align = r.read_u32_leb()?;
            let offset = r.read_u32_leb()?;
            Imm::MemArg { align, offset }
        }
        ImmKind::MemIdx => Imm::MemIdx(r.read_u32_leb()?),
        ImmKind::I32 => Imm::I32(r.read_i32_leb()?),
        ImmKind::I64 => Imm::I64(r.read_i64_leb()?),
        ImmKind::F32 => Imm::F32(r.read_f32_le()?),
        ImmKind::F64 => Imm::F64(r.read_f64_le()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_const_and_terminator() {
        // i32.const 42; end
        let instrs = decode_bytecode(&[0x41, 0x2A, 0x0B]).unwrap();
        assert_eq!(
            instrs,
            vec![
                Instruction::with_imm(Opcode::I32Const, Imm::I32(42)),
                Instruction::plain(Opcode::End),
            ]
        );
    }

    #[test]
    fn decodes_nested_blocks_in_order() {
        // block (result i32); loop; br 1; end; i32.const 7; end; end
        let bytes = [0x02, 0x7F, 0x03, 0x40, 0x0C, 0x01, 0x0B, 0x41, 0x07, 0x0B, 0x0B];
        let instrs = decode_bytecode(&bytes).unwrap();
        let ops: Vec<Opcode> = instrs.iter().map(|i| i.opcode).collect();
        assert_eq!(
            ops,
            vec![
                Opcode::Block,
                Opcode::Loop,
                Opcode::Br,
                Opcode::End,
                Opcode::I32Const,
                Opcode::End,
                Opcode::End,
            ]
        );
        assert_eq!(instrs[0].imm, Imm::Block(BlockType::Value(ValType::I32)));
        assert_eq!(instrs[1].imm, Imm::Block(BlockType::Empty));
    }

    #[test]
    fn decodes_if_else() {
        // i32.const 1; if; nop; else; nop; end; end
        let bytes = [0x41, 0x01, 0x04, 0x40, 0x01, 0x05, 0x01, 0x0B, 0x0B];
        let instrs = decode_bytecode(&bytes).unwrap();
        assert_eq!(instrs.len(), 7);
        assert_eq!(instrs[3].opcode, Opcode::Else);
    }

    #[test]
    fn decodes_br_table() {
        // br_table [1 2] default 0; ...; end (padded to stay balanced)
        let bytes = [0x02, 0x40, 0x0E, 0x02, 0x01, 0x02, 0x00, 0x0B, 0x0B];
        let instrs = decode_bytecode(&bytes).unwrap();
        assert_eq!(instrs[1].imm, Imm::BrTable { depths: vec![1, 2], default: 0 });
    }

    #[test]
    fn br_table_count_bounded_by_input() {
        // declared u32::MAX entries, but only three bytes follow the count
        let bytes = [0x02, 0x40, 0x0E, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0x00, 0x0B, 0x0B];
        assert_eq!(
            decode_bytecode(&bytes),
            Err(CoreError::UnexpectedEof { needed: 1, at: 11 })
        );
    }

    #[test]
    fn decodes_memarg_and_call() {
        // i32.load align=2 offset=4; call 3; end
        let bytes = [0x28, 0x02, 0x04, 0x10, 0x03, 0x0B];
        let instrs = decode_bytecode(&bytes).unwrap();
        assert_eq!(instrs[0].imm, Imm::MemArg { align: 2, offset: 4 });
        assert_eq!(instrs[1].imm, Imm::FuncIdx(3));
    }

    #[test]
    fn decodes_float_consts() {
        let mut bytes = vec![0x43];
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.push(0x0B);
        let instrs = decode_bytecode(&bytes).unwrap();
        assert_eq!(instrs[0].imm, Imm::F32(1.5));
    }

    #[test]
    fn rejects_unknown_opcode() {
        assert_eq!(decode_bytecode(&[0x06, 0x0B]), Err(CoreError::UnknownOpcode { raw: 0x06 }));
    }

    #[test]
    fn rejects_missing_terminator() {
        // block never closed, input ends
        assert_eq!(
            decode_bytecode(&[0x02, 0x40, 0x01]),
            Err(CoreError::UnexpectedEof { needed: 1, at: 3 })
        );
    }

    #[test]
    fn rejects_else_outside_if() {
        assert_eq!(decode_bytecode(&[0x05, 0x0B]), Err(CoreError::UnbalancedBlock { at: 0 }));
    }

    #[test]
    fn rejects_double_else() {
        // if; else; else — the second else has no open if arm
        let bytes = [0x41, 0x00, 0x04, 0x40, 0x05, 0x05, 0x0B, 0x0B];
        assert_eq!(decode_bytecode(&bytes), Err(CoreError::UnbalancedBlock { at: 5 }));
    }

    #[test]
    fn rejects_trailing_bytes() {
        // end (terminator) followed by a stray nop
        assert_eq!(decode_bytecode(&[0x0B, 0x01]), Err(CoreError::TrailingBytes { at: 1 }));
    }

    #[test]
    fn func_body_reads_locals_then_code() {
        // 2 entries: 2×i32, 1×f64 — then i32.const 0; end
        let bytes = [0x02, 0x02, 0x7F, 0x01, 0x7C, 0x41, 0x00, 0x0B];
        let body = decode_func_body(&bytes).unwrap();
        assert_eq!(
            body.locals,
            vec![
                LocalEntry { count: 2, ty: ValType::I32 },
                LocalEntry { count: 1, ty: ValType::F64 },
            ]
        );
        assert_eq!(body.instrs.len(), 2);
    }

    #[test]
    fn func_body_rejects_bad_local_type() {
        let bytes = [0x01, 0x01, 0x7B, 0x0B];
        assert_eq!(decode_func_body(&bytes), Err(CoreError::UnknownValType { raw: 0x7B }));
    }
}
