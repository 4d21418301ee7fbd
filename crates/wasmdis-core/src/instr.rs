//! Decoded instruction records and function bodies.
//!
//! Produced exclusively by the decoder, consumed read-only downstream. Block
//! nesting is positional: an enter-block instruction is paired with exactly
//! one leave-block instruction at the same depth, and the decoder has already
//! enforced that discipline by the time these values exist.

use crate::opcodes::Opcode;
use crate::types::{BlockType, ValType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Immediate payload decoded after an opcode byte.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Imm {
    /// No immediate.
    None,
    /// Block signature (`block`, `loop`, `if`).
    Block(BlockType),
    /// Relative branch depth (`br`, `br_if`).
    Depth(u32),
    /// Branch table: depth per case plus the default depth.
    BrTable {
        /// Case depths, in table order.
        depths: Vec<u32>,
        /// Depth taken when the index falls outside the table.
        default: u32,
    },
    /// Function index (`call`).
    FuncIdx(u32),
    /// Type index (`call_indirect`).
    CallIndirect {
        /// Index into the module's type table.
        type_idx: u32,
    },
    /// Local index.
    LocalIdx(u32),
    /// Global index.
    GlobalIdx(u32),
    /// Memory argument.
    MemArg {
        /// Alignment exponent (base-2 logarithm of the alignment).
        align: u32,
        /// Static address offset.
        offset: u32,
    },
    /// Memory index (`memory.size`, `memory.grow`).
    MemIdx(u32),
    /// `i32.const` payload.
    I32(i32),
    /// `i64.const` payload.
    I64(i64),
    /// `f32.const` payload.
    F32(f32),
    /// `f64.const` payload.
    F64(f64),
}

/// One decoded bytecode operation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instruction {
    /// Operation kind.
    pub opcode: Opcode,
    /// Immediate payload, `Imm::None` for most opcodes.
    pub imm: Imm,
}

impl Instruction {
    /// Builds an instruction with no immediate.
    pub const fn plain(opcode: Opcode) -> Self {
        Self { opcode, imm: Imm::None }
    }

    /// Builds an instruction with the given immediate.
    pub const fn with_imm(opcode: Opcode, imm: Imm) -> Self {
        Self { opcode, imm }
    }
}

/// Run-length local declaration: `count` slots of type `ty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalEntry {
    /// Number of consecutive slots.
    pub count: u32,
    /// Type shared by the slots.
    pub ty: ValType,
}

/// A function body: declared local slots plus the instruction sequence.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FuncBody {
    /// Run-length local declarations, in declaration order.
    pub locals: Vec<LocalEntry>,
    /// Instruction sequence, terminated by the function-level `end`.
    pub instrs: Vec<Instruction>,
}

impl FuncBody {
    /// Body with instructions and no locals.
    pub fn from_instrs(instrs: Vec<Instruction>) -> Self {
        Self { locals: Vec::new(), instrs }
    }

    /// Total number of declared local slots (run-lengths expanded).
    pub fn local_slot_count(&self) -> u64 {
        self.locals.iter().map(|l| u64::from(l.count)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn local_slot_count_expands_runs() {
        let body = FuncBody {
            locals: vec![
                LocalEntry { count: 2, ty: ValType::I32 },
                LocalEntry { count: 3, ty: ValType::F64 },
            ],
            instrs: vec![Instruction::plain(Opcode::End)],
        };
        assert_eq!(body.local_slot_count(), 5);
    }

    #[test]
    fn plain_instruction_has_no_imm() {
        assert_eq!(Instruction::plain(Opcode::Nop).imm, Imm::None);
    }
}
