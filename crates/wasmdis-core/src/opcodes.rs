//! WebAssembly MVP opcode table.
//!
//! One declarative table drives the enum, the checked byte lookup, the
//! text-format mnemonic and the immediate-class used by the decoder. A hole
//! in the table is a loud [`CoreError::UnknownOpcode`], never a default.
//!
//! The structural markers the formatter relies on are exposed as predicates:
//! [`Opcode::enters_block`] (`block`/`loop`/`if`), [`Opcode::leaves_block`]
//! (`end`) and [`Opcode::is_else`] (`else`, which both closes and reopens a
//! block during rendering).

use crate::{CoreError, CoreResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Immediate class attached to an opcode, consumed by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmKind {
    /// No immediate.
    None,
    /// Block signature byte (`block`, `loop`, `if`).
    Block,
    /// Relative branch depth (`br`, `br_if`).
    Depth,
    /// Branch table: depth vector plus default depth.
    BrTable,
    /// Function index (`call`).
    Func,
    /// Type index plus reserved table byte (`call_indirect`).
    CallIndirect,
    /// Local index.
    Local,
    /// Global index.
    Global,
    /// Memory argument: alignment exponent and offset.
    Mem,
    /// Memory index (`memory.size`, `memory.grow`).
    MemIdx,
    /// Signed 32-bit constant.
    I32,
    /// Signed 64-bit constant.
    I64,
    /// IEEE-754 32-bit constant.
    F32,
    /// IEEE-754 64-bit constant.
    F64,
}

macro_rules! opcode_table {
    ($( $byte:literal => $name:ident, $mnemonic:literal, $imm:ident; )*) => {
        /// A WebAssembly MVP operation kind.
        ///
        /// Discriminants match the binary encoding.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[repr(u8)]
        pub enum Opcode {
            $(
                #[doc = concat!("`", $mnemonic, "`")]
                $name = $byte,
            )*
        }

        impl Opcode {
            /// Looks up an opcode by its binary encoding.
            pub fn from_byte(raw: u8) -> CoreResult<Self> {
                match raw {
                    $( $byte => Ok(Opcode::$name), )*
                    _ => Err(CoreError::UnknownOpcode { raw }),
                }
            }

            /// Text-format mnemonic, distinct per opcode.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Immediate class decoded after the opcode byte.
            pub const fn imm_kind(self) -> ImmKind {
                match self {
                    $( Opcode::$name => ImmKind::$imm, )*
                }
            }
        }
    };
}

opcode_table! {
    // Control
    0x00 => Unreachable, "unreachable", None;
    0x01 => Nop, "nop", None;
    0x02 => Block, "block", Block;
    0x03 => Loop, "loop", Block;
    0x04 => If, "if", Block;
    0x05 => Else, "else", None;
    0x0B => End, "end", None;
    0x0C => Br, "br", Depth;
    0x0D => BrIf, "br_if", Depth;
    0x0E => BrTable, "br_table", BrTable;
    0x0F => Return, "return", None;
    0x10 => Call, "call", Func;
    0x11 => CallIndirect, "call_indirect", CallIndirect;

    // Parametric
    0x1A => Drop, "drop", None;
    0x1B => Select, "select", None;

    // Variable
    0x20 => LocalGet, "local.get", Local;
    0x21 => LocalSet, "local.set", Local;
    0x22 => LocalTee, "local.tee", Local;
    0x23 => GlobalGet, "global.get", Global;
    0x24 => GlobalSet, "global.set", Global;

    // Memory
    0x28 => I32Load, "i32.load", Mem;
    0x29 => I64Load, "i64.load", Mem;
    0x2A => F32Load, "f32.load", Mem;
    0x2B => F64Load, "f64.load", Mem;
    0x2C => I32Load8S, "i32.load8_s", Mem;
    0x2D => I32Load8U, "i32.load8_u", Mem;
    0x2E => I32Load16S, "i32.load16_s", Mem;
    0x2F => I32Load16U, "i32.load16_u", Mem;
    0x30 => I64Load8S, "i64.load8_s", Mem;
    0x31 => I64Load8U, "i64.load8_u", Mem;
    0x32 => I64Load16S, "i64.load16_s", Mem;
    0x33 => I64Load16U, "i64.load16_u", Mem;
    0x34 => I64Load32S, "i64.load32_s", Mem;
    0x35 => I64Load32U, "i64.load32_u", Mem;
    0x36 => I32Store, "i32.store", Mem;
    0x37 => I64Store, "i64.store", Mem;
    0x38 => F32Store, "f32.store", Mem;
    0x39 => F64Store, "f64.store", Mem;
    0x3A => I32Store8, "i32.store8", Mem;
    0x3B => I32Store16, "i32.store16", Mem;
    0x3C => I64Store8, "i64.store8", Mem;
    0x3D => I64Store16, "i64.store16", Mem;
    0x3E => I64Store32, "i64.store32", Mem;
    0x3F => MemorySize, "memory.size", MemIdx;
    0x40 => MemoryGrow, "memory.grow", MemIdx;

    // Constants
    0x41 => I32Const, "i32.const", I32;
    0x42 => I64Const, "i64.const", I64;
    0x43 => F32Const, "f32.const", F32;
    0x44 => F64Const, "f64.const", F64;

    // i32 comparisons
    0x45 => I32Eqz, "i32.eqz", None;
    0x46 => I32Eq, "i32.eq", None;
    0x47 => I32Ne, "i32.ne", None;
    0x48 => I32LtS, "i32.lt_s", None;
    0x49 => I32LtU, "i32.lt_u", None;
    0x4A => I32GtS, "i32.gt_s", None;
    0x4B => I32GtU, "i32.gt_u", None;
    0x4C => I32LeS, "i32.le_s", None;
    0x4D => I32LeU, "i32.le_u", None;
    0x4E => I32GeS, "i32.ge_s", None;
    0x4F => I32GeU, "i32.ge_u", None;

    // i64 comparisons
    0x50 => I64Eqz, "i64.eqz", None;
    0x51 => I64Eq, "i64.eq", None;
    0x52 => I64Ne, "i64.ne", None;
    0x53 => I64LtS, "i64.lt_s", None;
    0x54 => I64LtU, "i64.lt_u", None;
    0x55 => I64GtS, "i64.gt_s", None;
    0x56 => I64GtU, "i64.gt_u", None;
    0x57 => I64LeS, "i64.le_s", None;
    0x58 => I64LeU, "i64.le_u", None;
    0x59 => I64GeS, "i64.ge_s", None;
    0x5A => I64GeU, "i64.ge_u", None;

    // f32 comparisons
    0x5B => F32Eq, "f32.eq", None;
    0x5C => F32Ne, "f32.ne", None;
    0x5D => F32Lt, "f32.lt", None;
    0x5E => F32Gt, "f32.gt", None;
    0x5F => F32Le, "f32.le", None;
    0x60 => F32Ge, "f32.ge", None;

    // f64 comparisons
    0x61 => F64Eq, "f64.eq", None;
    0x62 => F64Ne, "f64.ne", None;
    0x63 => F64Lt, "f64.lt", None;
    0x64 => F64Gt, "f64.gt", None;
    0x65 => F64Le, "f64.le", None;
    0x66 => F64Ge, "f64.ge", None;

    // i32 numerics
    0x67 => I32Clz, "i32.clz", None;
    0x68 => I32Ctz, "i32.ctz", None;
    0x69 => I32Popcnt, "i32.popcnt", None;
    0x6A => I32Add, "i32.add", None;
    0x6B => I32Sub, "i32.sub", None;
    0x6C => I32Mul, "i32.mul", None;
    0x6D => I32DivS, "i32.div_s", None;
    0x6E => I32DivU, "i32.div_u", None;
    0x6F => I32RemS, "i32.rem_s", None;
    0x70 => I32RemU, "i32.rem_u", None;
    0x71 => I32And, "i32.and", None;
    0x72 => I32Or, "i32.or", None;
    0x73 => I32Xor, "i32.xor", None;
    0x74 => I32Shl, "i32.shl", None;
    0x75 => I32ShrS, "i32.shr_s", None;
    0x76 => I32ShrU, "i32.shr_u", None;
    0x77 => I32Rotl, "i32.rotl", None;
    0x78 => I32Rotr, "i32.rotr", None;

    // i64 numerics
    0x79 => I64Clz, "i64.clz", None;
    0x7A => I64Ctz, "i64.ctz", None;
    0x7B => I64Popcnt, "i64.popcnt", None;
    0x7C => I64Add, "i64.add", None;
    0x7D => I64Sub, "i64.sub", None;
    0x7E => I64Mul, "i64.mul", None;
    0x7F => I64DivS, "i64.div_s", None;
    0x80 => I64DivU, "i64.div_u", None;
    0x81 => I64RemS, "i64.rem_s", None;
    0x82 => I64RemU, "i64.rem_u", None;
    0x83 => I64And, "i64.and", None;
    0x84 => I64Or, "i64.or", None;
    0x85 => I64Xor, "i64.xor", None;
    0x86 => I64Shl, "i64.shl", None;
    0x87 => I64ShrS, "i64.shr_s", None;
    0x88 => I64ShrU, "i64.shr_u", None;
    0x89 => I64Rotl, "i64.rotl", None;
    0x8A => I64Rotr, "i64.rotr", None;

    // f32 numerics
    0x8B => F32Abs, "f32.abs", None;
    0x8C => F32Neg, "f32.neg", None;
    0x8D => F32Ceil, "f32.ceil", None;
    0x8E => F32Floor, "f32.floor", None;
    0x8F => F32Trunc, "f32.trunc", None;
    0x90 => F32Nearest, "f32.nearest", None;
    0x91 => F32Sqrt, "f32.sqrt", None;
    0x92 => F32Add, "f32.add", None;
    0x93 => F32Sub, "f32.sub", None;
    0x94 => F32Mul, "f32.mul", None;
    0x95 => F32Div, "f32.div", None;
    0x96 => F32Min, "f32.min", None;
    0x97 => F32Max, "f32.max", None;
    0x98 => F32Copysign, "f32.copysign", None;

    // f64 numerics
    0x99 => F64Abs, "f64.abs", None;
    0x9A => F64Neg, "f64.neg", None;
    0x9B => F64Ceil, "f64.ceil", None;
    0x9C => F64Floor, "f64.floor", None;
    0x9D => F64Trunc, "f64.trunc", None;
    0x9E => F64Nearest, "f64.nearest", None;
    0x9F => F64Sqrt, "f64.sqrt", None;
    0xA0 => F64Add, "f64.add", None;
    0xA1 => F64Sub, "f64.sub", None;
    0xA2 => F64Mul, "f64.mul", None;
    0xA3 => F64Div, "f64.div", None;
    0xA4 => F64Min, "f64.min", None;
    0xA5 => F64Max, "f64.max", None;
    0xA6 => F64Copysign, "f64.copysign", None;

    // Conversions
    0xA7 => I32WrapI64, "i32.wrap_i64", None;
    0xA8 => I32TruncF32S, "i32.trunc_f32_s", None;
    0xA9 => I32TruncF32U, "i32.trunc_f32_u", None;
    0xAA => I32TruncF64S, "i32.trunc_f64_s", None;
    0xAB => I32TruncF64U, "i32.trunc_f64_u", None;
    0xAC => I64ExtendI32S, "i64.extend_i32_s", None;
    0xAD => I64ExtendI32U, "i64.extend_i32_u", None;
    0xAE => I64TruncF32S, "i64.trunc_f32_s", None;
    0xAF => I64TruncF32U, "i64.trunc_f32_u", None;
    0xB0 => I64TruncF64S, "i64.trunc_f64_s", None;
    0xB1 => I64TruncF64U, "i64.trunc_f64_u", None;
    0xB2 => F32ConvertI32S, "f32.convert_i32_s", None;
    0xB3 => F32ConvertI32U, "f32.convert_i32_u", None;
    0xB4 => F32ConvertI64S, "f32.convert_i64_s", None;
    0xB5 => F32ConvertI64U, "f32.convert_i64_u", None;
    0xB6 => F32DemoteF64, "f32.demote_f64", None;
    0xB7 => F64ConvertI32S, "f64.convert_i32_s", None;
    0xB8 => F64ConvertI32U, "f64.convert_i32_u", None;
    0xB9 => F64ConvertI64S, "f64.convert_i64_s", None;
    0xBA => F64ConvertI64U, "f64.convert_i64_u", None;
    0xBB => F64PromoteF32, "f64.promote_f32", None;

    // Reinterpretations
    0xBC => I32ReinterpretF32, "i32.reinterpret_f32", None;
    0xBD => I64ReinterpretF64, "i64.reinterpret_f64", None;
    0xBE => F32ReinterpretI32, "f32.reinterpret_i32", None;
    0xBF => F64ReinterpretI64, "f64.reinterpret_i64", None;
}

impl Opcode {
    /// Binary encoding of this opcode.
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// True for the block-entering markers (`block`, `loop`, `if`).
    pub const fn enters_block(self) -> bool {
        matches!(self, Opcode::Block | Opcode::Loop | Opcode::If)
    }

    /// True for the block-leaving marker (`end`).
    pub const fn leaves_block(self) -> bool {
        matches!(self, Opcode::End)
    }

    /// True for `else`, which closes the consequent arm and opens the
    /// alternative one.
    pub const fn is_else(self) -> bool {
        matches!(self, Opcode::Else)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn byte_lookup_roundtrips() {
        for op in [Opcode::Unreachable, Opcode::Block, Opcode::End, Opcode::I32Const, Opcode::F64ReinterpretI64] {
            assert_eq!(Opcode::from_byte(op.to_byte()), Ok(op));
        }
    }

    #[test]
    fn holes_in_the_table_fail_loudly() {
        for raw in [0x06u8, 0x0A, 0x12, 0x1C, 0x25, 0xC0, 0xFF] {
            assert_eq!(Opcode::from_byte(raw), Err(CoreError::UnknownOpcode { raw }));
        }
    }

    #[test]
    fn structural_markers() {
        assert!(Opcode::Block.enters_block());
        assert!(Opcode::Loop.enters_block());
        assert!(Opcode::If.enters_block());
        assert!(Opcode::End.leaves_block());
        assert!(Opcode::Else.is_else());
        assert!(!Opcode::Nop.enters_block());
        assert!(!Opcode::Nop.leaves_block());
    }

    #[test]
    fn mnemonics_are_distinct() {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for raw in 0x00u8..=0xBF {
            if let Ok(op) = Opcode::from_byte(raw) {
                assert!(seen.insert(op.mnemonic()), "duplicate mnemonic {}", op.mnemonic());
            }
        }
        assert_eq!(seen.len(), 172);
    }

    #[test]
    fn imm_kinds_match_binary_encoding() {
        assert_eq!(Opcode::Block.imm_kind(), ImmKind::Block);
        assert_eq!(Opcode::BrTable.imm_kind(), ImmKind::BrTable);
        assert_eq!(Opcode::I32Load.imm_kind(), ImmKind::Mem);
        assert_eq!(Opcode::I64Const.imm_kind(), ImmKind::I64);
        assert_eq!(Opcode::I32Add.imm_kind(), ImmKind::None);
    }
}
