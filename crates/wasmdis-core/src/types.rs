//! Closed tag tables: value types, mutability, block signatures.
//!
//! Every table is a closed enum with a checked `from_byte` constructor. An
//! out-of-domain tag is an error carrying the raw byte, never a default.

use crate::{CoreError, CoreResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Binary tag for `i32`.
pub const TAG_I32: u8 = 0x7F;
/// Binary tag for `i64`.
pub const TAG_I64: u8 = 0x7E;
/// Binary tag for `f32`.
pub const TAG_F32: u8 = 0x7D;
/// Binary tag for `f64`.
pub const TAG_F64: u8 = 0x7C;
/// Binary tag for an empty block signature.
pub const TAG_BLOCK_EMPTY: u8 = 0x40;

/// The four numeric value kinds attached to locals, parameters and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValType {
    /// 32-bit integer.
    I32,
    /// 64-bit integer.
    I64,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl ValType {
    /// Reads a value type from its binary tag.
    pub fn from_byte(raw: u8) -> CoreResult<Self> {
        match raw {
            TAG_I32 => Ok(ValType::I32),
            TAG_I64 => Ok(ValType::I64),
            TAG_F32 => Ok(ValType::F32),
            TAG_F64 => Ok(ValType::F64),
            _ => Err(CoreError::UnknownValType { raw }),
        }
    }

    /// Binary tag of this value type.
    pub const fn to_byte(self) -> u8 {
        match self {
            ValType::I32 => TAG_I32,
            ValType::I64 => TAG_I64,
            ValType::F32 => TAG_F32,
            ValType::F64 => TAG_F64,
        }
    }
}

/// Two-state tag on a declared storage location such as a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mutability {
    /// Immutable once initialised.
    Const,
    /// May be reassigned.
    Var,
}

impl Mutability {
    /// Reads a mutability flag from its binary tag.
    pub fn from_byte(raw: u8) -> CoreResult<Self> {
        match raw {
            0x00 => Ok(Mutability::Const),
            0x01 => Ok(Mutability::Var),
            _ => Err(CoreError::UnknownMutability { raw }),
        }
    }

    /// Binary tag of this flag.
    pub const fn to_byte(self) -> u8 {
        match self {
            Mutability::Const => 0x00,
            Mutability::Var => 0x01,
        }
    }
}

/// Signature of a structured block: no result, or a single value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BlockType {
    /// Block produces no value.
    Empty,
    /// Block produces one value of the given type.
    Value(ValType),
}

impl BlockType {
    /// Reads a block signature from its binary tag.
    pub fn from_byte(raw: u8) -> CoreResult<Self> {
        if raw == TAG_BLOCK_EMPTY {
            return Ok(BlockType::Empty);
        }
        ValType::from_byte(raw)
            .map(BlockType::Value)
            .map_err(|_| CoreError::UnknownBlockType { raw })
    }
}

/// Function signature: parameter and result value-type lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FuncType {
    /// Parameter types, in declaration order.
    pub params: Vec<ValType>,
    /// Result types, in declaration order.
    pub results: Vec<ValType>,
}

impl FuncType {
    /// Builds a signature from parameter and result lists.
    pub fn new(params: Vec<ValType>, results: Vec<ValType>) -> Self {
        Self { params, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn val_type_tags_roundtrip() {
        for ty in [ValType::I32, ValType::I64, ValType::F32, ValType::F64] {
            assert_eq!(ValType::from_byte(ty.to_byte()), Ok(ty));
        }
    }

    #[test]
    fn val_type_rejects_unknown_tag() {
        assert_eq!(ValType::from_byte(0x7B), Err(CoreError::UnknownValType { raw: 0x7B }));
        assert_eq!(ValType::from_byte(0x00), Err(CoreError::UnknownValType { raw: 0x00 }));
    }

    #[test]
    fn mutability_tags_roundtrip() {
        assert_eq!(Mutability::from_byte(0x00), Ok(Mutability::Const));
        assert_eq!(Mutability::from_byte(0x01), Ok(Mutability::Var));
        assert_eq!(Mutability::from_byte(0x02), Err(CoreError::UnknownMutability { raw: 0x02 }));
    }

    #[test]
    fn block_type_tags() {
        assert_eq!(BlockType::from_byte(0x40), Ok(BlockType::Empty));
        assert_eq!(BlockType::from_byte(0x7F), Ok(BlockType::Value(ValType::I32)));
        assert_eq!(BlockType::from_byte(0x41), Err(CoreError::UnknownBlockType { raw: 0x41 }));
    }
}
