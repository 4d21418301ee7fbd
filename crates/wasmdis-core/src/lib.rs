//! wasmdis-core — primitives partagées de l'outillage wasmdis
//!
//! Fournit :
//! - les tables fermées de types de valeur et de mutabilité ([`types`])
//! - la table des opcodes WebAssembly MVP ([`opcodes`])
//! - le modèle de données des instructions décodées ([`instr`])
//! - le décodeur de corps de fonction ([`decode`])
//! - un lecteur d'octets sur slice avec helpers LEB128 ([`ByteReader`])
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! Features :
//! - `serde` : derive (dé)sérialisation sur le modèle de données public
//!
//! Le décodeur est le seul composant ici qui inspecte des octets bruts ; tout
//! l'aval (notamment `wasmdis-fmt`) consomme les structures produites et les
//! traite comme immuables.

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Tables fermées de types de valeur et de mutabilité.
pub mod types;

/// Table des opcodes WebAssembly MVP (mnémoniques + marqueurs structurels).
pub mod opcodes;

/// Instructions décodées et corps de fonction.
pub mod instr;

/// Décodeur de corps de fonction (`decode_bytecode`, `decode_func_body`).
pub mod decode;

pub use decode::{decode_bytecode, decode_func_body};
pub use instr::{FuncBody, Imm, Instruction, LocalEntry};
pub use opcodes::Opcode;
pub use types::{BlockType, FuncType, Mutability, ValType};

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs bas niveau partagées par le décodeur et les tables de tags.
///
/// Toute recherche dans un domaine fermé échoue bruyamment avec le tag brut
/// fautif ; rien ici ne remplace silencieusement une valeur inconnue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Fin de l'entrée avant d'avoir pu lire une valeur complète.
    #[error("unexpected end of input: need {needed} more byte(s) at offset {at}")]
    UnexpectedEof {
        /// Nombre d'octets manquants.
        needed: usize,
        /// Offset où la lecture a commencé.
        at: usize,
    },
    /// Valeur LEB128 qui déborde de la largeur déclarée.
    #[error("LEB128 value out of range at offset {at}")]
    LebOverflow {
        /// Offset du premier octet de la valeur.
        at: usize,
    },
    /// Octet absent de la table des opcodes.
    #[error("unknown opcode: 0x{raw:02X}")]
    UnknownOpcode {
        /// Octet d'opcode brut.
        raw: u8,
    },
    /// Octet qui n'est aucun des quatre tags de type de valeur.
    #[error("unknown value type tag: 0x{raw:02X}")]
    UnknownValType {
        /// Tag de type brut.
        raw: u8,
    },
    /// Octet qui n'est aucun des deux tags de mutabilité.
    #[error("unknown mutability tag: 0x{raw:02X}")]
    UnknownMutability {
        /// Tag de mutabilité brut.
        raw: u8,
    },
    /// Octet qui n'est ni le tag de bloc vide ni un tag de type de valeur.
    #[error("unknown block type tag: 0x{raw:02X}")]
    UnknownBlockType {
        /// Tag de type de bloc brut.
        raw: u8,
    },
    /// Marqueurs d'entrée/sortie de bloc non appariés.
    #[error("unbalanced block nesting at offset {at}")]
    UnbalancedBlock {
        /// Offset de l'instruction qui a rompu la discipline.
        at: usize,
    },
    /// Entrée qui continue après le `end` terminal du corps.
    #[error("trailing bytes after function end at offset {at}")]
    TrailingBytes {
        /// Offset du premier octet excédentaire.
        at: usize,
    },
}

/* ─────────────────────────── Byte Reader ─────────────────────────── */

/// Lecteur séquentiel sur slice d'octets avec helpers LEB128 et IEEE-754.
///
/// Toute lecture est bornée et rapporte l'offset où elle a commencé, de sorte
/// que les erreurs du décodeur pointent l'instruction fautive.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    off: usize,
}

impl<'a> ByteReader<'a> {
    /// Construit un lecteur sur `data`, positionné au début.
    pub fn new(data: &'a [u8]) -> Self { Self { data, off: 0 } }

    /// Offset courant.
    pub fn offset(&self) -> usize { self.off }

    /// Nombre d'octets restants.
    pub fn remaining(&self) -> usize { self.data.len().saturating_sub(self.off) }

    /// Vrai une fois la slice entièrement consommée.
    pub fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Lit `n` octets bruts (ou erreur en fin d'entrée).
    pub fn read_bytes(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::UnexpectedEof { needed: n - self.remaining(), at: self.off });
        }
        let start = self.off;
        self.off += n;
        Ok(&self.data[start..self.off])
    }

    /// Lit un octet.
    pub fn read_u8(&mut self) -> CoreResult<u8> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    /// Lit une valeur LEB128 non signée tenant dans un `u32`.
    pub fn read_u32_leb(&mut self) -> CoreResult<u32> {
        let at = self.off;
        let mut result: u32 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            let low = u32::from(byte & 0x7F);
            // le cinquième octet ne peut contribuer que 4 bits
            if shift == 28 && byte & 0xF0 != 0 {
                return Err(CoreError::LebOverflow { at });
            }
            result |= low << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift >= 32 {
                return Err(CoreError::LebOverflow { at });
            }
        }
    }

    /// Lit une valeur LEB128 signée tenant dans un `i32`.
    pub fn read_i32_leb(&mut self) -> CoreResult<i32> {
        let at = self.off;
        let v = self.read_sleb(32, at)?;
        Ok(v as i32)
    }

    /// Lit une valeur LEB128 signée tenant dans un `i64`.
    pub fn read_i64_leb(&mut self) -> CoreResult<i64> {
        let at = self.off;
        self.read_sleb(64, at)
    }

    fn read_sleb(&mut self, bits: u32, at: usize) -> CoreResult<i64> {
        let mut result: i64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            // le dixième octet d'une lecture 64 bits porte un seul bit de
            // valeur ; les six bits au-dessus doivent en être l'extension de
            // signe
            if shift == 63 && byte != 0x00 && byte != 0x7F {
                return Err(CoreError::LebOverflow { at });
            }
            let low = i64::from(byte & 0x7F);
            result |= low << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                // extension de signe depuis le dernier bit de donnée
                if shift < 64 && byte & 0x40 != 0 {
                    result |= -1i64 << shift;
                }
                // rejette ce qui ne tient pas dans `bits` bits
                if bits < 64 {
                    let min = -(1i64 << (bits - 1));
                    let max = (1i64 << (bits - 1)) - 1;
                    if result < min || result > max {
                        return Err(CoreError::LebOverflow { at });
                    }
                }
                return Ok(result);
            }
            if shift >= bits.div_ceil(7) * 7 {
                return Err(CoreError::LebOverflow { at });
            }
        }
    }

    /// Lit un `f32` IEEE-754 little-endian.
    pub fn read_f32_le(&mut self) -> CoreResult<f32> {
        let b = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Lit un `f64` IEEE-754 little-endian.
    pub fn read_f64_le(&mut self) -> CoreResult<f64> {
        let b = self.read_bytes(8)?;
        Ok(f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }
}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude important les types clés de la crate.
pub mod prelude {
    /// Ré-exports utiles pour un import rapide.
    pub use super::{
        decode_bytecode, decode_func_body, BlockType, ByteReader, CoreError, CoreResult, FuncBody,
        FuncType, Imm, Instruction, LocalEntry, Mutability, Opcode, ValType,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reader_u8_and_eof() {
        let mut r = ByteReader::new(&[0x2A]);
        assert_eq!(r.read_u8(), Ok(0x2A));
        assert_eq!(r.read_u8(), Err(CoreError::UnexpectedEof { needed: 1, at: 1 }));
    }

    #[test]
    fn uleb_single_and_multi_byte() {
        let mut r = ByteReader::new(&[0x2A, 0xE5, 0x8E, 0x26]);
        assert_eq!(r.read_u32_leb(), Ok(42));
        assert_eq!(r.read_u32_leb(), Ok(624_485));
        assert!(r.is_empty());
    }

    #[test]
    fn uleb_max_and_overflow() {
        let mut r = ByteReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(r.read_u32_leb(), Ok(u32::MAX));

        let mut r = ByteReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
        assert_eq!(r.read_u32_leb(), Err(CoreError::LebOverflow { at: 0 }));
    }

    #[test]
    fn sleb_negative_values() {
        // -1 et -123456 en LEB128 signé
        let mut r = ByteReader::new(&[0x7F]);
        assert_eq!(r.read_i32_leb(), Ok(-1));
        let mut r = ByteReader::new(&[0xC0, 0xBB, 0x78]);
        assert_eq!(r.read_i32_leb(), Ok(-123_456));
    }

    #[test]
    fn sleb_i64_roundtrips_extremes() {
        // i64::MIN : 9 octets de payload + octet de signe
        let mut r = ByteReader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x7F]);
        assert_eq!(r.read_i64_leb(), Ok(i64::MIN));
    }

    #[test]
    fn sleb_i64_rejects_out_of_range_tenth_byte() {
        // bit 63 posé sans extension de signe : encoderait +2^63
        let mut r = ByteReader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert_eq!(r.read_i64_leb(), Err(CoreError::LebOverflow { at: 0 }));

        // un bit de payload au-delà du signe n'est pas représentable du tout
        let mut r = ByteReader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x02]);
        assert_eq!(r.read_i64_leb(), Err(CoreError::LebOverflow { at: 0 }));
    }

    #[test]
    fn floats_little_endian() {
        let bytes = 1.5f32.to_le_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_f32_le(), Ok(1.5));
        let bytes = (-2.25f64).to_le_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_f64_le(), Ok(-2.25));
    }
}
