//! wasmdis-fmt — rendu textuel du bytecode WebAssembly décodé
//!
//! Couche de formatage pure au-dessus du modèle de données `wasmdis-core`.
//! Quatre points d'entrée :
//! - [`format_lang_type`] / [`format_mutability`] — tables de tokens sur
//!   domaine fermé, totales et bijectives, avec variantes sur tag brut qui
//!   remontent une erreur « tag inconnu » au lieu d'un token par défaut
//! - [`format_instruction`] — une instruction vers une ligne de texte
//! - [`format_function`] — un corps entier vers un puits de sortie,
//!   indentation suivant l'imbrication des blocs
//!
//! Aucun état conservé entre les appels ; les entrées sont en lecture seule.
//! Le vocabulaire suit le format texte WebAssembly (`i32`, `const`/`mut`,
//! mnémoniques du format texte).

#![deny(missing_docs)]

use core::fmt::{self, Write};

use wasmdis_core::{BlockType, CoreResult, FuncBody, FuncType, Imm, Instruction, Mutability, ValType};

/* ─────────────────────────── Tokens fermés ─────────────────────────── */

/// Token d'affichage d'un type de valeur.
///
/// Exhaustif sur le domaine à quatre éléments ; chaque entrée produit un
/// token distinct et stable.
pub const fn format_lang_type(ty: ValType) -> &'static str {
    match ty {
        ValType::I32 => "i32",
        ValType::I64 => "i64",
        ValType::F32 => "f32",
        ValType::F64 => "f64",
    }
}

/// Variante sur tag brut de [`format_lang_type`].
///
/// Un tag hors domaine est rapporté, jamais rendu comme token par défaut.
pub fn format_raw_lang_type(raw: u8) -> CoreResult<&'static str> {
    ValType::from_byte(raw).map(format_lang_type)
}

/// Token d'affichage d'un flag de mutabilité.
///
/// `const` pour le stockage immuable, `mut` pour le stockage mutable.
pub const fn format_mutability(m: Mutability) -> &'static str {
    match m {
        Mutability::Const => "const",
        Mutability::Var => "mut",
    }
}

/// Variante sur tag brut de [`format_mutability`].
pub fn format_raw_mutability(raw: u8) -> CoreResult<&'static str> {
    Mutability::from_byte(raw).map(format_mutability)
}

/// Annotation de signature d'un bloc structuré.
///
/// Chaîne vide pour une signature vide, sinon suffixe de style
/// ` (result i32)`, prêt à concaténer au mnémonique d'entrée de bloc.
pub fn format_block_type(bt: BlockType) -> String {
    match bt {
        BlockType::Empty => String::new(),
        BlockType::Value(ty) => format!(" (result {})", format_lang_type(ty)),
    }
}

/* ─────────────────────────── Instructions ─────────────────────────── */

/// Rend une instruction décodée : mnémonique plus immédiats.
///
/// Totale sur les instructions bien formées — un opcode malformé ne peut pas
/// atteindre cette fonction, le décodeur le rejette à la frontière des octets.
pub fn format_instruction(insn: &Instruction) -> String {
    let mnemonic = insn.opcode.mnemonic();
    match &insn.imm {
        Imm::None => mnemonic.to_owned(),
        Imm::Block(bt) => format!("{mnemonic}{}", format_block_type(*bt)),
        Imm::Depth(depth) => format!("{mnemonic} {depth}"),
        Imm::BrTable { depths, default } => {
            let mut out = mnemonic.to_owned();
            for d in depths {
                let _ = write!(out, " {d}");
            }
            let _ = write!(out, " {default}");
            out
        }
        Imm::FuncIdx(idx) => format!("{mnemonic} {idx}"),
        Imm::CallIndirect { type_idx } => format!("{mnemonic} (type {type_idx})"),
        Imm::LocalIdx(idx) | Imm::GlobalIdx(idx) => format!("{mnemonic} {idx}"),
        Imm::MemArg { align, offset } => {
            let mut out = mnemonic.to_owned();
            if *offset != 0 {
                let _ = write!(out, " offset={offset}");
            }
            if *align != 0 {
                let _ = write!(out, " align={align}");
            }
            out
        }
        Imm::MemIdx(idx) => {
            if *idx == 0 {
                mnemonic.to_owned()
            } else {
                format!("{mnemonic} {idx}")
            }
        }
        Imm::I32(v) => format!("{mnemonic} {v}"),
        Imm::I64(v) => format!("{mnemonic} {v}"),
        Imm::F32(v) => format!("{mnemonic} {v}"),
        Imm::F64(v) => format!("{mnemonic} {v}"),
    }
}

/* ─────────────────────────── Corps de fonction ─────────────────────────── */

/// Unité d'indentation, une répétition par niveau d'imbrication.
pub const INDENT_UNIT: &str = "  ";

/// Options de rendu pour [`format_function`].
///
/// Par défaut : pas d'annotation de signature, niveau d'indentation 0,
/// locals listés.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions<'a> {
    /// Signature servant à annoter paramètres et résultats. En son absence,
    /// la ligne d'en-tête `(param …) (result …)` est omise entièrement.
    pub func_type: Option<&'a FuncType>,
    /// Niveau d'indentation initial appliqué à chaque ligne.
    pub indent: usize,
    /// Liste ou non les slots locaux déclarés avant les instructions.
    pub include_locals: bool,
}

impl Default for FormatOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FormatOptions<'a> {
    /// Options par défaut (`indent = 0`, locals listés).
    pub const fn new() -> Self {
        Self { func_type: None, indent: 0, include_locals: true }
    }

    /// Fixe l'annotation de signature.
    #[must_use]
    pub const fn with_func_type(mut self, ft: &'a FuncType) -> Self {
        self.func_type = Some(ft);
        self
    }

    /// Fixe le niveau d'indentation initial.
    #[must_use]
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Contrôle la ligne des locals.
    #[must_use]
    pub const fn with_locals(mut self, include: bool) -> Self {
        self.include_locals = include;
        self
    }
}

/// Rend un corps de fonction entier vers `out`, une instruction par ligne.
///
/// Chaque instruction est émise exactement une fois, dans l'ordre d'origine.
/// L'indentation croît d'un niveau après un marqueur d'entrée de bloc et
/// décroît d'un niveau avant le marqueur de sortie apparié ; `else` ressort
/// pour sa propre ligne puis rentre pour la branche alternative. Le `end`
/// terminal implicite de la fonction retombe au niveau de base.
pub fn format_function<W: Write>(out: &mut W, body: &FuncBody, opts: &FormatOptions<'_>) -> fmt::Result {
    let base = INDENT_UNIT.repeat(opts.indent);

    if let Some(ft) = opts.func_type {
        if !ft.params.is_empty() || !ft.results.is_empty() {
            out.write_str(&base)?;
            let mut first = true;
            if !ft.params.is_empty() {
                out.write_str("(param")?;
                for p in &ft.params {
                    write!(out, " {}", format_lang_type(*p))?;
                }
                out.write_str(")")?;
                first = false;
            }
            if !ft.results.is_empty() {
                if !first {
                    out.write_str(" ")?;
                }
                out.write_str("(result")?;
                for r in &ft.results {
                    write!(out, " {}", format_lang_type(*r))?;
                }
                out.write_str(")")?;
            }
            out.write_str("\n")?;
        }
    }

    if opts.include_locals && !body.locals.is_empty() {
        out.write_str(&base)?;
        out.write_str("(local")?;
        for entry in &body.locals {
            for _ in 0..entry.count {
                write!(out, " {}", format_lang_type(entry.ty))?;
            }
        }
        out.write_str(")\n")?;
    }

    let mut depth: usize = 0;
    for insn in &body.instrs {
        if insn.opcode.leaves_block() || insn.opcode.is_else() {
            depth = depth.saturating_sub(1);
        }
        for _ in 0..opts.indent + depth {
            out.write_str(INDENT_UNIT)?;
        }
        out.write_str(&format_instruction(insn))?;
        out.write_str("\n")?;
        if insn.opcode.enters_block() || insn.opcode.is_else() {
            depth += 1;
        }
    }

    Ok(())
}

/// Enrobage pratique de [`format_function`] retournant une `String`.
pub fn format_function_to_string(body: &FuncBody, opts: &FormatOptions<'_>) -> String {
    let mut out = String::new();
    // écrire dans une String ne peut pas échouer
    let _ = format_function(&mut out, body, opts);
    out
}

/* ─────────────────────────── Tests ─────────────────────────── */
