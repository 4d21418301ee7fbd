//! wasmdis — désassemble un corps de fonction WebAssembly brut en texte.
//!
//! Exemples :
//!   wasmdis body.bin
//!   wasmdis body.bin --type "i32 i32 -> i64" -o body.wat
//!   cat expr.bin | wasmdis - --code-only --no-locals
//!
//! L'entrée est le corps d'une seule fonction tel qu'on le trouve dans la
//! section code d'un module : déclarations de locals en run-length, puis la
//! séquence d'instructions. `--code-only` saute les déclarations de locals et
//! traite l'entrée comme une expression nue.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use wasmdis_core::{decode_bytecode, decode_func_body, FuncBody, FuncType, ValType};
use wasmdis_fmt::{format_function_to_string, FormatOptions};

#[derive(Parser, Debug)]
#[command(name = "wasmdis", version, about = "Disassemble a raw WebAssembly function body")]
struct Cli {
    /// Fichier d'entrée, ou '-' pour stdin
    input: String,

    /// Traite l'entrée comme une expression nue (sans déclarations de locals)
    #[arg(long, action = ArgAction::SetTrue)]
    code_only: bool,

    /// Annotation de signature, ex. "i32 i32 -> i64" (chaque côté peut être vide)
    #[arg(long = "type", value_name = "SIG")]
    func_type: Option<String>,

    /// Ne liste pas les locals déclarés
    #[arg(long, action = ArgAction::SetTrue)]
    no_locals: bool,

    /// Niveau d'indentation initial
    #[arg(long, default_value_t = 0)]
    indent: usize,

    /// Fichier de sortie (stdout par défaut)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_val_type(token: &str) -> Result<ValType> {
    Ok(match token {
        "i32" => ValType::I32,
        "i64" => ValType::I64,
        "f32" => ValType::F32,
        "f64" => ValType::F64,
        other => bail!("type de valeur inconnu `{other}` (attendu i32, i64, f32 ou f64)"),
    })
}

fn parse_type_list(list: &str) -> Result<Vec<ValType>> {
    list.split_whitespace().map(parse_val_type).collect()
}

/// Parse une signature de style `"i32 i32 -> i64"`. Chaque côté peut être vide.
fn parse_func_type(sig: &str) -> Result<FuncType> {
    let Some((params, results)) = sig.split_once("->") else {
        bail!("la signature doit contenir `->`, ex. \"i32 i32 -> i64\"");
    };
    Ok(FuncType::new(parse_type_list(params)?, parse_type_list(results)?))
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("Lecture stdin échouée")?;
        Ok(buf)
    } else {
        fs::read(input).with_context(|| format!("Lecture échouée: {input}"))
    }
}

fn run(cli: &Cli) -> Result<()> {
    let bytes = read_input(&cli.input)?;
    tracing::debug!(len = bytes.len(), input = %cli.input, "input loaded");

    let body = if cli.code_only {
        FuncBody::from_instrs(decode_bytecode(&bytes).context("Décodage de l'expression échoué")?)
    } else {
        decode_func_body(&bytes).context("Décodage du corps de fonction échoué")?
    };
    tracing::debug!(instrs = body.instrs.len(), locals = body.local_slot_count(), "body decoded");

    let func_type = cli.func_type.as_deref().map(parse_func_type).transpose()?;
    let mut opts = FormatOptions::new()
        .with_indent(cli.indent)
        .with_locals(!cli.no_locals);
    if let Some(ft) = func_type.as_ref() {
        opts = opts.with_func_type(ft);
    }

    let text = format_function_to_string(&body, &opts);
    match &cli.output {
        Some(path) => fs::write(path, text).with_context(|| format!("Écriture échouée: {}", path.display()))?,
        None => io::stdout().write_all(text.as_bytes()).context("Écriture stdout échouée")?,
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn signature_parsing() {
        let ft = parse_func_type("i32 i32 -> i64").unwrap();
        assert_eq!(ft, FuncType::new(vec![ValType::I32, ValType::I32], vec![ValType::I64]));

        let ft = parse_func_type("-> f32").unwrap();
        assert_eq!(ft, FuncType::new(vec![], vec![ValType::F32]));

        let ft = parse_func_type("f64 ->").unwrap();
        assert_eq!(ft, FuncType::new(vec![ValType::F64], vec![]));
    }

    #[test]
    fn signature_rejects_garbage() {
        assert!(parse_func_type("i32 i32").is_err());
        assert!(parse_func_type("v128 -> i32").is_err());
    }

    #[test]
    fn end_to_end_on_a_tiny_body() {
        // sans locals ; i32.const 42; drop; end
        let (_dir, bytes) = tempdir_input(&[0x00, 0x41, 0x2A, 0x1A, 0x0B]);
        let cli = Cli::parse_from(["wasmdis", bytes.to_str().unwrap()]);
        run(&cli).unwrap();
    }

    #[test]
    fn output_file_is_written() {
        let (_dir, input) = tempdir_input(&[0x00, 0x41, 0x07, 0x1A, 0x0B]);
        let out = input.with_extension("wat");
        let cli = Cli::parse_from([
            "wasmdis",
            input.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ]);
        run(&cli).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "i32.const 7\ndrop\nend\n");
    }

    // le garde doit survivre au corps du test, sinon le dossier est supprimé
    fn tempdir_input(bytes: &[u8]) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.bin");
        fs::write(&path, bytes).unwrap();
        (dir, path)
    }
}
