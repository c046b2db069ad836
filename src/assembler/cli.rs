// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::level_filters::LevelFilter;

use crate::core::assembler::error::{AsmError, AsmErrorKind, AsmRunError};
use crate::core::cursor::TokenCursor;
use crate::core::tokenizer::{OperatorKind, TokenKind};

use super::AssemblerOptions;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Two-pass assembler for the 6502/65C02/65816, 6809, 68000, Z80 and ARM.

The CPU given with -c is selected at the start of every pass; CPU/PROCESSOR
directives in the source switch it part way through.
Outputs are opt-in: -o writes a raw binary image spanning the lowest to the
highest emitted address (gaps use the -f fill byte), -l writes a listing.
Use --list-cpus to see every CPU name and alias.";

#[derive(Parser, Debug)]
#[command(
    name = "retroasm",
    version = VERSION,
    about = "Retargetable two-pass assembler for 8-, 16- and 32-bit CPUs",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        value_name = "INPUT",
        required_unless_present = "list_cpus",
        long_help = "Assembly source file."
    )]
    pub input: Option<PathBuf>,
    #[arg(
        short = 'c',
        long = "cpu",
        value_name = "NAME",
        default_value = "6502",
        long_help = "Initial CPU, by name or alias (case-insensitive). Defaults to 6502."
    )]
    pub cpu: String,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        long_help = "Write the raw binary image to FILE."
    )]
    pub output: Option<PathBuf>,
    #[arg(
        short = 'l',
        long = "list",
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = "",
        long_help = "Emit a listing file. FILE is optional; when omitted, the input name with a .lst extension is used."
    )]
    pub list_name: Option<String>,
    #[arg(
        short = 'f',
        long = "fill",
        value_name = "hh",
        long_help = "Fill byte for gaps in the binary image (2 hex digits). Defaults to FF."
    )]
    pub fill_byte: Option<String>,
    #[arg(
        short = 'D',
        long = "define",
        value_name = "NAME[=VAL]",
        action = ArgAction::Append,
        long_help = "Predefine a numeric symbol (repeatable). If VAL is omitted, defaults to 1."
    )]
    pub defines: Vec<String>,
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        long_help = "Diagnostic log level on stderr: off, error, warn, info, debug or trace."
    )]
    pub log_level: LevelFilter,
    #[arg(
        long = "list-cpus",
        action = ArgAction::SetTrue,
        long_help = "Print the supported CPUs grouped by family and exit."
    )]
    pub list_cpus: bool,
}

/// Validated CLI configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub listing: Option<PathBuf>,
    pub options: AssemblerOptions,
}

pub fn is_valid_hex_2(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn cli_error(message: &str, param: Option<&str>) -> AsmRunError {
    AsmRunError::new(
        AsmError::new(AsmErrorKind::Cli, message, param),
        Vec::new(),
        Vec::new(),
    )
}

/// Parse `NAME[=VAL]`; the value uses assembler number syntax and may be
/// negative.
pub fn parse_define(arg: &str) -> Result<(String, i64), AsmRunError> {
    let (name, value) = arg.split_once('=').unwrap_or((arg, "1"));
    let valid_name = name
        .bytes()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_')
        && name.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'.');
    if !valid_name {
        return Err(cli_error("Invalid symbol name in -D", Some(arg)));
    }
    let invalid = || cli_error("Invalid value in -D", Some(arg));
    let mut cursor = TokenCursor::from_line(value, 0).map_err(|_| invalid())?;
    let negative = cursor.eat_operator(OperatorKind::Minus);
    let magnitude = match cursor.advance().kind {
        TokenKind::Number(literal) => literal.value().ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    if !cursor.at_end() {
        return Err(invalid());
    }
    Ok((name.to_string(), if negative { -magnitude } else { magnitude }))
}

pub fn validate_cli(cli: &Cli) -> Result<CliConfig, AsmRunError> {
    let Some(input) = cli.input.clone() else {
        return Err(cli_error("No input file specified", None));
    };

    let fill = match cli.fill_byte.as_deref() {
        None => 0xFF,
        Some(text) if is_valid_hex_2(text) => {
            u8::from_str_radix(text, 16).map_err(|_| cli_error("Invalid -f/--fill value", Some(text)))?
        }
        Some(text) => {
            return Err(cli_error(
                "Invalid -f/--fill value; expected 2 hex digits",
                Some(text),
            ))
        }
    };

    let defines = cli
        .defines
        .iter()
        .map(|arg| parse_define(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let listing = cli.list_name.as_deref().map(|name| {
        if name.is_empty() {
            input.with_extension("lst")
        } else {
            PathBuf::from(name)
        }
    });

    Ok(CliConfig {
        output: cli.output.clone(),
        listing,
        options: AssemblerOptions {
            cpu: cli.cpu.clone(),
            defines,
            fill,
        },
        input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_outputs_and_inputs() {
        let cli = Cli::parse_from([
            "retroasm", "prog.asm", "-c", "z80", "-o", "prog.bin", "-l", "-f", "aa", "-D", "DEBUG",
            "-D", "BASE=$C000",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("prog.asm")));
        assert_eq!(cli.cpu, "z80");
        assert_eq!(cli.list_name, Some(String::new()));
        assert_eq!(cli.fill_byte, Some("aa".to_string()));
        assert_eq!(cli.log_level, LevelFilter::WARN);

        let config = validate_cli(&cli).expect("validate cli");
        assert_eq!(config.listing, Some(PathBuf::from("prog.lst")));
        assert_eq!(config.output, Some(PathBuf::from("prog.bin")));
        assert_eq!(config.options.fill, 0xAA);
        assert_eq!(
            config.options.defines,
            [("DEBUG".to_string(), 1), ("BASE".to_string(), 0xC000)]
        );
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["retroasm", "prog.asm"]);
        let config = validate_cli(&cli).expect("validate cli");
        assert_eq!(config.options, AssemblerOptions::default());
        assert!(config.listing.is_none() && config.output.is_none());
    }

    #[test]
    fn list_cpus_needs_no_input() {
        let cli = Cli::parse_from(["retroasm", "--list-cpus", "--log-level", "debug"]);
        assert!(cli.list_cpus);
        assert_eq!(cli.log_level, LevelFilter::DEBUG);
        assert!(Cli::try_parse_from(["retroasm"]).is_err());
    }

    #[test]
    fn explicit_listing_name() {
        let cli = Cli::parse_from(["retroasm", "prog.asm", "--list", "out/prog.txt"]);
        let config = validate_cli(&cli).unwrap();
        assert_eq!(config.listing, Some(PathBuf::from("out/prog.txt")));
    }

    #[test]
    fn rejects_bad_fill() {
        let cli = Cli::parse_from(["retroasm", "prog.asm", "-f", "1FF"]);
        let err = validate_cli(&cli).unwrap_err();
        assert_eq!(err.error().kind(), AsmErrorKind::Cli);
    }

    #[test]
    fn define_values() {
        assert_eq!(parse_define("X=0x10").unwrap(), ("X".to_string(), 16));
        assert_eq!(parse_define("X=-3").unwrap(), ("X".to_string(), -3));
        assert_eq!(parse_define("Y=%101").unwrap(), ("Y".to_string(), 5));
        assert!(parse_define("1X=2").is_err());
        assert!(parse_define("X=abc").is_err());
        assert!(parse_define("X=1+2").is_err());
    }
}
