// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU-agnostic assembler core.
//!
//! This module provides the infrastructure shared by every architecture
//! backend (6502, 6809, 68000, Z80, ARM).
//!
//! # Components
//!
//! - [`tokenizer`] / [`cursor`] - Token scanning and a backtracking cursor
//! - [`expr`] - Expression parsing and known/unknown evaluation
//! - [`registers`] - Register name lookup
//! - [`dispatch`] - Mnemonic tables with exact and wildcard rows
//! - [`select`] - Encoding-width selection
//! - [`range`] - Operand range checks
//! - [`emit`] - Instruction buffer
//! - [`family`] / [`registry`] - Handler contract and CPU registry
//! - [`symbol_table`] / [`imagestore`] - Symbols and the output image
//! - [`assembler`] - Diagnostics and listing

pub mod assembler;
pub mod cpu;
pub mod cursor;
pub mod dispatch;
pub mod emit;
pub mod expr;
pub mod family;
pub mod imagestore;
pub mod range;
pub mod registers;
pub mod registry;
pub mod select;
pub mod state;
pub mod symbol_table;
pub mod text_utils;
pub mod tokenizer;

// Re-exports for convenience
pub use cpu::{CpuDescriptor, CpuFamily, CpuType, Endianness};
pub use cursor::TokenCursor;
pub use emit::InstructionBuffer;
pub use expr::{eval_expr, parse_expr, EvalContext, EvalError, Expr, Value};
pub use family::{AssemblerContext, CpuHandler, EncodeOutcome};
pub use symbol_table::SymbolTable;
pub use tokenizer::{Span, Token, TokenKind, TokenizeError, Tokenizer};
