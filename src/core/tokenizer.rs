// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Tokenizer for assembly source with spans.
//!
//! This tokenizer is CPU-agnostic. Register names are not classified here;
//! resolvers decide register-vs-value per operand position through
//! [`crate::core::registers::RegisterSet`].

use thiserror::Error;

use crate::core::text_utils::{is_ident_char, is_ident_start, is_space};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub col_start: usize,
    pub col_end: usize,
}

impl Span {
    pub(crate) fn new(line: u32, start: usize, end: usize) -> Self {
        Self {
            line,
            col_start: start + 1,
            col_end: end + 1,
        }
    }

    /// Span covering both `self` and `other` (same line assumed).
    pub fn join(self, other: Span) -> Span {
        Span {
            line: self.line,
            col_start: self.col_start.min(other.col_start),
            col_end: self.col_end.max(other.col_end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier(String),
    Number(NumberLiteral),
    String(StringLiteral),
    Comma,
    Colon,
    Dollar,
    Dot,
    Hash,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Operator(OperatorKind),
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberLiteral {
    pub text: String,
    pub base: u32,
}

impl NumberLiteral {
    /// Numeric value of the literal, `None` when the digits do not fit the base.
    pub fn value(&self) -> Option<i64> {
        let upper = self.text.to_ascii_uppercase();
        let mut digits: &str = &upper;
        if let Some(rest) = digits.strip_prefix('$').or_else(|| digits.strip_prefix('%')) {
            digits = rest;
        } else if let Some(rest) = digits.strip_prefix("0X") {
            digits = rest;
        }
        match (self.base, digits.as_bytes().last()) {
            (16, Some(b'H')) | (2, Some(b'B')) | (8, Some(b'O' | b'Q')) | (10, Some(b'D')) => {
                digits = &digits[..digits.len() - 1];
            }
            (2, _) => {
                if let Some(rest) = digits.strip_prefix("0B") {
                    digits = rest;
                }
            }
            _ => {}
        }
        let digits: String = digits.chars().filter(|&c| c != '_').collect();
        if digits.is_empty() {
            return None;
        }
        u64::from_str_radix(&digits, self.base)
            .ok()
            .map(|v| v as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub raw: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,
    Shl,
    Shr,
    BitNot,
    LogicNot,
    BitAnd,
    BitOr,
    BitXor,
    LogicAnd,
    LogicOr,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl OperatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperatorKind::Plus => "+",
            OperatorKind::Minus => "-",
            OperatorKind::Multiply => "*",
            OperatorKind::Divide => "/",
            OperatorKind::Mod => "%",
            OperatorKind::Shl => "<<",
            OperatorKind::Shr => ">>",
            OperatorKind::BitNot => "~",
            OperatorKind::LogicNot => "!",
            OperatorKind::BitAnd => "&",
            OperatorKind::BitOr => "|",
            OperatorKind::BitXor => "^",
            OperatorKind::LogicAnd => "&&",
            OperatorKind::LogicOr => "||",
            OperatorKind::Eq => "==",
            OperatorKind::Ne => "!=",
            OperatorKind::Ge => ">=",
            OperatorKind::Gt => ">",
            OperatorKind::Le => "<=",
            OperatorKind::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn to_source_text(&self) -> String {
        match &self.kind {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Number(num) => num.text.clone(),
            TokenKind::String(lit) => lit.raw.clone(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::Dollar => "$".to_string(),
            TokenKind::Dot => ".".to_string(),
            TokenKind::Hash => "#".to_string(),
            TokenKind::OpenBracket => "[".to_string(),
            TokenKind::CloseBracket => "]".to_string(),
            TokenKind::OpenBrace => "{".to_string(),
            TokenKind::CloseBrace => "}".to_string(),
            TokenKind::OpenParen => "(".to_string(),
            TokenKind::CloseParen => ")".to_string(),
            TokenKind::Operator(op) => op.as_str().to_string(),
            TokenKind::End => String::new(),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TokenizeError {
    pub message: String,
    pub span: Span,
}

pub struct Tokenizer<'a> {
    line_num: u32,
    input: &'a [u8],
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(line: &'a str, line_num: u32) -> Self {
        Self {
            line_num,
            input: line.as_bytes(),
            cursor: 0,
        }
    }

    /// Tokenize the rest of the line, always ending with [`TokenKind::End`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::End;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, TokenizeError> {
        self.skip_white();
        let start = self.cursor;
        let c = self.current_byte();
        match c {
            0 => Ok(self.single(TokenKind::End, start, 0)),
            b';' => {
                self.cursor = self.input.len();
                Ok(Token {
                    kind: TokenKind::End,
                    span: Span::new(self.line_num, start, start),
                })
            }
            _ if is_ident_start(c) => self.scan_identifier(),
            _ if c.is_ascii_digit() => self.scan_number(),
            b'"' | b'\'' => self.scan_string(),
            b'.' => Ok(self.single(TokenKind::Dot, start, 1)),
            b'[' => Ok(self.single(TokenKind::OpenBracket, start, 1)),
            b']' => Ok(self.single(TokenKind::CloseBracket, start, 1)),
            b'{' => Ok(self.single(TokenKind::OpenBrace, start, 1)),
            b'}' => Ok(self.single(TokenKind::CloseBrace, start, 1)),
            b'#' => Ok(self.single(TokenKind::Hash, start, 1)),
            b'$' => {
                if is_hex_digit(self.peek_raw_byte(1)) {
                    self.scan_prefixed_number(16)
                } else {
                    Ok(self.single(TokenKind::Dollar, start, 1))
                }
            }
            b'%' => {
                let next = self.peek_raw_byte(1);
                if is_bin_digit(next) && self.is_prefix_context(start) {
                    self.scan_prefixed_number(2)
                } else {
                    Ok(self.single(TokenKind::Operator(OperatorKind::Mod), start, 1))
                }
            }
            _ => self.scan_operator(start, c),
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize, len: usize) -> Token {
        self.cursor += len;
        Token {
            kind,
            span: Span::new(self.line_num, start, self.cursor),
        }
    }

    fn scan_operator(&mut self, start: usize, c: u8) -> Result<Token, TokenizeError> {
        self.cursor += 1;
        let next = self.peek_raw_byte(0);
        let (kind, extra) = match (c, next) {
            (b',', _) => (TokenKind::Comma, 0),
            (b':', _) => (TokenKind::Colon, 0),
            (b'(', _) => (TokenKind::OpenParen, 0),
            (b')', _) => (TokenKind::CloseParen, 0),
            (b'+', _) => (TokenKind::Operator(OperatorKind::Plus), 0),
            (b'-', _) => (TokenKind::Operator(OperatorKind::Minus), 0),
            (b'*', _) => (TokenKind::Operator(OperatorKind::Multiply), 0),
            (b'/', _) => (TokenKind::Operator(OperatorKind::Divide), 0),
            (b'~', _) => (TokenKind::Operator(OperatorKind::BitNot), 0),
            (b'=', b'=') => (TokenKind::Operator(OperatorKind::Eq), 1),
            (b'=', _) => (TokenKind::Operator(OperatorKind::Eq), 0),
            (b'!', b'=') => (TokenKind::Operator(OperatorKind::Ne), 1),
            (b'!', _) => (TokenKind::Operator(OperatorKind::LogicNot), 0),
            (b'&', b'&') => (TokenKind::Operator(OperatorKind::LogicAnd), 1),
            (b'&', _) => (TokenKind::Operator(OperatorKind::BitAnd), 0),
            (b'|', b'|') => (TokenKind::Operator(OperatorKind::LogicOr), 1),
            (b'|', _) => (TokenKind::Operator(OperatorKind::BitOr), 0),
            (b'^', _) => (TokenKind::Operator(OperatorKind::BitXor), 0),
            (b'<', b'<') => (TokenKind::Operator(OperatorKind::Shl), 1),
            (b'<', b'=') => (TokenKind::Operator(OperatorKind::Le), 1),
            (b'<', b'>') => (TokenKind::Operator(OperatorKind::Ne), 1),
            (b'<', _) => (TokenKind::Operator(OperatorKind::Lt), 0),
            (b'>', b'>') => (TokenKind::Operator(OperatorKind::Shr), 1),
            (b'>', b'=') => (TokenKind::Operator(OperatorKind::Ge), 1),
            (b'>', _) => (TokenKind::Operator(OperatorKind::Gt), 0),
            _ => {
                return Err(TokenizeError {
                    message: "Illegal character".to_string(),
                    span: Span::new(self.line_num, start, self.cursor),
                })
            }
        };
        self.cursor += extra;
        Ok(Token {
            kind,
            span: Span::new(self.line_num, start, self.cursor),
        })
    }

    fn scan_identifier(&mut self) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        while is_ident_char(self.current_byte()) {
            self.cursor += 1;
        }
        // Z80 shadow pair: AF'
        if self.current_byte() == b'\''
            && self.input[start..self.cursor].eq_ignore_ascii_case(b"AF")
        {
            self.cursor += 1;
        }
        let text = String::from_utf8_lossy(&self.input[start..self.cursor]).to_string();
        Ok(Token {
            kind: TokenKind::Identifier(text),
            span: Span::new(self.line_num, start, self.cursor),
        })
    }

    fn scan_number(&mut self) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        if self.current_byte() == b'0' && matches!(self.peek_raw_byte(1), b'x' | b'X') {
            self.cursor += 2;
            while is_hex_digit(self.current_byte()) || self.current_byte() == b'_' {
                self.cursor += 1;
            }
            return self.finish_number(start, 16);
        }
        if self.current_byte() == b'0'
            && matches!(self.peek_raw_byte(1), b'b' | b'B')
            && is_bin_digit(self.peek_raw_byte(2))
        {
            self.cursor += 2;
            while is_bin_digit(self.current_byte()) || self.current_byte() == b'_' {
                self.cursor += 1;
            }
            if !is_num_char(self.current_byte()) {
                return self.finish_number(start, 2);
            }
            self.cursor = start;
        }
        while is_num_char(self.current_byte()) {
            self.cursor += 1;
        }
        let base = match self.input[self.cursor - 1].to_ascii_uppercase() {
            b'H' => 16,
            b'B' => 2,
            b'O' | b'Q' => 8,
            _ => 10,
        };
        self.finish_number(start, base)
    }

    fn finish_number(&mut self, start: usize, base: u32) -> Result<Token, TokenizeError> {
        let text = String::from_utf8_lossy(&self.input[start..self.cursor]).to_string();
        let literal = NumberLiteral { text, base };
        if literal.value().is_none() {
            return Err(TokenizeError {
                message: format!("Illegal character in constant: {}", literal.text),
                span: Span::new(self.line_num, start, self.cursor),
            });
        }
        Ok(Token {
            kind: TokenKind::Number(literal),
            span: Span::new(self.line_num, start, self.cursor),
        })
    }

    fn scan_prefixed_number(&mut self, base: u32) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        self.cursor += 1;
        loop {
            let c = self.current_byte();
            let ok = match base {
                2 => is_bin_digit(c) || c == b'_',
                _ => is_hex_digit(c) || c == b'_',
            };
            if !ok {
                break;
            }
            self.cursor += 1;
        }
        self.finish_number(start, base)
    }

    fn scan_string(&mut self) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        let quote = self.current_byte();
        self.cursor += 1;
        let mut out = Vec::new();
        while self.current_byte() != 0 && self.current_byte() != quote {
            let c = self.current_byte();
            if c == b'\\' {
                self.cursor += 1;
                let esc = self.current_byte();
                let val = match esc {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'0' => b'\0',
                    b'x' => {
                        let hi = self.peek_raw_byte(1);
                        let lo = self.peek_raw_byte(2);
                        if !hi.is_ascii_hexdigit() || !lo.is_ascii_hexdigit() {
                            return Err(TokenizeError {
                                message: "Bad hex escape in string".to_string(),
                                span: Span::new(self.line_num, start, self.cursor),
                            });
                        }
                        self.cursor += 2;
                        (hex_digit(hi) << 4) | hex_digit(lo)
                    }
                    _ => esc,
                };
                out.push(val);
            } else {
                out.push(c);
            }
            self.cursor += 1;
        }

        if self.current_byte() != quote {
            return Err(TokenizeError {
                message: format!(
                    "Unterminated string: {}",
                    String::from_utf8_lossy(&self.input[start..])
                ),
                span: Span::new(self.line_num, start, self.cursor),
            });
        }
        self.cursor += 1;
        let raw = String::from_utf8_lossy(&self.input[start..self.cursor]).to_string();
        Ok(Token {
            kind: TokenKind::String(StringLiteral { raw, bytes: out }),
            span: Span::new(self.line_num, start, self.cursor),
        })
    }

    fn skip_white(&mut self) {
        while is_space(self.current_byte()) {
            self.cursor += 1;
        }
    }

    fn current_byte(&self) -> u8 {
        self.input.get(self.cursor).copied().unwrap_or(0)
    }

    fn peek_raw_byte(&self, offset: usize) -> u8 {
        self.input.get(self.cursor + offset).copied().unwrap_or(0)
    }

    /// `%` starts a binary literal only where an operand may begin: at the
    /// start of the line, after an operator or punctuation, or after an
    /// identifier followed by whitespace.
    fn is_prefix_context(&self, start: usize) -> bool {
        let has_leading_space = start > 0 && is_space(self.input[start - 1]);

        match self.prev_non_space(start) {
            None => true,
            Some(
                b'(' | b',' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b'~' | b'!'
                | b'<' | b'>' | b'=' | b'#' | b'[' | b':',
            ) => true,
            Some(ch) if has_leading_space && is_ident_char(ch) => true,
            _ => false,
        }
    }

    fn prev_non_space(&self, start: usize) -> Option<u8> {
        (0..start)
            .rev()
            .map(|i| self.input[i])
            .find(|&c| !is_space(c))
    }
}

fn is_num_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_bin_digit(c: u8) -> bool {
    c == b'0' || c == b'1'
}

fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

fn hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'A'..=b'F' => c - b'A' + 10,
        _ => c - b'a' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::{OperatorKind, TokenKind, Tokenizer};

    fn kinds(line: &str) -> Vec<TokenKind> {
        Tokenizer::new(line, 1)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn number(kind: &TokenKind) -> i64 {
        match kind {
            TokenKind::Number(lit) => lit.value().unwrap(),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn tokenizes_number_formats() {
        let toks = kinds("$1f 0x20 %101 0b11 0A6h 17o 101b 99");
        let values: Vec<i64> = toks[..8].iter().map(number).collect();
        assert_eq!(values, vec![0x1f, 0x20, 5, 3, 0xa6, 15, 5, 99]);
    }

    #[test]
    fn percent_is_modulo_after_value() {
        let toks = kinds("7 %10");
        assert_eq!(toks[1], TokenKind::Operator(OperatorKind::Mod));
    }

    #[test]
    fn rejects_bad_constant() {
        assert!(Tokenizer::new("12Z", 1).tokenize().is_err());
    }

    #[test]
    fn tokenizes_string_literal() {
        let toks = kinds("DB \"A\\n\"");
        if let TokenKind::String(lit) = &toks[1] {
            assert_eq!(lit.bytes, vec![b'A', b'\n']);
        } else {
            panic!("Expected string literal token");
        }
    }

    #[test]
    fn tokenizes_size_suffixed_mnemonic_as_one_identifier() {
        let toks = kinds("MOVE.L D0,D1");
        assert_eq!(toks[0], TokenKind::Identifier("MOVE.L".to_string()));
        assert_eq!(toks[2], TokenKind::Comma);
    }

    #[test]
    fn keeps_shadow_pair_prime() {
        let toks = kinds("EX AF,AF'");
        assert_eq!(toks[3], TokenKind::Identifier("AF'".to_string()));
        assert_eq!(toks[4], TokenKind::End);
    }

    #[test]
    fn comment_ends_line() {
        let toks = kinds("NOP ; comment, with (stuff)");
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[1], TokenKind::End);
    }

    #[test]
    fn tokenizes_shift_and_compare_operators() {
        let toks = kinds("<< >> <= >= <> < >");
        assert_eq!(
            toks[..7],
            [
                TokenKind::Operator(OperatorKind::Shl),
                TokenKind::Operator(OperatorKind::Shr),
                TokenKind::Operator(OperatorKind::Le),
                TokenKind::Operator(OperatorKind::Ge),
                TokenKind::Operator(OperatorKind::Ne),
                TokenKind::Operator(OperatorKind::Lt),
                TokenKind::Operator(OperatorKind::Gt),
            ]
        );
    }

    #[test]
    fn tokenizes_brackets_and_braces() {
        let toks = kinds("[{ } ]");
        assert_eq!(
            toks[..4],
            [
                TokenKind::OpenBracket,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
                TokenKind::CloseBracket
            ]
        );
    }
}
