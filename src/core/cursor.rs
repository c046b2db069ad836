// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token cursor with checkpoint/rewind for backtracking operand grammars.
//!
//! Operand syntax is not LL(1) on most targets (`(expr)` vs `(expr,X)`,
//! `-(A0)` vs `-4(A0)`, `,X+` vs `,X++`). Resolvers take a [`Checkpoint`]
//! before a speculative read and [`TokenCursor::rewind`] to it when the
//! continuation does not match, or wrap the attempt in
//! [`TokenCursor::speculate`].

use crate::core::assembler::error::AsmError;
use crate::core::registers::{RegisterMatch, RegisterSet};
use crate::core::tokenizer::{OperatorKind, Span, Token, TokenKind, Tokenizer};

/// Saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Cursor over the tokens of one source line. The last token is always
/// [`TokenKind::End`]; advancing never moves past it.
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| &t.kind) != Some(&TokenKind::End) {
            let span = tokens
                .last()
                .map(|t| Span {
                    line: t.span.line,
                    col_start: t.span.col_end,
                    col_end: t.span.col_end,
                })
                .unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::End,
                span,
            });
        }
        Self { tokens, pos: 0 }
    }

    /// Tokenize `line` and wrap the result.
    pub fn from_line(line: &str, line_num: u32) -> Result<Self, AsmError> {
        Ok(Self::new(Tokenizer::new(line, line_num).tokenize()?))
    }

    pub fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    pub fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Token `n` positions ahead, clamped to the final `End`.
    pub fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::End)
    }

    /// True at a comma or end of line, i.e. where an operand may stop.
    pub fn at_operand_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::End | TokenKind::Comma)
    }

    pub fn span(&self) -> Span {
        self.peek().span
    }

    /// Span of the most recently consumed token.
    pub fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Run `attempt`; keep its consumption when it yields `Some`, otherwise
    /// restore the cursor to where it was.
    pub fn speculate<T>(&mut self, attempt: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        let result = attempt(self);
        if result.is_none() {
            self.rewind(checkpoint);
        }
        result
    }

    /// Consume the next token when it equals `kind`.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_operator(&mut self, op: OperatorKind) -> bool {
        self.eat(&TokenKind::Operator(op))
    }

    /// Consume an identifier spelled `word` (case-insensitive).
    pub fn eat_word(&mut self, word: &str) -> bool {
        match self.peek_kind() {
            TokenKind::Identifier(name) if name.eq_ignore_ascii_case(word) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Identifier text of the next token, if it is one.
    pub fn peek_ident(&self) -> Option<&str> {
        match self.peek_kind() {
            TokenKind::Identifier(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Consume `kind` or fail: `MissingOperand` at end of line, otherwise
    /// `BadAddressingMode` naming what was expected.
    pub fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Span, AsmError> {
        if self.peek_kind() == kind {
            return Ok(self.advance().span);
        }
        Err(self.unexpected(what))
    }

    pub fn expect_comma(&mut self) -> Result<(), AsmError> {
        self.expect(&TokenKind::Comma, "','").map(|_| ())
    }

    /// Error describing the current token as unexpected.
    pub fn unexpected(&self, what: &str) -> AsmError {
        let token = self.peek();
        if token.kind == TokenKind::End {
            AsmError::missing_operand().with_span(token.span)
        } else {
            AsmError::bad_mode(&format!(
                "Expected {what}, found '{}'",
                token.to_source_text()
            ))
            .with_span(token.span)
        }
    }

    /// Fail unless the line is fully consumed.
    pub fn expect_end(&self) -> Result<(), AsmError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(AsmError::bad_mode(&format!(
                "Unexpected '{}' after operand",
                self.peek().to_source_text()
            ))
            .with_span(self.span()))
        }
    }

    /// Look the next token up in `set`, consuming it on a hit. Register
    /// names always win over same-named symbols in register positions.
    pub fn register(&mut self, set: &RegisterSet) -> RegisterMatch {
        let found = match self.peek_kind() {
            TokenKind::End => return RegisterMatch::EndOfLine,
            TokenKind::Identifier(name) => set.index_of(name),
            _ => None,
        };
        match found {
            Some(idx) => {
                self.advance();
                RegisterMatch::Found(idx)
            }
            None => RegisterMatch::NotFound,
        }
    }

    /// Like [`Self::register`] but without consuming.
    pub fn peek_register(&self, set: &RegisterSet) -> Option<usize> {
        self.peek_ident().and_then(|name| set.index_of(name))
    }

    /// Require a register from `set`.
    pub fn expect_register(&mut self, set: &RegisterSet, what: &str) -> Result<usize, AsmError> {
        match self.register(set) {
            RegisterMatch::Found(idx) => Ok(idx),
            RegisterMatch::EndOfLine => Err(AsmError::missing_operand().with_span(self.span())),
            RegisterMatch::NotFound => Err(AsmError::illegal_operand(&format!(
                "Expected {what}, found '{}'",
                self.peek().to_source_text()
            ))
            .with_span(self.span())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XY: RegisterSet = RegisterSet::new(&["X", "Y"]);

    #[test]
    fn rewind_restores_position() {
        let mut cur = TokenCursor::from_line("(1),Y", 1).unwrap();
        let cp = cur.checkpoint();
        assert!(cur.eat(&TokenKind::OpenParen));
        cur.advance();
        cur.rewind(cp);
        assert_eq!(cur.peek_kind(), &TokenKind::OpenParen);
    }

    #[test]
    fn speculate_commits_only_on_success() {
        let mut cur = TokenCursor::from_line("(5)*2", 1).unwrap();
        let hit: Option<()> = cur.speculate(|c| {
            c.advance();
            c.advance();
            c.eat(&TokenKind::CloseParen).then_some(())?;
            c.at_end().then_some(())
        });
        assert!(hit.is_none());
        assert_eq!(cur.peek_kind(), &TokenKind::OpenParen);

        let hit = cur.speculate(|c| c.eat(&TokenKind::OpenParen).then_some(()));
        assert!(hit.is_some());
        assert!(matches!(cur.peek_kind(), TokenKind::Number(_)));
    }

    #[test]
    fn advance_stops_at_end() {
        let mut cur = TokenCursor::from_line("A", 1).unwrap();
        cur.advance();
        cur.advance();
        assert!(cur.at_end());
    }

    #[test]
    fn register_lookup_reports_end_of_line() {
        let mut cur = TokenCursor::from_line("y", 1).unwrap();
        assert_eq!(cur.register(&XY), RegisterMatch::Found(1));
        assert_eq!(cur.register(&XY), RegisterMatch::EndOfLine);
    }

    #[test]
    fn register_lookup_skips_non_registers() {
        let mut cur = TokenCursor::from_line("label", 1).unwrap();
        assert_eq!(cur.register(&XY), RegisterMatch::NotFound);
        assert_eq!(cur.peek_ident(), Some("label"));
    }

    #[test]
    fn expect_reports_missing_operand_at_end() {
        let mut cur = TokenCursor::from_line("", 1).unwrap();
        let err = cur.expect_comma().unwrap_err();
        assert_eq!(
            err.kind(),
            crate::core::assembler::error::AsmErrorKind::MissingOperand
        );
    }
}
