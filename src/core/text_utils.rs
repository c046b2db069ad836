// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text utilities for tokenization and parsing.

/// Check if a byte is a valid identifier start character (letter or underscore).
#[inline]
pub fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Check if a byte is a valid identifier continuation character.
///
/// `.` is included so size-suffixed mnemonics such as `MOVE.L` lex as one word.
#[inline]
pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'$'
}

/// Check if a byte is whitespace (space or tab).
#[inline]
pub fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Split `NAME.X` into `("NAME", Some('X'))` when the final component is a
/// single-letter size suffix.
pub fn split_size_suffix(name: &str) -> (&str, Option<char>) {
    let bytes = name.as_bytes();
    if bytes.len() >= 3 && bytes[bytes.len() - 2] == b'.' {
        let suffix = (bytes[bytes.len() - 1] as char).to_ascii_uppercase();
        if matches!(suffix, 'B' | 'W' | 'L' | 'S') {
            return (&name[..name.len() - 2], Some(suffix));
        }
    }
    (name, None)
}

/// Expand tabs to the next multiple of eight columns for listing output.
pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if c == '\t' {
            let pad = 8 - (out.len() % 8);
            out.extend(std::iter::repeat(' ').take(pad));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_classes() {
        assert!(is_ident_start(b'_'));
        assert!(!is_ident_start(b'1'));
        assert!(is_ident_char(b'.'));
        assert!(!is_ident_char(b','));
    }

    #[test]
    fn splits_size_suffix() {
        assert_eq!(split_size_suffix("MOVE.L"), ("MOVE", Some('L')));
        assert_eq!(split_size_suffix("label.w"), ("label", Some('W')));
        assert_eq!(split_size_suffix("D0"), ("D0", None));
        assert_eq!(split_size_suffix("a.bc"), ("a.bc", None));
    }

    #[test]
    fn expands_tabs() {
        assert_eq!(expand_tabs("a\tb"), "a       b");
    }
}
