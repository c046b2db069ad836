// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Mnemonic tables and lookup.
//!
//! Two matching disciplines are supported:
//!
//! - **Exact rows**: size or width variants are separate rows
//!   (`MOVE.B`, `MOVE.W`, `MOVE.L`) matched by exact, case-insensitive name.
//! - **Wildcard rows**: a `*` in the row name marks where a suffix (a
//!   condition code, a flag letter) may appear, as in `B*` or `LDR*`. The
//!   backend's suffix parser turns the text at the marker into an auxiliary
//!   parameter; text it does not recognize means the row does not match.
//!
//! Exact rows win over wildcard rows, and among wildcard rows the longest
//! fixed prefix wins (`BL*` before `B*`).

use crate::core::assembler::error::AsmError;

/// One row of an architecture's opcode table.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry<C: 'static, P: 'static = u32> {
    pub mnemonic: &'static str,
    pub class: C,
    pub param: P,
}

/// A matched row plus the value decoded from its wildcard suffix.
#[derive(Debug, Clone, Copy)]
pub struct Matched<C: 'static, P: 'static> {
    pub entry: &'static OpcodeEntry<C, P>,
    pub aux: Option<u32>,
}

impl<C: Copy, P: Copy> Matched<C, P> {
    pub fn class(&self) -> C {
        self.entry.class
    }

    pub fn param(&self) -> P {
        self.entry.param
    }
}

/// Static opcode table with lookup.
#[derive(Debug, Clone, Copy)]
pub struct MnemonicTable<C: 'static, P: 'static = u32> {
    entries: &'static [OpcodeEntry<C, P>],
}

impl<C, P> MnemonicTable<C, P> {
    pub const fn new(entries: &'static [OpcodeEntry<C, P>]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [OpcodeEntry<C, P>] {
        self.entries
    }

    /// Exact-row lookup.
    pub fn lookup(&self, mnemonic: &str) -> Result<Matched<C, P>, AsmError> {
        self.lookup_with(mnemonic, |_, _| None)
    }

    /// Lookup with wildcard rows; `suffix` decodes the text at the `*` for a
    /// given row, returning `None` when that text is not a valid suffix.
    pub fn lookup_with(
        &self,
        mnemonic: &str,
        suffix: impl Fn(&OpcodeEntry<C, P>, &str) -> Option<u32>,
    ) -> Result<Matched<C, P>, AsmError> {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| !e.mnemonic.contains('*') && e.mnemonic.eq_ignore_ascii_case(mnemonic))
        {
            return Ok(Matched { entry, aux: None });
        }

        let upper = mnemonic.to_ascii_uppercase();
        let mut best: Option<(usize, Matched<C, P>)> = None;
        for entry in self.entries {
            let Some((head, tail)) = entry.mnemonic.split_once('*') else {
                continue;
            };
            if best.as_ref().is_some_and(|(len, _)| *len >= head.len()) {
                continue;
            }
            let Some(middle) = wildcard_middle(&upper, head, tail) else {
                continue;
            };
            if let Some(aux) = suffix(entry, middle) {
                best = Some((
                    head.len(),
                    Matched {
                        entry,
                        aux: Some(aux),
                    },
                ));
            }
        }
        best.map(|(_, matched)| matched)
            .ok_or_else(|| AsmError::unknown_mnemonic(mnemonic))
    }
}

/// Text of `token` between a wildcard row's `head` and `tail`.
fn wildcard_middle<'a>(token: &'a str, head: &str, tail: &str) -> Option<&'a str> {
    if token.len() < head.len() + tail.len() {
        return None;
    }
    let rest = token.strip_prefix(head)?;
    rest.strip_suffix(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembler::error::AsmErrorKind;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Class {
        Branch,
        BranchLink,
        Move,
        Short,
    }

    static ROWS: [OpcodeEntry<Class>; 6] = [
        OpcodeEntry {
            mnemonic: "B*",
            class: Class::Branch,
            param: 0,
        },
        OpcodeEntry {
            mnemonic: "BL*",
            class: Class::BranchLink,
            param: 1,
        },
        OpcodeEntry {
            mnemonic: "B*.S",
            class: Class::Short,
            param: 2,
        },
        OpcodeEntry {
            mnemonic: "MOVE.B",
            class: Class::Move,
            param: 1,
        },
        OpcodeEntry {
            mnemonic: "MOVE.W",
            class: Class::Move,
            param: 3,
        },
        OpcodeEntry {
            mnemonic: "MOVE.L",
            class: Class::Move,
            param: 2,
        },
    ];

    const TABLE: MnemonicTable<Class> = MnemonicTable::new(&ROWS);

    fn cond(_: &OpcodeEntry<Class>, text: &str) -> Option<u32> {
        match text {
            "" => Some(14),
            "EQ" => Some(0),
            "NE" => Some(1),
            "LT" => Some(11),
            "LS" => Some(9),
            _ => None,
        }
    }

    #[test]
    fn exact_rows_match_case_insensitively() {
        let m = TABLE.lookup("move.l").unwrap();
        assert_eq!(m.class(), Class::Move);
        assert_eq!(m.param(), 2);
        assert_eq!(m.aux, None);
    }

    #[test]
    fn wildcard_strips_condition() {
        let m = TABLE.lookup_with("BEQ", cond).unwrap();
        assert_eq!((m.class(), m.aux), (Class::Branch, Some(0)));
        let m = TABLE.lookup_with("B", cond).unwrap();
        assert_eq!(m.aux, Some(14));
    }

    #[test]
    fn longest_stem_wins_when_suffix_valid() {
        let m = TABLE.lookup_with("BLNE", cond).unwrap();
        assert_eq!((m.class(), m.aux), (Class::BranchLink, Some(1)));
        // BLT is B + LT, not BL + T.
        let m = TABLE.lookup_with("BLT", cond).unwrap();
        assert_eq!((m.class(), m.aux), (Class::Branch, Some(11)));
        let m = TABLE.lookup_with("BLS", cond).unwrap();
        assert_eq!((m.class(), m.aux), (Class::Branch, Some(9)));
    }

    #[test]
    fn wildcard_with_tail() {
        let m = TABLE.lookup_with("bne.s", cond).unwrap();
        assert_eq!((m.class(), m.aux), (Class::Short, Some(1)));
    }

    #[test]
    fn unrecognized_suffix_is_unknown_mnemonic() {
        let err = TABLE.lookup_with("BXX", cond).unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::UnknownMnemonic);
        let err = TABLE.lookup("MOVE.Q").unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::UnknownMnemonic);
    }

    #[test]
    fn exact_lookup_ignores_wildcards() {
        assert!(TABLE.lookup("BEQ").is_err());
    }
}
