// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! ARM (ARMv4) opcode table.
//!
//! Every row is a wildcard: the text after the stem carries the condition
//! and, depending on the class, an `S` flag, a transfer size or a block
//! transfer mode. Both orders are accepted (`ADDEQS` and `ADDSEQ`,
//! `LDREQB` and `LDRBEQ`).

use crate::core::dispatch::{MnemonicTable, OpcodeEntry};

/// Data-processing operand layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DpKind {
    /// `Rd, Rn, <op2>`
    Normal,
    /// `Rd, <op2>` (`MOV`, `MVN`)
    Move,
    /// `Rn, <op2>`, flags always set (`CMP`, `CMN`, `TST`, `TEQ`)
    Compare,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    /// Parameter: the 4-bit opcode field.
    DataProc(DpKind),
    /// Parameter: accumulate bit.
    Multiply,
    /// Parameter: the `U`/`A` bits (`UMULL` 0 .. `SMLAL` 3).
    MultiplyLong,
    /// `LDR`/`STR`; parameter: load bit.
    Transfer,
    /// `LDM`/`STM`; parameter: load bit.
    Multiple,
    /// `PUSH`/`POP`; parameter: load bit.
    Stack,
    /// `B`/`BL`; parameter: link bit.
    Branch,
    BranchExchange,
    Interrupt,
    Swap,
    StatusRead,
    StatusWrite,
    Address,
    Nop,
}

pub type Entry = OpcodeEntry<Class, u32>;

const fn row(mnemonic: &'static str, class: Class, param: u32) -> Entry {
    OpcodeEntry {
        mnemonic,
        class,
        param,
    }
}

use Class::*;
use DpKind::*;

static ROWS: &[Entry] = &[
    row("AND*", DataProc(Normal), 0x0),
    row("EOR*", DataProc(Normal), 0x1),
    row("SUB*", DataProc(Normal), 0x2),
    row("RSB*", DataProc(Normal), 0x3),
    row("ADD*", DataProc(Normal), 0x4),
    row("ADC*", DataProc(Normal), 0x5),
    row("SBC*", DataProc(Normal), 0x6),
    row("RSC*", DataProc(Normal), 0x7),
    row("TST*", DataProc(Compare), 0x8),
    row("TEQ*", DataProc(Compare), 0x9),
    row("CMP*", DataProc(Compare), 0xA),
    row("CMN*", DataProc(Compare), 0xB),
    row("ORR*", DataProc(Normal), 0xC),
    row("MOV*", DataProc(Move), 0xD),
    row("BIC*", DataProc(Normal), 0xE),
    row("MVN*", DataProc(Move), 0xF),
    row("MUL*", Multiply, 0),
    row("MLA*", Multiply, 1),
    row("UMULL*", MultiplyLong, 0),
    row("UMLAL*", MultiplyLong, 1),
    row("SMULL*", MultiplyLong, 2),
    row("SMLAL*", MultiplyLong, 3),
    row("LDR*", Transfer, 1),
    row("STR*", Transfer, 0),
    row("LDM*", Multiple, 1),
    row("STM*", Multiple, 0),
    row("PUSH*", Stack, 0),
    row("POP*", Stack, 1),
    row("B*", Branch, 0),
    row("BL*", Branch, 1),
    row("BX*", BranchExchange, 0),
    row("SWI*", Interrupt, 0),
    row("SVC*", Interrupt, 0),
    row("SWP*", Swap, 0),
    row("MRS*", StatusRead, 0),
    row("MSR*", StatusWrite, 0),
    row("ADR*", Address, 0),
    row("NOP", Nop, 0),
];

pub static INSTRUCTION_TABLE: MnemonicTable<Class, u32> = MnemonicTable::new(ROWS);

/// The "always" condition.
pub const AL: u32 = 0xE;

const CONDITIONS: &[(&str, u32)] = &[
    ("EQ", 0x0),
    ("NE", 0x1),
    ("CS", 0x2),
    ("HS", 0x2),
    ("CC", 0x3),
    ("LO", 0x3),
    ("MI", 0x4),
    ("PL", 0x5),
    ("VS", 0x6),
    ("VC", 0x7),
    ("HI", 0x8),
    ("LS", 0x9),
    ("GE", 0xA),
    ("LT", 0xB),
    ("GT", 0xC),
    ("LE", 0xD),
    ("AL", AL),
];

pub fn condition(text: &str) -> Option<u32> {
    CONDITIONS
        .iter()
        .find(|(name, _)| *name == text)
        .map(|(_, code)| *code)
}

/// Transfer size variants of `LDR`/`STR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Word,
    Byte,
    WordUser,
    ByteUser,
    Half,
    SignedByte,
    SignedHalf,
}

const WIDTHS: &[(&str, Width)] = &[
    ("", Width::Word),
    ("B", Width::Byte),
    ("T", Width::WordUser),
    ("BT", Width::ByteUser),
    ("H", Width::Half),
    ("SB", Width::SignedByte),
    ("SH", Width::SignedHalf),
];

/// Block transfer addressing modes, by their `P`/`U` bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockMode {
    IncrementAfter,
    IncrementBefore,
    DecrementAfter,
    DecrementBefore,
}

impl BlockMode {
    /// `P` (bit 24) and `U` (bit 23).
    pub fn bits(self) -> u32 {
        match self {
            BlockMode::IncrementAfter => 0x0080_0000,
            BlockMode::IncrementBefore => 0x0180_0000,
            BlockMode::DecrementAfter => 0x0000_0000,
            BlockMode::DecrementBefore => 0x0100_0000,
        }
    }
}

const MODES: [BlockMode; 4] = [
    BlockMode::IncrementAfter,
    BlockMode::IncrementBefore,
    BlockMode::DecrementAfter,
    BlockMode::DecrementBefore,
];

fn block_mode(text: &str, load: bool) -> Option<usize> {
    use BlockMode::*;
    let mode = match (text, load) {
        ("" | "IA", _) | ("FD", true) | ("EA", false) => IncrementAfter,
        ("IB", _) | ("ED", true) | ("FA", false) => IncrementBefore,
        ("DA", _) | ("FA", true) | ("ED", false) => DecrementAfter,
        ("DB", _) | ("EA", true) | ("FD", false) => DecrementBefore,
        _ => return None,
    };
    MODES.iter().position(|m| *m == mode)
}

/// Decoded wildcard text of a matched row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Suffix {
    pub cond: u32,
    variant: u32,
}

impl Suffix {
    pub fn from_aux(aux: Option<u32>) -> Self {
        let aux = aux.unwrap_or(AL);
        Self {
            cond: aux & 0xF,
            variant: aux >> 4,
        }
    }

    pub fn set_flags(self) -> bool {
        self.variant == 1
    }

    pub fn width(self) -> Width {
        WIDTHS
            .get(self.variant as usize)
            .map_or(Width::Word, |(_, width)| *width)
    }

    pub fn block_mode(self) -> BlockMode {
        MODES
            .get(self.variant as usize)
            .copied()
            .unwrap_or(BlockMode::IncrementAfter)
    }

    /// `SWPB`
    pub fn byte(self) -> bool {
        self.variant == 1
    }
}

/// Split `text` into a condition and a class variant, in either order.
fn split(text: &str, variant: impl Fn(&str) -> Option<usize>) -> Option<u32> {
    let pack = |cond: u32, v: usize| Some(cond | (v as u32) << 4);
    if text.len() >= 2 {
        if let (Some(cond), Some(v)) = (condition(&text[..2]), variant(&text[2..])) {
            return pack(cond, v);
        }
        let at = text.len() - 2;
        if let (Some(cond), Some(v)) = (condition(&text[at..]), variant(&text[..at])) {
            return pack(cond, v);
        }
    }
    variant(text).and_then(|v| pack(AL, v))
}

/// Wildcard decoder for [`INSTRUCTION_TABLE`].
pub fn suffix(entry: &Entry, text: &str) -> Option<u32> {
    if !text.is_ascii() {
        return None;
    }
    let flag = |t: &str| match t {
        "" => Some(0),
        "S" => Some(1),
        _ => None,
    };
    match entry.class {
        DataProc(_) | Multiply | MultiplyLong => split(text, flag),
        Transfer => {
            let load = entry.param == 1;
            split(text, |t| {
                WIDTHS.iter().position(|(name, width)| {
                    *name == t
                        && (load || !matches!(width, Width::SignedByte | Width::SignedHalf))
                })
            })
        }
        Multiple => split(text, |t| block_mode(t, entry.param == 1)),
        Swap => split(text, |t| match t {
            "" => Some(0),
            "B" => Some(1),
            _ => None,
        }),
        _ => split(text, |t| t.is_empty().then_some(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> (&'static str, Suffix) {
        let matched = INSTRUCTION_TABLE.lookup_with(name, suffix).unwrap();
        (matched.entry.mnemonic, Suffix::from_aux(matched.aux))
    }

    #[test]
    fn condition_and_flag_in_either_order() {
        let (row, s) = lookup("ADDEQS");
        assert_eq!((row, s.cond, s.set_flags()), ("ADD*", 0x0, true));
        let (_, s) = lookup("addseq");
        assert_eq!((s.cond, s.set_flags()), (0x0, true));
        let (_, s) = lookup("MOVLS");
        assert_eq!((s.cond, s.set_flags()), (0x9, false));
    }

    #[test]
    fn branch_rows_prefer_the_longest_stem() {
        assert_eq!(lookup("BL").0, "BL*");
        assert_eq!(lookup("BLE"), ("B*", Suffix { cond: 0xD, variant: 0 }));
        assert_eq!(lookup("BLS").1.cond, 0x9);
        assert_eq!(lookup("BLLT"), ("BL*", Suffix { cond: 0xB, variant: 0 }));
        assert_eq!(lookup("BICS").0, "BIC*");
    }

    #[test]
    fn transfer_widths() {
        assert_eq!(lookup("LDREQB").1.width(), Width::Byte);
        assert_eq!(lookup("LDRBEQ").1.width(), Width::Byte);
        assert_eq!(lookup("LDRSH").1.width(), Width::SignedHalf);
        assert_eq!(lookup("LDRHS").1, Suffix { cond: 0x2, variant: 0 });
        assert!(INSTRUCTION_TABLE.lookup_with("STRSB", suffix).is_err());
    }

    #[test]
    fn stack_modes_depend_on_direction() {
        assert_eq!(lookup("LDMFD").1.block_mode(), BlockMode::IncrementAfter);
        assert_eq!(lookup("STMFD").1.block_mode(), BlockMode::DecrementBefore);
        assert_eq!(lookup("STMNEIA").1.cond, 0x1);
    }

    #[test]
    fn unknown_suffix_is_unknown_mnemonic() {
        assert!(INSTRUCTION_TABLE.lookup_with("ADDXX", suffix).is_err());
        assert!(INSTRUCTION_TABLE.lookup_with("BXS", suffix).is_err());
    }
}
