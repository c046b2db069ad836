// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 68000 opcode table.
//!
//! Rows are keyed by the mnemonic without its `.B/.W/.L/.S` suffix; the
//! handler strips the suffix first. `B*`, `DB*` and `S*` rows take a
//! condition code at the wildcard.

use crate::core::dispatch::{MnemonicTable, OpcodeEntry};

use super::operand::Size;

/// Flavour of a two-operand ALU mnemonic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluKind {
    /// `ADD`, `SUB`: address destinations become `ADDA`/`SUBA`.
    Arith,
    /// `AND`, `OR`: may target `CCR`/`SR` with an immediate.
    Logic,
    /// `CMP`: only `<ea>,Dn`.
    Compare,
    /// `EOR`: only `Dn,<ea>`.
    Exclusive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Inherent,
    Move,
    MoveAddress,
    MoveQuick,
    MoveMultiple,
    Alu(AluKind),
    AluAddress,
    AluImmediate,
    Quick,
    /// `ADDX`, `SUBX`, `ABCD`, `SBCD`.
    Extended,
    CompareMemory,
    /// One data-alterable operand with a size field (`CLR`, `TST`, ...).
    Single,
    /// One data-alterable byte operand without a size field (`TAS`, `NBCD`).
    SingleByte,
    Shift,
    Bit,
    Branch,
    DecrementBranch,
    SetCondition,
    /// `LEA`
    LoadAddress,
    /// One control operand (`PEA`, `JMP`, `JSR`).
    Control,
    Link,
    Unlink,
    Trap,
    Stop,
    Check,
    Extend,
    Swap,
    Exchange,
    /// `MULU`, `MULS`, `DIVU`, `DIVS`.
    MulDiv,
}

/// Sizes a row accepts, as a bitmask over [`Size`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sizes(u8);

impl Sizes {
    pub const B: Sizes = Sizes(0b001);
    pub const W: Sizes = Sizes(0b010);
    pub const L: Sizes = Sizes(0b100);
    pub const WL: Sizes = Sizes(0b110);
    pub const BL: Sizes = Sizes(0b101);
    pub const BWL: Sizes = Sizes(0b111);

    pub fn allows(self, size: Size) -> bool {
        let bit = match size {
            Size::Byte => 0b001,
            Size::Word => 0b010,
            Size::Long => 0b100,
        };
        self.0 & bit != 0
    }

    /// Size used when no suffix is written.
    pub fn default_size(self) -> Size {
        if self.allows(Size::Word) {
            Size::Word
        } else if self.allows(Size::Long) {
            Size::Long
        } else {
            Size::Byte
        }
    }
}

/// Row parameter. `alt` is a second opcode: the immediate form for ALU rows,
/// the direction bit for shifts, the condition for `BRA`/`BSR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Op {
    pub base: u16,
    pub alt: u16,
    pub sizes: Sizes,
}

pub type Entry = OpcodeEntry<Class, Op>;

const fn row(mnemonic: &'static str, class: Class, base: u16, sizes: Sizes) -> Entry {
    OpcodeEntry {
        mnemonic,
        class,
        param: Op {
            base,
            alt: 0,
            sizes,
        },
    }
}

const fn alt(mnemonic: &'static str, class: Class, base: u16, alt: u16, sizes: Sizes) -> Entry {
    OpcodeEntry {
        mnemonic,
        class,
        param: Op { base, alt, sizes },
    }
}

/// Shift rows: `base` holds the type field, `alt` the direction (1 = left).
const fn shift(mnemonic: &'static str, kind: u16, left: u16) -> Entry {
    alt(mnemonic, Class::Shift, kind, left, Sizes::BWL)
}

use AluKind::*;
use Class::*;

static ROWS: &[Entry] = &[
    row("NOP", Inherent, 0x4E71, Sizes::W),
    row("RTS", Inherent, 0x4E75, Sizes::W),
    row("RTE", Inherent, 0x4E73, Sizes::W),
    row("RTR", Inherent, 0x4E77, Sizes::W),
    row("RESET", Inherent, 0x4E70, Sizes::W),
    row("TRAPV", Inherent, 0x4E76, Sizes::W),
    row("ILLEGAL", Inherent, 0x4AFC, Sizes::W),
    row("MOVE", Move, 0x0000, Sizes::BWL),
    row("MOVEA", MoveAddress, 0x0040, Sizes::WL),
    row("MOVEQ", MoveQuick, 0x7000, Sizes::L),
    row("MOVEM", MoveMultiple, 0x4880, Sizes::WL),
    alt("ADD", Alu(Arith), 0xD000, 0x0600, Sizes::BWL),
    alt("SUB", Alu(Arith), 0x9000, 0x0400, Sizes::BWL),
    alt("AND", Alu(Logic), 0xC000, 0x0200, Sizes::BWL),
    alt("OR", Alu(Logic), 0x8000, 0x0000, Sizes::BWL),
    alt("CMP", Alu(Compare), 0xB000, 0x0C00, Sizes::BWL),
    alt("EOR", Alu(Exclusive), 0xB000, 0x0A00, Sizes::BWL),
    row("ADDA", AluAddress, 0xD0C0, Sizes::WL),
    row("SUBA", AluAddress, 0x90C0, Sizes::WL),
    row("CMPA", AluAddress, 0xB0C0, Sizes::WL),
    row("ADDI", AluImmediate, 0x0600, Sizes::BWL),
    row("SUBI", AluImmediate, 0x0400, Sizes::BWL),
    row("ANDI", AluImmediate, 0x0200, Sizes::BWL),
    row("ORI", AluImmediate, 0x0000, Sizes::BWL),
    row("EORI", AluImmediate, 0x0A00, Sizes::BWL),
    row("CMPI", AluImmediate, 0x0C00, Sizes::BWL),
    row("ADDQ", Quick, 0x5000, Sizes::BWL),
    row("SUBQ", Quick, 0x5100, Sizes::BWL),
    row("ADDX", Extended, 0xD100, Sizes::BWL),
    row("SUBX", Extended, 0x9100, Sizes::BWL),
    row("ABCD", Extended, 0xC100, Sizes::B),
    row("SBCD", Extended, 0x8100, Sizes::B),
    row("CMPM", CompareMemory, 0xB108, Sizes::BWL),
    row("CLR", Single, 0x4200, Sizes::BWL),
    row("NEG", Single, 0x4400, Sizes::BWL),
    row("NEGX", Single, 0x4000, Sizes::BWL),
    row("NOT", Single, 0x4600, Sizes::BWL),
    row("TST", Single, 0x4A00, Sizes::BWL),
    row("TAS", SingleByte, 0x4AC0, Sizes::B),
    row("NBCD", SingleByte, 0x4800, Sizes::B),
    shift("ASR", 0, 0),
    shift("ASL", 0, 1),
    shift("LSR", 1, 0),
    shift("LSL", 1, 1),
    shift("ROXR", 2, 0),
    shift("ROXL", 2, 1),
    shift("ROR", 3, 0),
    shift("ROL", 3, 1),
    row("BTST", Bit, 0, Sizes::BL),
    row("BCHG", Bit, 1, Sizes::BL),
    row("BCLR", Bit, 2, Sizes::BL),
    row("BSET", Bit, 3, Sizes::BL),
    alt("BRA", Branch, 0x6000, 0x0, Sizes::BWL),
    alt("BSR", Branch, 0x6000, 0x1, Sizes::BWL),
    row("B*", Branch, 0x6000, Sizes::BWL),
    row("DB*", DecrementBranch, 0x50C8, Sizes::W),
    row("S*", SetCondition, 0x50C0, Sizes::B),
    row("LEA", LoadAddress, 0x41C0, Sizes::L),
    row("PEA", Control, 0x4840, Sizes::L),
    row("JMP", Control, 0x4EC0, Sizes::L),
    row("JSR", Control, 0x4E80, Sizes::L),
    row("LINK", Link, 0x4E50, Sizes::W),
    row("UNLK", Unlink, 0x4E58, Sizes::W),
    row("TRAP", Trap, 0x4E40, Sizes::W),
    row("STOP", Stop, 0x4E72, Sizes::W),
    row("CHK", Check, 0x4180, Sizes::W),
    row("EXT", Extend, 0x4880, Sizes::WL),
    row("SWAP", Swap, 0x4840, Sizes::W),
    row("EXG", Exchange, 0xC100, Sizes::L),
    row("MULU", MulDiv, 0xC0C0, Sizes::W),
    row("MULS", MulDiv, 0xC1C0, Sizes::W),
    row("DIVU", MulDiv, 0x80C0, Sizes::W),
    row("DIVS", MulDiv, 0x81C0, Sizes::W),
];

pub static INSTRUCTION_TABLE: MnemonicTable<Class, Op> = MnemonicTable::new(ROWS);

const CONDITIONS: [(&str, u32); 18] = [
    ("T", 0x0),
    ("F", 0x1),
    ("HI", 0x2),
    ("LS", 0x3),
    ("CC", 0x4),
    ("HS", 0x4),
    ("CS", 0x5),
    ("LO", 0x5),
    ("NE", 0x6),
    ("EQ", 0x7),
    ("VC", 0x8),
    ("VS", 0x9),
    ("PL", 0xA),
    ("MI", 0xB),
    ("GE", 0xC),
    ("LT", 0xD),
    ("GT", 0xE),
    ("LE", 0xF),
];

/// Condition code at a wildcard. `Bcc` has no `T`/`F` forms (those slots
/// are `BRA` and `BSR`); `DBRA` is `DBF`.
pub fn condition_suffix(entry: &Entry, text: &str) -> Option<u32> {
    if entry.class == Class::DecrementBranch && text == "RA" {
        return Some(0x1);
    }
    let code = CONDITIONS
        .iter()
        .find(|(name, _)| *name == text)
        .map(|(_, code)| *code)?;
    if entry.class == Class::Branch && code < 2 {
        return None;
    }
    Some(code)
}
