// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 6809 opcode table.
//!
//! Most memory instructions follow a fixed layout: the immediate opcode plus
//! `0x10`, `0x20` and `0x30` gives the direct, indexed and extended forms.
//! Read-modify-write instructions use `0x00`, `0x60` and `0x70` columns
//! instead. Opcodes above `0xFF` carry a `0x10` or `0x11` page prefix.

use crate::core::dispatch::{MnemonicTable, OpcodeEntry};

/// Instruction class; selects the operand grammar and opcode layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Inherent,
    /// Immediate, direct, indexed and extended.
    Memory,
    /// Like [`Class::Memory`] without the immediate form.
    Store,
    /// Direct, indexed and extended in the `0x00/0x60/0x70` columns.
    ReadModifyWrite,
    /// Indexed only (`LEAx`).
    Indexed,
    /// 8-bit immediate only (`ANDCC`, `ORCC`, `CWAI`).
    Immediate,
    Branch,
    LongBranch,
    /// `TFR`, `EXG`.
    Transfer,
    /// `PSHS`, `PULS`, `PSHU`, `PULU`.
    Stack,
}

/// Row parameter: base opcode and immediate width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Op {
    pub opcode: u16,
    pub wide: bool,
}

pub type Entry = OpcodeEntry<Class, Op>;

const fn row(mnemonic: &'static str, class: Class, opcode: u16) -> Entry {
    OpcodeEntry {
        mnemonic,
        class,
        param: Op {
            opcode,
            wide: false,
        },
    }
}

const fn wide(mnemonic: &'static str, opcode: u16) -> Entry {
    OpcodeEntry {
        mnemonic,
        class: Class::Memory,
        param: Op { opcode, wide: true },
    }
}

use Class::*;

static ROWS: &[Entry] = &[
    // Inherent
    row("ABX", Inherent, 0x3A),
    row("DAA", Inherent, 0x19),
    row("MUL", Inherent, 0x3D),
    row("NOP", Inherent, 0x12),
    row("RTI", Inherent, 0x3B),
    row("RTS", Inherent, 0x39),
    row("SEX", Inherent, 0x1D),
    row("SWI", Inherent, 0x3F),
    row("SWI2", Inherent, 0x103F),
    row("SWI3", Inherent, 0x113F),
    row("SYNC", Inherent, 0x13),
    row("NEGA", Inherent, 0x40),
    row("COMA", Inherent, 0x43),
    row("LSRA", Inherent, 0x44),
    row("RORA", Inherent, 0x46),
    row("ASRA", Inherent, 0x47),
    row("ASLA", Inherent, 0x48),
    row("LSLA", Inherent, 0x48),
    row("ROLA", Inherent, 0x49),
    row("DECA", Inherent, 0x4A),
    row("INCA", Inherent, 0x4C),
    row("TSTA", Inherent, 0x4D),
    row("CLRA", Inherent, 0x4F),
    row("NEGB", Inherent, 0x50),
    row("COMB", Inherent, 0x53),
    row("LSRB", Inherent, 0x54),
    row("RORB", Inherent, 0x56),
    row("ASRB", Inherent, 0x57),
    row("ASLB", Inherent, 0x58),
    row("LSLB", Inherent, 0x58),
    row("ROLB", Inherent, 0x59),
    row("DECB", Inherent, 0x5A),
    row("INCB", Inherent, 0x5C),
    row("TSTB", Inherent, 0x5D),
    row("CLRB", Inherent, 0x5F),
    // 8-bit accumulator
    row("SUBA", Memory, 0x80),
    row("CMPA", Memory, 0x81),
    row("SBCA", Memory, 0x82),
    row("ANDA", Memory, 0x84),
    row("BITA", Memory, 0x85),
    row("LDA", Memory, 0x86),
    row("EORA", Memory, 0x88),
    row("ADCA", Memory, 0x89),
    row("ORA", Memory, 0x8A),
    row("ADDA", Memory, 0x8B),
    row("SUBB", Memory, 0xC0),
    row("CMPB", Memory, 0xC1),
    row("SBCB", Memory, 0xC2),
    row("ANDB", Memory, 0xC4),
    row("BITB", Memory, 0xC5),
    row("LDB", Memory, 0xC6),
    row("EORB", Memory, 0xC8),
    row("ADCB", Memory, 0xC9),
    row("ORB", Memory, 0xCA),
    row("ADDB", Memory, 0xCB),
    // 16-bit
    wide("SUBD", 0x83),
    wide("ADDD", 0xC3),
    wide("CMPX", 0x8C),
    wide("LDX", 0x8E),
    wide("LDD", 0xCC),
    wide("LDU", 0xCE),
    wide("CMPD", 0x1083),
    wide("CMPY", 0x108C),
    wide("LDY", 0x108E),
    wide("LDS", 0x10CE),
    wide("CMPU", 0x1183),
    wide("CMPS", 0x118C),
    // Stores and JSR
    row("STA", Store, 0x87),
    row("STB", Store, 0xC7),
    row("STD", Store, 0xCD),
    row("STX", Store, 0x8F),
    row("STU", Store, 0xCF),
    row("STY", Store, 0x108F),
    row("STS", Store, 0x10CF),
    row("JSR", Store, 0x8D),
    // Read-modify-write
    row("NEG", ReadModifyWrite, 0x00),
    row("COM", ReadModifyWrite, 0x03),
    row("LSR", ReadModifyWrite, 0x04),
    row("ROR", ReadModifyWrite, 0x06),
    row("ASR", ReadModifyWrite, 0x07),
    row("ASL", ReadModifyWrite, 0x08),
    row("LSL", ReadModifyWrite, 0x08),
    row("ROL", ReadModifyWrite, 0x09),
    row("DEC", ReadModifyWrite, 0x0A),
    row("INC", ReadModifyWrite, 0x0C),
    row("TST", ReadModifyWrite, 0x0D),
    row("JMP", ReadModifyWrite, 0x0E),
    row("CLR", ReadModifyWrite, 0x0F),
    // Indexed only
    row("LEAX", Indexed, 0x30),
    row("LEAY", Indexed, 0x31),
    row("LEAS", Indexed, 0x32),
    row("LEAU", Indexed, 0x33),
    // Immediate only
    row("ORCC", Immediate, 0x1A),
    row("ANDCC", Immediate, 0x1C),
    row("CWAI", Immediate, 0x3C),
    // Branches
    row("BRA", Branch, 0x20),
    row("BRN", Branch, 0x21),
    row("BHI", Branch, 0x22),
    row("BLS", Branch, 0x23),
    row("BCC", Branch, 0x24),
    row("BHS", Branch, 0x24),
    row("BCS", Branch, 0x25),
    row("BLO", Branch, 0x25),
    row("BNE", Branch, 0x26),
    row("BEQ", Branch, 0x27),
    row("BVC", Branch, 0x28),
    row("BVS", Branch, 0x29),
    row("BPL", Branch, 0x2A),
    row("BMI", Branch, 0x2B),
    row("BGE", Branch, 0x2C),
    row("BLT", Branch, 0x2D),
    row("BGT", Branch, 0x2E),
    row("BLE", Branch, 0x2F),
    row("BSR", Branch, 0x8D),
    row("LBRA", LongBranch, 0x16),
    row("LBSR", LongBranch, 0x17),
    row("LBRN", LongBranch, 0x1021),
    row("LBHI", LongBranch, 0x1022),
    row("LBLS", LongBranch, 0x1023),
    row("LBCC", LongBranch, 0x1024),
    row("LBHS", LongBranch, 0x1024),
    row("LBCS", LongBranch, 0x1025),
    row("LBLO", LongBranch, 0x1025),
    row("LBNE", LongBranch, 0x1026),
    row("LBEQ", LongBranch, 0x1027),
    row("LBVC", LongBranch, 0x1028),
    row("LBVS", LongBranch, 0x1029),
    row("LBPL", LongBranch, 0x102A),
    row("LBMI", LongBranch, 0x102B),
    row("LBGE", LongBranch, 0x102C),
    row("LBLT", LongBranch, 0x102D),
    row("LBGT", LongBranch, 0x102E),
    row("LBLE", LongBranch, 0x102F),
    // Register operands
    row("EXG", Transfer, 0x1E),
    row("TFR", Transfer, 0x1F),
    row("PSHS", Stack, 0x34),
    row("PULS", Stack, 0x35),
    row("PSHU", Stack, 0x36),
    row("PULU", Stack, 0x37),
];

pub static INSTRUCTION_TABLE: MnemonicTable<Class, Op> = MnemonicTable::new(ROWS);

/// Opcode of the requested column, or `None` when the class lacks it.
pub fn column(class: Class, op: Op, column: Column) -> Option<u16> {
    let offset = match (class, column) {
        (Memory | Immediate, Column::Immediate) => 0x00,
        (Memory | Store, Column::Direct) => 0x10,
        (Memory | Store, Column::Indexed) => 0x20,
        (Memory | Store, Column::Extended) => 0x30,
        (ReadModifyWrite, Column::Direct) => 0x00,
        (ReadModifyWrite, Column::Indexed) => 0x60,
        (ReadModifyWrite, Column::Extended) => 0x70,
        (Indexed, Column::Indexed) => 0x00,
        _ => return None,
    };
    Some(op.opcode + offset)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Immediate,
    Direct,
    Indexed,
    Extended,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_follow_the_fixed_layout() {
        let lda = INSTRUCTION_TABLE.lookup("lda").unwrap();
        assert_eq!(column(lda.class(), lda.param(), Column::Extended), Some(0xB6));
        let ldy = INSTRUCTION_TABLE.lookup("LDY").unwrap();
        assert_eq!(column(ldy.class(), ldy.param(), Column::Direct), Some(0x109E));
        let clr = INSTRUCTION_TABLE.lookup("CLR").unwrap();
        assert_eq!(column(clr.class(), clr.param(), Column::Indexed), Some(0x6F));
        assert_eq!(column(clr.class(), clr.param(), Column::Immediate), None);
    }

    #[test]
    fn mnemonics_are_unique() {
        let mut names: Vec<_> = ROWS.iter().map(|row| row.mnemonic).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }
}
