// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Z80 opcode table.
//!
//! Row parameters are the base opcode (inherent rows, with an `ED` page
//! prefix above `0xFF`) or the operation index within a group: the ALU
//! operation for `ADD`..`CP`, the rotate kind for the `CB` page, and the
//! `CB` quadrant for `BIT`/`RES`/`SET`.

use crate::core::dispatch::{MnemonicTable, OpcodeEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Inherent,
    Load,
    Push,
    Pop,
    Exchange,
    /// `ADD`..`CP`, including the 16-bit `ADD`/`ADC`/`SBC` forms.
    Alu,
    Increment,
    Decrement,
    Rotate,
    Bit,
    Jump,
    JumpRelative,
    DecrementJump,
    Call,
    Return,
    Restart,
    InterruptMode,
    Input,
    Output,
}

pub type Entry = OpcodeEntry<Class, u16>;

const fn row(mnemonic: &'static str, class: Class, param: u16) -> Entry {
    OpcodeEntry {
        mnemonic,
        class,
        param,
    }
}

use Class::*;

static ROWS: &[Entry] = &[
    row("NOP", Inherent, 0x00),
    row("HALT", Inherent, 0x76),
    row("DI", Inherent, 0xF3),
    row("EI", Inherent, 0xFB),
    row("EXX", Inherent, 0xD9),
    row("DAA", Inherent, 0x27),
    row("CPL", Inherent, 0x2F),
    row("SCF", Inherent, 0x37),
    row("CCF", Inherent, 0x3F),
    row("RLCA", Inherent, 0x07),
    row("RRCA", Inherent, 0x0F),
    row("RLA", Inherent, 0x17),
    row("RRA", Inherent, 0x1F),
    row("NEG", Inherent, 0xED44),
    row("RETN", Inherent, 0xED45),
    row("RETI", Inherent, 0xED4D),
    row("RRD", Inherent, 0xED67),
    row("RLD", Inherent, 0xED6F),
    row("LDI", Inherent, 0xEDA0),
    row("CPI", Inherent, 0xEDA1),
    row("INI", Inherent, 0xEDA2),
    row("OUTI", Inherent, 0xEDA3),
    row("LDD", Inherent, 0xEDA8),
    row("CPD", Inherent, 0xEDA9),
    row("IND", Inherent, 0xEDAA),
    row("OUTD", Inherent, 0xEDAB),
    row("LDIR", Inherent, 0xEDB0),
    row("CPIR", Inherent, 0xEDB1),
    row("INIR", Inherent, 0xEDB2),
    row("OTIR", Inherent, 0xEDB3),
    row("LDDR", Inherent, 0xEDB8),
    row("CPDR", Inherent, 0xEDB9),
    row("INDR", Inherent, 0xEDBA),
    row("OTDR", Inherent, 0xEDBB),
    row("LD", Load, 0),
    row("PUSH", Push, 0xC5),
    row("POP", Pop, 0xC1),
    row("EX", Exchange, 0),
    row("ADD", Alu, 0),
    row("ADC", Alu, 1),
    row("SUB", Alu, 2),
    row("SBC", Alu, 3),
    row("AND", Alu, 4),
    row("XOR", Alu, 5),
    row("OR", Alu, 6),
    row("CP", Alu, 7),
    row("INC", Increment, 0),
    row("DEC", Decrement, 1),
    row("RLC", Rotate, 0),
    row("RRC", Rotate, 1),
    row("RL", Rotate, 2),
    row("RR", Rotate, 3),
    row("SLA", Rotate, 4),
    row("SRA", Rotate, 5),
    row("SLL", Rotate, 6),
    row("SRL", Rotate, 7),
    row("BIT", Bit, 0x40),
    row("RES", Bit, 0x80),
    row("SET", Bit, 0xC0),
    row("JP", Jump, 0xC3),
    row("JR", JumpRelative, 0x18),
    row("DJNZ", DecrementJump, 0x10),
    row("CALL", Call, 0xCD),
    row("RET", Return, 0xC9),
    row("RST", Restart, 0xC7),
    row("IM", InterruptMode, 0),
    row("IN", Input, 0),
    row("OUT", Output, 0),
];

pub static INSTRUCTION_TABLE: MnemonicTable<Class, u16> = MnemonicTable::new(ROWS);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_unique() {
        let mut names: Vec<_> = ROWS.iter().map(|r| r.mnemonic).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ROWS.len());
    }

    #[test]
    fn lookup_ignores_case() {
        let ldir = INSTRUCTION_TABLE.lookup("ldir").unwrap();
        assert_eq!((ldir.class(), ldir.param()), (Inherent, 0xEDB0));
        assert!(INSTRUCTION_TABLE.lookup("MOV").is_err());
    }
}
