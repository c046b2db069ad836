// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instruction table for the MOS 6502 family.
//!
//! One row per mnemonic. Each row lists the (mode, opcode) pairs it offers
//! together with the CPUs that accept the pair, so 6502, 65C02 and 65816
//! share one table.

use crate::core::dispatch::{MnemonicTable, OpcodeEntry};
use crate::families::mos6502::operand::AddressMode;

/// A CPU of the family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    M6502,
    M65C02,
    M65816,
}

impl Variant {
    const fn bit(self) -> u8 {
        match self {
            Variant::M6502 => 1,
            Variant::M65C02 => 2,
            Variant::M65816 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::M6502 => "6502",
            Variant::M65C02 => "65C02",
            Variant::M65816 => "65816",
        }
    }
}

/// Set of CPUs accepting an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Variants(u8);

impl Variants {
    pub const ALL: Variants = Variants(1 | 2 | 4);
    /// 65C02 and 65816.
    pub const CMOS: Variants = Variants(2 | 4);
    /// Rockwell/WDC 65C02 bit instructions; the 65816 reuses their opcodes.
    pub const C02: Variants = Variants(2);
    pub const W816: Variants = Variants(4);

    pub const fn contains(self, variant: Variant) -> bool {
        self.0 & variant.bit() != 0
    }
}

/// Instruction classes; each selects a resolver routine in the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    /// General operand grammar, mode chosen from the row's mode list.
    Memory,
    /// 8-bit PC-relative branch.
    Branch,
    /// 16-bit PC-relative (BRL, PER).
    BranchLong,
    /// BBRn/BBSn zp,target.
    BitBranch,
    /// RMBn/SMBn zp.
    BitZeroPage,
    /// MVN/MVP src,dst.
    BlockMove,
}

/// Width of the immediate operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImmWidth {
    Byte,
    /// Follows the 65816 accumulator width (`LONGA`).
    Accumulator,
    /// Follows the 65816 index width (`LONGI`).
    Index,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeOp {
    pub mode: AddressMode,
    pub opcode: u8,
    pub cpus: Variants,
}

const fn m(mode: AddressMode, opcode: u8, cpus: Variants) -> ModeOp {
    ModeOp { mode, opcode, cpus }
}

/// Row parameter.
#[derive(Clone, Copy, Debug)]
pub struct Ops {
    pub imm: ImmWidth,
    pub modes: &'static [ModeOp],
}

impl Ops {
    /// True when any mode of the row exists on `variant`.
    pub fn supported_by(&self, variant: Variant) -> bool {
        self.modes.iter().any(|op| op.cpus.contains(variant))
    }

    pub fn find(&self, mode: AddressMode, variant: Variant) -> Option<u8> {
        self.modes
            .iter()
            .find(|op| op.mode == mode && op.cpus.contains(variant))
            .map(|op| op.opcode)
    }

    /// True when `mode` exists for some CPU of the family.
    pub fn has_mode(&self, mode: AddressMode) -> bool {
        self.modes.iter().any(|op| op.mode == mode)
    }

    /// Base opcode of a single-mode row.
    pub fn base(&self) -> u8 {
        self.modes.first().map_or(0, |op| op.opcode)
    }
}

pub type Entry = OpcodeEntry<Class, Ops>;

use AddressMode::*;

const A: Variants = Variants::ALL;
const C: Variants = Variants::CMOS;
const W: Variants = Variants::W816;

macro_rules! alu {
    ($name:ident, $base:expr) => {
        static $name: [ModeOp; 15] = [
            m(IndexedIndirectX, $base + 0x01, A),
            m(StackRelative, $base + 0x03, W),
            m(ZeroPage, $base + 0x05, A),
            m(DirectIndirectLong, $base + 0x07, W),
            m(Immediate, $base + 0x09, A),
            m(Absolute, $base + 0x0D, A),
            m(AbsoluteLong, $base + 0x0F, W),
            m(IndirectIndexedY, $base + 0x11, A),
            m(ZeroPageIndirect, $base + 0x12, C),
            m(StackRelativeIndirectY, $base + 0x13, W),
            m(ZeroPageX, $base + 0x15, A),
            m(DirectIndirectLongY, $base + 0x17, W),
            m(AbsoluteY, $base + 0x19, A),
            m(AbsoluteX, $base + 0x1D, A),
            m(AbsoluteLongX, $base + 0x1F, W),
        ];
    };
}

macro_rules! rmw {
    ($name:ident, $base:expr) => {
        static $name: [ModeOp; 5] = [
            m(Accumulator, $base + 0x0A, A),
            m(ZeroPage, $base + 0x06, A),
            m(ZeroPageX, $base + 0x16, A),
            m(Absolute, $base + 0x0E, A),
            m(AbsoluteX, $base + 0x1E, A),
        ];
    };
}

alu!(ORA_OPS, 0x00);
alu!(AND_OPS, 0x20);
alu!(EOR_OPS, 0x40);
alu!(ADC_OPS, 0x60);
alu!(LDA_OPS, 0xA0);
alu!(CMP_OPS, 0xC0);
alu!(SBC_OPS, 0xE0);

static STA_OPS: [ModeOp; 14] = [
    m(IndexedIndirectX, 0x81, A),
    m(StackRelative, 0x83, W),
    m(ZeroPage, 0x85, A),
    m(DirectIndirectLong, 0x87, W),
    m(Absolute, 0x8D, A),
    m(AbsoluteLong, 0x8F, W),
    m(IndirectIndexedY, 0x91, A),
    m(ZeroPageIndirect, 0x92, C),
    m(StackRelativeIndirectY, 0x93, W),
    m(ZeroPageX, 0x95, A),
    m(DirectIndirectLongY, 0x97, W),
    m(AbsoluteY, 0x99, A),
    m(AbsoluteX, 0x9D, A),
    m(AbsoluteLongX, 0x9F, W),
];

rmw!(ASL_OPS, 0x00);
rmw!(ROL_OPS, 0x20);
rmw!(LSR_OPS, 0x40);
rmw!(ROR_OPS, 0x60);

static INC_OPS: [ModeOp; 5] = [
    m(Accumulator, 0x1A, C),
    m(ZeroPage, 0xE6, A),
    m(ZeroPageX, 0xF6, A),
    m(Absolute, 0xEE, A),
    m(AbsoluteX, 0xFE, A),
];
static DEC_OPS: [ModeOp; 5] = [
    m(Accumulator, 0x3A, C),
    m(ZeroPage, 0xC6, A),
    m(ZeroPageX, 0xD6, A),
    m(Absolute, 0xCE, A),
    m(AbsoluteX, 0xDE, A),
];
static BIT_OPS: [ModeOp; 5] = [
    m(Immediate, 0x89, C),
    m(ZeroPage, 0x24, A),
    m(ZeroPageX, 0x34, C),
    m(Absolute, 0x2C, A),
    m(AbsoluteX, 0x3C, C),
];
static LDX_OPS: [ModeOp; 5] = [
    m(Immediate, 0xA2, A),
    m(ZeroPage, 0xA6, A),
    m(ZeroPageY, 0xB6, A),
    m(Absolute, 0xAE, A),
    m(AbsoluteY, 0xBE, A),
];
static LDY_OPS: [ModeOp; 5] = [
    m(Immediate, 0xA0, A),
    m(ZeroPage, 0xA4, A),
    m(ZeroPageX, 0xB4, A),
    m(Absolute, 0xAC, A),
    m(AbsoluteX, 0xBC, A),
];
static STX_OPS: [ModeOp; 3] = [
    m(ZeroPage, 0x86, A),
    m(ZeroPageY, 0x96, A),
    m(Absolute, 0x8E, A),
];
static STY_OPS: [ModeOp; 3] = [
    m(ZeroPage, 0x84, A),
    m(ZeroPageX, 0x94, A),
    m(Absolute, 0x8C, A),
];
static STZ_OPS: [ModeOp; 4] = [
    m(ZeroPage, 0x64, C),
    m(ZeroPageX, 0x74, C),
    m(Absolute, 0x9C, C),
    m(AbsoluteX, 0x9E, C),
];
static CPX_OPS: [ModeOp; 3] = [
    m(Immediate, 0xE0, A),
    m(ZeroPage, 0xE4, A),
    m(Absolute, 0xEC, A),
];
static CPY_OPS: [ModeOp; 3] = [
    m(Immediate, 0xC0, A),
    m(ZeroPage, 0xC4, A),
    m(Absolute, 0xCC, A),
];
static TRB_OPS: [ModeOp; 2] = [m(ZeroPage, 0x14, C), m(Absolute, 0x1C, C)];
static TSB_OPS: [ModeOp; 2] = [m(ZeroPage, 0x04, C), m(Absolute, 0x0C, C)];
static JMP_OPS: [ModeOp; 5] = [
    m(Absolute, 0x4C, A),
    m(AbsoluteLong, 0x5C, W),
    m(Indirect, 0x6C, A),
    m(AbsoluteIndexedIndirect, 0x7C, C),
    m(AbsoluteIndirectLong, 0xDC, W),
];
static JML_OPS: [ModeOp; 2] = [m(AbsoluteLong, 0x5C, W), m(AbsoluteIndirectLong, 0xDC, W)];
static JSR_OPS: [ModeOp; 3] = [
    m(Absolute, 0x20, A),
    m(AbsoluteLong, 0x22, W),
    m(AbsoluteIndexedIndirect, 0xFC, W),
];
static JSL_OPS: [ModeOp; 1] = [m(AbsoluteLong, 0x22, W)];
static PEA_OPS: [ModeOp; 1] = [m(Absolute, 0xF4, W)];
static PEI_OPS: [ModeOp; 1] = [m(ZeroPageIndirect, 0xD4, W)];
static REP_OPS: [ModeOp; 1] = [m(Immediate, 0xC2, W)];
static SEP_OPS: [ModeOp; 1] = [m(Immediate, 0xE2, W)];
static COP_OPS: [ModeOp; 1] = [m(Immediate, 0x02, W)];

const fn memory(mnemonic: &'static str, imm: ImmWidth, modes: &'static [ModeOp]) -> Entry {
    OpcodeEntry {
        mnemonic,
        class: Class::Memory,
        param: Ops { imm, modes },
    }
}

macro_rules! implied {
    ($mnemonic:expr, $opcode:expr, $cpus:expr) => {
        OpcodeEntry {
            mnemonic: $mnemonic,
            class: Class::Memory,
            param: Ops {
                imm: ImmWidth::Byte,
                modes: &[m(Implied, $opcode, $cpus)],
            },
        }
    };
}

macro_rules! single {
    ($mnemonic:expr, $class:expr, $mode:expr, $opcode:expr, $cpus:expr) => {
        OpcodeEntry {
            mnemonic: $mnemonic,
            class: $class,
            param: Ops {
                imm: ImmWidth::Byte,
                modes: &[m($mode, $opcode, $cpus)],
            },
        }
    };
}

use ImmWidth::{Accumulator as Acc, Byte, Index as Idx};

static ROWS: &[Entry] = &[
    memory("ORA", Acc, &ORA_OPS),
    memory("AND", Acc, &AND_OPS),
    memory("EOR", Acc, &EOR_OPS),
    memory("ADC", Acc, &ADC_OPS),
    memory("STA", Acc, &STA_OPS),
    memory("LDA", Acc, &LDA_OPS),
    memory("CMP", Acc, &CMP_OPS),
    memory("SBC", Acc, &SBC_OPS),
    memory("ASL", Byte, &ASL_OPS),
    memory("ROL", Byte, &ROL_OPS),
    memory("LSR", Byte, &LSR_OPS),
    memory("ROR", Byte, &ROR_OPS),
    memory("INC", Byte, &INC_OPS),
    memory("DEC", Byte, &DEC_OPS),
    memory("BIT", Acc, &BIT_OPS),
    memory("LDX", Idx, &LDX_OPS),
    memory("LDY", Idx, &LDY_OPS),
    memory("STX", Byte, &STX_OPS),
    memory("STY", Byte, &STY_OPS),
    memory("STZ", Byte, &STZ_OPS),
    memory("CPX", Idx, &CPX_OPS),
    memory("CPY", Idx, &CPY_OPS),
    memory("TRB", Byte, &TRB_OPS),
    memory("TSB", Byte, &TSB_OPS),
    memory("JMP", Byte, &JMP_OPS),
    memory("JML", Byte, &JML_OPS),
    memory("JSR", Byte, &JSR_OPS),
    memory("JSL", Byte, &JSL_OPS),
    memory("PEA", Byte, &PEA_OPS),
    memory("PEI", Byte, &PEI_OPS),
    memory("REP", Byte, &REP_OPS),
    memory("SEP", Byte, &SEP_OPS),
    memory("COP", Byte, &COP_OPS),
    // Implied
    implied!("BRK", 0x00, A),
    implied!("CLC", 0x18, A),
    implied!("CLD", 0xD8, A),
    implied!("CLI", 0x58, A),
    implied!("CLV", 0xB8, A),
    implied!("DEX", 0xCA, A),
    implied!("DEY", 0x88, A),
    implied!("INX", 0xE8, A),
    implied!("INY", 0xC8, A),
    implied!("NOP", 0xEA, A),
    implied!("PHA", 0x48, A),
    implied!("PHP", 0x08, A),
    implied!("PLA", 0x68, A),
    implied!("PLP", 0x28, A),
    implied!("RTI", 0x40, A),
    implied!("RTS", 0x60, A),
    implied!("SEC", 0x38, A),
    implied!("SED", 0xF8, A),
    implied!("SEI", 0x78, A),
    implied!("TAX", 0xAA, A),
    implied!("TAY", 0xA8, A),
    implied!("TSX", 0xBA, A),
    implied!("TXA", 0x8A, A),
    implied!("TXS", 0x9A, A),
    implied!("TYA", 0x98, A),
    implied!("PHX", 0xDA, C),
    implied!("PHY", 0x5A, C),
    implied!("PLX", 0xFA, C),
    implied!("PLY", 0x7A, C),
    implied!("INA", 0x1A, C),
    implied!("DEA", 0x3A, C),
    implied!("WAI", 0xCB, C),
    implied!("STP", 0xDB, C),
    implied!("PHB", 0x8B, W),
    implied!("PHD", 0x0B, W),
    implied!("PHK", 0x4B, W),
    implied!("PLB", 0xAB, W),
    implied!("PLD", 0x2B, W),
    implied!("RTL", 0x6B, W),
    implied!("TCD", 0x5B, W),
    implied!("TCS", 0x1B, W),
    implied!("TDC", 0x7B, W),
    implied!("TSC", 0x3B, W),
    implied!("TXY", 0x9B, W),
    implied!("TYX", 0xBB, W),
    implied!("XBA", 0xEB, W),
    implied!("XCE", 0xFB, W),
    // Branches
    single!("BPL", Class::Branch, Relative, 0x10, A),
    single!("BMI", Class::Branch, Relative, 0x30, A),
    single!("BVC", Class::Branch, Relative, 0x50, A),
    single!("BVS", Class::Branch, Relative, 0x70, A),
    single!("BCC", Class::Branch, Relative, 0x90, A),
    single!("BLT", Class::Branch, Relative, 0x90, A),
    single!("BCS", Class::Branch, Relative, 0xB0, A),
    single!("BGE", Class::Branch, Relative, 0xB0, A),
    single!("BNE", Class::Branch, Relative, 0xD0, A),
    single!("BEQ", Class::Branch, Relative, 0xF0, A),
    single!("BRA", Class::Branch, Relative, 0x80, C),
    single!("BRL", Class::BranchLong, Relative, 0x82, W),
    single!("PER", Class::BranchLong, Relative, 0x62, W),
    // Bit index comes from the digit at `*`
    single!("BBR*", Class::BitBranch, Relative, 0x0F, Variants::C02),
    single!("BBS*", Class::BitBranch, Relative, 0x8F, Variants::C02),
    single!("RMB*", Class::BitZeroPage, ZeroPage, 0x07, Variants::C02),
    single!("SMB*", Class::BitZeroPage, ZeroPage, 0x87, Variants::C02),
    single!("MVN", Class::BlockMove, Implied, 0x54, W),
    single!("MVP", Class::BlockMove, Implied, 0x44, W),
];

pub static FAMILY_INSTRUCTION_TABLE: MnemonicTable<Class, Ops> = MnemonicTable::new(ROWS);

/// Suffix parser for the `BBRn`/`BBSn`/`RMBn`/`SMBn` rows.
pub fn bit_suffix(_entry: &Entry, suffix: &str) -> Option<u32> {
    match suffix.as_bytes() {
        [d @ b'0'..=b'7'] => Some(u32::from(d - b'0')),
        _ => None,
    }
}

/// Check if a mnemonic exists for any CPU of the family.
pub fn has_mnemonic(mnemonic: &str) -> bool {
    FAMILY_INSTRUCTION_TABLE
        .lookup_with(mnemonic, bit_suffix)
        .is_ok()
}
