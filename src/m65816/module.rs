// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 65816 CPU module registration.

use crate::core::cpu::{CpuDescriptor, CpuType, Endianness};
use crate::core::family::CpuHandler;
use crate::core::registry::CpuModule;
use crate::families::mos6502::module::FAMILY_ID;

use super::M65816CpuHandler;

pub const CPU_ID: CpuType = CpuType::new("m65816");

pub struct M65816CpuModule;

impl CpuModule for M65816CpuModule {
    fn descriptor(&self) -> CpuDescriptor {
        CpuDescriptor {
            id: CPU_ID,
            family: FAMILY_ID,
            name: "65816",
            aliases: &["65C816", "W65C816", "W65C816S"],
            endianness: Endianness::Little,
            address_bits: 24,
        }
    }

    fn handler(&self) -> Box<dyn CpuHandler> {
        Box::new(M65816CpuHandler::new())
    }
}
