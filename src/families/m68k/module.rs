// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 68000 family module.

use crate::core::cpu::{CpuDescriptor, CpuFamily, CpuType, Endianness};
use crate::core::family::CpuHandler;
use crate::core::registry::{CpuModule, FamilyModule};

use super::M68kHandler;

pub const FAMILY_ID: CpuFamily = CpuFamily::new("m68k");
pub const CPU_ID: CpuType = CpuType::new("m68000");

pub struct M68kFamilyModule;

impl FamilyModule for M68kFamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn description(&self) -> &'static str {
        "Motorola 68000"
    }

    fn cpus(&self) -> Vec<Box<dyn CpuModule>> {
        vec![Box::new(M68000CpuModule)]
    }
}

pub struct M68000CpuModule;

impl CpuModule for M68000CpuModule {
    fn descriptor(&self) -> CpuDescriptor {
        CpuDescriptor {
            id: CPU_ID,
            family: FAMILY_ID,
            name: "68000",
            aliases: &["MC68000", "M68K", "68K"],
            endianness: Endianness::Big,
            address_bits: 24,
        }
    }

    fn handler(&self) -> Box<dyn CpuHandler> {
        Box::new(M68kHandler::new())
    }
}
