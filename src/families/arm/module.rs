// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! ARM family module.

use crate::core::cpu::{CpuDescriptor, CpuFamily, CpuType, Endianness};
use crate::core::family::CpuHandler;
use crate::core::registry::{CpuModule, FamilyModule};

use super::ArmHandler;

pub const FAMILY_ID: CpuFamily = CpuFamily::new("arm");
pub const CPU_ID: CpuType = CpuType::new("arm");
pub const CPU_BE_ID: CpuType = CpuType::new("armbe");

pub struct ArmFamilyModule;

impl FamilyModule for ArmFamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn description(&self) -> &'static str {
        "ARM (ARMv4 instruction set)"
    }

    fn cpus(&self) -> Vec<Box<dyn CpuModule>> {
        vec![
            Box::new(ArmCpuModule {
                id: CPU_ID,
                name: "ARM",
                aliases: &["ARMLE", "ARM7"],
                endianness: Endianness::Little,
            }),
            Box::new(ArmCpuModule {
                id: CPU_BE_ID,
                name: "ARMBE",
                aliases: &[],
                endianness: Endianness::Big,
            }),
        ]
    }
}

/// One byte order of the ARM core; the encoder is shared.
pub struct ArmCpuModule {
    id: CpuType,
    name: &'static str,
    aliases: &'static [&'static str],
    endianness: Endianness,
}

impl CpuModule for ArmCpuModule {
    fn descriptor(&self) -> CpuDescriptor {
        CpuDescriptor {
            id: self.id,
            family: FAMILY_ID,
            name: self.name,
            aliases: self.aliases,
            endianness: self.endianness,
            address_bits: 32,
        }
    }

    fn handler(&self) -> Box<dyn CpuHandler> {
        Box::new(ArmHandler::new())
    }
}
