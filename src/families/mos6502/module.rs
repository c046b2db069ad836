// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 family module.

use crate::core::cpu::{CpuDescriptor, CpuFamily, CpuType, Endianness};
use crate::core::family::CpuHandler;
use crate::core::registry::{CpuModule, FamilyModule};
use crate::m65816::module::M65816CpuModule;

use super::{MOS6502Handler, Variant};

pub const FAMILY_ID: CpuFamily = CpuFamily::new("mos6502");
pub const CPU_ID: CpuType = CpuType::new("m6502");
pub const M65C02_CPU_ID: CpuType = CpuType::new("m65c02");

pub struct MOS6502FamilyModule;

impl FamilyModule for MOS6502FamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn description(&self) -> &'static str {
        "MOS 6502 and descendants"
    }

    fn cpus(&self) -> Vec<Box<dyn CpuModule>> {
        vec![
            Box::new(M6502CpuModule),
            Box::new(M65C02CpuModule),
            Box::new(M65816CpuModule),
        ]
    }
}

pub struct M6502CpuModule;

impl CpuModule for M6502CpuModule {
    fn descriptor(&self) -> CpuDescriptor {
        CpuDescriptor {
            id: CPU_ID,
            family: FAMILY_ID,
            name: "6502",
            aliases: &["6502A", "NMOS6502"],
            endianness: Endianness::Little,
            address_bits: 16,
        }
    }

    fn handler(&self) -> Box<dyn CpuHandler> {
        Box::new(MOS6502Handler::new(Variant::M6502))
    }
}

pub struct M65C02CpuModule;

impl CpuModule for M65C02CpuModule {
    fn descriptor(&self) -> CpuDescriptor {
        CpuDescriptor {
            id: M65C02_CPU_ID,
            family: FAMILY_ID,
            name: "65C02",
            aliases: &["W65C02", "R65C02"],
            endianness: Endianness::Little,
            address_bits: 16,
        }
    }

    fn handler(&self) -> Box<dyn CpuHandler> {
        Box::new(MOS6502Handler::new(Variant::M65C02))
    }
}
