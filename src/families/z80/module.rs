// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Zilog Z80 family module.

use crate::core::cpu::{CpuDescriptor, CpuFamily, CpuType, Endianness};
use crate::core::family::CpuHandler;
use crate::core::registry::{CpuModule, FamilyModule};

use super::Z80Handler;

pub const FAMILY_ID: CpuFamily = CpuFamily::new("z80");
pub const CPU_ID: CpuType = CpuType::new("z80");

pub struct Z80FamilyModule;

impl FamilyModule for Z80FamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn description(&self) -> &'static str {
        "Zilog Z80"
    }

    fn cpus(&self) -> Vec<Box<dyn CpuModule>> {
        vec![Box::new(Z80CpuModule)]
    }
}

pub struct Z80CpuModule;

impl CpuModule for Z80CpuModule {
    fn descriptor(&self) -> CpuDescriptor {
        CpuDescriptor {
            id: CPU_ID,
            family: FAMILY_ID,
            name: "Z80",
            aliases: &["Z80A", "Z84C00"],
            endianness: Endianness::Little,
            address_bits: 16,
        }
    }

    fn handler(&self) -> Box<dyn CpuHandler> {
        Box::new(Z80Handler::new())
    }
}
