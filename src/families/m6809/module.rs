// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 6809 family module.

use crate::core::cpu::{CpuDescriptor, CpuFamily, CpuType, Endianness};
use crate::core::family::CpuHandler;
use crate::core::registry::{CpuModule, FamilyModule};

use super::M6809Handler;

pub const FAMILY_ID: CpuFamily = CpuFamily::new("m6809");
pub const CPU_ID: CpuType = CpuType::new("m6809");

pub struct M6809FamilyModule;

impl FamilyModule for M6809FamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn description(&self) -> &'static str {
        "Motorola 6809"
    }

    fn cpus(&self) -> Vec<Box<dyn CpuModule>> {
        vec![Box::new(M6809CpuModule)]
    }
}

pub struct M6809CpuModule;

impl CpuModule for M6809CpuModule {
    fn descriptor(&self) -> CpuDescriptor {
        CpuDescriptor {
            id: CPU_ID,
            family: FAMILY_ID,
            name: "6809",
            aliases: &["M6809", "MC6809"],
            endianness: Endianness::Big,
            address_bits: 16,
        }
    }

    fn handler(&self) -> Box<dyn CpuHandler> {
        Box::new(M6809Handler::new())
    }
}
