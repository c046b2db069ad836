// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Module registry for CPU families and CPUs.
//!
//! Every architecture registers a [`FamilyModule`] which in turn provides one
//! [`CpuModule`] per selectable variant. The driver resolves a CPU by name
//! (or alias) and receives its descriptor plus a boxed [`CpuHandler`].

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::core::cpu::{CpuDescriptor, CpuFamily, CpuType};
use crate::core::family::CpuHandler;

pub trait FamilyModule: Send + Sync {
    fn family_id(&self) -> CpuFamily;
    /// One-line description shown by `--list-cpus`.
    fn description(&self) -> &'static str;
    fn cpus(&self) -> Vec<Box<dyn CpuModule>>;
}

pub trait CpuModule: Send + Sync {
    fn descriptor(&self) -> CpuDescriptor;
    fn handler(&self) -> Box<dyn CpuHandler>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown CPU: {0}")]
    UnknownCpu(String),
    #[error("CPU name already registered: {0}")]
    DuplicateCpu(String),
    #[error("CPU {cpu} belongs to unregistered family {family}")]
    MissingFamily { cpu: String, family: &'static str },
}

/// A CPU selected by name, ready to encode.
pub struct ResolvedCpu {
    pub descriptor: CpuDescriptor,
    pub handler: Box<dyn CpuHandler>,
}

impl std::fmt::Debug for ResolvedCpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCpu")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// One family with its CPUs, in registration order.
#[derive(Debug, Clone)]
pub struct FamilyListing {
    pub family: CpuFamily,
    pub description: &'static str,
    pub cpus: Vec<CpuDescriptor>,
}

pub struct ModuleRegistry {
    families: HashMap<CpuFamily, Box<dyn FamilyModule>>,
    family_order: Vec<CpuFamily>,
    cpus: HashMap<CpuType, Box<dyn CpuModule>>,
    cpu_order: Vec<CpuType>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            families: HashMap::new(),
            family_order: Vec::new(),
            cpus: HashMap::new(),
            cpu_order: Vec::new(),
        }
    }

    /// Registry with every built-in architecture.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let families: [Box<dyn FamilyModule>; 5] = [
            Box::new(crate::families::mos6502::module::MOS6502FamilyModule),
            Box::new(crate::families::m6809::module::M6809FamilyModule),
            Box::new(crate::families::m68k::module::M68kFamilyModule),
            Box::new(crate::families::z80::module::Z80FamilyModule),
            Box::new(crate::families::arm::module::ArmFamilyModule),
        ];
        for family in families {
            // Built-in CPU names are distinct.
            if let Err(err) = registry.register_family(family) {
                debug!(%err, "skipping built-in CPU");
            }
        }
        registry
    }

    /// Register a family and all of its CPUs.
    pub fn register_family(&mut self, module: Box<dyn FamilyModule>) -> Result<(), RegistryError> {
        let family_id = module.family_id();
        let cpus = module.cpus();
        if !self.families.contains_key(&family_id) {
            self.family_order.push(family_id);
        }
        self.families.insert(family_id, module);
        debug!(family = family_id.as_str(), cpus = cpus.len(), "registered family");
        for cpu in cpus {
            self.register_cpu(cpu)?;
        }
        Ok(())
    }

    /// Register a single CPU. Its family must already be registered.
    pub fn register_cpu(&mut self, module: Box<dyn CpuModule>) -> Result<(), RegistryError> {
        let desc = module.descriptor();
        if !self.families.contains_key(&desc.family) {
            return Err(RegistryError::MissingFamily {
                cpu: desc.name.to_string(),
                family: desc.family.as_str(),
            });
        }
        let names = std::iter::once(desc.name).chain(desc.aliases.iter().copied());
        for name in names {
            if self.find_module(name).is_some() {
                return Err(RegistryError::DuplicateCpu(name.to_string()));
            }
        }
        debug!(cpu = desc.name, family = desc.family.as_str(), "registered cpu");
        self.cpu_order.push(desc.id);
        self.cpus.insert(desc.id, module);
        Ok(())
    }

    fn find_module(&self, name: &str) -> Option<&dyn CpuModule> {
        self.cpu_order
            .iter()
            .filter_map(|id| self.cpus.get(id))
            .find(|module| module.descriptor().matches(name))
            .map(|module| module.as_ref())
    }

    /// Look a CPU up by name or alias (case-insensitive).
    pub fn find(&self, name: &str) -> Result<ResolvedCpu, RegistryError> {
        let module = self
            .find_module(name)
            .ok_or_else(|| RegistryError::UnknownCpu(name.to_string()))?;
        Ok(ResolvedCpu {
            descriptor: module.descriptor(),
            handler: module.handler(),
        })
    }

    /// Families and their CPUs in registration order.
    pub fn cpus_by_family(&self) -> Vec<FamilyListing> {
        self.family_order
            .iter()
            .filter_map(|family| self.families.get(family))
            .map(|module| FamilyListing {
                family: module.family_id(),
                description: module.description(),
                cpus: self
                    .cpu_order
                    .iter()
                    .filter_map(|id| self.cpus.get(id))
                    .map(|cpu| cpu.descriptor())
                    .filter(|desc| desc.family == module.family_id())
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves_names_and_aliases() {
        let registry = ModuleRegistry::with_defaults();
        for name in ["6502", "65c02", "W65C02", "65816", "6809", "68000", "z80", "ARM", "armbe"] {
            assert!(registry.find(name).is_ok(), "{name}");
        }
        assert_eq!(
            registry.find("8086").unwrap_err(),
            RegistryError::UnknownCpu("8086".to_string())
        );
    }

    #[test]
    fn listing_groups_cpus_by_family() {
        let registry = ModuleRegistry::with_defaults();
        let listing = registry.cpus_by_family();
        assert_eq!(listing.len(), 5);
        assert_eq!(listing[0].family.as_str(), "mos6502");
        let names: Vec<_> = listing[0].cpus.iter().map(|d| d.name).collect();
        assert_eq!(names, ["6502", "65C02", "65816"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ModuleRegistry::with_defaults();
        let err = registry
            .register_family(Box::new(crate::families::z80::module::Z80FamilyModule))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateCpu("Z80".to_string()));
    }
}
