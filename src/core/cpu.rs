// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU identifiers and variant descriptors.
//!
//! This module intentionally avoids hardcoding specific CPU families or types.
//! Family and CPU modules define their own identifiers and expose them through
//! the registry at runtime.

/// Identifier for a CPU family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuFamily(&'static str);

impl CpuFamily {
    /// Create a new CPU family identifier.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Return the identifier string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Identifier for a CPU type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuType(&'static str);

impl CpuType {
    /// Create a new CPU type identifier.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Return the identifier string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Byte order for multi-byte operands and data directives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Static description of one selectable CPU variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuDescriptor {
    pub id: CpuType,
    pub family: CpuFamily,
    /// Name used by `-c` and the `CPU` directive.
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub endianness: Endianness,
    /// Width of the program address space in bits.
    pub address_bits: u8,
}

impl CpuDescriptor {
    /// True when `name` selects this CPU (case-insensitive, aliases included).
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    }

    /// Highest valid address for this CPU.
    pub fn address_mask(&self) -> u32 {
        if self.address_bits >= 32 {
            u32::MAX
        } else {
            (1u32 << self.address_bits) - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC: CpuDescriptor = CpuDescriptor {
        id: CpuType::new("m65c02"),
        family: CpuFamily::new("mos6502"),
        name: "65C02",
        aliases: &["W65C02"],
        endianness: Endianness::Little,
        address_bits: 16,
    };

    #[test]
    fn matches_name_and_alias() {
        assert!(DESC.matches("65c02"));
        assert!(DESC.matches("w65c02"));
        assert!(!DESC.matches("6502"));
    }

    #[test]
    fn address_mask_by_width() {
        assert_eq!(DESC.address_mask(), 0xffff);
        let wide = CpuDescriptor {
            address_bits: 32,
            ..DESC
        };
        assert_eq!(wide.address_mask(), u32::MAX);
    }
}
