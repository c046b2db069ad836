// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Retargetable two-pass assembler.
//!
//! [`core`] holds the CPU-agnostic framework, [`families`] one backend per
//! architecture, [`m65816`] the 65816 extension of the 6502 family and
//! [`assembler`] the driver and command line.

pub mod assembler;
pub mod core;
pub mod families;
pub mod m65816;
