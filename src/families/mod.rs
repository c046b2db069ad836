// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU family backends.

pub mod arm;
pub mod m6809;
pub mod m68k;
pub mod mos6502;
pub mod z80;
