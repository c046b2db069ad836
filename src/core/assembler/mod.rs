// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Assembler support shared by the driver: diagnostics and listing output.

pub mod error;
pub mod listing;
