// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-pass CPU mode state.
//!
//! Backends keep assembly-time modes here (65816 register widths, 6809 direct
//! page, ...). The driver clears the state and calls the handler's
//! `pass_init` at the start of every pass and on every CPU switch, so pass 2
//! sees the same mode sequence pass 1 did.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuState {
    values: HashMap<&'static str, i64>,
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    pub fn get_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).unwrap_or(default)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get_or(key, 0) != 0
    }

    pub fn set(&mut self, key: &'static str, value: i64) {
        self.values.insert(key, value);
    }

    pub fn set_flag(&mut self, key: &'static str, on: bool) {
        self.set(key, i64::from(on));
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let mut state = CpuState::new();
        assert_eq!(state.get("dp"), None);
        state.set("dp", 0x12);
        state.set_flag("longa", true);
        assert_eq!(state.get_or("dp", 0), 0x12);
        assert!(state.flag("longa"));
        state.clear();
        assert!(!state.flag("longa"));
    }
}
