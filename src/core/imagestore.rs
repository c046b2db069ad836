// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Sparse memory image with binary output.

use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Debug, Default, Clone)]
pub struct ImageStore {
    bytes: BTreeMap<u32, u8>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_entries(&self) -> usize {
        self.bytes.len()
    }

    pub fn store(&mut self, addr: u32, val: u8) {
        self.bytes.insert(addr, val);
    }

    pub fn store_slice(&mut self, addr: u32, values: &[u8]) {
        for (ix, val) in values.iter().enumerate() {
            self.store(addr.wrapping_add(ix as u32), *val);
        }
    }

    pub fn get(&self, addr: u32) -> Option<u8> {
        self.bytes.get(&addr).copied()
    }

    /// Lowest and highest written address.
    pub fn output_range(&self) -> Option<(u32, u32)> {
        let first = self.bytes.keys().next()?;
        let last = self.bytes.keys().next_back()?;
        Some((*first, *last))
    }

    /// Contiguous image from the lowest to the highest written address,
    /// gaps filled with `fill`.
    pub fn to_vec(&self, fill: u8) -> Vec<u8> {
        let Some((start, end)) = self.output_range() else {
            return Vec::new();
        };
        let mut mem = vec![fill; (end - start) as usize + 1];
        for (addr, value) in &self.bytes {
            mem[(addr - start) as usize] = *value;
        }
        mem
    }

    pub fn write_bin_file<W: Write>(&self, mut out: W, fill: u8) -> io::Result<()> {
        out.write_all(&self.to_vec(fill))
    }
}
