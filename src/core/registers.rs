// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Ordered register-name sets shared by every operand resolver.

/// An ordered list of register names; a name's position is its encoding
/// index unless the backend maps it further.
#[derive(Debug, Clone, Copy)]
pub struct RegisterSet {
    names: &'static [&'static str],
}

/// Outcome of looking up the next token in a [`RegisterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterMatch {
    Found(usize),
    NotFound,
    EndOfLine,
}

impl RegisterSet {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// Position of `name` in the set, ignoring ASCII case.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }
}
