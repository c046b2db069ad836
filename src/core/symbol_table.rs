// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Symbol table for labels and constants.
//
// Entries survive from pass 1 into pass 2 and remember the pass that last
// defined them. A lookup of a symbol defined earlier in the current pass is
// known; one only defined by the previous pass is a forward reference.

use std::io::{self, Write};

use crate::core::expr::SymbolValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Address label.
    Label,
    /// `EQU` / `=` constant.
    Equ,
    /// `SET` variable, may be redefined.
    Set,
    /// Defined on the command line.
    Predefined,
}

#[derive(Debug, Clone)]
pub struct SymbolTableEntry {
    pub name: String,
    pub value: i64,
    pub kind: SymbolKind,
    /// Pass that last defined the symbol; 0 for predefined symbols.
    pub defined_pass: u8,
    pub line: u32,
    /// The defining expression depended on an unknown value.
    pub unresolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SymbolTableResult {
    Ok,
    /// Defined twice in the same pass.
    Duplicate,
    /// A label or constant got a different value than in the previous pass.
    Changed { previous: i64 },
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolTableEntry>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Define a symbol always visible as known.
    pub fn predefine(&mut self, name: &str, value: i64) -> SymbolTableResult {
        if self.entry(name).is_some() {
            return SymbolTableResult::Duplicate;
        }
        self.entries.push(SymbolTableEntry {
            name: name.to_string(),
            value,
            kind: SymbolKind::Predefined,
            defined_pass: 0,
            line: 0,
            unresolved: false,
        });
        SymbolTableResult::Ok
    }

    pub fn define(
        &mut self,
        name: &str,
        value: i64,
        kind: SymbolKind,
        pass: u8,
        line: u32,
    ) -> SymbolTableResult {
        let Some(entry) = self.entry_mut(name) else {
            self.entries.push(SymbolTableEntry {
                name: name.to_string(),
                value,
                kind,
                defined_pass: pass,
                line,
                unresolved: false,
            });
            return SymbolTableResult::Ok;
        };

        let redefinable = kind == SymbolKind::Set && entry.kind == SymbolKind::Set;
        if entry.kind == SymbolKind::Predefined
            || (entry.defined_pass == pass && !redefinable)
        {
            return SymbolTableResult::Duplicate;
        }
        let previous = entry.value;
        let carried_over = entry.defined_pass < pass;
        entry.value = value;
        entry.kind = kind;
        entry.defined_pass = pass;
        entry.line = line;
        let was_unresolved = std::mem::replace(&mut entry.unresolved, false);
        if carried_over && !was_unresolved && kind != SymbolKind::Set && previous != value {
            return SymbolTableResult::Changed { previous };
        }
        SymbolTableResult::Ok
    }

    /// Look up a symbol by name (case-insensitive) as seen from `pass`.
    #[must_use]
    pub fn lookup(&self, name: &str, pass: u8) -> SymbolValue {
        match self.entry(name) {
            None => SymbolValue::Undefined,
            Some(entry) if entry.unresolved => SymbolValue::Forward(entry.value),
            Some(entry) if entry.defined_pass == 0 || entry.defined_pass == pass => {
                SymbolValue::Known(entry.value)
            }
            Some(entry) if entry.defined_pass < pass => SymbolValue::Forward(entry.value),
            Some(_) => SymbolValue::Undefined,
        }
    }

    /// Mark `name` as holding a placeholder; lookups see it as unknown
    /// until it is defined again.
    pub fn mark_unresolved(&mut self, name: &str) {
        if let Some(entry) = self.entry_mut(name) {
            entry.unresolved = true;
        }
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<i64> {
        self.entry(name).map(|e| e.value)
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&SymbolTableEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut SymbolTableEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by name, for the listing.
    #[must_use]
    pub fn sorted(&self) -> Vec<&SymbolTableEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.name.to_ascii_uppercase());
        sorted
    }

    pub fn dump<W: Write>(&self, mut out: W) -> io::Result<()> {
        for entry in self.sorted() {
            writeln!(
                out,
                "{:<16}: {:08x} ({})",
                entry.name, entry.value as u32, entry.value
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SymbolKind, SymbolTable, SymbolTableResult};
    use crate::core::expr::SymbolValue;

    #[test]
    fn define_and_lookup_are_case_insensitive() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.define("Foo", 0x10, SymbolKind::Label, 1, 1),
            SymbolTableResult::Ok
        );
        assert_eq!(table.lookup("foo", 1), SymbolValue::Known(0x10));
        assert_eq!(table.value("FOO"), Some(0x10));
    }

    #[test]
    fn earlier_pass_definitions_are_forward() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.define("later", 0x200, SymbolKind::Label, 1, 9),
            SymbolTableResult::Ok
        );
        assert_eq!(table.lookup("later", 2), SymbolValue::Forward(0x200));
        assert_eq!(
            table.define("later", 0x200, SymbolKind::Label, 2, 9),
            SymbolTableResult::Ok
        );
        assert_eq!(table.lookup("later", 2), SymbolValue::Known(0x200));
        assert_eq!(table.lookup("missing", 2), SymbolValue::Undefined);
    }

    #[test]
    fn duplicate_and_set_behavior() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.define("Val", 1, SymbolKind::Equ, 1, 1),
            SymbolTableResult::Ok
        );
        assert_eq!(
            table.define("val", 2, SymbolKind::Equ, 1, 2),
            SymbolTableResult::Duplicate
        );
        assert_eq!(
            table.define("Count", 3, SymbolKind::Set, 1, 3),
            SymbolTableResult::Ok
        );
        assert_eq!(
            table.define("count", 4, SymbolKind::Set, 1, 4),
            SymbolTableResult::Ok
        );
        assert_eq!(table.value("COUNT"), Some(4));
    }

    #[test]
    fn changed_value_between_passes_is_flagged() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.define("loop", 0x1003, SymbolKind::Label, 1, 5),
            SymbolTableResult::Ok
        );
        assert_eq!(
            table.define("loop", 0x1002, SymbolKind::Label, 2, 5),
            SymbolTableResult::Changed { previous: 0x1003 }
        );
    }

    #[test]
    fn unresolved_constants_stay_unknown() {
        let mut table = SymbolTable::new();
        let _ = table.define("size", 0, SymbolKind::Equ, 1, 1);
        table.mark_unresolved("size");
        assert_eq!(table.lookup("size", 1), SymbolValue::Forward(0));
        assert_eq!(
            table.define("size", 12, SymbolKind::Equ, 2, 1),
            SymbolTableResult::Ok
        );
        assert_eq!(table.lookup("size", 2), SymbolValue::Known(12));
    }

    #[test]
    fn predefined_symbols_are_always_known() {
        let mut table = SymbolTable::new();
        assert_eq!(table.predefine("DEBUG", 1), SymbolTableResult::Ok);
        assert_eq!(table.lookup("debug", 1), SymbolValue::Known(1));
        assert_eq!(
            table.define("DEBUG", 0, SymbolKind::Equ, 1, 1),
            SymbolTableResult::Duplicate
        );
    }

    #[test]
    fn dump_is_sorted() {
        let mut table = SymbolTable::new();
        let _ = table.define("zeta", 2, SymbolKind::Label, 1, 1);
        let _ = table.define("Alpha", 1, SymbolKind::Label, 1, 2);
        let mut out = Vec::new();
        table.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Alpha"));
        assert!(text.contains("zeta            : 00000002 (2)"));
    }
}
