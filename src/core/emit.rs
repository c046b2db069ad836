// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-line instruction buffer.

use crate::core::assembler::error::AsmError;
use crate::core::cpu::Endianness;

/// Bytes of the instruction being encoded plus the recoverable diagnostics
/// raised while encoding it.
///
/// Range violations are reported here rather than returned so the handler
/// can keep emitting and the line keeps its predicted length.
#[derive(Debug, Clone)]
pub struct InstructionBuffer {
    endian: Endianness,
    bytes: Vec<u8>,
    errors: Vec<AsmError>,
    warnings: Vec<AsmError>,
}

impl InstructionBuffer {
    pub fn new(endian: Endianness) -> Self {
        Self {
            endian,
            bytes: Vec::with_capacity(8),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endian
    }

    pub fn byte(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// 16-bit value in the CPU's byte order.
    pub fn word(&mut self, value: u16) {
        match self.endian {
            Endianness::Little => self.bytes.extend_from_slice(&value.to_le_bytes()),
            Endianness::Big => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// 24-bit value in the CPU's byte order.
    pub fn triple(&mut self, value: u32) {
        let [b0, b1, b2, _] = value.to_le_bytes();
        match self.endian {
            Endianness::Little => self.bytes.extend_from_slice(&[b0, b1, b2]),
            Endianness::Big => self.bytes.extend_from_slice(&[b2, b1, b0]),
        }
    }

    /// 32-bit value in the CPU's byte order.
    pub fn long(&mut self, value: u32) {
        match self.endian {
            Endianness::Little => self.bytes.extend_from_slice(&value.to_le_bytes()),
            Endianness::Big => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Append pre-built 16-bit extension words.
    pub fn words(&mut self, words: &[u16]) {
        for &w in words {
            self.word(w);
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Drop the pending instruction bytes (diagnostics are kept).
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Record a recoverable error against the current line.
    pub fn report(&mut self, error: AsmError) {
        self.errors.push(error);
    }

    pub fn warn(&mut self, warning: AsmError) {
        self.warnings.push(warning);
    }

    pub fn errors(&self) -> &[AsmError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[AsmError] {
        &self.warnings
    }

    /// Split into bytes, errors and warnings.
    pub fn into_parts(self) -> (Vec<u8>, Vec<AsmError>, Vec<AsmError>) {
        (self.bytes, self.errors, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_order_follows_endianness() {
        let mut le = InstructionBuffer::new(Endianness::Little);
        le.word(0x1234);
        le.triple(0x563412);
        assert_eq!(le.bytes(), &[0x34, 0x12, 0x12, 0x34, 0x56]);

        let mut be = InstructionBuffer::new(Endianness::Big);
        be.word(0x203c);
        be.long(0x1234_5678);
        assert_eq!(be.bytes(), &[0x20, 0x3c, 0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn clear_keeps_diagnostics() {
        let mut buf = InstructionBuffer::new(Endianness::Little);
        buf.byte(1);
        buf.report(AsmError::out_of_range("too big"));
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.errors().len(), 1);
    }
}
