// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand range checks.
//!
//! A violation is reported into the [`InstructionBuffer`] and the value is
//! masked to the field width, so the instruction still has its predicted
//! length and the pass carries on.

use crate::core::assembler::error::AsmError;
use crate::core::emit::InstructionBuffer;
use crate::core::tokenizer::Span;

/// Numeric domain of an encoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// `0 ..= 2^n - 1`
    Unsigned(u8),
    /// `-2^(n-1) ..= 2^(n-1) - 1`
    Signed(u8),
    /// Signed or unsigned view of an n-bit field: `-2^(n-1) ..= 2^n - 1`.
    Either(u8),
    /// Explicit inclusive bounds, e.g. a bit index `0..=7`.
    Range(i64, i64),
}

impl Domain {
    pub const BYTE: Domain = Domain::Either(8);
    pub const WORD: Domain = Domain::Either(16);
    pub const BIT_INDEX: Domain = Domain::Range(0, 7);

    pub fn bounds(self) -> (i64, i64) {
        match self {
            Domain::Unsigned(bits) => (0, (1i64 << bits) - 1),
            Domain::Signed(bits) => (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1),
            Domain::Either(bits) => (-(1i64 << (bits - 1)), (1i64 << bits) - 1),
            Domain::Range(lo, hi) => (lo, hi),
        }
    }

    pub fn contains(self, value: i64) -> bool {
        let (lo, hi) = self.bounds();
        (lo..=hi).contains(&value)
    }

    /// Mask that truncates a value to the field width.
    pub fn mask(self) -> i64 {
        match self {
            Domain::Unsigned(bits) | Domain::Signed(bits) | Domain::Either(bits) => {
                (1i64 << bits) - 1
            }
            Domain::Range(_, hi) => {
                let width = (hi.max(1) as u64 + 1).next_power_of_two();
                width as i64 - 1
            }
        }
    }
}

/// Check `value` against `domain`; report `OperandOutOfRange` on violation.
/// Returns the value masked to the field width either way.
pub fn check(
    buf: &mut InstructionBuffer,
    value: i64,
    domain: Domain,
    what: &str,
    span: Span,
) -> i64 {
    if !domain.contains(value) {
        let (lo, hi) = domain.bounds();
        buf.report(
            AsmError::out_of_range(&format!(
                "{what} out of range: {value} (allowed {lo}..{hi})"
            ))
            .with_span(span),
        );
    }
    value & domain.mask()
}

/// Check a relative displacement; additionally requires `value` to be a
/// multiple of `align`.
pub fn check_displacement(
    buf: &mut InstructionBuffer,
    value: i64,
    domain: Domain,
    align: i64,
    span: Span,
) -> i64 {
    if align > 1 && value % align != 0 {
        buf.report(
            AsmError::out_of_range(&format!(
                "Branch target misaligned: offset {value} is not a multiple of {align}"
            ))
            .with_span(span),
        );
    }
    let scaled = value.div_euclid(align.max(1));
    if !domain.contains(scaled) {
        buf.report(
            AsmError::out_of_range(&format!("Branch out of range: offset {value}"))
                .with_span(span),
        );
    }
    scaled & domain.mask()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cpu::Endianness;

    #[test]
    fn domain_bounds() {
        assert_eq!(Domain::Unsigned(8).bounds(), (0, 255));
        assert_eq!(Domain::Signed(8).bounds(), (-128, 127));
        assert_eq!(Domain::BYTE.bounds(), (-128, 255));
        assert_eq!(Domain::BIT_INDEX.bounds(), (0, 7));
    }

    #[test]
    fn violation_reports_and_masks() {
        let mut buf = InstructionBuffer::new(Endianness::Little);
        let v = check(&mut buf, 0x1ff, Domain::BYTE, "Byte", Span::default());
        assert_eq!(v, 0xff);
        assert_eq!(buf.errors().len(), 1);
        assert!(buf.errors()[0].message().starts_with("Byte out of range"));
    }

    #[test]
    fn in_range_values_pass_silently() {
        let mut buf = InstructionBuffer::new(Endianness::Little);
        assert_eq!(check(&mut buf, -1, Domain::BYTE, "Byte", Span::default()), 0xff);
        assert_eq!(check(&mut buf, 7, Domain::BIT_INDEX, "Bit", Span::default()), 7);
        assert!(buf.errors().is_empty());
    }

    #[test]
    fn range_domain_masks_to_power_of_two() {
        assert_eq!(Domain::BIT_INDEX.mask(), 7);
        assert_eq!(Domain::Range(1, 8).mask(), 15);
    }

    #[test]
    fn displacement_alignment_and_range() {
        let mut buf = InstructionBuffer::new(Endianness::Little);
        assert_eq!(
            check_displacement(&mut buf, -8, Domain::Signed(24), 4, Span::default()),
            0xff_fffe
        );
        assert!(buf.errors().is_empty());
        check_displacement(&mut buf, 6, Domain::Signed(24), 4, Span::default());
        assert_eq!(buf.errors().len(), 1);
        check_displacement(&mut buf, 0x400_0000, Domain::Signed(24), 4, Span::default());
        assert_eq!(buf.errors().len(), 2);
    }
}
