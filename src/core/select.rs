// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Encoding-width selection.
//!
//! Every backend picks operand widths here so the two-pass rules hold in
//! one place:
//!
//! - an explicit size-force prefix wins;
//! - an unknown value (forward reference) takes the widest legal form, so
//!   pass 1 sizes are an upper bound;
//! - a known value takes the narrowest form whose range accepts it.
//!
//! Forward references evaluate as unknown in *both* passes, so a line that
//! went wide in pass 1 stays wide in pass 2. Any remaining length change is
//! caught by the driver as a phase error.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::expr::Value;
use crate::core::range::Domain;
use crate::core::tokenizer::OperatorKind;

/// Explicit width override written before an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeForce {
    #[default]
    Auto,
    /// `<`: short / direct page / zero page.
    Short,
    /// `>`: absolute / long.
    Long,
    /// `>>`: extra long (65816 24-bit).
    ExtraLong,
}

impl SizeForce {
    /// Consume a leading `<`, `>` or `>>`.
    pub fn parse(cursor: &mut TokenCursor) -> SizeForce {
        if cursor.eat_operator(OperatorKind::Lt) {
            SizeForce::Short
        } else if cursor.eat_operator(OperatorKind::Shr) {
            SizeForce::ExtraLong
        } else if cursor.eat_operator(OperatorKind::Gt) {
            SizeForce::Long
        } else {
            SizeForce::Auto
        }
    }

    /// Width rank requested by the force, `None` for automatic.
    pub fn rank(self) -> Option<u8> {
        match self {
            SizeForce::Auto => None,
            SizeForce::Short => Some(0),
            SizeForce::Long => Some(1),
            SizeForce::ExtraLong => Some(2),
        }
    }
}

/// One legal width for an operand, ordered narrow to wide by `rank`.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<W> {
    pub width: W,
    /// 0 = short, 1 = long, 2 = extra long; matched against [`SizeForce`].
    pub rank: u8,
    pub domain: Domain,
}

impl<W> Candidate<W> {
    pub const fn new(width: W, rank: u8, domain: Domain) -> Self {
        Self {
            width,
            rank,
            domain,
        }
    }
}

/// The chosen width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<W> {
    pub width: W,
    pub domain: Domain,
    /// Whether the value fits the chosen width.
    pub fits: bool,
}

/// Pick the width for `value` among `candidates` (narrow to wide).
pub fn select_width<W: Copy>(
    value: Value,
    force: SizeForce,
    candidates: &[Candidate<W>],
) -> Result<Selection<W>, AsmError> {
    let Some(widest) = candidates.last() else {
        return Err(AsmError::bad_mode("Addressing mode not available"));
    };
    let pick = |c: &Candidate<W>| Selection {
        width: c.width,
        domain: c.domain,
        fits: c.domain.contains(value.value),
    };

    if let Some(rank) = force.rank() {
        return candidates
            .iter()
            .find(|c| c.rank == rank)
            .map(pick)
            .ok_or_else(|| AsmError::bad_mode("Forced operand size not available here"));
    }
    if !value.known {
        return Ok(pick(widest));
    }
    Ok(candidates
        .iter()
        .find(|c| c.domain.contains(value.value))
        .map(pick)
        .unwrap_or_else(|| pick(widest)))
}

/// One legal branch form.
#[derive(Debug, Clone, Copy)]
pub struct BranchCandidate<W> {
    pub width: W,
    pub rank: u8,
    /// Offset from the instruction start to the address displacements are
    /// measured from (usually the instruction length).
    pub base: i64,
    pub domain: Domain,
    /// Displacement value the short form cannot encode (68000 `Bcc.S` 0).
    pub reserved: Option<i64>,
}

/// The chosen branch form and its displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchSelection<W> {
    pub width: W,
    pub displacement: i64,
    pub domain: Domain,
}

/// Displacement from the end of an instruction of `length` bytes at `origin`.
/// Saturates, so an extreme target still fails the range check.
pub fn branch_displacement(target: i64, origin: i64, length: i64) -> i64 {
    target.saturating_sub(origin.saturating_add(length))
}

/// Choose a branch form for `target`, then compute the displacement against
/// the chosen form's base.
pub fn select_branch<W: Copy>(
    target: Value,
    origin: i64,
    force: SizeForce,
    candidates: &[BranchCandidate<W>],
) -> Result<BranchSelection<W>, AsmError> {
    let Some(widest) = candidates.last() else {
        return Err(AsmError::bad_mode("Branch form not available"));
    };
    let pick = |c: &BranchCandidate<W>| BranchSelection {
        width: c.width,
        displacement: branch_displacement(target.value, origin, c.base),
        domain: c.domain,
    };
    let fits = |c: &&BranchCandidate<W>| {
        let disp = branch_displacement(target.value, origin, c.base);
        c.domain.contains(disp) && c.reserved != Some(disp)
    };

    if let Some(rank) = force.rank() {
        return candidates
            .iter()
            .find(|c| c.rank == rank)
            .map(pick)
            .ok_or_else(|| AsmError::bad_mode("Forced branch size not available here"));
    }
    if !target.known {
        return Ok(pick(widest));
    }
    Ok(candidates
        .iter()
        .find(fits)
        .map(pick)
        .unwrap_or_else(|| pick(widest)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum W {
        Zp,
        Abs,
        Long,
    }

    const DIRECT: [Candidate<W>; 3] = [
        Candidate::new(W::Zp, 0, Domain::Unsigned(8)),
        Candidate::new(W::Abs, 1, Domain::Unsigned(16)),
        Candidate::new(W::Long, 2, Domain::Unsigned(24)),
    ];

    #[test]
    fn known_value_takes_narrowest() {
        let sel = select_width(Value::known(0x10), SizeForce::Auto, &DIRECT).unwrap();
        assert_eq!(sel.width, W::Zp);
        let sel = select_width(Value::known(0x1234), SizeForce::Auto, &DIRECT).unwrap();
        assert_eq!(sel.width, W::Abs);
    }

    #[test]
    fn unknown_value_takes_widest() {
        let sel = select_width(Value::unknown(0x10), SizeForce::Auto, &DIRECT).unwrap();
        assert_eq!(sel.width, W::Long);
        let sel = select_width(Value::unknown(0), SizeForce::Auto, &DIRECT[..2]).unwrap();
        assert_eq!(sel.width, W::Abs);
    }

    #[test]
    fn force_overrides_and_flags_misfit() {
        let sel = select_width(Value::known(0x10), SizeForce::Long, &DIRECT).unwrap();
        assert_eq!(sel.width, W::Abs);
        let sel = select_width(Value::known(0x1234), SizeForce::Short, &DIRECT).unwrap();
        assert_eq!(sel.width, W::Zp);
        assert!(!sel.fits);
        assert!(select_width(Value::known(1), SizeForce::ExtraLong, &DIRECT[..2]).is_err());
    }

    #[test]
    fn oversize_known_value_goes_widest_and_does_not_fit() {
        let sel = select_width(Value::known(0x1_0000), SizeForce::Auto, &DIRECT[..2]).unwrap();
        assert_eq!(sel.width, W::Abs);
        assert!(!sel.fits);
    }

    #[test]
    fn parses_force_prefixes() {
        for (text, force) in [
            ("<1", SizeForce::Short),
            (">1", SizeForce::Long),
            (">>1", SizeForce::ExtraLong),
            ("1", SizeForce::Auto),
        ] {
            let mut cursor = TokenCursor::from_line(text, 1).unwrap();
            assert_eq!(SizeForce::parse(&mut cursor), force, "{text}");
        }
    }

    const BCC: [BranchCandidate<W>; 2] = [
        BranchCandidate {
            width: W::Zp,
            rank: 0,
            base: 2,
            domain: Domain::Signed(8),
            reserved: Some(0),
        },
        BranchCandidate {
            width: W::Abs,
            rank: 1,
            base: 2,
            domain: Domain::Signed(16),
            reserved: None,
        },
    ];

    #[test]
    fn backward_known_branch_is_short() {
        let sel = select_branch(Value::known(0x100), 0x110, SizeForce::Auto, &BCC).unwrap();
        assert_eq!(sel.width, W::Zp);
        assert_eq!(sel.displacement, -0x12);
    }

    #[test]
    fn forward_unknown_branch_is_long() {
        let sel = select_branch(Value::unknown(0x104), 0x100, SizeForce::Auto, &BCC).unwrap();
        assert_eq!(sel.width, W::Abs);
        assert_eq!(sel.displacement, 2);
    }

    #[test]
    fn extreme_targets_saturate() {
        assert_eq!(branch_displacement(i64::MIN, 0x100, 2), i64::MIN);
        assert_eq!(branch_displacement(i64::MAX, -4, 2), i64::MAX);
        let sel = select_branch(Value::known(i64::MIN), 0x100, SizeForce::Auto, &BCC).unwrap();
        assert_eq!(sel.width, W::Abs);
        assert!(!sel.domain.contains(sel.displacement));
    }

    #[test]
    fn reserved_short_displacement_promotes() {
        let sel = select_branch(Value::known(0x102), 0x100, SizeForce::Auto, &BCC).unwrap();
        assert_eq!(sel.width, W::Abs);
    }
}
