// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 65816 register-width hints.
//!
//! `LONGA ON` makes accumulator immediates 16-bit and `LONGI ON` does the
//! same for index immediates. Both start off at every pass.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::state::CpuState;

pub const LONGA_KEY: &str = "m65816.longa";
pub const LONGI_KEY: &str = "m65816.longi";

pub fn reset(state: &mut CpuState) {
    state.set_flag(LONGA_KEY, false);
    state.set_flag(LONGI_KEY, false);
}

pub fn accumulator_is_16bit(state: &CpuState) -> bool {
    state.flag(LONGA_KEY)
}

pub fn index_is_16bit(state: &CpuState) -> bool {
    state.flag(LONGI_KEY)
}

/// Key for a width pseudo-op, accepting a leading `.`.
pub fn hint_key(name: &str) -> Option<&'static str> {
    let name = name.strip_prefix('.').unwrap_or(name);
    if name.eq_ignore_ascii_case("LONGA") {
        Some(LONGA_KEY)
    } else if name.eq_ignore_ascii_case("LONGI") {
        Some(LONGI_KEY)
    } else {
        None
    }
}

/// Parse the `ON`/`OFF` operand of a width pseudo-op.
pub fn parse_switch(cursor: &mut TokenCursor) -> Result<bool, AsmError> {
    let on = if cursor.eat_word("ON") {
        true
    } else if cursor.eat_word("OFF") {
        false
    } else {
        return Err(cursor.unexpected("ON or OFF"));
    };
    cursor.expect_end()?;
    Ok(on)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_default_to_eight_bit() {
        let mut state = CpuState::new();
        assert!(!accumulator_is_16bit(&state));
        state.set_flag(LONGA_KEY, true);
        state.set_flag(LONGI_KEY, true);
        assert!(accumulator_is_16bit(&state) && index_is_16bit(&state));
        reset(&mut state);
        assert!(!accumulator_is_16bit(&state) && !index_is_16bit(&state));
    }

    #[test]
    fn switch_operand() {
        let mut cursor = TokenCursor::from_line("on", 1).unwrap();
        assert!(parse_switch(&mut cursor).unwrap());
        let mut cursor = TokenCursor::from_line("maybe", 1).unwrap();
        assert!(parse_switch(&mut cursor).is_err());
        assert_eq!(hint_key(".longi"), Some(LONGI_KEY));
        assert_eq!(hint_key("LONG"), None);
    }
}
