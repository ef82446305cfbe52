// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Display formatting for counts, addresses and token amounts.

use alloy::primitives::U256;

/// Abbreviate a count: `999`, `1.5K`, `2.3M`.
///
/// One decimal place, rounded half-up.
pub fn format_number(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{}M", tenths(value, 1_000_000))
    } else if value >= 1_000 {
        format!("{}K", tenths(value, 1_000))
    } else {
        value.to_string()
    }
}

fn tenths(value: u64, unit: u64) -> String {
    let scaled = (u128::from(value) * 10 + u128::from(unit) / 2) / u128::from(unit);
    format!("{}.{}", scaled / 10, scaled % 10)
}

/// Shorten an address to `start...end` characters.
///
/// Inputs no longer than `start_len + end_len` are returned unchanged.
pub fn truncate_address(address: &str, start_len: usize, end_len: usize) -> String {
    if address.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= start_len + end_len {
        return address.to_string();
    }

    let start: String = chars[..start_len].iter().collect();
    let end: String = chars[chars.len() - end_len..].iter().collect();
    format!("{start}...{end}")
}

/// Fractional digits kept by [`format_units`].
const MAX_FRACTION_DIGITS: usize = 6;

/// Render a raw token amount in whole units, e.g. `1500000` with 6 decimals
/// is `"1.5"`. The fraction is truncated to 6 digits, then trailing zeros are
/// dropped.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let (whole, fraction) = amount.div_rem(scale);

    if fraction.is_zero() {
        return whole.to_string();
    }

    let digits = format!("{fraction:0>width$}", width = usize::from(decimals));
    let kept = digits[..MAX_FRACTION_DIGITS.min(digits.len())].trim_end_matches('0');
    if kept.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{kept}")
    }
}
