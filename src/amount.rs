//! Conversion between human decimal amount strings and integer base units.
//!
//! Each asset has a fixed scale (see [`Asset::scale`]); amounts are held as
//! `u128` base units everywhere inside the engine and only rendered back to
//! decimal strings at the API boundary.

use bigdecimal::BigDecimal;

use crate::db::models::Asset;
use crate::error::LedgerError;

/// Parses a decimal amount string into base units for `asset`.
///
/// Accepts `digits` or `digits.digits` only: no sign, no exponent, no
/// grouping. Fractional digits beyond the asset scale are truncated, never
/// rounded. Zero and malformed input are rejected.
pub fn parse_units(asset: Asset, input: &str) -> Result<u128, LedgerError> {
    let input = input.trim();
    let (whole, fraction) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::Validation(format!(
            "invalid amount: {:?}",
            input
        )));
    }
    if input.contains('.') && (fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(LedgerError::Validation(format!(
            "invalid amount: {:?}",
            input
        )));
    }

    let scale = asset.scale() as usize;
    let truncated = &fraction[..fraction.len().min(scale)];
    let mut frac_digits = String::with_capacity(scale);
    frac_digits.push_str(truncated);
    while frac_digits.len() < scale {
        frac_digits.push('0');
    }

    let out_of_range = || LedgerError::Validation("amount out of range".to_string());

    let whole_units = whole
        .parse::<u128>()
        .map_err(|_| out_of_range())?
        .checked_mul(10u128.checked_pow(asset.scale()).ok_or_else(out_of_range)?)
        .ok_or_else(out_of_range)?;
    let frac_units = if frac_digits.is_empty() {
        0
    } else {
        frac_digits.parse::<u128>().map_err(|_| out_of_range())?
    };
    let units = whole_units.checked_add(frac_units).ok_or_else(out_of_range)?;

    if units == 0 {
        return Err(LedgerError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    Ok(units)
}

/// Renders base units as a decimal string, trimming trailing fractional
/// zeros. Inverse of [`parse_units`] for inputs normalized to the asset
/// scale.
pub fn format_units(asset: Asset, units: u128) -> String {
    let scale = asset.scale() as usize;
    let digits = format!("{:0>width$}", units, width = scale + 1);
    let split = digits.len() - scale;
    let whole = &digits[..split];
    let fraction = digits[split..].trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Decodes a NUMERIC(39,0) column value back into base units.
pub fn numeric_to_units(value: &BigDecimal) -> Result<u128, LedgerError> {
    value
        .with_scale(0)
        .to_string()
        .parse::<u128>()
        .map_err(|_| LedgerError::Validation(format!("stored amount out of range: {}", value)))
}

/// Formats a NUMERIC(39,0) column value as a decimal amount string.
pub fn numeric_to_decimal(asset: Asset, value: &BigDecimal) -> Result<String, LedgerError> {
    Ok(format_units(asset, numeric_to_units(value)?))
}
