use anchor_lang::prelude::*;

use crate::constants::{PROTOCOL_FEE_DENOMINATOR, PROTOCOL_FEE_PERCENT};
use crate::error::EscrowError;

/// Fee charged on a gross amount at a fixed-point percent.
///
/// Formula: fee = amount × fee_percent / precision
pub fn fee_from_gross(amount: u64, fee_percent: u32, precision: u64) -> Result<u64> {
    mul_div(amount, fee_percent as u64, precision)
}

/// Flat 2% protocol fee taken from a gross amount.
pub fn protocol_fee_from_gross(amount: u64) -> Result<u64> {
    mul_div(amount, PROTOCOL_FEE_PERCENT, PROTOCOL_FEE_DENOMINATOR)
}

/// Protocol fee contained in a total that already includes it.
///
/// Formula: fee = (total × 100 × 2) / 102 / 100
///
/// Scaling by 100 before the divisions keeps the intermediate precision, so
/// `total - fee` is the net that a 2% charge would have been taken from.
pub fn protocol_fee_embedded_in(total: u64) -> Result<u64> {
    let scaled = (total as u128)
        .checked_mul(PROTOCOL_FEE_DENOMINATOR as u128)
        .ok_or(EscrowError::MathOverflow)?
        .checked_mul(PROTOCOL_FEE_PERCENT as u128)
        .ok_or(EscrowError::MathOverflow)?;

    let fee = scaled
        / (PROTOCOL_FEE_DENOMINATOR + PROTOCOL_FEE_PERCENT) as u128
        / PROTOCOL_FEE_DENOMINATOR as u128;

    require!(fee <= u64::MAX as u128, EscrowError::MathOverflow);
    Ok(fee as u64)
}

/// Safe multiplication then floor division.
///
/// Computes: (value × numerator) / denominator
/// Uses u128 intermediate to prevent overflow.
pub fn mul_div(value: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, EscrowError::DivisionByZero);

    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(EscrowError::MathOverflow)?;

    let result = product / (denominator as u128);

    require!(result <= u64::MAX as u128, EscrowError::MathOverflow);
    Ok(result as u64)
}
