use anchor_lang::prelude::*;

use crate::error::TokenError;

/// `a * b / c` with a u128 intermediate, floored.
pub fn mul_div(a: u64, b: u64, c: u64) -> Result<u64> {
    require!(c > 0, TokenError::DivisionByZero);

    let result = (a as u128)
        .checked_mul(b as u128)
        .ok_or(TokenError::MathOverflow)?
        .checked_div(c as u128)
        .ok_or(TokenError::DivisionByZero)?;

    u64::try_from(result).map_err(|_| error!(TokenError::MathOverflow))
}

/// `a * b * c / (d * e)` with u128 intermediates, floored. Used for linear
/// accrual where both the rate and the elapsed time scale the principal.
pub fn mul_mul_div(a: u64, b: u64, c: u64, d: u64, e: u64) -> Result<u64> {
    let denominator = (d as u128)
        .checked_mul(e as u128)
        .ok_or(TokenError::MathOverflow)?;
    require!(denominator > 0, TokenError::DivisionByZero);

    let result = (a as u128)
        .checked_mul(b as u128)
        .ok_or(TokenError::MathOverflow)?
        .checked_mul(c as u128)
        .ok_or(TokenError::MathOverflow)?
        .checked_div(denominator)
        .ok_or(TokenError::DivisionByZero)?;

    u64::try_from(result).map_err(|_| error!(TokenError::MathOverflow))
}

pub fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or_else(|| error!(TokenError::MathOverflow))
}

pub fn sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or_else(|| error!(TokenError::MathUnderflow))
}
