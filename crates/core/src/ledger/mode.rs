//! Pure update arithmetic.

use starledger_shared::types::UpdateMode;

/// Why an update cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Add or subtract of a negative amount.
    NegativeAmount,
    /// Result would drop below zero.
    BelowZero,
    /// Result does not fit.
    Overflow,
    /// Amount or result is NaN or infinite.
    NotFinite,
}

/// Applies `amount` to `current` under `mode`.
pub fn apply_balance(current: i64, amount: i64, mode: UpdateMode) -> Result<i64, Rejection> {
    match mode {
        UpdateMode::Set if amount < 0 => Err(Rejection::BelowZero),
        UpdateMode::Set => Ok(amount),
        _ if amount < 0 => Err(Rejection::NegativeAmount),
        UpdateMode::Add => current.checked_add(amount).ok_or(Rejection::Overflow),
        UpdateMode::Subtract if current < amount => Err(Rejection::BelowZero),
        UpdateMode::Subtract => Ok(current - amount),
    }
}

/// Applies `amount` to `current` under `mode`.
pub fn apply_quantity(current: f64, amount: f64, mode: UpdateMode) -> Result<f64, Rejection> {
    if !amount.is_finite() {
        return Err(Rejection::NotFinite);
    }
    let next = match mode {
        UpdateMode::Set if amount < 0.0 => return Err(Rejection::BelowZero),
        UpdateMode::Set => amount,
        _ if amount < 0.0 => return Err(Rejection::NegativeAmount),
        UpdateMode::Add => current + amount,
        UpdateMode::Subtract if current < amount => return Err(Rejection::BelowZero),
        UpdateMode::Subtract => current - amount,
    };
    if next.is_finite() {
        Ok(next)
    } else {
        Err(Rejection::NotFinite)
    }
}
