//! Balances in major units and conversion to the ledger's integer lamports

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::WalletError;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places between SOL and lamports
pub const SOL_DECIMALS: u32 = 9;

/// Flat network fee shown to users before a send. Display only.
pub const ESTIMATED_FEE_LAMPORTS: u64 = 5_000;

/// Last fetched balance of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Balance {
    /// Never fetched, or the fetch failed
    #[default]
    Unknown,
    /// Major units (SOL)
    Known(Decimal),
}


impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Balance::Known(sol) => write!(f, "{} SOL", sol),
            Balance::Unknown => write!(f, "unknown"),
        }
    }
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(lamports as i128, SOL_DECIMALS).normalize()
}

/// Convert a user-entered amount to lamports. The amount must be positive,
/// a whole number of lamports, and fit in a `u64`.
pub fn sol_to_lamports(amount: Decimal) -> Result<u64, WalletError> {
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(format!(
            "{} SOL is not a positive amount",
            amount
        )));
    }

    let lamports = amount
        .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .ok_or_else(|| WalletError::InvalidAmount(format!("{} SOL is too large", amount)))?;

    if !lamports.fract().is_zero() {
        return Err(WalletError::InvalidAmount(format!(
            "{} SOL is finer than one lamport",
            amount
        )));
    }

    lamports
        .to_u64()
        .ok_or_else(|| WalletError::InvalidAmount(format!("{} SOL is too large", amount)))
}

/// Fixed fee estimate in SOL, for display next to a send form
pub fn estimated_fee_sol() -> Decimal {
    lamports_to_sol(ESTIMATED_FEE_LAMPORTS)
}
