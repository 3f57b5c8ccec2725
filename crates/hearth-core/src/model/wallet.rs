use serde::{Deserialize, Serialize};

use crate::error::EconomyError;

/// Coin balance. The balance can never go below zero: debits fail closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyWallet {
    pub balance: u64,
    /// Lifetime coins credited; never decreases.
    pub total_earned: u64,
}

impl CurrencyWallet {
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            total_earned: balance,
        }
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
        self.total_earned = self.total_earned.saturating_add(amount);
    }

    /// Remove `amount` coins, or leave the wallet untouched and fail.
    pub fn debit(&mut self, amount: u64) -> Result<(), EconomyError> {
        if !self.can_afford(amount) {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }
}
