use anchor_lang::prelude::*;

use crate::error::TokenError;
use crate::math::{add, sub};
use crate::state::ShareRecord;

/// Ledger balance of one owner (wallet, pair authority or program PDA)
/// PDA: ["holder", ledger, owner]
#[account]
#[derive(InitSpace, Default)]
pub struct HolderAccount {
    pub ledger: Pubkey,
    pub owner: Pubkey,
    pub balance: u64,
    pub is_fee_exempt: bool,
    pub is_amm_pair: bool,
    /// Excluded from the dividend stream. Pairs, the fee holding, the dead
    /// holder and staking custody are exempt.
    pub is_dividend_exempt: bool,
    /// Dividend share, mutated only through `Distributor`
    pub share: ShareRecord,
    pub bump: u8,
}

impl HolderAccount {
    pub fn open(&mut self, ledger: Pubkey, owner: Pubkey, bump: u8) {
        self.ledger = ledger;
        self.owner = owner;
        self.bump = bump;
    }

    pub fn is_open(&self) -> bool {
        self.ledger != Pubkey::default()
    }

    pub fn credit(&mut self, amount: u64) -> Result<()> {
        self.balance = add(self.balance, amount)?;
        Ok(())
    }

    pub fn debit(&mut self, amount: u64) -> Result<()> {
        require!(self.balance >= amount, TokenError::InsufficientBalance);
        self.balance = sub(self.balance, amount)?;
        Ok(())
    }

    /// Balance that should be mirrored into the dividend share
    pub fn qualifying_balance(&self) -> u64 {
        if self.is_dividend_exempt {
            0
        } else {
            self.balance
        }
    }
}

/// Spending approval granted by `owner` to `spender`
/// PDA: ["allowance", ledger, owner, spender]
#[account]
#[derive(InitSpace, Default)]
pub struct Allowance {
    pub ledger: Pubkey,
    pub owner: Pubkey,
    pub spender: Pubkey,
    pub amount: u64,
    pub bump: u8,
}

impl Allowance {
    /// `u64::MAX` is an unlimited approval and is never decremented.
    pub fn spend(&mut self, amount: u64) -> Result<()> {
        if self.amount == u64::MAX {
            return Ok(());
        }
        require!(self.amount >= amount, TokenError::InsufficientAllowance);
        self.amount = sub(self.amount, amount)?;
        Ok(())
    }
}
