// =============================================================================
// Dividend Distributor State
// =============================================================================
// Reward-per-share accounting over holder balances:
//
//   dividends_per_share += deposit * PRECISION / total_shares
//   unpaid(holder)       = amount * dividends_per_share / PRECISION - total_excluded
//
// `total_excluded` is the holder's baseline at their last settlement, so a
// holder only earns on deposits made while they held shares. Rounding dust
// stays in the reward vault.
// =============================================================================

use anchor_lang::prelude::*;

use crate::constants::{DIVIDEND_PRECISION, MAX_SHAREHOLDERS};
use crate::error::TokenError;
use crate::math::{add, sub};
use crate::state::HolderAccount;

/// Per-holder dividend share, embedded in `HolderAccount`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct ShareRecord {
    pub amount: u64,
    /// Scaled like `cumulative_dividends`, which outgrows u64 once the
    /// accumulator is large
    pub total_excluded: u128,
    pub total_realised: u64,
    pub last_claim: i64,
}

/// One reward asset's distributor
/// PDA: ["distributor", ledger]
#[account]
#[derive(InitSpace, Default)]
pub struct Distributor {
    pub ledger: Pubkey,
    pub reward_mint: Pubkey,

    /// PDA: ["reward_vault", distributor]
    pub reward_vault: Pubkey,

    pub total_shares: u64,

    /// Lifetime deposited
    pub total_dividends: u64,

    /// Lifetime paid out
    pub total_distributed: u64,

    /// Scaled by DIVIDEND_PRECISION, never decreases
    pub dividends_per_share: u128,

    /// Next index of `shareholders` visited by `process`
    pub payout_cursor: u32,

    /// `process` skips holders paid within this many seconds
    pub min_period: i64,

    /// `process` skips holders owed this much or less
    pub min_distribution: u64,

    /// Holder account keys visited by `process`, in registration order
    #[max_len(200)]
    pub shareholders: Vec<Pubkey>,

    pub bump: u8,
    pub vault_bump: u8,
}

impl Distributor {
    pub fn cumulative_dividends(&self, amount: u64) -> Result<u128> {
        (amount as u128)
            .checked_mul(self.dividends_per_share)
            .ok_or(TokenError::MathOverflow)?
            .checked_div(DIVIDEND_PRECISION)
            .ok_or_else(|| error!(TokenError::DivisionByZero))
    }

    pub fn unpaid_earnings(&self, share: &ShareRecord) -> Result<u64> {
        if share.amount == 0 {
            return Ok(0);
        }
        let cumulative = self.cumulative_dividends(share.amount)?;
        u64::try_from(cumulative.saturating_sub(share.total_excluded))
            .map_err(|_| error!(TokenError::MathOverflow))
    }

    /// Realise a holder's unpaid earnings. Returns the amount the caller
    /// must transfer out of the reward vault; 0 is a no-op.
    pub fn settle(&mut self, share: &mut ShareRecord, now: i64) -> Result<u64> {
        if share.amount == 0 {
            return Ok(0);
        }

        let unpaid = self.unpaid_earnings(share)?;
        if unpaid == 0 {
            return Ok(0);
        }

        self.total_distributed = add(self.total_distributed, unpaid)?;
        share.total_realised = add(share.total_realised, unpaid)?;
        share.total_excluded = self.cumulative_dividends(share.amount)?;
        share.last_claim = now;

        Ok(unpaid)
    }

    /// Move a holder's share to `new_amount`, settling first. Returns the
    /// settlement payout.
    pub fn set_share(
        &mut self,
        holder_key: Pubkey,
        share: &mut ShareRecord,
        new_amount: u64,
        now: i64,
    ) -> Result<u64> {
        let payout = self.settle(share, now)?;

        if share.amount == 0 && new_amount > 0 {
            self.register(holder_key);
        } else if share.amount > 0 && new_amount == 0 {
            self.deregister(&holder_key);
        }

        self.total_shares = add(sub(self.total_shares, share.amount)?, new_amount)?;
        share.amount = new_amount;
        share.total_excluded = self.cumulative_dividends(new_amount)?;

        Ok(payout)
    }

    /// Mirror a holder's qualifying balance into their share.
    pub fn sync_holder(
        &mut self,
        holder_key: Pubkey,
        holder: &mut HolderAccount,
        now: i64,
    ) -> Result<u64> {
        let target = holder.qualifying_balance();
        if target == holder.share.amount {
            return Ok(0);
        }
        self.set_share(holder_key, &mut holder.share, target, now)
    }

    pub fn deposit(&mut self, amount: u64) -> Result<()> {
        require!(self.total_shares > 0, TokenError::NoShares);

        let increase = (amount as u128)
            .checked_mul(DIVIDEND_PRECISION)
            .ok_or(TokenError::MathOverflow)?
            .checked_div(self.total_shares as u128)
            .ok_or(TokenError::DivisionByZero)?;

        self.dividends_per_share = self
            .dividends_per_share
            .checked_add(increase)
            .ok_or(TokenError::MathOverflow)?;
        self.total_dividends = add(self.total_dividends, amount)?;

        Ok(())
    }

    pub fn should_distribute(&self, share: &ShareRecord, now: i64) -> Result<bool> {
        let period_elapsed = share.last_claim.saturating_add(self.min_period) <= now;
        Ok(period_elapsed && self.unpaid_earnings(share)? > self.min_distribution)
    }

    /// Advances the payout cursor by up to `step_budget` positions and
    /// returns the holder keys to visit, in order. Never wraps past the
    /// starting position within one call.
    pub fn next_batch(&mut self, step_budget: u32) -> Vec<Pubkey> {
        let count = self.shareholders.len();
        if count == 0 {
            self.payout_cursor = 0;
            return Vec::new();
        }

        let steps = (step_budget as usize).min(count);
        let mut cursor = self.payout_cursor as usize % count;
        let mut batch = Vec::with_capacity(steps);
        for _ in 0..steps {
            batch.push(self.shareholders[cursor]);
            cursor = (cursor + 1) % count;
        }
        self.payout_cursor = cursor as u32;
        batch
    }

    /// Holders past capacity still accrue and can claim, they are just not
    /// visited by `process`.
    fn register(&mut self, holder_key: Pubkey) {
        if self.shareholders.len() >= MAX_SHAREHOLDERS {
            msg!("Payout set full, {} not added to cursor", holder_key);
            return;
        }
        if !self.shareholders.contains(&holder_key) {
            self.shareholders.push(holder_key);
        }
    }

    fn deregister(&mut self, holder_key: &Pubkey) {
        if let Some(index) = self.shareholders.iter().position(|k| k == holder_key) {
            self.shareholders.swap_remove(index);
            if self.payout_cursor as usize >= self.shareholders.len() {
                self.payout_cursor = 0;
            }
        }
    }
}
