use anchor_lang::prelude::*;

use crate::constants::MAX_TRANCHES;
use crate::error::TokenError;
use crate::math::{add, sub};
use crate::state::{Distributor, HolderAccount, Ledger};

/// Vesting manager singleton
/// PDA: ["vesting_manager", ledger]
#[account]
#[derive(InitSpace, Default)]
pub struct VestingManager {
    pub ledger: Pubkey,
    pub instance_count: u32,

    /// Schedule applied to instances created from now on
    pub tranche_count: u8,
    pub tranche_interval: i64,

    /// Lifetime amount moved into instances
    pub total_allocated: u64,

    pub bump: u8,
}

impl VestingManager {
    pub fn set_tranche_schedule(&mut self, tranche_count: u8, tranche_interval: i64) -> Result<()> {
        require!(
            tranche_count > 0 && tranche_count <= MAX_TRANCHES,
            TokenError::InvalidTrancheSchedule
        );
        require!(tranche_interval > 0, TokenError::InvalidTrancheSchedule);
        self.tranche_count = tranche_count;
        self.tranche_interval = tranche_interval;
        Ok(())
    }

    pub fn next_instance_index(&mut self) -> Result<u32> {
        let index = self.instance_count;
        self.instance_count = self
            .instance_count
            .checked_add(1)
            .ok_or(TokenError::MathOverflow)?;
        Ok(index)
    }

    /// Inclusive range check against created instances
    pub fn check_range(&self, from_index: u32, to_index: u32) -> Result<()> {
        require!(
            from_index <= to_index && to_index < self.instance_count,
            TokenError::InvalidRange
        );
        Ok(())
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct Tranche {
    pub amount: u64,
    /// Seconds after `start_time`
    pub unlock_offset: i64,
    /// Absolute, 0 until the instance is started
    pub unlock_time: i64,
}

/// Escrow of one beneficiary's allocation
/// PDA: ["vesting", manager, index_le]
#[account]
#[derive(InitSpace, Default)]
pub struct VestingInstance {
    pub manager: Pubkey,
    pub index: u32,
    pub beneficiary: Pubkey,
    pub total_vested: u64,
    #[max_len(12)]
    pub tranches: Vec<Tranche>,
    /// 0 until started
    pub start_time: i64,
    pub claimed: u64,
    /// Lifetime dividends redirected to the beneficiary
    pub dividends_forwarded: u64,
    pub bump: u8,
}

impl VestingInstance {
    /// Equal tranches, the last one absorbing the division remainder so the
    /// table sums exactly to `total`.
    pub fn build_tranches(total: u64, count: u8, interval: i64) -> Result<Vec<Tranche>> {
        require!(
            count > 0 && count <= MAX_TRANCHES,
            TokenError::InvalidTrancheSchedule
        );
        require!(interval > 0, TokenError::InvalidTrancheSchedule);

        let per_tranche = total / count as u64;
        let mut tranches = Vec::with_capacity(count as usize);
        let mut allocated = 0u64;
        for i in 0..count {
            let amount = if i + 1 == count {
                sub(total, allocated)?
            } else {
                per_tranche
            };
            allocated = add(allocated, amount)?;
            let unlock_offset = interval
                .checked_mul(i as i64 + 1)
                .ok_or(TokenError::MathOverflow)?;
            tranches.push(Tranche {
                amount,
                unlock_offset,
                unlock_time: 0,
            });
        }
        Ok(tranches)
    }

    pub fn is_started(&self) -> bool {
        self.start_time != 0
    }

    /// Starts the clock. Returns false if it was already running.
    pub fn start(&mut self, now: i64) -> Result<bool> {
        if self.is_started() {
            return Ok(false);
        }
        self.start_time = now;
        for tranche in self.tranches.iter_mut() {
            tranche.unlock_time = now
                .checked_add(tranche.unlock_offset)
                .ok_or(TokenError::MathOverflow)?;
        }
        Ok(true)
    }

    pub fn claimable_amount(&self, now: i64) -> Result<u64> {
        if !self.is_started() {
            return Ok(0);
        }
        let mut unlocked = 0u64;
        for tranche in self.tranches.iter().filter(|t| t.unlock_time <= now) {
            unlocked = add(unlocked, tranche.amount)?;
        }
        Ok(unlocked.saturating_sub(self.claimed))
    }

    pub fn record_claim(&mut self, amount: u64) -> Result<()> {
        let claimed = add(self.claimed, amount)?;
        require!(claimed <= self.total_vested, TokenError::MathOverflow);
        self.claimed = claimed;
        Ok(())
    }

    /// Moves everything claimable from the escrow to the beneficiary and
    /// realises the dividends on both sides. The escrow keeps earning on
    /// its locked balance until this runs, so its settlement belongs to the
    /// beneficiary too.
    #[allow(clippy::too_many_arguments)]
    pub fn release(
        &mut self,
        ledger: &Ledger,
        distributor: &mut Distributor,
        escrow_key: Pubkey,
        escrow: &mut HolderAccount,
        beneficiary_key: Pubkey,
        beneficiary: &mut HolderAccount,
        now: i64,
    ) -> Result<VestingRelease> {
        let mut escrow_dividends = distributor.settle(&mut escrow.share, now)?;

        let amount = self.claimable_amount(now)?;
        if amount > 0 {
            ledger.move_balance(escrow, beneficiary, amount)?;
            self.record_claim(amount)?;
        }

        escrow_dividends = add(
            escrow_dividends,
            distributor.sync_holder(escrow_key, escrow, now)?,
        )?;
        let beneficiary_dividends = distributor.sync_holder(beneficiary_key, beneficiary, now)?;
        self.dividends_forwarded = add(self.dividends_forwarded, escrow_dividends)?;

        Ok(VestingRelease {
            amount,
            escrow_dividends,
            beneficiary_dividends,
        })
    }
}

/// Result of one `VestingInstance::release`. Both dividend parts are paid
/// to the beneficiary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VestingRelease {
    pub amount: u64,
    /// Earned by the escrow's share while locked
    pub escrow_dividends: u64,
    /// The beneficiary's own settlement, due because their share grew
    pub beneficiary_dividends: u64,
}

/// Totals across every instance held for one beneficiary
/// PDA: ["beneficiary", manager, beneficiary]
#[account]
#[derive(InitSpace, Default)]
pub struct BeneficiaryRecord {
    pub manager: Pubkey,
    pub beneficiary: Pubkey,
    pub instance_count: u32,
    pub total_vested: u64,
    pub claimed: u64,
    pub dividends_forwarded: u64,
    pub bump: u8,
}

/// Returned by `get_all_amounts_for_user`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VestedAmounts {
    pub total_vested: u64,
    pub claimed: u64,
    pub dividends_forwarded: u64,
}

impl BeneficiaryRecord {
    pub fn record_instance(&mut self, total_vested: u64) -> Result<()> {
        self.instance_count = self
            .instance_count
            .checked_add(1)
            .ok_or(TokenError::MathOverflow)?;
        self.total_vested = add(self.total_vested, total_vested)?;
        Ok(())
    }

    pub fn record_release(&mut self, release: &VestingRelease) -> Result<()> {
        self.claimed = add(self.claimed, release.amount)?;
        self.dividends_forwarded = add(self.dividends_forwarded, release.escrow_dividends)?;
        Ok(())
    }

    pub fn amounts(&self) -> VestedAmounts {
        VestedAmounts {
            total_vested: self.total_vested,
            claimed: self.claimed,
            dividends_forwarded: self.dividends_forwarded,
        }
    }
}
