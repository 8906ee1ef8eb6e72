// =============================================================================
// Staking Engine State
// =============================================================================
// Fixed-term pools. A stake accrues linearly in two denominations until the
// lock elapses:
//
//   owed = amount * rate * min(now - start, lock) / (lock * precision_divisor)
//
// Denomination A is the ledger asset, paid from engine custody and funded up
// front by `reward_budget_a` and topped up from custody surplus by
// `fund_pool`. Denomination B is minted by the engine up to
// `reward_budget_b`.
// =============================================================================

use anchor_lang::prelude::*;

use crate::constants::{BPS_DENOMINATOR, MAX_PENALTY_BPS};
use crate::error::TokenError;
use crate::math::{add, mul_mul_div, sub};

/// Engine singleton
/// PDA: ["staking", ledger]
#[account]
#[derive(InitSpace, Default)]
pub struct StakingEngine {
    pub ledger: Pubkey,

    /// Second reward denomination. Mint authority is this account.
    pub bonus_mint: Pubkey,

    pub pool_count: u32,

    /// Principal currently locked across all pools
    pub total_principal: u64,

    /// Early-exit penalty at the moment a stake opens, over BPS_DENOMINATOR
    pub penalty_bps: u16,

    /// Lifetime penalties kept in engine custody
    pub penalties_retained: u64,

    /// Denomination-A budget committed to pools and not yet paid out
    pub reward_reserved_a: u64,

    pub bump: u8,
    pub bonus_mint_bump: u8,
}

impl StakingEngine {
    pub fn set_penalty(&mut self, penalty_bps: u16) -> Result<()> {
        require!(penalty_bps <= MAX_PENALTY_BPS, TokenError::InvalidPenalty);
        self.penalty_bps = penalty_bps;
        Ok(())
    }

    /// Custody not backing principal or a pool's unpaid budget: sweep
    /// top-ups and retained penalties.
    pub fn surplus(&self, custody_balance: u64) -> u64 {
        custody_balance
            .saturating_sub(self.total_principal)
            .saturating_sub(self.reward_reserved_a)
    }

    /// Raises a pool's denomination-A budget out of custody surplus.
    pub fn fund_pool(
        &mut self,
        pool: &mut StakePool,
        custody_balance: u64,
        amount: u64,
    ) -> Result<()> {
        require!(amount > 0, TokenError::InvalidAmount);
        require!(
            amount <= self.surplus(custody_balance),
            TokenError::InsufficientSurplus
        );
        pool.reward_budget_a = add(pool.reward_budget_a, amount)?;
        self.reward_reserved_a = add(self.reward_reserved_a, amount)?;
        Ok(())
    }

    pub fn commit_reward_a(&mut self, amount: u64) -> Result<()> {
        self.reward_reserved_a = add(self.reward_reserved_a, amount)?;
        Ok(())
    }

    pub fn spend_reward_a(&mut self, amount: u64) -> Result<()> {
        self.reward_reserved_a = sub(self.reward_reserved_a, amount)?;
        Ok(())
    }

    pub fn next_pool_index(&mut self) -> Result<u32> {
        let index = self.pool_count;
        self.pool_count = self
            .pool_count
            .checked_add(1)
            .ok_or(TokenError::MathOverflow)?;
        Ok(index)
    }
}

/// Pool configuration passed to `create_pool`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub lock_duration: i64,
    pub reward_budget_a: u64,
    pub reward_budget_b: u64,
    pub capacity: u64,
    pub rate_a: u64,
    pub rate_b: u64,
    pub precision_divisor: u64,
}

/// Append-only staking pool
/// PDA: ["pool", staking, index_le]
#[account]
#[derive(InitSpace, Default)]
pub struct StakePool {
    pub engine: Pubkey,
    pub index: u32,
    pub lock_duration: i64,
    pub reward_budget_a: u64,
    pub reward_budget_b: u64,
    pub capacity: u64,
    pub rate_a: u64,
    pub rate_b: u64,
    pub precision_divisor: u64,

    /// Always equal to the sum of active stake amounts, never above capacity
    pub total_staked: u64,

    pub reward_paid_a: u64,
    pub reward_paid_b: u64,
    pub active_stakes: u32,
    pub created_at: i64,
    pub bump: u8,
}

/// Owed rewards in both denominations
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwedRewards {
    pub a: u64,
    pub b: u64,
}

/// What leaving a stake released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StakeRelease {
    /// Principal returned to the holder, after any penalty
    pub principal: u64,
    pub penalty: u64,
    pub rewards: OwedRewards,
}

impl StakePool {
    pub fn configure(
        &mut self,
        engine: Pubkey,
        index: u32,
        config: &PoolConfig,
        now: i64,
        bump: u8,
    ) -> Result<()> {
        require!(config.lock_duration > 0, TokenError::InvalidPoolConfig);
        require!(config.capacity > 0, TokenError::InvalidPoolConfig);
        require!(config.precision_divisor > 0, TokenError::InvalidPoolConfig);

        self.engine = engine;
        self.index = index;
        self.lock_duration = config.lock_duration;
        self.reward_budget_a = config.reward_budget_a;
        self.reward_budget_b = config.reward_budget_b;
        self.capacity = config.capacity;
        self.rate_a = config.rate_a;
        self.rate_b = config.rate_b;
        self.precision_divisor = config.precision_divisor;
        self.total_staked = 0;
        self.created_at = now;
        self.bump = bump;
        Ok(())
    }

    fn elapsed(&self, stake: &StakePosition, now: i64) -> u64 {
        now.saturating_sub(stake.start_time)
            .clamp(0, self.lock_duration) as u64
    }

    pub fn current_owed(&self, stake: &StakePosition, now: i64) -> Result<OwedRewards> {
        if stake.amount == 0 {
            return Ok(OwedRewards::default());
        }

        let elapsed = self.elapsed(stake, now);
        let lock = self.lock_duration as u64;

        Ok(OwedRewards {
            a: mul_mul_div(stake.amount, self.rate_a, elapsed, lock, self.precision_divisor)?,
            b: mul_mul_div(stake.amount, self.rate_b, elapsed, lock, self.precision_divisor)?,
        })
    }

    pub fn is_mature(&self, stake: &StakePosition, now: i64) -> bool {
        now.saturating_sub(stake.start_time) >= self.lock_duration
    }

    /// Linear from `penalty_bps` at open down to nothing at maturity.
    pub fn calc_penalty(&self, stake: &StakePosition, now: i64, penalty_bps: u16) -> Result<u64> {
        let lock = self.lock_duration as u64;
        let remaining = lock.saturating_sub(self.elapsed(stake, now));
        mul_mul_div(
            stake.amount,
            penalty_bps as u64,
            remaining,
            lock,
            BPS_DENOMINATOR as u64,
        )
    }

    fn record_rewards(&mut self, rewards: &OwedRewards) -> Result<()> {
        let paid_a = add(self.reward_paid_a, rewards.a)?;
        let paid_b = add(self.reward_paid_b, rewards.b)?;
        require!(paid_a <= self.reward_budget_a, TokenError::RewardBudgetExhausted);
        require!(paid_b <= self.reward_budget_b, TokenError::RewardBudgetExhausted);
        self.reward_paid_a = paid_a;
        self.reward_paid_b = paid_b;
        Ok(())
    }

    /// Opens a stake or merges into the holder's active one. A merge first
    /// cashes in everything owed so far and restarts the clock on the merged
    /// principal. Returns the settlement the caller must pay out.
    pub fn stake(
        &mut self,
        stake: &mut StakePosition,
        amount: u64,
        now: i64,
    ) -> Result<OwedRewards> {
        require!(amount > 0, TokenError::InvalidAmount);
        require!(
            add(self.total_staked, amount)? <= self.capacity,
            TokenError::CapacityExceeded
        );

        let settlement = self.current_owed(stake, now)?;
        if stake.amount > 0 {
            self.record_rewards(&settlement)?;
            stake.accrued_a = add(stake.accrued_a, settlement.a)?;
            stake.accrued_b = add(stake.accrued_b, settlement.b)?;
        } else {
            self.active_stakes = self
                .active_stakes
                .checked_add(1)
                .ok_or(TokenError::MathOverflow)?;
        }

        stake.amount = add(stake.amount, amount)?;
        stake.start_time = now;
        self.total_staked = add(self.total_staked, amount)?;

        Ok(settlement)
    }

    /// Closes a matured stake, paying both rewards with the principal.
    pub fn claim(&mut self, stake: &mut StakePosition, now: i64) -> Result<StakeRelease> {
        require!(stake.amount > 0, TokenError::NoActiveStake);
        require!(self.is_mature(stake, now), TokenError::NotMature);

        let rewards = self.current_owed(stake, now)?;
        self.record_rewards(&rewards)?;

        let principal = stake.amount;
        self.close(stake)?;

        Ok(StakeRelease {
            principal,
            penalty: 0,
            rewards,
        })
    }

    /// Closes a stake at any time, forfeiting accrual and deducting the
    /// early-exit penalty from principal.
    pub fn emergency_withdraw(
        &mut self,
        stake: &mut StakePosition,
        now: i64,
        penalty_bps: u16,
    ) -> Result<StakeRelease> {
        require!(stake.amount > 0, TokenError::NoActiveStake);

        let penalty = self.calc_penalty(stake, now, penalty_bps)?;
        let principal = sub(stake.amount, penalty)?;
        self.close(stake)?;

        Ok(StakeRelease {
            principal,
            penalty,
            rewards: OwedRewards::default(),
        })
    }

    fn close(&mut self, stake: &mut StakePosition) -> Result<()> {
        self.total_staked = sub(self.total_staked, stake.amount)?;
        self.active_stakes = self.active_stakes.saturating_sub(1);
        stake.amount = 0;
        stake.start_time = 0;
        Ok(())
    }
}

/// One holder's stake in one pool
/// PDA: ["stake", pool, owner]
#[account]
#[derive(InitSpace, Default)]
pub struct StakePosition {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub start_time: i64,
    /// Rewards cashed in by restake settlements since this record opened
    pub accrued_a: u64,
    pub accrued_b: u64,
    pub bump: u8,
}

/// Per-holder totals across pools
/// PDA: ["staker", staking, owner]
#[account]
#[derive(InitSpace, Default)]
pub struct Staker {
    pub engine: Pubkey,
    pub owner: Pubkey,
    pub staked_tokens: u64,
    pub bump: u8,
}

impl Staker {
    pub fn record_stake(&mut self, amount: u64) -> Result<()> {
        self.staked_tokens = add(self.staked_tokens, amount)?;
        Ok(())
    }

    pub fn record_release(&mut self, principal_before_penalty: u64) -> Result<()> {
        self.staked_tokens = sub(self.staked_tokens, principal_before_penalty)?;
        Ok(())
    }
}
