// =============================================================================
// Dividend Token - Fee-Bearing Token Economics Program
// =============================================================================
//
// A fee-bearing ledger asset with four cooperating components:
// - FeeLedger: balances, transfer tax, anti-snipe window, fee sweep
// - Distributor: reward-per-share dividends in a separate reward token
// - StakingEngine: fixed-term pools paying two reward denominations
// - VestingManager: tranche-released escrows that keep earning dividends
//
// The ledger asset is accounted inside this program; the reward asset and
// the staking bonus asset are SPL tokens.
// =============================================================================

pub mod amm;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;

#[cfg(test)]
mod tests;

use anchor_lang::prelude::*;

pub use constants::*;
pub use error::*;
pub use instructions::*;
pub use state::*;

// Program ID - will be updated after first deploy
declare_id!("CW6Ru8q3gAhMQD6yYPyz5Uz9NtwmbxiKFXQwnD2UGSni");

#[program]
pub mod dividend_token {
    use super::*;

    // =========================================================================
    // Ledger Setup
    // =========================================================================

    /// Create the ledger, mint the initial supply to the creator and set up
    /// the fee holding, the dead holder and the dividend distributor.
    ///
    /// The reward mint and AMM program are fixed here; the pair is set later
    /// with `set_liquidity_pair`.
    pub fn initialize_ledger(ctx: Context<InitializeLedger>) -> Result<()> {
        instructions::initialize::handler_initialize_ledger(ctx)
    }

    /// Open a zero-balance holder account for `owner`
    pub fn open_holder(ctx: Context<OpenHolder>) -> Result<()> {
        instructions::open_holder::handler_open_holder(ctx)
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Transfer ledger tokens
    ///
    /// # Arguments
    /// * `amount` - Amount debited from the sender; the recipient gets
    ///   `amount - fee`
    ///
    /// # Fees
    /// * Taxed only when one side is an AMM pair and neither side is exempt
    /// * Sells pay the sell multiplier, all trades pay the heavy tax inside
    ///   the anti-snipe window
    pub fn transfer(ctx: Context<TransferTokens>, amount: u64) -> Result<()> {
        instructions::transfer::handler_transfer(ctx, amount)
    }

    /// Set `spender`'s allowance. `u64::MAX` never decrements.
    pub fn approve(ctx: Context<Approve>, amount: u64) -> Result<()> {
        instructions::transfer::handler_approve(ctx, amount)
    }

    /// Transfer on behalf of `owner` against an allowance
    pub fn transfer_from(ctx: Context<TransferFrom>, amount: u64) -> Result<()> {
        instructions::transfer::handler_transfer_from(ctx, amount)
    }

    // =========================================================================
    // Ledger Admin (authorized set)
    // =========================================================================

    /// Open trading. Can only be called once.
    ///
    /// # Arguments
    /// * `protected_slots` - Length of the anti-snipe window from now
    /// * `heavy_tax_bps` - Fee rate applied to every taxed transfer inside it
    pub fn enable_trading(
        ctx: Context<LedgerAdmin>,
        protected_slots: u64,
        heavy_tax_bps: u16,
    ) -> Result<()> {
        instructions::admin::handler_enable_trading(ctx, protected_slots, heavy_tax_bps)
    }

    /// Replace the fee schedule. Total must stay below the denominator.
    pub fn set_fees(ctx: Context<LedgerAdmin>, fees: FeeSchedule) -> Result<()> {
        instructions::admin::handler_set_fees(ctx, fees)
    }

    pub fn set_sell_multiplier(
        ctx: Context<LedgerAdmin>,
        enabled: bool,
        multiplier: u16,
    ) -> Result<()> {
        instructions::admin::handler_set_sell_multiplier(ctx, enabled, multiplier)
    }

    pub fn set_swap_back_settings(
        ctx: Context<LedgerAdmin>,
        enabled: bool,
        threshold: u64,
    ) -> Result<()> {
        instructions::admin::handler_set_swap_back_settings(ctx, enabled, threshold)
    }

    pub fn set_target_liquidity(
        ctx: Context<LedgerAdmin>,
        target: u16,
        denominator: u16,
    ) -> Result<()> {
        instructions::admin::handler_set_target_liquidity(ctx, target, denominator)
    }

    pub fn set_fee_receivers(
        ctx: Context<LedgerAdmin>,
        liquidity_receiver: Pubkey,
        marketing_receiver: Pubkey,
        staking_receiver: Pubkey,
    ) -> Result<()> {
        instructions::admin::handler_set_fee_receivers(
            ctx,
            liquidity_receiver,
            marketing_receiver,
            staking_receiver,
        )
    }

    pub fn authorize(ctx: Context<LedgerAdmin>, account: Pubkey) -> Result<()> {
        instructions::admin::handler_authorize(ctx, account)
    }

    /// The owner cannot be revoked
    pub fn revoke(ctx: Context<LedgerAdmin>, account: Pubkey) -> Result<()> {
        instructions::admin::handler_revoke(ctx, account)
    }

    /// Hand the owner role to `new_owner` (owner only)
    pub fn transfer_ownership(ctx: Context<TransferOwnership>, new_owner: Pubkey) -> Result<()> {
        instructions::admin::handler_transfer_ownership(ctx, new_owner)
    }

    pub fn set_is_fee_exempt(ctx: Context<HolderAdmin>, exempt: bool) -> Result<()> {
        instructions::admin::handler_set_is_fee_exempt(ctx, exempt)
    }

    /// Toggle dividend eligibility. Resyncs the holder's share, so a
    /// settlement may be paid out.
    pub fn set_is_dividend_exempt(ctx: Context<HolderAdmin>, exempt: bool) -> Result<()> {
        instructions::admin::handler_set_is_dividend_exempt(ctx, exempt)
    }

    /// Mark a holder as an AMM pair. Pairs are always dividend-exempt.
    pub fn set_amm_pair(ctx: Context<HolderAdmin>, is_pair: bool) -> Result<()> {
        instructions::admin::handler_set_amm_pair(ctx, is_pair)
    }

    /// Make the holder the pair used by the fee sweep and buyback
    pub fn set_liquidity_pair(ctx: Context<HolderAdmin>) -> Result<()> {
        instructions::admin::handler_set_liquidity_pair(ctx)
    }

    // =========================================================================
    // Fee Sweep
    // =========================================================================

    /// Sell the fee holding once it is above the threshold and distribute
    /// the proceeds. Permissionless.
    pub fn swap_back(ctx: Context<SwapBack>) -> Result<()> {
        instructions::swap_back::handler_swap_back(ctx)
    }

    /// Spend buyback reserve lamports on tokens sent to the dead holder
    pub fn trigger_manual_buyback(
        ctx: Context<TriggerManualBuyback>,
        native_amount: u64,
    ) -> Result<()> {
        instructions::buyback::handler_trigger_manual_buyback(ctx, native_amount)
    }

    // =========================================================================
    // Dividends
    // =========================================================================

    /// Pay the caller everything they are owed. Paying 0 is not an error.
    pub fn claim_dividend(ctx: Context<ClaimDividend>) -> Result<()> {
        instructions::dividends::handler_claim_dividend(ctx)
    }

    /// Visit up to `step_budget` holders from the payout cursor and pay those
    /// meeting the distribution criteria. Permissionless.
    ///
    /// Remaining accounts: [holder, reward token account] per visited holder.
    pub fn process_dividends<'info>(
        ctx: Context<'_, '_, 'info, 'info, ProcessDividends<'info>>,
        step_budget: u32,
    ) -> Result<()> {
        instructions::dividends::handler_process_dividends(ctx, step_budget)
    }

    pub fn set_distribution_criteria(
        ctx: Context<DistributorAdmin>,
        min_period: i64,
        min_distribution: u64,
    ) -> Result<()> {
        instructions::admin::handler_set_distribution_criteria(ctx, min_period, min_distribution)
    }

    // =========================================================================
    // Staking
    // =========================================================================

    /// Create the staking engine, its custody holder and the bonus mint
    pub fn initialize_staking(ctx: Context<InitializeStaking>) -> Result<()> {
        instructions::staking::handler_initialize_staking(ctx)
    }

    /// Append a pool. `reward_budget_a` is moved from the admin's balance
    /// into engine custody.
    pub fn create_pool(ctx: Context<CreatePool>, config: PoolConfig) -> Result<()> {
        instructions::staking::handler_create_pool(ctx, config)
    }

    /// Stake into a pool, merging into an active stake after settling it
    ///
    /// # Errors
    /// * `CapacityExceeded` - pool total would pass its capacity
    pub fn create_stake(ctx: Context<CreateStake>, amount: u64) -> Result<()> {
        instructions::staking::handler_create_stake(ctx, amount)
    }

    /// Claim a matured stake: principal plus both rewards
    pub fn claim_stake(ctx: Context<ReleaseStake>) -> Result<()> {
        instructions::staking::handler_claim_stake(ctx)
    }

    /// Leave a stake early. No rewards, and the penalty stays in custody.
    pub fn emergency_withdraw(ctx: Context<ReleaseStake>) -> Result<()> {
        instructions::staking::handler_emergency_withdraw(ctx)
    }

    pub fn set_penalty(ctx: Context<StakingAdmin>, penalty_bps: u16) -> Result<()> {
        instructions::staking::handler_set_penalty(ctx, penalty_bps)
    }

    /// Raise a pool's denomination-A budget from unallocated custody:
    /// swept staking fees and retained penalties
    ///
    /// # Errors
    /// * `InsufficientSurplus` - custody only backs principal and budgets
    pub fn fund_pool(ctx: Context<FundPool>, amount: u64) -> Result<()> {
        instructions::staking::handler_fund_pool(ctx, amount)
    }

    // =========================================================================
    // Vesting
    // =========================================================================

    pub fn initialize_vesting(ctx: Context<InitializeVesting>) -> Result<()> {
        instructions::vesting::handler_initialize_vesting(ctx)
    }

    /// Schedule used by instances created after this call
    pub fn set_tranche_schedule(
        ctx: Context<VestingAdmin>,
        tranche_count: u8,
        tranche_interval: i64,
    ) -> Result<()> {
        instructions::vesting::handler_set_tranche_schedule(ctx, tranche_count, tranche_interval)
    }

    /// Escrow `total_amount` from the admin's balance for `beneficiary`
    pub fn create_vesting_instance(
        ctx: Context<CreateVestingInstance>,
        beneficiary: Pubkey,
        total_amount: u64,
    ) -> Result<()> {
        instructions::vesting::handler_create_vesting_instance(ctx, beneficiary, total_amount)
    }

    /// Start the clock on instances `from_index..=to_index`
    ///
    /// Remaining accounts: the instances, in index order.
    pub fn start_multiple_vesting<'info>(
        ctx: Context<'_, '_, 'info, 'info, StartMultipleVesting<'info>>,
        from_index: u32,
        to_index: u32,
    ) -> Result<()> {
        instructions::vesting::handler_start_multiple_vesting(ctx, from_index, to_index)
    }

    /// Release vested tokens and forward escrow dividends for
    /// `from_index..=to_index`
    ///
    /// Remaining accounts, per instance: [instance, instance holder,
    /// beneficiary holder, beneficiary record, beneficiary reward token
    /// account].
    pub fn process_multiple_instances<'info>(
        ctx: Context<'_, '_, 'info, 'info, ProcessMultipleInstances<'info>>,
        from_index: u32,
        to_index: u32,
    ) -> Result<()> {
        instructions::vesting::handler_process_multiple_instances(ctx, from_index, to_index)
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn get_circulating_supply(ctx: Context<GetCirculatingSupply>) -> Result<u64> {
        instructions::views::handler_get_circulating_supply(ctx)
    }

    pub fn get_unpaid_earnings(ctx: Context<GetUnpaidEarnings>) -> Result<u64> {
        instructions::views::handler_get_unpaid_earnings(ctx)
    }

    pub fn get_unpaid_dividend(ctx: Context<GetUnpaidDividend>) -> Result<u64> {
        instructions::views::handler_get_unpaid_dividend(ctx)
    }

    pub fn get_current_owed(ctx: Context<GetCurrentOwed>) -> Result<OwedRewards> {
        instructions::views::handler_get_current_owed(ctx)
    }

    pub fn get_staked_tokens(ctx: Context<GetStakedTokens>) -> Result<u64> {
        instructions::views::handler_get_staked_tokens(ctx)
    }

    pub fn get_claimable_amount(ctx: Context<GetClaimableAmount>) -> Result<u64> {
        instructions::views::handler_get_claimable_amount(ctx)
    }

    pub fn get_all_amounts_for_user(
        ctx: Context<GetAllAmountsForUser>,
        beneficiary: Pubkey,
    ) -> Result<VestedAmounts> {
        instructions::views::handler_get_all_amounts_for_user(ctx, beneficiary)
    }
}
