// =============================================================================
// Views
// =============================================================================
// Read-only instructions that return a value through return data, for
// clients that simulate rather than decode accounts themselves.
// =============================================================================

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::state::{
    BeneficiaryRecord, Distributor, HolderAccount, Ledger, OwedRewards, StakePool, StakePosition,
    Staker, VestedAmounts, VestingInstance,
};

#[derive(Accounts)]
pub struct GetCirculatingSupply<'info> {
    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        seeds = [HOLDER_SEED, ledger.key().as_ref(), DEAD_ADDRESS.as_ref()],
        bump = dead_holder.bump
    )]
    pub dead_holder: Box<Account<'info, HolderAccount>>,
}

/// Total supply minus the dead holder's balance
pub fn handler_get_circulating_supply(ctx: Context<GetCirculatingSupply>) -> Result<u64> {
    ctx.accounts
        .ledger
        .circulating_supply(ctx.accounts.dead_holder.balance)
}

#[derive(Accounts)]
pub struct GetUnpaidEarnings<'info> {
    #[account(
        seeds = [DISTRIBUTOR_SEED, distributor.ledger.as_ref()],
        bump = distributor.bump
    )]
    pub distributor: Box<Account<'info, Distributor>>,

    #[account(constraint = holder.ledger == distributor.ledger)]
    pub holder: Box<Account<'info, HolderAccount>>,
}

pub fn handler_get_unpaid_earnings(ctx: Context<GetUnpaidEarnings>) -> Result<u64> {
    ctx.accounts
        .distributor
        .unpaid_earnings(&ctx.accounts.holder.share)
}

#[derive(Accounts)]
pub struct GetUnpaidDividend<'info> {
    #[account(
        seeds = [DISTRIBUTOR_SEED, distributor.ledger.as_ref()],
        bump = distributor.bump
    )]
    pub distributor: Box<Account<'info, Distributor>>,

    pub instance: Box<Account<'info, VestingInstance>>,

    #[account(
        seeds = [HOLDER_SEED, distributor.ledger.as_ref(), instance.key().as_ref()],
        bump = instance_holder.bump
    )]
    pub instance_holder: Box<Account<'info, HolderAccount>>,
}

/// Dividends the escrow has earned and not yet forwarded
pub fn handler_get_unpaid_dividend(ctx: Context<GetUnpaidDividend>) -> Result<u64> {
    ctx.accounts
        .distributor
        .unpaid_earnings(&ctx.accounts.instance_holder.share)
}

#[derive(Accounts)]
pub struct GetCurrentOwed<'info> {
    pub pool: Box<Account<'info, StakePool>>,

    #[account(constraint = stake.pool == pool.key())]
    pub stake: Box<Account<'info, StakePosition>>,
}

pub fn handler_get_current_owed(ctx: Context<GetCurrentOwed>) -> Result<OwedRewards> {
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.pool.current_owed(&ctx.accounts.stake, now)
}

#[derive(Accounts)]
pub struct GetStakedTokens<'info> {
    pub staker: Box<Account<'info, Staker>>,
}

pub fn handler_get_staked_tokens(ctx: Context<GetStakedTokens>) -> Result<u64> {
    Ok(ctx.accounts.staker.staked_tokens)
}

#[derive(Accounts)]
pub struct GetClaimableAmount<'info> {
    pub instance: Box<Account<'info, VestingInstance>>,
}

pub fn handler_get_claimable_amount(ctx: Context<GetClaimableAmount>) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    ctx.accounts.instance.claimable_amount(now)
}

#[derive(Accounts)]
#[instruction(beneficiary: Pubkey)]
pub struct GetAllAmountsForUser<'info> {
    #[account(
        seeds = [BENEFICIARY_SEED, beneficiary_record.manager.as_ref(), beneficiary.as_ref()],
        bump = beneficiary_record.bump
    )]
    pub beneficiary_record: Box<Account<'info, BeneficiaryRecord>>,
}

/// Vested, claimed and forwarded-dividend totals over all of a
/// beneficiary's instances
pub fn handler_get_all_amounts_for_user(
    ctx: Context<GetAllAmountsForUser>,
    _beneficiary: Pubkey,
) -> Result<VestedAmounts> {
    Ok(ctx.accounts.beneficiary_record.amounts())
}
