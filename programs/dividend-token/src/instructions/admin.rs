// =============================================================================
// Admin Instructions
// =============================================================================
// Ledger configuration. Every instruction here requires a signer from the
// ledger's authorized set; ownership transfer requires the owner itself.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::*;
use crate::error::TokenError;
use crate::events::{FeesUpdated, TradingEnabled};
use crate::instructions::payout::pay_dividend;
use crate::state::{Distributor, FeeSchedule, HolderAccount, Ledger};

// =============================================================================
// Ledger Settings
// =============================================================================

/// Accounts required for ledger configuration instructions
#[derive(Accounts)]
pub struct LedgerAdmin<'info> {
    #[account(
        constraint = ledger.is_authorized(&authority.key()) @ TokenError::Unauthorized
    )]
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,
}

/// One-time launch. Arms the anti-snipe window at the current slot.
pub fn handler_enable_trading(
    ctx: Context<LedgerAdmin>,
    protected_slots: u64,
    heavy_tax_bps: u16,
) -> Result<()> {
    let slot = Clock::get()?.slot;
    let ledger = &mut ctx.accounts.ledger;

    ledger.enable_trading(slot, protected_slots, heavy_tax_bps)?;

    emit!(TradingEnabled {
        launch_slot: slot,
        protected_slots,
        heavy_tax_bps,
    });
    msg!(
        "Trading enabled at slot {}. {} bps tax until slot {}",
        slot,
        heavy_tax_bps,
        slot.saturating_add(protected_slots)
    );
    Ok(())
}

pub fn handler_set_fees(ctx: Context<LedgerAdmin>, fees: FeeSchedule) -> Result<()> {
    ctx.accounts.ledger.set_fees(fees)?;

    emit!(FeesUpdated {
        liquidity_fee: fees.liquidity_fee,
        buyback_fee: fees.buyback_fee,
        reflection_fee: fees.reflection_fee,
        marketing_fee: fees.marketing_fee,
        staking_fee: fees.staking_fee,
        fee_denominator: fees.fee_denominator,
    });
    msg!(
        "Fees set: {} / {}",
        fees.total_fee(),
        fees.fee_denominator
    );
    Ok(())
}

pub fn handler_set_sell_multiplier(
    ctx: Context<LedgerAdmin>,
    enabled: bool,
    multiplier: u16,
) -> Result<()> {
    ctx.accounts.ledger.set_sell_multiplier(enabled, multiplier)?;
    msg!("Sell multiplier {}x, enabled: {}", multiplier, enabled);
    Ok(())
}

pub fn handler_set_swap_back_settings(
    ctx: Context<LedgerAdmin>,
    enabled: bool,
    threshold: u64,
) -> Result<()> {
    require!(threshold > 0, TokenError::InvalidAmount);
    let ledger = &mut ctx.accounts.ledger;
    ledger.swap_enabled = enabled;
    ledger.swap_threshold = threshold;
    msg!("Fee sweep enabled: {}, threshold: {}", enabled, threshold);
    Ok(())
}

pub fn handler_set_target_liquidity(
    ctx: Context<LedgerAdmin>,
    target: u16,
    denominator: u16,
) -> Result<()> {
    ctx.accounts.ledger.set_target_liquidity(target, denominator)?;
    msg!("Target liquidity {} / {}", target, denominator);
    Ok(())
}

pub fn handler_set_fee_receivers(
    ctx: Context<LedgerAdmin>,
    liquidity_receiver: Pubkey,
    marketing_receiver: Pubkey,
    staking_receiver: Pubkey,
) -> Result<()> {
    let ledger = &mut ctx.accounts.ledger;
    let ledger_key = ledger.key();
    require_keys_neq!(staking_receiver, ledger_key, TokenError::InvalidReceiver);
    require_keys_neq!(staking_receiver, ledger.pair, TokenError::InvalidReceiver);

    ledger.liquidity_receiver = liquidity_receiver;
    ledger.marketing_receiver = marketing_receiver;
    ledger.staking_receiver = staking_receiver;

    msg!("Liquidity receiver: {}", liquidity_receiver);
    msg!("Marketing receiver: {}", marketing_receiver);
    msg!("Staking receiver: {}", staking_receiver);
    Ok(())
}

pub fn handler_authorize(ctx: Context<LedgerAdmin>, account: Pubkey) -> Result<()> {
    ctx.accounts.ledger.authorize(account)?;
    msg!("Authorized {}", account);
    Ok(())
}

pub fn handler_revoke(ctx: Context<LedgerAdmin>, account: Pubkey) -> Result<()> {
    ctx.accounts.ledger.revoke(&account)?;
    msg!("Revoked {}", account);
    Ok(())
}

// =============================================================================
// Ownership
// =============================================================================

/// Accounts required for transfer_ownership instruction
#[derive(Accounts)]
pub struct TransferOwnership<'info> {
    #[account(
        constraint = owner.key() == ledger.owner @ TokenError::Unauthorized
    )]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,
}

pub fn handler_transfer_ownership(ctx: Context<TransferOwnership>, new_owner: Pubkey) -> Result<()> {
    require_keys_neq!(new_owner, Pubkey::default(), TokenError::Unauthorized);
    ctx.accounts.ledger.transfer_ownership(new_owner)?;
    msg!("Ownership transferred to {}", new_owner);
    Ok(())
}

// =============================================================================
// Holder Flags
// =============================================================================

/// Accounts required for holder flag instructions. Flags that change dividend
/// eligibility resync the holder's share, which may pay out a settlement.
#[derive(Accounts)]
pub struct HolderAdmin<'info> {
    #[account(
        constraint = ledger.is_authorized(&authority.key()) @ TokenError::Unauthorized
    )]
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), holder.owner.as_ref()],
        bump = holder.bump
    )]
    pub holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [DISTRIBUTOR_SEED, ledger.key().as_ref()],
        bump = distributor.bump
    )]
    pub distributor: Box<Account<'info, Distributor>>,

    #[account(
        mut,
        seeds = [REWARD_VAULT_SEED, distributor.key().as_ref()],
        bump = distributor.vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub holder_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Program<'info, Token>,
}

impl<'info> HolderAdmin<'info> {
    fn resync_share(&mut self) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let holder_key = self.holder.key();

        let payout = self
            .distributor
            .sync_holder(holder_key, &mut self.holder, now)?;

        pay_dividend(
            &self.distributor,
            &self.reward_vault,
            self.holder_reward_account.as_deref(),
            &self.token_program,
            holder_key,
            self.holder.owner,
            payout,
        )
    }
}

pub fn handler_set_is_fee_exempt(ctx: Context<HolderAdmin>, exempt: bool) -> Result<()> {
    let holder = &mut ctx.accounts.holder;
    holder.is_fee_exempt = exempt;
    msg!("Fee exempt {}: {}", holder.owner, exempt);
    Ok(())
}

pub fn handler_set_is_dividend_exempt(ctx: Context<HolderAdmin>, exempt: bool) -> Result<()> {
    let holder = &mut ctx.accounts.holder;
    let ledger_key = ctx.accounts.ledger.key();
    require!(
        exempt || (!holder.is_amm_pair && holder.owner != ledger_key),
        TokenError::InvalidHolder
    );
    holder.is_dividend_exempt = exempt;
    msg!("Dividend exempt {}: {}", holder.owner, exempt);

    ctx.accounts.resync_share()
}

/// Flags or unflags a holder as an AMM pair. Pairs never earn dividends.
pub fn handler_set_amm_pair(ctx: Context<HolderAdmin>, is_pair: bool) -> Result<()> {
    let holder = &mut ctx.accounts.holder;
    holder.is_amm_pair = is_pair;
    if is_pair {
        holder.is_dividend_exempt = true;
    }
    msg!("AMM pair {}: {}", holder.owner, is_pair);

    ctx.accounts.resync_share()
}

/// Flags a holder as a pair and makes it the one the fee sweep trades against.
pub fn handler_set_liquidity_pair(ctx: Context<HolderAdmin>) -> Result<()> {
    let pair_owner = ctx.accounts.holder.owner;
    require_keys_neq!(
        pair_owner,
        ctx.accounts.ledger.staking_receiver,
        TokenError::InvalidReceiver
    );

    let holder = &mut ctx.accounts.holder;
    holder.is_amm_pair = true;
    holder.is_dividend_exempt = true;
    ctx.accounts.ledger.pair = pair_owner;
    msg!("Liquidity pair: {}", pair_owner);

    ctx.accounts.resync_share()
}

// =============================================================================
// Distributor Settings
// =============================================================================

/// Accounts required for set_distribution_criteria instruction
#[derive(Accounts)]
pub struct DistributorAdmin<'info> {
    #[account(
        constraint = ledger.is_authorized(&authority.key()) @ TokenError::Unauthorized
    )]
    pub authority: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [DISTRIBUTOR_SEED, ledger.key().as_ref()],
        bump = distributor.bump
    )]
    pub distributor: Box<Account<'info, Distributor>>,
}

pub fn handler_set_distribution_criteria(
    ctx: Context<DistributorAdmin>,
    min_period: i64,
    min_distribution: u64,
) -> Result<()> {
    require!(min_period >= 0, TokenError::InvalidAmount);
    let distributor = &mut ctx.accounts.distributor;
    distributor.min_period = min_period;
    distributor.min_distribution = min_distribution;
    msg!(
        "Distribution criteria: every {}s, above {}",
        min_period,
        min_distribution
    );
    Ok(())
}
