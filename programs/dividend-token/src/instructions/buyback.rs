use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::amm::{AmmCpi, Asset, SwapVenue};
use crate::constants::*;
use crate::error::TokenError;
use crate::events::BuybackExecuted;
use crate::math::add;
use crate::state::{Distributor, HolderAccount, Ledger};

/// Accounts required for trigger_manual_buyback instruction
///
/// Spends lamports from the native vault (the buyback reserve left by fee
/// sweeps) on ledger tokens from the pair and credits them to the dead holder.
#[derive(Accounts)]
pub struct TriggerManualBuyback<'info> {
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
        seeds = [HOLDER_SEED, ledger.key().as_ref(), ledger.pair.as_ref()],
        bump = pair_holder.bump
    )]
    pub pair_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), DEAD_ADDRESS.as_ref()],
        bump = dead_holder.bump
    )]
    pub dead_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [NATIVE_VAULT_SEED, ledger.key().as_ref()],
        bump = ledger.native_vault_bump
    )]
    pub native_vault: SystemAccount<'info>,

    #[account(
        seeds = [DISTRIBUTOR_SEED, ledger.key().as_ref()],
        bump = distributor.bump
    )]
    pub distributor: Box<Account<'info, Distributor>>,

    #[account(mut, address = distributor.reward_vault @ TokenError::InvalidRewardAccount)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    /// CHECK: matched against ledger configuration
    #[account(mut, address = ledger.liquidity_receiver @ TokenError::InvalidReceiver)]
    pub liquidity_receiver: UncheckedAccount<'info>,

    /// CHECK: matched against ledger configuration
    #[account(executable, address = ledger.amm_program @ TokenError::InvalidAmmProgram)]
    pub amm_program: UncheckedAccount<'info>,

    /// CHECK: validated by the AMM program
    #[account(mut)]
    pub amm_pool: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler_trigger_manual_buyback(
    mut ctx: Context<TriggerManualBuyback>,
    native_amount: u64,
) -> Result<()> {
    require!(native_amount > 0, TokenError::InvalidAmount);
    require!(!ctx.accounts.ledger.in_swap, TokenError::SwapInProgress);

    let rent_floor = Rent::get()?.minimum_balance(0);
    let available = ctx.accounts.native_vault.lamports().saturating_sub(rent_floor);
    require!(native_amount <= available, TokenError::InsufficientNativeBalance);

    let ledger_key = ctx.accounts.ledger.key();
    let accounts = &mut ctx.accounts;
    accounts.ledger.in_swap = true;
    accounts.ledger.exit(&crate::ID)?;

    let amm_program = accounts.amm_program.to_account_info();
    let amm_pool = accounts.amm_pool.to_account_info();
    let native_vault = accounts.native_vault.to_account_info();
    let reward_vault = accounts.reward_vault.to_account_info();
    let liquidity_receiver = accounts.liquidity_receiver.to_account_info();
    let token_program = accounts.token_program.to_account_info();
    let system_program = accounts.system_program.to_account_info();
    let native_vault_bump = accounts.ledger.native_vault_bump;
    let native_vault_seeds: &[&[u8]] = &[NATIVE_VAULT_SEED, ledger_key.as_ref(), &[native_vault_bump]];

    let mut venue = AmmCpi {
        amm_program: &amm_program,
        amm_pool: &amm_pool,
        native_vault: &native_vault,
        reward_vault: &reward_vault,
        liquidity_receiver: &liquidity_receiver,
        token_program: &token_program,
        system_program: &system_program,
        native_vault_seeds,
    };

    let tokens_out = venue.swap(native_amount, Asset::Native, Asset::Ledger)?;

    // The pair's side of the trade settles on the ledger
    accounts
        .ledger
        .move_balance(&mut accounts.pair_holder, &mut accounts.dead_holder, tokens_out)?;
    accounts.ledger.total_bought_back = add(accounts.ledger.total_bought_back, tokens_out)?;
    accounts.ledger.in_swap = false;

    emit!(BuybackExecuted {
        native_spent: native_amount,
        tokens_burned: tokens_out,
    });
    msg!(
        "Buyback: {} lamports -> {} tokens burned. Dead balance: {}",
        native_amount,
        tokens_out,
        accounts.dead_holder.balance
    );

    Ok(())
}
