// =============================================================================
// Initialize Ledger
// =============================================================================
// Creates the ledger, mints the full supply to the creator and sets up the
// fee holding, the dead holder, the dividend distributor with its reward
// vault, and the native vault that receives swap proceeds.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::events::LedgerInitialized;
use crate::state::{Distributor, FeeSchedule, HolderAccount, Ledger};

/// Accounts required for initialize_ledger instruction
#[derive(Accounts)]
pub struct InitializeLedger<'info> {
    /// Receives the initial supply and becomes owner
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        init,
        payer = creator,
        space = 8 + Ledger::INIT_SPACE,
        seeds = [LEDGER_SEED, creator.key().as_ref()],
        bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        init,
        payer = creator,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), creator.key().as_ref()],
        bump
    )]
    pub creator_holder: Box<Account<'info, HolderAccount>>,

    /// The ledger's own holding, credited with every fee
    #[account(
        init,
        payer = creator,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), ledger.key().as_ref()],
        bump
    )]
    pub fee_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        init,
        payer = creator,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), DEAD_ADDRESS.as_ref()],
        bump
    )]
    pub dead_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        init,
        payer = creator,
        space = 8 + Distributor::INIT_SPACE,
        seeds = [DISTRIBUTOR_SEED, ledger.key().as_ref()],
        bump
    )]
    pub distributor: Box<Account<'info, Distributor>>,

    /// Reward asset paid out as dividends
    pub reward_mint: Box<Account<'info, Mint>>,

    #[account(
        init,
        payer = creator,
        seeds = [REWARD_VAULT_SEED, distributor.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = distributor
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [NATIVE_VAULT_SEED, ledger.key().as_ref()],
        bump
    )]
    pub native_vault: SystemAccount<'info>,

    /// CHECK: AMM program id, only stored and later matched by address
    #[account(executable)]
    pub amm_program: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_initialize_ledger(ctx: Context<InitializeLedger>) -> Result<()> {
    let clock = Clock::get()?;
    let creator = ctx.accounts.creator.key();
    let ledger_key = ctx.accounts.ledger.key();

    // =========================================================================
    // Ledger
    // =========================================================================

    let ledger = &mut ctx.accounts.ledger;
    ledger.creator = creator;
    ledger.owner = creator;
    ledger.authorize(creator)?;
    ledger.total_supply = INITIAL_SUPPLY;
    ledger.decimals = TOKEN_DECIMALS;
    ledger.fees = FeeSchedule::launch_default();
    ledger.sell_multiplier_enabled = false;
    ledger.sell_multiplier = 1;
    ledger.amm_program = ctx.accounts.amm_program.key();
    ledger.swap_enabled = true;
    ledger.swap_threshold = DEFAULT_SWAP_THRESHOLD;
    ledger.target_liquidity = DEFAULT_TARGET_LIQUIDITY;
    ledger.target_liquidity_denominator = DEFAULT_TARGET_LIQUIDITY_DENOMINATOR;
    ledger.liquidity_receiver = creator;
    ledger.marketing_receiver = creator;
    ledger.staking_receiver = creator;
    ledger.bump = ctx.bumps.ledger;
    ledger.native_vault_bump = ctx.bumps.native_vault;

    // =========================================================================
    // Holders
    // =========================================================================

    let creator_holder = &mut ctx.accounts.creator_holder;
    creator_holder.open(ledger_key, creator, ctx.bumps.creator_holder);
    creator_holder.is_fee_exempt = true;
    creator_holder.credit(INITIAL_SUPPLY)?;

    let fee_holder = &mut ctx.accounts.fee_holder;
    fee_holder.open(ledger_key, ledger_key, ctx.bumps.fee_holder);
    fee_holder.is_fee_exempt = true;
    fee_holder.is_dividend_exempt = true;

    let dead_holder = &mut ctx.accounts.dead_holder;
    dead_holder.open(ledger_key, DEAD_ADDRESS, ctx.bumps.dead_holder);
    dead_holder.is_dividend_exempt = true;

    // =========================================================================
    // Distributor
    // =========================================================================

    let distributor = &mut ctx.accounts.distributor;
    distributor.ledger = ledger_key;
    distributor.reward_mint = ctx.accounts.reward_mint.key();
    distributor.reward_vault = ctx.accounts.reward_vault.key();
    distributor.min_period = DEFAULT_MIN_PERIOD;
    distributor.min_distribution = DEFAULT_MIN_DISTRIBUTION;
    distributor.bump = ctx.bumps.distributor;
    distributor.vault_bump = ctx.bumps.reward_vault;

    let creator_holder_key = ctx.accounts.creator_holder.key();
    distributor.sync_holder(
        creator_holder_key,
        &mut ctx.accounts.creator_holder,
        clock.unix_timestamp,
    )?;

    // Keep the native vault rent-exempt so sweeps and buybacks can draw it
    // down to the minimum without the runtime rejecting the transaction.
    let rent_floor = Rent::get()?.minimum_balance(0);
    let top_up = rent_floor.saturating_sub(ctx.accounts.native_vault.lamports());
    if top_up > 0 {
        system_program::transfer(
            CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                system_program::Transfer {
                    from: ctx.accounts.creator.to_account_info(),
                    to: ctx.accounts.native_vault.to_account_info(),
                },
            ),
            top_up,
        )?;
    }

    emit!(LedgerInitialized {
        ledger: ledger_key,
        owner: creator,
        total_supply: INITIAL_SUPPLY,
        timestamp: clock.unix_timestamp,
    });

    msg!("Ledger initialized: {}", ledger_key);
    msg!("Supply {} minted to {}", INITIAL_SUPPLY, creator);
    msg!("Reward mint: {}", ctx.accounts.reward_mint.key());
    msg!("AMM program: {}", ctx.accounts.amm_program.key());

    Ok(())
}
