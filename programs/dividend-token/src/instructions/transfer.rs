// =============================================================================
// Transfers
// =============================================================================
// transfer / transfer_from move ledger balances, taking the fee when one side
// is a pair, then mirror both holders' new balances into their dividend
// shares. Settlement payouts go out only after all ledger state is final.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::*;
use crate::error::TokenError;
use crate::events::{FeeCollected, SwapBackReady};
use crate::instructions::payout::pay_dividend;
use crate::state::{Allowance, Distributor, HolderAccount, Ledger};

/// Accounts required for transfer instruction
#[derive(Accounts)]
pub struct TransferTokens<'info> {
    /// Owner of the source balance
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), authority.key().as_ref()],
        bump = from_holder.bump
    )]
    pub from_holder: Box<Account<'info, HolderAccount>>,

    /// CHECK: any address can receive
    pub recipient: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = authority,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), recipient.key().as_ref()],
        bump
    )]
    pub to_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), ledger.key().as_ref()],
        bump = fee_holder.bump
    )]
    pub fee_holder: Box<Account<'info, HolderAccount>>,

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

    /// Required when the sender has unpaid dividends
    #[account(mut)]
    pub from_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    /// Required when the recipient has unpaid dividends
    #[account(mut)]
    pub to_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler_transfer(mut ctx: Context<TransferTokens>, amount: u64) -> Result<()> {
    let authority = ctx.accounts.authority.key();
    let recipient = ctx.accounts.recipient.key();
    let ledger_key = ctx.accounts.ledger.key();

    require!(amount > 0, TokenError::InvalidAmount);
    require_keys_neq!(authority, recipient, TokenError::SelfTransfer);
    require_keys_neq!(recipient, ledger_key, TokenError::InvalidHolder);

    if !ctx.accounts.to_holder.is_open() {
        ctx.accounts
            .to_holder
            .open(ledger_key, recipient, ctx.bumps.to_holder);
    }

    let accounts = &mut ctx.accounts;
    apply_transfer(
        &mut accounts.ledger,
        &mut accounts.from_holder,
        &mut accounts.to_holder,
        &mut accounts.fee_holder,
        &mut accounts.distributor,
        &accounts.reward_vault,
        accounts.from_reward_account.as_deref(),
        accounts.to_reward_account.as_deref(),
        &accounts.token_program,
        amount,
    )
}

// =============================================================================
// Approve
// =============================================================================

/// Accounts required for approve instruction
#[derive(Accounts)]
pub struct Approve<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    /// CHECK: only its key is recorded
    pub spender: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + Allowance::INIT_SPACE,
        seeds = [
            ALLOWANCE_SEED,
            ledger.key().as_ref(),
            owner.key().as_ref(),
            spender.key().as_ref()
        ],
        bump
    )]
    pub allowance: Box<Account<'info, Allowance>>,

    pub system_program: Program<'info, System>,
}

pub fn handler_approve(ctx: Context<Approve>, amount: u64) -> Result<()> {
    let allowance = &mut ctx.accounts.allowance;
    allowance.ledger = ctx.accounts.ledger.key();
    allowance.owner = ctx.accounts.owner.key();
    allowance.spender = ctx.accounts.spender.key();
    allowance.amount = amount;
    allowance.bump = ctx.bumps.allowance;

    msg!(
        "Approved {} to spend {} of {}",
        allowance.spender,
        amount,
        allowance.owner
    );
    Ok(())
}

// =============================================================================
// Transfer From
// =============================================================================

/// Accounts required for transfer_from instruction
#[derive(Accounts)]
pub struct TransferFrom<'info> {
    #[account(mut)]
    pub spender: Signer<'info>,

    #[account(
        mut,
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    /// CHECK: owner of the source balance, bound by the allowance seeds
    pub owner: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [
            ALLOWANCE_SEED,
            ledger.key().as_ref(),
            owner.key().as_ref(),
            spender.key().as_ref()
        ],
        bump = allowance.bump
    )]
    pub allowance: Box<Account<'info, Allowance>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), owner.key().as_ref()],
        bump = from_holder.bump
    )]
    pub from_holder: Box<Account<'info, HolderAccount>>,

    /// CHECK: any address can receive
    pub recipient: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = spender,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), recipient.key().as_ref()],
        bump
    )]
    pub to_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), ledger.key().as_ref()],
        bump = fee_holder.bump
    )]
    pub fee_holder: Box<Account<'info, HolderAccount>>,

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
    pub from_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    #[account(mut)]
    pub to_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler_transfer_from(mut ctx: Context<TransferFrom>, amount: u64) -> Result<()> {
    let owner = ctx.accounts.owner.key();
    let recipient = ctx.accounts.recipient.key();
    let ledger_key = ctx.accounts.ledger.key();

    require!(amount > 0, TokenError::InvalidAmount);
    require_keys_neq!(owner, recipient, TokenError::SelfTransfer);
    require_keys_neq!(recipient, ledger_key, TokenError::InvalidHolder);

    ctx.accounts.allowance.spend(amount)?;

    if !ctx.accounts.to_holder.is_open() {
        ctx.accounts
            .to_holder
            .open(ledger_key, recipient, ctx.bumps.to_holder);
    }

    let accounts = &mut ctx.accounts;
    apply_transfer(
        &mut accounts.ledger,
        &mut accounts.from_holder,
        &mut accounts.to_holder,
        &mut accounts.fee_holder,
        &mut accounts.distributor,
        &accounts.reward_vault,
        accounts.from_reward_account.as_deref(),
        accounts.to_reward_account.as_deref(),
        &accounts.token_program,
        amount,
    )
}

// =============================================================================
// Shared transfer path
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn apply_transfer<'info>(
    ledger: &mut Account<'info, Ledger>,
    from_holder: &mut Account<'info, HolderAccount>,
    to_holder: &mut Account<'info, HolderAccount>,
    fee_holder: &mut Account<'info, HolderAccount>,
    distributor: &mut Account<'info, Distributor>,
    reward_vault: &Account<'info, TokenAccount>,
    from_reward_account: Option<&Account<'info, TokenAccount>>,
    to_reward_account: Option<&Account<'info, TokenAccount>>,
    token_program: &Program<'info, Token>,
    amount: u64,
) -> Result<()> {
    let clock = Clock::get()?;
    let now = clock.unix_timestamp;
    let from_key = from_holder.key();
    let to_key = to_holder.key();

    // Effects: balances, then shares
    let outcome = ledger.transfer(from_holder, to_holder, fee_holder, amount, clock.slot)?;
    let from_payout = distributor.sync_holder(from_key, from_holder, now)?;
    let to_payout = distributor.sync_holder(to_key, to_holder, now)?;

    // Interactions
    pay_dividend(
        distributor,
        reward_vault,
        from_reward_account,
        token_program,
        from_key,
        from_holder.owner,
        from_payout,
    )?;
    pay_dividend(
        distributor,
        reward_vault,
        to_reward_account,
        token_program,
        to_key,
        to_holder.owner,
        to_payout,
    )?;

    if outcome.fee > 0 {
        emit!(FeeCollected {
            from: from_holder.owner,
            to: to_holder.owner,
            amount,
            fee: outcome.fee,
        });
    }
    if outcome.sweep_ready {
        emit!(SwapBackReady {
            held: fee_holder.balance,
            threshold: ledger.swap_threshold,
        });
        msg!("Fee holding {} above sweep threshold", fee_holder.balance);
    }

    msg!(
        "Transfer {} -> {}: sent {}, received {}, fee {}",
        from_holder.owner,
        to_holder.owner,
        amount,
        outcome.received,
        outcome.fee
    );

    Ok(())
}
