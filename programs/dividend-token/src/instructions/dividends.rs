// =============================================================================
// Dividend Claims
// =============================================================================

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::*;
use crate::error::TokenError;
use crate::instructions::payout::pay_dividend;
use crate::state::{Distributor, HolderAccount, Ledger};

/// Accounts required for claim_dividend instruction
#[derive(Accounts)]
pub struct ClaimDividend<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), owner.key().as_ref()],
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

    #[account(
        mut,
        token::mint = distributor.reward_mint,
        token::authority = owner
    )]
    pub owner_reward_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

/// Nothing owed is not an error; the claim just pays 0.
pub fn handler_claim_dividend(mut ctx: Context<ClaimDividend>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let holder_key = ctx.accounts.holder.key();
    let owner = ctx.accounts.owner.key();

    let accounts = &mut ctx.accounts;
    let payout = accounts.distributor.settle(&mut accounts.holder.share, now)?;

    if payout == 0 {
        msg!("Nothing to claim for {}", owner);
        return Ok(());
    }

    pay_dividend(
        &accounts.distributor,
        &accounts.reward_vault,
        Some(&*accounts.owner_reward_account),
        &accounts.token_program,
        holder_key,
        owner,
        payout,
    )?;

    msg!(
        "Claimed {}. Lifetime realised: {}",
        payout,
        accounts.holder.share.total_realised
    );
    Ok(())
}

// =============================================================================
// Process (bounded payout sweep)
// =============================================================================

/// Accounts required for process_dividends instruction
///
/// Remaining accounts: for each holder the cursor will visit, in cursor
/// order, that holder's `HolderAccount` followed by its reward token account.
/// The batch is `min(step_budget, shareholders)` long.
#[derive(Accounts)]
pub struct ProcessDividends<'info> {
    pub cranker: Signer<'info>,

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

    #[account(
        mut,
        seeds = [REWARD_VAULT_SEED, distributor.key().as_ref()],
        bump = distributor.vault_bump
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler_process_dividends<'info>(
    mut ctx: Context<'_, '_, 'info, 'info, ProcessDividends<'info>>,
    step_budget: u32,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let remaining = ctx.remaining_accounts;
    let accounts = &mut ctx.accounts;

    let batch = accounts.distributor.next_batch(step_budget);
    require!(
        remaining.len() >= batch.len() * 2,
        TokenError::CursorAccountMismatch
    );

    let mut paid_holders = 0u32;
    let mut paid_total = 0u64;

    for (i, expected_key) in batch.iter().enumerate() {
        let holder_info = &remaining[i * 2];
        let reward_info = &remaining[i * 2 + 1];
        require_keys_eq!(*holder_info.key, *expected_key, TokenError::CursorAccountMismatch);

        let mut holder: Account<'info, HolderAccount> = Account::try_from(holder_info)?;
        if !accounts.distributor.should_distribute(&holder.share, now)? {
            continue;
        }

        // A holder without a usable reward account (e.g. a PDA-owned
        // balance) is left for its own claim path rather than stalling the
        // cursor.
        let reward_account = match Account::<'info, TokenAccount>::try_from(reward_info) {
            Ok(account)
                if account.owner == holder.owner
                    && account.mint == accounts.distributor.reward_mint =>
            {
                account
            }
            _ => {
                msg!("Skipping {}: no reward account supplied", holder.owner);
                continue;
            }
        };

        let payout = accounts.distributor.settle(&mut holder.share, now)?;
        holder.exit(&crate::ID)?;

        pay_dividend(
            &accounts.distributor,
            &accounts.reward_vault,
            Some(&reward_account),
            &accounts.token_program,
            *expected_key,
            holder.owner,
            payout,
        )?;

        paid_holders += 1;
        paid_total = paid_total.saturating_add(payout);
    }

    msg!(
        "Processed {} holders, paid {} a total of {}. Cursor at {}",
        batch.len(),
        paid_holders,
        paid_total,
        accounts.distributor.payout_cursor
    );
    Ok(())
}
