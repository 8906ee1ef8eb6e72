use anchor_lang::prelude::*;

use crate::constants::{HOLDER_SEED, LEDGER_SEED};
use crate::state::{HolderAccount, Ledger};

/// Accounts required for open_holder instruction
///
/// Holders are otherwise opened on first receipt by `transfer`; this exists
/// for accounts that must be referenced before they ever receive tokens
/// (pairs, vesting beneficiaries).
#[derive(Accounts)]
pub struct OpenHolder<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    /// CHECK: any address can own a ledger balance
    pub owner: UncheckedAccount<'info>,

    #[account(
        init,
        payer = payer,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub holder: Box<Account<'info, HolderAccount>>,

    pub system_program: Program<'info, System>,
}

pub fn handler_open_holder(ctx: Context<OpenHolder>) -> Result<()> {
    let ledger_key = ctx.accounts.ledger.key();
    let owner = ctx.accounts.owner.key();

    ctx.accounts
        .holder
        .open(ledger_key, owner, ctx.bumps.holder);

    msg!("Holder opened for {}", owner);
    Ok(())
}
