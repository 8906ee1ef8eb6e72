// =============================================================================
// Reward Payouts
// =============================================================================
// Every instruction that changes a dividend share may owe the holder a
// settlement. The accounting is done by `Distributor`; this is the transfer
// out of the reward vault that follows it.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, MintTo, Token, TokenAccount, Transfer};

use crate::constants::{DISTRIBUTOR_SEED, STAKING_SEED};
use crate::error::TokenError;
use crate::events::DividendPaid;
use crate::state::{Distributor, StakingEngine};

/// Transfer `amount` of the reward asset to `recipient`'s token account.
/// The account is only required when something is actually owed.
pub fn pay_dividend<'info>(
    distributor: &Account<'info, Distributor>,
    reward_vault: &Account<'info, TokenAccount>,
    destination: Option<&Account<'info, TokenAccount>>,
    token_program: &Program<'info, Token>,
    holder: Pubkey,
    recipient: Pubkey,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }

    let destination = destination.ok_or(TokenError::RewardAccountRequired)?;
    require_keys_eq!(
        destination.mint,
        distributor.reward_mint,
        TokenError::InvalidRewardAccount
    );
    require_keys_eq!(destination.owner, recipient, TokenError::InvalidRewardAccount);

    let ledger_key = distributor.ledger;
    let signer_seeds: &[&[&[u8]]] = &[&[
        DISTRIBUTOR_SEED,
        ledger_key.as_ref(),
        &[distributor.bump],
    ]];

    token::transfer(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            Transfer {
                from: reward_vault.to_account_info(),
                to: destination.to_account_info(),
                authority: distributor.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
    )?;

    emit!(DividendPaid {
        holder,
        recipient,
        amount,
    });
    msg!("Dividend paid: {} to {}", amount, recipient);

    Ok(())
}

/// Mint the second reward denomination. Only the staking engine PDA can
/// sign for the mint.
pub fn mint_bonus<'info>(
    engine: &Account<'info, StakingEngine>,
    bonus_mint: &Account<'info, Mint>,
    destination: &Account<'info, TokenAccount>,
    token_program: &Program<'info, Token>,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    require_keys_eq!(bonus_mint.key(), engine.bonus_mint, TokenError::InvalidRewardAccount);

    let ledger_key = engine.ledger;
    let signer_seeds: &[&[&[u8]]] = &[&[STAKING_SEED, ledger_key.as_ref(), &[engine.bump]]];

    token::mint_to(
        CpiContext::new_with_signer(
            token_program.to_account_info(),
            MintTo {
                mint: bonus_mint.to_account_info(),
                to: destination.to_account_info(),
                authority: engine.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
    )?;

    msg!("Minted {} bonus tokens to {}", amount, destination.owner);
    Ok(())
}

