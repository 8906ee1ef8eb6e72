// =============================================================================
// Fee Sweep
// =============================================================================
// Permissionless crank, runnable once the fee holding is above the sweep
// threshold (a transfer that crosses it emits `SwapBackReady`). One sweep
// sells exactly `swap_threshold` tokens:
//
//   staking share  -> ledger tokens to the staking receiver
//   liquidity half -> kept as tokens for add_liquidity
//   the rest       -> sold to the pair for lamports
//
// The lamports are then split by fee weight into dividends (bought as the
// reward asset and deposited into the distributor), marketing, the other
// liquidity half, and a buyback reserve that stays in the native vault.
//
// `begin_sweep` does the token-side moves and `finish_sweep` drives the AMM
// through `SwapVenue`, so both run without a validator. `in_swap` is
// persisted between the two so a reentrant transfer is rejected.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token::{Token, TokenAccount};

use crate::amm::{AmmCpi, Asset, SwapVenue};
use crate::constants::*;
use crate::error::TokenError;
use crate::events::{DividendDeposited, SwapBackExecuted};
use crate::instructions::payout::pay_dividend;
use crate::math::add;
use crate::state::{Distributor, HolderAccount, Ledger, SwapBackPlan};

/// Accounts required for swap_back instruction
#[derive(Accounts)]
pub struct SwapBack<'info> {
    pub cranker: Signer<'info>,

    #[account(
        mut,
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), ledger.key().as_ref()],
        bump = fee_holder.bump
    )]
    pub fee_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), ledger.pair.as_ref()],
        bump = pair_holder.bump
    )]
    pub pair_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        seeds = [HOLDER_SEED, ledger.key().as_ref(), DEAD_ADDRESS.as_ref()],
        bump = dead_holder.bump
    )]
    pub dead_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), ledger.staking_receiver.as_ref()],
        bump = staking_holder.bump
    )]
    pub staking_holder: Box<Account<'info, HolderAccount>>,

    /// Required when the staking receiver earns dividends and has some unpaid
    #[account(mut)]
    pub staking_reward_account: Option<Box<Account<'info, TokenAccount>>>,

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
        seeds = [NATIVE_VAULT_SEED, ledger.key().as_ref()],
        bump = ledger.native_vault_bump
    )]
    pub native_vault: SystemAccount<'info>,

    /// CHECK: matched against ledger configuration
    #[account(mut, address = ledger.marketing_receiver @ TokenError::InvalidReceiver)]
    pub marketing_receiver: UncheckedAccount<'info>,

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

/// What the AMM legs of a sweep did. All zero when the sell returned
/// nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub native_received: u64,
    /// Reward tokens deposited into the distributor
    pub to_dividends: u64,
    /// Lamports paired with tokens in `add_liquidity`
    pub to_liquidity: u64,
    pub to_marketing: u64,
    /// Lamports left in the native vault for manual buybacks
    pub retained: u64,
}

/// Checks the sweep is due, plans it and moves its token legs out of the
/// fee holding: the staking top-up to the staking receiver, the sell amount
/// to the pair. Leaves `in_swap` set.
pub fn begin_sweep(
    ledger: &mut Ledger,
    fee_holder: &mut HolderAccount,
    pair_holder: &mut HolderAccount,
    staking_holder: &mut HolderAccount,
    dead_balance: u64,
) -> Result<SwapBackPlan> {
    require!(
        ledger.should_swap_back(fee_holder.balance),
        TokenError::SwapBackNotReady
    );
    require_keys_neq!(ledger.pair, Pubkey::default(), TokenError::SwapBackNotReady);

    let over_liquified = ledger.is_over_liquified(pair_holder.balance, dead_balance)?;
    let plan = ledger.plan_swap_back(over_liquified)?;

    ledger.move_balance(fee_holder, staking_holder, plan.to_staking)?;
    ledger.move_balance(fee_holder, pair_holder, plan.to_swap)?;
    ledger.in_swap = true;

    Ok(plan)
}

/// Sells to the pair, buys and deposits dividends, and adds liquidity.
/// A sell that returns nothing ends the sweep with nothing distributed;
/// the tokens already moved stay with the pair. With no shareholders the
/// dividend lamports stay in the vault. Clears `in_swap`.
pub fn finish_sweep<V: SwapVenue>(
    venue: &mut V,
    ledger: &mut Ledger,
    fee_holder: &mut HolderAccount,
    pair_holder: &mut HolderAccount,
    distributor: &mut Distributor,
    plan: &SwapBackPlan,
) -> Result<SweepOutcome> {
    let native_received = if plan.to_swap > 0 {
        venue.swap(plan.to_swap, Asset::Ledger, Asset::Native)?
    } else {
        0
    };

    if native_received == 0 {
        ledger.in_swap = false;
        return Ok(SweepOutcome::default());
    }

    let split = ledger.split_native(plan, native_received)?;
    let mut retained = split.buyback;

    // =========================================================================
    // Dividends
    // =========================================================================

    let mut to_dividends = 0u64;
    if split.reflection > 0 && distributor.total_shares > 0 {
        let reward_out = venue.swap(split.reflection, Asset::Native, Asset::Reward)?;
        if reward_out > 0 {
            distributor.deposit(reward_out)?;
            to_dividends = reward_out;

            emit!(DividendDeposited {
                amount: reward_out,
                total_shares: distributor.total_shares,
                dividends_per_share: distributor.dividends_per_share,
            });
        }
    } else {
        retained = add(retained, split.reflection)?;
    }

    // =========================================================================
    // Liquidity
    // =========================================================================

    let mut to_liquidity = 0u64;
    if plan.to_liquify > 0 && split.liquidity > 0 {
        ledger.move_balance(fee_holder, pair_holder, plan.to_liquify)?;
        venue.add_liquidity(plan.to_liquify, split.liquidity)?;
        to_liquidity = split.liquidity;
    } else {
        retained = add(retained, split.liquidity)?;
    }

    ledger.in_swap = false;

    Ok(SweepOutcome {
        native_received,
        to_dividends,
        to_liquidity,
        to_marketing: split.marketing,
        retained,
    })
}

pub fn handler_swap_back(mut ctx: Context<SwapBack>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let ledger_key = ctx.accounts.ledger.key();

    require_keys_neq!(
        ctx.accounts.staking_holder.key(),
        ctx.accounts.fee_holder.key(),
        TokenError::InvalidReceiver
    );
    require_keys_neq!(
        ctx.accounts.staking_holder.key(),
        ctx.accounts.pair_holder.key(),
        TokenError::InvalidReceiver
    );

    // =========================================================================
    // Effects: token-side split
    // =========================================================================

    let dead_balance = ctx.accounts.dead_holder.balance;
    let accounts = &mut ctx.accounts;
    let plan = begin_sweep(
        &mut accounts.ledger,
        &mut accounts.fee_holder,
        &mut accounts.pair_holder,
        &mut accounts.staking_holder,
        dead_balance,
    )?;

    let staking_holder_key = accounts.staking_holder.key();
    let staking_payout =
        accounts
            .distributor
            .sync_holder(staking_holder_key, &mut accounts.staking_holder, now)?;

    accounts.ledger.exit(&crate::ID)?;

    pay_dividend(
        &accounts.distributor,
        &accounts.reward_vault,
        accounts.staking_reward_account.as_deref(),
        &accounts.token_program,
        staking_holder_key,
        accounts.staking_holder.owner,
        staking_payout,
    )?;

    // =========================================================================
    // Interactions: AMM legs
    // =========================================================================

    let amm_program = accounts.amm_program.to_account_info();
    let amm_pool = accounts.amm_pool.to_account_info();
    let native_vault = accounts.native_vault.to_account_info();
    let reward_vault = accounts.reward_vault.to_account_info();
    let liquidity_receiver = accounts.liquidity_receiver.to_account_info();
    let token_program = accounts.token_program.to_account_info();
    let system_program_info = accounts.system_program.to_account_info();
    let native_vault_bump = accounts.ledger.native_vault_bump;
    let native_vault_seeds: &[&[u8]] = &[NATIVE_VAULT_SEED, ledger_key.as_ref(), &[native_vault_bump]];

    let mut venue = AmmCpi {
        amm_program: &amm_program,
        amm_pool: &amm_pool,
        native_vault: &native_vault,
        reward_vault: &reward_vault,
        liquidity_receiver: &liquidity_receiver,
        token_program: &token_program,
        system_program: &system_program_info,
        native_vault_seeds,
    };

    let outcome = finish_sweep(
        &mut venue,
        &mut accounts.ledger,
        &mut accounts.fee_holder,
        &mut accounts.pair_holder,
        &mut accounts.distributor,
        &plan,
    )?;

    if outcome.native_received == 0 {
        msg!("Fee sweep: swap returned nothing, distribution skipped");
        return Ok(());
    }

    // =========================================================================
    // Marketing
    // =========================================================================

    if outcome.to_marketing > 0 {
        system_program::transfer(
            CpiContext::new_with_signer(
                system_program_info.clone(),
                system_program::Transfer {
                    from: native_vault.clone(),
                    to: accounts.marketing_receiver.to_account_info(),
                },
                &[native_vault_seeds],
            ),
            outcome.to_marketing,
        )?;
    }

    emit!(SwapBackExecuted {
        tokens_swapped: plan.to_swap,
        native_received: outcome.native_received,
        to_staking: plan.to_staking,
        to_liquidity: outcome.to_liquidity,
        to_dividends: outcome.to_dividends,
        to_marketing: outcome.to_marketing,
        retained_for_buyback: outcome.retained,
    });

    msg!(
        "Fee sweep: {} tokens -> {} lamports",
        plan.to_swap,
        outcome.native_received
    );
    msg!(
        "Staking {} tokens, dividends {}, marketing {}, liquidity {}, buyback reserve {}",
        plan.to_staking,
        outcome.to_dividends,
        outcome.to_marketing,
        outcome.to_liquidity,
        outcome.retained
    );

    Ok(())
}
