// =============================================================================
// Staking Instructions
// =============================================================================
// Principal and denomination-A rewards are ledger balances held in the
// engine's custody holder; denomination B is minted by the engine. Every
// instruction settles ledger and share state first, then pays out.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::*;
use crate::error::TokenError;
use crate::events::{PoolCreated, PoolFunded, StakeClaimed, StakeCreated, StakeWithdrawnEarly};
use crate::instructions::payout::{mint_bonus, pay_dividend};
use crate::math::{add, sub};
use crate::state::{
    Distributor, HolderAccount, Ledger, PoolConfig, StakePool, StakePosition, Staker,
    StakingEngine,
};

// =============================================================================
// Initialize Staking
// =============================================================================

/// Accounts required for initialize_staking instruction
#[derive(Accounts)]
pub struct InitializeStaking<'info> {
    #[account(
        mut,
        constraint = ledger.is_authorized(&admin.key()) @ TokenError::Unauthorized
    )]
    pub admin: Signer<'info>,

    #[account(
        mut,
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        init,
        payer = admin,
        space = 8 + StakingEngine::INIT_SPACE,
        seeds = [STAKING_SEED, ledger.key().as_ref()],
        bump
    )]
    pub staking_engine: Box<Account<'info, StakingEngine>>,

    /// Engine custody for principal and denomination-A rewards
    #[account(
        init,
        payer = admin,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), staking_engine.key().as_ref()],
        bump
    )]
    pub engine_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        init,
        payer = admin,
        seeds = [BONUS_MINT_SEED, staking_engine.key().as_ref()],
        bump,
        mint::decimals = BONUS_DECIMALS,
        mint::authority = staking_engine
    )]
    pub bonus_mint: Box<Account<'info, Mint>>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_initialize_staking(ctx: Context<InitializeStaking>) -> Result<()> {
    let ledger_key = ctx.accounts.ledger.key();
    let engine_key = ctx.accounts.staking_engine.key();

    let engine = &mut ctx.accounts.staking_engine;
    engine.ledger = ledger_key;
    engine.bonus_mint = ctx.accounts.bonus_mint.key();
    engine.penalty_bps = DEFAULT_PENALTY_BPS;
    engine.bump = ctx.bumps.staking_engine;
    engine.bonus_mint_bump = ctx.bumps.bonus_mint;

    let engine_holder = &mut ctx.accounts.engine_holder;
    engine_holder.open(ledger_key, engine_key, ctx.bumps.engine_holder);
    engine_holder.is_fee_exempt = true;
    engine_holder.is_dividend_exempt = true;

    // Sweep top-ups land in engine custody from now on
    ctx.accounts.ledger.staking_receiver = engine_key;

    msg!("Staking engine initialized: {}", engine_key);
    msg!("Bonus mint: {}", ctx.accounts.bonus_mint.key());
    Ok(())
}

// =============================================================================
// Admin
// =============================================================================

/// Accounts required for set_penalty instruction
#[derive(Accounts)]
pub struct StakingAdmin<'info> {
    #[account(
        constraint = ledger.is_authorized(&admin.key()) @ TokenError::Unauthorized
    )]
    pub admin: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, ledger.key().as_ref()],
        bump = staking_engine.bump
    )]
    pub staking_engine: Box<Account<'info, StakingEngine>>,
}

pub fn handler_set_penalty(ctx: Context<StakingAdmin>, penalty_bps: u16) -> Result<()> {
    ctx.accounts.staking_engine.set_penalty(penalty_bps)?;
    msg!("Early-exit penalty set to {} bps", penalty_bps);
    Ok(())
}

/// Accounts required for fund_pool instruction
#[derive(Accounts)]
pub struct FundPool<'info> {
    #[account(
        constraint = ledger.is_authorized(&admin.key()) @ TokenError::Unauthorized
    )]
    pub admin: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, ledger.key().as_ref()],
        bump = staking_engine.bump
    )]
    pub staking_engine: Box<Account<'info, StakingEngine>>,

    #[account(
        mut,
        seeds = [POOL_SEED, staking_engine.key().as_ref(), &pool.index.to_le_bytes()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, StakePool>>,

    #[account(
        seeds = [HOLDER_SEED, ledger.key().as_ref(), staking_engine.key().as_ref()],
        bump = engine_holder.bump
    )]
    pub engine_holder: Box<Account<'info, HolderAccount>>,
}

/// Moves swept staking fees and retained penalties into a pool's
/// denomination-A budget. No tokens move; they are already in custody.
pub fn handler_fund_pool(mut ctx: Context<FundPool>, amount: u64) -> Result<()> {
    let custody = ctx.accounts.engine_holder.balance;
    let accounts = &mut ctx.accounts;

    accounts
        .staking_engine
        .fund_pool(&mut accounts.pool, custody, amount)?;

    emit!(PoolFunded {
        pool: accounts.pool.key(),
        amount,
        reward_budget_a: accounts.pool.reward_budget_a,
    });
    msg!(
        "Pool {} budget A raised by {} to {}. Custody surplus left: {}",
        accounts.pool.index,
        amount,
        accounts.pool.reward_budget_a,
        accounts.staking_engine.surplus(custody)
    );
    Ok(())
}

// =============================================================================
// Create Pool
// =============================================================================

/// Accounts required for create_pool instruction
///
/// The admin funds `reward_budget_a` from their own ledger balance into
/// engine custody.
#[derive(Accounts)]
pub struct CreatePool<'info> {
    #[account(
        mut,
        constraint = ledger.is_authorized(&admin.key()) @ TokenError::Unauthorized
    )]
    pub admin: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, ledger.key().as_ref()],
        bump = staking_engine.bump
    )]
    pub staking_engine: Box<Account<'info, StakingEngine>>,

    #[account(
        init,
        payer = admin,
        space = 8 + StakePool::INIT_SPACE,
        seeds = [
            POOL_SEED,
            staking_engine.key().as_ref(),
            &staking_engine.pool_count.to_le_bytes()
        ],
        bump
    )]
    pub pool: Box<Account<'info, StakePool>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), admin.key().as_ref()],
        bump = admin_holder.bump
    )]
    pub admin_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), staking_engine.key().as_ref()],
        bump = engine_holder.bump
    )]
    pub engine_holder: Box<Account<'info, HolderAccount>>,

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
    pub admin_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_create_pool(mut ctx: Context<CreatePool>, config: PoolConfig) -> Result<()> {
    let clock = Clock::get()?;
    let engine_key = ctx.accounts.staking_engine.key();
    let pool_key = ctx.accounts.pool.key();
    let admin = ctx.accounts.admin.key();

    let accounts = &mut ctx.accounts;
    let index = accounts.staking_engine.next_pool_index()?;
    accounts
        .pool
        .configure(engine_key, index, &config, clock.unix_timestamp, ctx.bumps.pool)?;
    accounts.staking_engine.commit_reward_a(config.reward_budget_a)?;

    // Fund denomination-A rewards
    accounts.ledger.move_balance(
        &mut accounts.admin_holder,
        &mut accounts.engine_holder,
        config.reward_budget_a,
    )?;
    let admin_holder_key = accounts.admin_holder.key();
    let payout = accounts.distributor.sync_holder(
        admin_holder_key,
        &mut accounts.admin_holder,
        clock.unix_timestamp,
    )?;

    pay_dividend(
        &accounts.distributor,
        &accounts.reward_vault,
        accounts.admin_reward_account.as_deref(),
        &accounts.token_program,
        admin_holder_key,
        admin,
        payout,
    )?;

    emit!(PoolCreated {
        pool: pool_key,
        index,
        lock_duration: config.lock_duration,
        capacity: config.capacity,
    });
    msg!(
        "Pool {} created: lock {}s, capacity {}, rates {}/{} over {}",
        index,
        config.lock_duration,
        config.capacity,
        config.rate_a,
        config.rate_b,
        config.precision_divisor
    );
    msg!(
        "Budgets: {} A funded, {} B mintable",
        config.reward_budget_a,
        config.reward_budget_b
    );
    Ok(())
}

// =============================================================================
// Create Stake
// =============================================================================

/// Accounts required for create_stake instruction
#[derive(Accounts)]
pub struct CreateStake<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, ledger.key().as_ref()],
        bump = staking_engine.bump
    )]
    pub staking_engine: Box<Account<'info, StakingEngine>>,

    #[account(
        mut,
        seeds = [POOL_SEED, staking_engine.key().as_ref(), &pool.index.to_le_bytes()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, StakePool>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + StakePosition::INIT_SPACE,
        seeds = [STAKE_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub stake: Box<Account<'info, StakePosition>>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + Staker::INIT_SPACE,
        seeds = [STAKER_SEED, staking_engine.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub staker: Box<Account<'info, Staker>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), owner.key().as_ref()],
        bump = owner_holder.bump
    )]
    pub owner_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), staking_engine.key().as_ref()],
        bump = engine_holder.bump
    )]
    pub engine_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [BONUS_MINT_SEED, staking_engine.key().as_ref()],
        bump = staking_engine.bonus_mint_bump
    )]
    pub bonus_mint: Box<Account<'info, Mint>>,

    /// Receives the denomination-B part of a restake settlement
    #[account(
        mut,
        token::mint = bonus_mint,
        token::authority = owner
    )]
    pub owner_bonus_account: Box<Account<'info, TokenAccount>>,

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
    pub owner_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_create_stake(mut ctx: Context<CreateStake>, amount: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();
    let pool_key = ctx.accounts.pool.key();
    let engine_key = ctx.accounts.staking_engine.key();

    let accounts = &mut ctx.accounts;

    if accounts.stake.pool == Pubkey::default() {
        accounts.stake.pool = pool_key;
        accounts.stake.owner = owner;
        accounts.stake.bump = ctx.bumps.stake;
    }
    if accounts.staker.engine == Pubkey::default() {
        accounts.staker.engine = engine_key;
        accounts.staker.owner = owner;
        accounts.staker.bump = ctx.bumps.staker;
    }

    // =========================================================================
    // Effects
    // =========================================================================

    let settlement = accounts.pool.stake(&mut accounts.stake, amount, now)?;
    accounts.staker.record_stake(amount)?;
    let engine = &mut accounts.staking_engine;
    engine.total_principal = add(engine.total_principal, amount)?;
    engine.spend_reward_a(settlement.a)?;

    accounts
        .ledger
        .move_balance(&mut accounts.owner_holder, &mut accounts.engine_holder, amount)?;
    if settlement.a > 0 {
        accounts.ledger.move_balance(
            &mut accounts.engine_holder,
            &mut accounts.owner_holder,
            settlement.a,
        )?;
    }

    let owner_holder_key = accounts.owner_holder.key();
    let payout = accounts
        .distributor
        .sync_holder(owner_holder_key, &mut accounts.owner_holder, now)?;

    // =========================================================================
    // Interactions
    // =========================================================================

    pay_dividend(
        &accounts.distributor,
        &accounts.reward_vault,
        accounts.owner_reward_account.as_deref(),
        &accounts.token_program,
        owner_holder_key,
        owner,
        payout,
    )?;
    mint_bonus(
        &accounts.staking_engine,
        &accounts.bonus_mint,
        &accounts.owner_bonus_account,
        &accounts.token_program,
        settlement.b,
    )?;

    emit!(StakeCreated {
        pool: pool_key,
        owner,
        amount,
        total_amount: accounts.stake.amount,
        settled_a: settlement.a,
        settled_b: settlement.b,
    });
    msg!(
        "Staked {} in pool {}. Position: {}, pool total: {} / {}",
        amount,
        accounts.pool.index,
        accounts.stake.amount,
        accounts.pool.total_staked,
        accounts.pool.capacity
    );
    if settlement.a > 0 || settlement.b > 0 {
        msg!("Restake settled {} A, {} B", settlement.a, settlement.b);
    }
    Ok(())
}

// =============================================================================
// Claim / Emergency Withdraw
// =============================================================================

/// Accounts required for claim_stake and emergency_withdraw instructions
#[derive(Accounts)]
pub struct ReleaseStake<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [LEDGER_SEED, ledger.creator.as_ref()],
        bump = ledger.bump
    )]
    pub ledger: Box<Account<'info, Ledger>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, ledger.key().as_ref()],
        bump = staking_engine.bump
    )]
    pub staking_engine: Box<Account<'info, StakingEngine>>,

    #[account(
        mut,
        seeds = [POOL_SEED, staking_engine.key().as_ref(), &pool.index.to_le_bytes()],
        bump = pool.bump
    )]
    pub pool: Box<Account<'info, StakePool>>,

    #[account(
        mut,
        seeds = [STAKE_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump = stake.bump
    )]
    pub stake: Box<Account<'info, StakePosition>>,

    #[account(
        mut,
        seeds = [STAKER_SEED, staking_engine.key().as_ref(), owner.key().as_ref()],
        bump = staker.bump
    )]
    pub staker: Box<Account<'info, Staker>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), owner.key().as_ref()],
        bump = owner_holder.bump
    )]
    pub owner_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), staking_engine.key().as_ref()],
        bump = engine_holder.bump
    )]
    pub engine_holder: Box<Account<'info, HolderAccount>>,

    /// Only needed by claim_stake when denomination B is owed
    #[account(
        mut,
        seeds = [BONUS_MINT_SEED, staking_engine.key().as_ref()],
        bump = staking_engine.bonus_mint_bump
    )]
    pub bonus_mint: Option<Box<Account<'info, Mint>>>,

    #[account(mut)]
    pub owner_bonus_account: Option<Box<Account<'info, TokenAccount>>>,

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
    pub owner_reward_account: Option<Box<Account<'info, TokenAccount>>>,

    pub token_program: Program<'info, Token>,
}

impl<'info> ReleaseStake<'info> {
    /// Returns `amount` of ledger tokens from custody to the owner and
    /// settles the owner's dividend share.
    fn release_to_owner(&mut self, amount: u64, now: i64) -> Result<()> {
        self.ledger
            .move_balance(&mut self.engine_holder, &mut self.owner_holder, amount)?;

        let owner_holder_key = self.owner_holder.key();
        let payout = self
            .distributor
            .sync_holder(owner_holder_key, &mut self.owner_holder, now)?;

        pay_dividend(
            &self.distributor,
            &self.reward_vault,
            self.owner_reward_account.as_deref(),
            &self.token_program,
            owner_holder_key,
            self.owner.key(),
            payout,
        )
    }
}

/// Matured claim: principal plus both rewards.
pub fn handler_claim_stake(mut ctx: Context<ReleaseStake>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();
    let accounts = &mut ctx.accounts;

    let release = accounts.pool.claim(&mut accounts.stake, now)?;
    accounts.staker.record_release(release.principal)?;
    let engine = &mut accounts.staking_engine;
    engine.total_principal = sub(engine.total_principal, release.principal)?;
    engine.spend_reward_a(release.rewards.a)?;

    let to_owner = add(release.principal, release.rewards.a)?;
    accounts.release_to_owner(to_owner, now)?;

    if release.rewards.b > 0 {
        let bonus_mint = accounts
            .bonus_mint
            .as_deref()
            .ok_or(TokenError::RewardAccountRequired)?;
        let owner_bonus_account = accounts
            .owner_bonus_account
            .as_deref()
            .ok_or(TokenError::RewardAccountRequired)?;
        require_keys_eq!(owner_bonus_account.owner, owner, TokenError::InvalidRewardAccount);
        require_keys_eq!(
            owner_bonus_account.mint,
            bonus_mint.key(),
            TokenError::InvalidRewardAccount
        );

        mint_bonus(
            &accounts.staking_engine,
            bonus_mint,
            owner_bonus_account,
            &accounts.token_program,
            release.rewards.b,
        )?;
    }

    emit!(StakeClaimed {
        pool: accounts.pool.key(),
        owner,
        principal: release.principal,
        reward_a: release.rewards.a,
        reward_b: release.rewards.b,
    });
    msg!(
        "Claimed pool {}: principal {}, rewards {} A / {} B",
        accounts.pool.index,
        release.principal,
        release.rewards.a,
        release.rewards.b
    );
    Ok(())
}

/// Exit at any time. Accrual is forfeited and the penalty stays in custody.
pub fn handler_emergency_withdraw(mut ctx: Context<ReleaseStake>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let owner = ctx.accounts.owner.key();
    let accounts = &mut ctx.accounts;
    let penalty_bps = accounts.staking_engine.penalty_bps;

    let release = accounts
        .pool
        .emergency_withdraw(&mut accounts.stake, now, penalty_bps)?;
    let unlocked = add(release.principal, release.penalty)?;

    accounts.staker.record_release(unlocked)?;
    let engine = &mut accounts.staking_engine;
    engine.total_principal = sub(engine.total_principal, unlocked)?;
    engine.penalties_retained = add(engine.penalties_retained, release.penalty)?;

    accounts.release_to_owner(release.principal, now)?;

    emit!(StakeWithdrawnEarly {
        pool: accounts.pool.key(),
        owner,
        principal: release.principal,
        penalty: release.penalty,
    });
    msg!(
        "Emergency withdraw from pool {}: {} returned, {} penalty retained",
        accounts.pool.index,
        release.principal,
        release.penalty
    );
    Ok(())
}
