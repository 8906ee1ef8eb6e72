// =============================================================================
// Vesting Instructions
// =============================================================================
// Each instance escrows its allocation in a holder account owned by the
// instance PDA. That holder is fee-exempt but earns dividends, which are
// forwarded to the beneficiary together with each vested release.
//
// The batched instructions take their instances as remaining accounts, in
// index order:
//
//   start_multiple_vesting      [instance]
//   process_multiple_instances  [instance, instance_holder,
//                                beneficiary_holder, beneficiary_record,
//                                beneficiary_reward_account]
// =============================================================================

use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::constants::*;
use crate::error::TokenError;
use crate::events::{VestingCreated, VestingReleased, VestingStarted};
use crate::instructions::payout::pay_dividend;
use crate::math::add;
use crate::state::{
    BeneficiaryRecord, Distributor, HolderAccount, Ledger, VestingInstance, VestingManager,
};

const PROCESS_ACCOUNTS_PER_INSTANCE: usize = 5;

// =============================================================================
// Initialize / Admin
// =============================================================================

/// Accounts required for initialize_vesting instruction
#[derive(Accounts)]
pub struct InitializeVesting<'info> {
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
        init,
        payer = admin,
        space = 8 + VestingManager::INIT_SPACE,
        seeds = [VESTING_MANAGER_SEED, ledger.key().as_ref()],
        bump
    )]
    pub vesting_manager: Box<Account<'info, VestingManager>>,

    pub system_program: Program<'info, System>,
}

pub fn handler_initialize_vesting(ctx: Context<InitializeVesting>) -> Result<()> {
    let manager = &mut ctx.accounts.vesting_manager;
    manager.ledger = ctx.accounts.ledger.key();
    manager.tranche_count = DEFAULT_TRANCHE_COUNT;
    manager.tranche_interval = DEFAULT_TRANCHE_INTERVAL;
    manager.bump = ctx.bumps.vesting_manager;

    msg!("Vesting manager initialized: {}", manager.key());
    msg!(
        "Schedule: {} tranche(s) every {}s",
        manager.tranche_count,
        manager.tranche_interval
    );
    Ok(())
}

/// Accounts required for set_tranche_schedule instruction
#[derive(Accounts)]
pub struct VestingAdmin<'info> {
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
        seeds = [VESTING_MANAGER_SEED, ledger.key().as_ref()],
        bump = vesting_manager.bump
    )]
    pub vesting_manager: Box<Account<'info, VestingManager>>,
}

pub fn handler_set_tranche_schedule(
    ctx: Context<VestingAdmin>,
    tranche_count: u8,
    tranche_interval: i64,
) -> Result<()> {
    ctx.accounts
        .vesting_manager
        .set_tranche_schedule(tranche_count, tranche_interval)?;
    msg!(
        "Tranche schedule: {} tranche(s) every {}s",
        tranche_count,
        tranche_interval
    );
    Ok(())
}

// =============================================================================
// Create Instance
// =============================================================================

/// Accounts required for create_vesting_instance instruction
#[derive(Accounts)]
#[instruction(beneficiary: Pubkey)]
pub struct CreateVestingInstance<'info> {
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
        seeds = [VESTING_MANAGER_SEED, ledger.key().as_ref()],
        bump = vesting_manager.bump
    )]
    pub vesting_manager: Box<Account<'info, VestingManager>>,

    #[account(
        init,
        payer = admin,
        space = 8 + VestingInstance::INIT_SPACE,
        seeds = [
            VESTING_SEED,
            vesting_manager.key().as_ref(),
            &vesting_manager.instance_count.to_le_bytes()
        ],
        bump
    )]
    pub instance: Box<Account<'info, VestingInstance>>,

    #[account(
        init,
        payer = admin,
        space = 8 + HolderAccount::INIT_SPACE,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), instance.key().as_ref()],
        bump
    )]
    pub instance_holder: Box<Account<'info, HolderAccount>>,

    #[account(
        init_if_needed,
        payer = admin,
        space = 8 + BeneficiaryRecord::INIT_SPACE,
        seeds = [BENEFICIARY_SEED, vesting_manager.key().as_ref(), beneficiary.as_ref()],
        bump
    )]
    pub beneficiary_record: Box<Account<'info, BeneficiaryRecord>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, ledger.key().as_ref(), admin.key().as_ref()],
        bump = admin_holder.bump
    )]
    pub admin_holder: Box<Account<'info, HolderAccount>>,

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

pub fn handler_create_vesting_instance(
    mut ctx: Context<CreateVestingInstance>,
    beneficiary: Pubkey,
    total_amount: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let ledger_key = ctx.accounts.ledger.key();
    let manager_key = ctx.accounts.vesting_manager.key();
    let instance_key = ctx.accounts.instance.key();
    let admin = ctx.accounts.admin.key();

    require!(total_amount > 0, TokenError::InvalidAmount);
    require_keys_neq!(beneficiary, Pubkey::default(), TokenError::InvalidHolder);
    require_keys_neq!(beneficiary, instance_key, TokenError::InvalidHolder);

    let accounts = &mut ctx.accounts;
    let manager = &mut accounts.vesting_manager;
    let index = manager.next_instance_index()?;
    let tranches = VestingInstance::build_tranches(
        total_amount,
        manager.tranche_count,
        manager.tranche_interval,
    )?;
    manager.total_allocated = add(manager.total_allocated, total_amount)?;

    let instance = &mut accounts.instance;
    instance.manager = manager_key;
    instance.index = index;
    instance.beneficiary = beneficiary;
    instance.total_vested = total_amount;
    instance.tranches = tranches;
    instance.bump = ctx.bumps.instance;

    let record = &mut accounts.beneficiary_record;
    if record.manager == Pubkey::default() {
        record.manager = manager_key;
        record.beneficiary = beneficiary;
        record.bump = ctx.bumps.beneficiary_record;
    }
    record.record_instance(total_amount)?;

    // Custody: fee-exempt, still dividend-eligible
    let instance_holder = &mut accounts.instance_holder;
    instance_holder.open(ledger_key, instance_key, ctx.bumps.instance_holder);
    instance_holder.is_fee_exempt = true;

    accounts.ledger.move_balance(
        &mut accounts.admin_holder,
        &mut accounts.instance_holder,
        total_amount,
    )?;

    let admin_holder_key = accounts.admin_holder.key();
    let instance_holder_key = accounts.instance_holder.key();
    let admin_payout =
        accounts
            .distributor
            .sync_holder(admin_holder_key, &mut accounts.admin_holder, now)?;
    accounts
        .distributor
        .sync_holder(instance_holder_key, &mut accounts.instance_holder, now)?;

    pay_dividend(
        &accounts.distributor,
        &accounts.reward_vault,
        accounts.admin_reward_account.as_deref(),
        &accounts.token_program,
        admin_holder_key,
        admin,
        admin_payout,
    )?;

    emit!(VestingCreated {
        instance: instance_key,
        index,
        beneficiary,
        total_vested: total_amount,
    });
    msg!(
        "Vesting instance {} for {}: {} over {} tranche(s)",
        index,
        beneficiary,
        total_amount,
        accounts.instance.tranches.len()
    );
    Ok(())
}

// =============================================================================
// Start
// =============================================================================

/// Accounts required for start_multiple_vesting instruction
#[derive(Accounts)]
pub struct StartMultipleVesting<'info> {
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
        seeds = [VESTING_MANAGER_SEED, ledger.key().as_ref()],
        bump = vesting_manager.bump
    )]
    pub vesting_manager: Box<Account<'info, VestingManager>>,
}

/// Already-started instances are left untouched.
pub fn handler_start_multiple_vesting<'info>(
    ctx: Context<'_, '_, 'info, 'info, StartMultipleVesting<'info>>,
    from_index: u32,
    to_index: u32,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let manager = &ctx.accounts.vesting_manager;
    manager.check_range(from_index, to_index)?;

    let count = (to_index - from_index) as usize + 1;
    require!(
        ctx.remaining_accounts.len() == count,
        TokenError::InvalidVestingInstance
    );

    let mut started = 0u32;
    for (offset, info) in ctx.remaining_accounts.iter().enumerate() {
        let mut instance: Account<'info, VestingInstance> = Account::try_from(info)?;
        check_instance(&instance, manager.key(), from_index, offset)?;

        if instance.start(now)? {
            instance.exit(&crate::ID)?;
            started += 1;
            emit!(VestingStarted {
                instance: instance.key(),
                start_time: now,
            });
        }
    }

    msg!(
        "Vesting started for {} of {} instances ({}..={})",
        started,
        count,
        from_index,
        to_index
    );
    Ok(())
}

// =============================================================================
// Process
// =============================================================================

/// Accounts required for process_multiple_instances instruction
#[derive(Accounts)]
pub struct ProcessMultipleInstances<'info> {
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
        seeds = [VESTING_MANAGER_SEED, ledger.key().as_ref()],
        bump = vesting_manager.bump
    )]
    pub vesting_manager: Box<Account<'info, VestingManager>>,

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

/// Releases every claimable tranche in range to its beneficiary and forwards
/// the dividends the escrow earned.
pub fn handler_process_multiple_instances<'info>(
    mut ctx: Context<'_, '_, 'info, 'info, ProcessMultipleInstances<'info>>,
    from_index: u32,
    to_index: u32,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let remaining = ctx.remaining_accounts;
    let accounts = &mut ctx.accounts;
    let ledger_key = accounts.ledger.key();
    let manager_key = accounts.vesting_manager.key();

    accounts.vesting_manager.check_range(from_index, to_index)?;
    let count = (to_index - from_index) as usize + 1;
    require!(
        remaining.len() == count * PROCESS_ACCOUNTS_PER_INSTANCE,
        TokenError::InvalidVestingInstance
    );

    let mut released_total = 0u64;
    let mut forwarded_total = 0u64;

    for (offset, group) in remaining
        .chunks_exact(PROCESS_ACCOUNTS_PER_INSTANCE)
        .enumerate()
    {
        let mut instance: Account<'info, VestingInstance> = Account::try_from(&group[0])?;
        check_instance(&instance, manager_key, from_index, offset)?;

        let mut instance_holder: Account<'info, HolderAccount> = Account::try_from(&group[1])?;
        require_keys_eq!(instance_holder.ledger, ledger_key, TokenError::InvalidHolder);
        require_keys_eq!(instance_holder.owner, instance.key(), TokenError::InvalidHolder);

        let mut beneficiary_holder: Account<'info, HolderAccount> =
            Account::try_from(&group[2])?;
        require_keys_eq!(beneficiary_holder.ledger, ledger_key, TokenError::InvalidHolder);
        require_keys_eq!(
            beneficiary_holder.owner,
            instance.beneficiary,
            TokenError::InvalidHolder
        );

        let mut beneficiary_record: Account<'info, BeneficiaryRecord> =
            Account::try_from(&group[3])?;
        require_keys_eq!(beneficiary_record.manager, manager_key, TokenError::InvalidVestingInstance);
        require_keys_eq!(
            beneficiary_record.beneficiary,
            instance.beneficiary,
            TokenError::InvalidVestingInstance
        );

        let beneficiary_reward_account = Account::<'info, TokenAccount>::try_from(&group[4]).ok();

        // =====================================================================
        // Effects
        // =====================================================================

        let instance_holder_key = instance_holder.key();
        let beneficiary_holder_key = beneficiary_holder.key();

        let release = instance.release(
            &accounts.ledger,
            &mut accounts.distributor,
            instance_holder_key,
            &mut instance_holder,
            beneficiary_holder_key,
            &mut beneficiary_holder,
            now,
        )?;
        beneficiary_record.record_release(&release)?;

        instance.exit(&crate::ID)?;
        instance_holder.exit(&crate::ID)?;
        beneficiary_holder.exit(&crate::ID)?;
        beneficiary_record.exit(&crate::ID)?;

        // =====================================================================
        // Interactions
        // =====================================================================

        pay_dividend(
            &accounts.distributor,
            &accounts.reward_vault,
            beneficiary_reward_account.as_ref(),
            &accounts.token_program,
            instance_holder_key,
            instance.beneficiary,
            release.escrow_dividends,
        )?;
        pay_dividend(
            &accounts.distributor,
            &accounts.reward_vault,
            beneficiary_reward_account.as_ref(),
            &accounts.token_program,
            beneficiary_holder_key,
            instance.beneficiary,
            release.beneficiary_dividends,
        )?;

        let dividends = add(release.escrow_dividends, release.beneficiary_dividends)?;
        if release.amount > 0 || dividends > 0 {
            emit!(VestingReleased {
                instance: instance.key(),
                beneficiary: instance.beneficiary,
                amount: release.amount,
                dividends,
            });
        }

        released_total = add(released_total, release.amount)?;
        forwarded_total = add(forwarded_total, dividends)?;
    }

    msg!(
        "Processed vesting {}..={}: released {}, dividends forwarded {}",
        from_index,
        to_index,
        released_total,
        forwarded_total
    );
    Ok(())
}

fn check_instance(
    instance: &VestingInstance,
    manager: Pubkey,
    from_index: u32,
    offset: usize,
) -> Result<()> {
    require_keys_eq!(instance.manager, manager, TokenError::InvalidVestingInstance);
    let expected = (from_index as usize)
        .checked_add(offset)
        .ok_or(TokenError::MathOverflow)?;
    require!(
        instance.index as usize == expected,
        TokenError::InvalidVestingInstance
    );
    Ok(())
}
