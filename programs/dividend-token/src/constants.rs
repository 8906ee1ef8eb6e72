// =============================================================================
// Dividend Token Constants
// =============================================================================
// Seeds, precision factors and the launch defaults for the fee schedule,
// dividend distributor, staking engine and vesting manager. Anything that can
// change after launch lives in account state and is only seeded from here.
// =============================================================================

use anchor_lang::prelude::*;

// =============================================================================
// PDA SEEDS
// =============================================================================

/// Ledger singleton: ["ledger", creator]
pub const LEDGER_SEED: &[u8] = b"ledger";

/// Per-owner balance record: ["holder", ledger, owner]
pub const HOLDER_SEED: &[u8] = b"holder";

/// Spending approval: ["allowance", ledger, owner, spender]
pub const ALLOWANCE_SEED: &[u8] = b"allowance";

/// Lamport vault that receives swap proceeds: ["native_vault", ledger]
pub const NATIVE_VAULT_SEED: &[u8] = b"native_vault";

/// Dividend distributor: ["distributor", ledger]
pub const DISTRIBUTOR_SEED: &[u8] = b"distributor";

/// Reward-asset token account owned by the distributor: ["reward_vault", distributor]
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault";

/// Staking engine: ["staking", ledger]
pub const STAKING_SEED: &[u8] = b"staking";

/// Second reward denomination mint, authority = staking engine: ["bonus_mint", staking]
pub const BONUS_MINT_SEED: &[u8] = b"bonus_mint";

/// Staking pool by creation index: ["pool", staking, index_le]
pub const POOL_SEED: &[u8] = b"pool";

/// Stake position: ["stake", pool, owner]
pub const STAKE_SEED: &[u8] = b"stake";

/// Per-holder staking totals across pools: ["staker", staking, owner]
pub const STAKER_SEED: &[u8] = b"staker";

/// Vesting manager: ["vesting_manager", ledger]
pub const VESTING_MANAGER_SEED: &[u8] = b"vesting_manager";

/// Vesting instance by creation index: ["vesting", manager, index_le]
pub const VESTING_SEED: &[u8] = b"vesting";

/// Per-beneficiary vesting totals: ["beneficiary", manager, beneficiary]
pub const BENEFICIARY_SEED: &[u8] = b"beneficiary";

// =============================================================================
// LEDGER ASSET
// =============================================================================

pub const TOKEN_DECIMALS: u8 = 6;

/// 20B tokens minted to the creator at initialization
pub const INITIAL_SUPPLY: u64 = 20_000_000_000 * 1_000_000;

/// Burn destination. Nobody can sign for it, so anything credited here is
/// out of circulation for good.
pub const DEAD_ADDRESS: Pubkey = Pubkey::new_from_array([
    0xde, 0xad, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xde, 0xad, 0x00,
]);

// =============================================================================
// FEE CONFIGURATION
// =============================================================================
// Launch schedule sums to 2000 / 10000 = 20% on taxed transfers.

pub const DEFAULT_LIQUIDITY_FEE: u16 = 200;
pub const DEFAULT_BUYBACK_FEE: u16 = 100;
pub const DEFAULT_REFLECTION_FEE: u16 = 1500;
pub const DEFAULT_MARKETING_FEE: u16 = 100;
pub const DEFAULT_STAKING_FEE: u16 = 100;
pub const DEFAULT_FEE_DENOMINATOR: u16 = 10000;

/// Denominator for anti-snipe tax and staking penalties
pub const BPS_DENOMINATOR: u16 = 10000;

/// Upper bound on the sell multiplier
pub const MAX_SELL_MULTIPLIER: u16 = 5;

/// Fee-holding balance that arms the sweep (1M tokens)
pub const DEFAULT_SWAP_THRESHOLD: u64 = INITIAL_SUPPLY / 20_000;

/// Liquidity backing target: 25 / 100
pub const DEFAULT_TARGET_LIQUIDITY: u16 = 25;
pub const DEFAULT_TARGET_LIQUIDITY_DENOMINATOR: u16 = 100;

/// Size of the authorized-caller set (owner included)
pub const MAX_AUTHORIZED: usize = 8;

// =============================================================================
// DIVIDEND DISTRIBUTOR
// =============================================================================

/// Fixed-point scale of the dividend-per-share accumulator (10^18)
pub const DIVIDEND_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Capacity of the payout-cursor set. Keep in sync with `#[max_len]` on
/// `Distributor::shareholders`.
pub const MAX_SHAREHOLDERS: usize = 200;

pub const DEFAULT_MIN_PERIOD: i64 = 0;
pub const DEFAULT_MIN_DISTRIBUTION: u64 = 0;

// =============================================================================
// STAKING ENGINE
// =============================================================================

/// Early-exit penalty at the moment a stake is opened (10%)
pub const DEFAULT_PENALTY_BPS: u16 = 1000;
pub const MAX_PENALTY_BPS: u16 = 5000;

pub const BONUS_DECIMALS: u8 = 6;

// =============================================================================
// VESTING
// =============================================================================

/// Keep in sync with `#[max_len]` on `VestingInstance::tranches`
pub const MAX_TRANCHES: u8 = 12;

pub const DEFAULT_TRANCHE_COUNT: u8 = 1;
pub const DEFAULT_TRANCHE_INTERVAL: i64 = 30 * 24 * 60 * 60;

// =============================================================================
// EXTERNAL AMM
// =============================================================================

/// Instruction discriminators of the AMM program's `swap` and `add_liquidity`
pub const AMM_SWAP_DISCRIMINATOR: [u8; 8] = [248, 198, 158, 145, 225, 117, 135, 200];
pub const AMM_ADD_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [181, 157, 89, 67, 143, 182, 52, 72];
