use anchor_lang::prelude::*;

// =============================================================================
// Ledger Events
// =============================================================================

#[event]
pub struct LedgerInitialized {
    pub ledger: Pubkey,
    pub owner: Pubkey,
    pub total_supply: u64,
    pub timestamp: i64,
}

#[event]
pub struct TradingEnabled {
    pub launch_slot: u64,
    pub protected_slots: u64,
    pub heavy_tax_bps: u16,
}

#[event]
pub struct FeesUpdated {
    pub liquidity_fee: u16,
    pub buyback_fee: u16,
    pub reflection_fee: u16,
    pub marketing_fee: u16,
    pub staking_fee: u16,
    pub fee_denominator: u16,
}

#[event]
pub struct FeeCollected {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: u64,
    pub fee: u64,
}

/// The fee holding crossed the sweep threshold; `swap_back` can run
#[event]
pub struct SwapBackReady {
    pub held: u64,
    pub threshold: u64,
}

#[event]
pub struct SwapBackExecuted {
    pub tokens_swapped: u64,
    pub native_received: u64,
    pub to_staking: u64,
    pub to_liquidity: u64,
    pub to_dividends: u64,
    pub to_marketing: u64,
    pub retained_for_buyback: u64,
}

#[event]
pub struct BuybackExecuted {
    pub native_spent: u64,
    pub tokens_burned: u64,
}

// =============================================================================
// Dividend Events
// =============================================================================

#[event]
pub struct DividendDeposited {
    pub amount: u64,
    pub total_shares: u64,
    pub dividends_per_share: u128,
}

#[event]
pub struct DividendPaid {
    pub holder: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
}

// =============================================================================
// Staking Events
// =============================================================================

#[event]
pub struct PoolCreated {
    pub pool: Pubkey,
    pub index: u32,
    pub lock_duration: i64,
    pub capacity: u64,
}

#[event]
pub struct PoolFunded {
    pub pool: Pubkey,
    pub amount: u64,
    pub reward_budget_a: u64,
}

#[event]
pub struct StakeCreated {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub total_amount: u64,
    pub settled_a: u64,
    pub settled_b: u64,
}

#[event]
pub struct StakeClaimed {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub principal: u64,
    pub reward_a: u64,
    pub reward_b: u64,
}

#[event]
pub struct StakeWithdrawnEarly {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub principal: u64,
    pub penalty: u64,
}

// =============================================================================
// Vesting Events
// =============================================================================

#[event]
pub struct VestingCreated {
    pub instance: Pubkey,
    pub index: u32,
    pub beneficiary: Pubkey,
    pub total_vested: u64,
}

#[event]
pub struct VestingStarted {
    pub instance: Pubkey,
    pub start_time: i64,
}

#[event]
pub struct VestingReleased {
    pub instance: Pubkey,
    pub beneficiary: Pubkey,
    pub amount: u64,
    pub dividends: u64,
}
