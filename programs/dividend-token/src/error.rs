// =============================================================================
// Dividend Token Error Codes
// =============================================================================

use anchor_lang::prelude::*;

/// Every failure the program can report. Any error aborts the whole
/// instruction, so no partial state change is ever observable.
#[error_code]
pub enum TokenError {
    // =========================================================================
    // Ledger
    // =========================================================================

    #[msg("Insufficient balance for transfer")]
    InsufficientBalance,

    #[msg("Transfer amount exceeds allowance")]
    InsufficientAllowance,

    /// Neither side of a pre-launch transfer is fee-exempt
    #[msg("Trading is not enabled yet")]
    TradingNotEnabled,

    #[msg("Trading is already enabled")]
    AlreadyEnabled,

    #[msg("Amount must be greater than zero")]
    InvalidAmount,

    #[msg("Source and destination must differ")]
    SelfTransfer,

    #[msg("Holder account does not belong to this ledger")]
    InvalidHolder,

    // =========================================================================
    // Fee configuration
    // =========================================================================

    /// Fee categories sum past the denominator, or the denominator is zero
    #[msg("Invalid fee schedule")]
    InvalidFeeConfig,

    #[msg("Invalid sell multiplier")]
    InvalidMultiplier,

    #[msg("Invalid target liquidity")]
    InvalidTargetLiquidity,

    // =========================================================================
    // Authorization
    // =========================================================================

    #[msg("Caller is not authorized")]
    Unauthorized,

    #[msg("Authorized caller set is full")]
    AuthorizedListFull,

    // =========================================================================
    // Fee sweep
    // =========================================================================

    /// A transfer arrived while a sweep was calling out to the AMM
    #[msg("Fee sweep in progress")]
    SwapInProgress,

    #[msg("Fee sweep threshold not reached or sweep disabled")]
    SwapBackNotReady,

    #[msg("AMM program does not match ledger configuration")]
    InvalidAmmProgram,

    #[msg("AMM did not report an output amount")]
    AmmReturnDataMissing,

    #[msg("Native vault balance too low")]
    InsufficientNativeBalance,

    #[msg("Receiver does not match ledger configuration")]
    InvalidReceiver,

    // =========================================================================
    // Dividends
    // =========================================================================

    /// Rewards deposited while nobody holds shares would be unattributable
    #[msg("No shares to distribute to")]
    NoShares,

    #[msg("Reward token account required for dividend settlement")]
    RewardAccountRequired,

    #[msg("Reward token account does not match holder or mint")]
    InvalidRewardAccount,

    #[msg("Remaining accounts do not match the payout cursor")]
    CursorAccountMismatch,

    // =========================================================================
    // Staking
    // =========================================================================

    #[msg("Stake would exceed pool capacity")]
    CapacityExceeded,

    #[msg("Stake has not reached maturity")]
    NotMature,

    #[msg("No active stake in this pool")]
    NoActiveStake,

    #[msg("Pool reward budget exhausted")]
    RewardBudgetExhausted,

    #[msg("Invalid pool configuration")]
    InvalidPoolConfig,

    #[msg("Penalty exceeds the allowed maximum")]
    InvalidPenalty,

    /// Custody only holds principal and budgets already committed
    #[msg("Not enough unallocated custody balance")]
    InsufficientSurplus,

    // =========================================================================
    // Vesting
    // =========================================================================

    #[msg("Invalid tranche schedule")]
    InvalidTrancheSchedule,

    #[msg("Invalid index range")]
    InvalidRange,

    #[msg("Vesting instance accounts do not match")]
    InvalidVestingInstance,

    // =========================================================================
    // Math
    // =========================================================================

    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Math underflow")]
    MathUnderflow,

    #[msg("Division by zero")]
    DivisionByZero,
}
