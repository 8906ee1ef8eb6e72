// =============================================================================
// Instructions Module
// =============================================================================

// Ledger
pub mod admin;
pub mod initialize;
pub mod open_holder;
pub mod transfer;

// Fee sweep
pub mod buyback;
pub mod swap_back;

// Dividends
pub mod dividends;
pub mod payout;

// Staking and vesting
pub mod staking;
pub mod vesting;

pub mod views;

// The #[derive(Accounts)] macro generates helper types that need to be at crate root
pub use admin::*;
pub use buyback::*;
pub use dividends::*;
pub use initialize::*;
pub use open_holder::*;
pub use staking::*;
pub use swap_back::*;
pub use transfer::*;
pub use vesting::*;
pub use views::*;
