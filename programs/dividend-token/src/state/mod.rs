pub mod distributor;
pub mod holder;
pub mod ledger;
pub mod staking;
pub mod vesting;

pub use distributor::*;
pub use holder::*;
pub use ledger::*;
pub use staking::*;
pub use vesting::*;
