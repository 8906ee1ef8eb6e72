// =============================================================================
// Ledger State
// =============================================================================
// Supply, fee schedule, launch window and the authorized-caller set for the
// ledger asset. Balances live in `HolderAccount`s; every balance change goes
// through the methods below so the sum of all balances stays equal to
// `total_supply`.
// =============================================================================

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::TokenError;
use crate::math::{add, mul_div, sub};
use crate::state::HolderAccount;

/// Fee categories, each a numerator over `fee_denominator`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct FeeSchedule {
    pub liquidity_fee: u16,
    pub buyback_fee: u16,
    pub reflection_fee: u16,
    pub marketing_fee: u16,
    pub staking_fee: u16,
    pub fee_denominator: u16,
}

impl FeeSchedule {
    pub fn launch_default() -> Self {
        Self {
            liquidity_fee: DEFAULT_LIQUIDITY_FEE,
            buyback_fee: DEFAULT_BUYBACK_FEE,
            reflection_fee: DEFAULT_REFLECTION_FEE,
            marketing_fee: DEFAULT_MARKETING_FEE,
            staking_fee: DEFAULT_STAKING_FEE,
            fee_denominator: DEFAULT_FEE_DENOMINATOR,
        }
    }

    pub fn total_fee(&self) -> u64 {
        self.liquidity_fee as u64
            + self.buyback_fee as u64
            + self.reflection_fee as u64
            + self.marketing_fee as u64
            + self.staking_fee as u64
    }

    pub fn validate(&self) -> Result<()> {
        require!(self.fee_denominator > 0, TokenError::InvalidFeeConfig);
        require!(
            self.total_fee() <= self.fee_denominator as u64,
            TokenError::InvalidFeeConfig
        );
        Ok(())
    }
}

/// Elevated tax for the first `protected_slots` slots after launch.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct AntiSnipeWindow {
    pub launch_slot: u64,
    pub protected_slots: u64,
    /// Over BPS_DENOMINATOR
    pub heavy_tax_bps: u16,
}

impl AntiSnipeWindow {
    pub fn is_active(&self, slot: u64) -> bool {
        slot < self.launch_slot.saturating_add(self.protected_slots)
    }
}

/// What a taxed transfer did to the three balances involved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    pub received: u64,
    pub fee: u64,
    /// The fee holding crossed the sweep threshold on this transfer
    pub sweep_ready: bool,
}

/// Token-side split of one fee sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapBackPlan {
    pub amount: u64,
    pub to_staking: u64,
    pub to_liquify: u64,
    pub to_swap: u64,
    /// Liquidity fee in effect for this sweep, 0 while over-liquified
    pub liquidity_fee: u64,
}

/// Native-side split of one fee sweep. `buyback` is the remainder and stays
/// in the native vault for manual buybacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeSplit {
    pub liquidity: u64,
    pub reflection: u64,
    pub marketing: u64,
    pub buyback: u64,
}

/// Ledger singleton
/// PDA: ["ledger", creator]
#[account]
#[derive(InitSpace, Default)]
pub struct Ledger {
    // =========================================================================
    // Roles
    // =========================================================================

    /// Seed of this PDA; unchanged by ownership transfers
    pub creator: Pubkey,

    pub owner: Pubkey,

    /// Callers allowed to change configuration. The owner is always included.
    #[max_len(8)]
    pub authorized: Vec<Pubkey>,

    // =========================================================================
    // Supply & Fees
    // =========================================================================

    pub total_supply: u64,
    pub decimals: u8,
    pub fees: FeeSchedule,
    pub sell_multiplier_enabled: bool,
    pub sell_multiplier: u16,

    /// Lifetime fees credited to the fee holding
    pub total_fees_collected: u64,

    // =========================================================================
    // Launch
    // =========================================================================

    pub trading_enabled: bool,
    pub anti_snipe: AntiSnipeWindow,

    // =========================================================================
    // Fee Sweep
    // =========================================================================

    /// Owner key of the designated liquidity pair holder
    pub pair: Pubkey,
    pub amm_program: Pubkey,
    pub swap_enabled: bool,
    pub swap_threshold: u64,
    pub target_liquidity: u16,
    pub target_liquidity_denominator: u16,

    /// Receives LP tokens minted by `add_liquidity`
    pub liquidity_receiver: Pubkey,
    /// Wallet paid the marketing share in lamports
    pub marketing_receiver: Pubkey,
    /// Owner key of the holder topped up with the staking share
    pub staking_receiver: Pubkey,

    /// Set while a sweep or buyback is calling out to the AMM
    pub in_swap: bool,

    /// Lifetime ledger tokens bought back into the dead holder
    pub total_bought_back: u64,

    pub bump: u8,
    pub native_vault_bump: u8,
}

impl Ledger {
    // =========================================================================
    // Authorization
    // =========================================================================

    pub fn is_authorized(&self, key: &Pubkey) -> bool {
        *key == self.owner || self.authorized.contains(key)
    }

    pub fn authorize(&mut self, key: Pubkey) -> Result<()> {
        if self.authorized.contains(&key) {
            return Ok(());
        }
        require!(
            self.authorized.len() < MAX_AUTHORIZED,
            TokenError::AuthorizedListFull
        );
        self.authorized.push(key);
        Ok(())
    }

    pub fn revoke(&mut self, key: &Pubkey) -> Result<()> {
        require!(*key != self.owner, TokenError::Unauthorized);
        self.authorized.retain(|k| k != key);
        Ok(())
    }

    pub fn transfer_ownership(&mut self, new_owner: Pubkey) -> Result<()> {
        let previous = self.owner;
        self.authorized.retain(|k| *k != previous);
        self.owner = new_owner;
        self.authorize(new_owner)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn enable_trading(&mut self, slot: u64, protected_slots: u64, heavy_tax_bps: u16) -> Result<()> {
        require!(!self.trading_enabled, TokenError::AlreadyEnabled);
        require!(heavy_tax_bps <= BPS_DENOMINATOR, TokenError::InvalidFeeConfig);

        self.trading_enabled = true;
        self.anti_snipe = AntiSnipeWindow {
            launch_slot: slot,
            protected_slots,
            heavy_tax_bps,
        };
        Ok(())
    }

    pub fn set_fees(&mut self, fees: FeeSchedule) -> Result<()> {
        fees.validate()?;
        self.fees = fees;
        Ok(())
    }

    pub fn set_sell_multiplier(&mut self, enabled: bool, multiplier: u16) -> Result<()> {
        require!(
            (1..=MAX_SELL_MULTIPLIER).contains(&multiplier),
            TokenError::InvalidMultiplier
        );
        self.sell_multiplier_enabled = enabled;
        self.sell_multiplier = multiplier;
        Ok(())
    }

    pub fn set_target_liquidity(&mut self, target: u16, denominator: u16) -> Result<()> {
        require!(denominator > 0, TokenError::InvalidTargetLiquidity);
        self.target_liquidity = target;
        self.target_liquidity_denominator = denominator;
        Ok(())
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Rate applied to a taxed transfer as (numerator, denominator).
    /// The anti-snipe tax replaces the schedule while its window is open.
    pub fn fee_rate(&self, is_sell: bool, slot: u64) -> (u64, u64) {
        if self.anti_snipe.is_active(slot) {
            return (self.anti_snipe.heavy_tax_bps as u64, BPS_DENOMINATOR as u64);
        }

        let denominator = self.fees.fee_denominator as u64;
        let mut numerator = self.fees.total_fee();
        if is_sell && self.sell_multiplier_enabled {
            numerator = numerator
                .saturating_mul(self.sell_multiplier as u64)
                .min(denominator);
        }
        (numerator, denominator)
    }

    /// Only trades against a pair are taxed, and never when either side is
    /// exempt.
    pub fn compute_fee(
        &self,
        amount: u64,
        from: &HolderAccount,
        to: &HolderAccount,
        slot: u64,
    ) -> Result<u64> {
        if from.is_fee_exempt || to.is_fee_exempt {
            return Ok(0);
        }
        if !from.is_amm_pair && !to.is_amm_pair {
            return Ok(0);
        }

        let (numerator, denominator) = self.fee_rate(to.is_amm_pair, slot);
        if numerator == 0 {
            return Ok(0);
        }
        mul_div(amount, numerator, denominator)
    }

    pub fn transfer(
        &mut self,
        from: &mut HolderAccount,
        to: &mut HolderAccount,
        fee_holder: &mut HolderAccount,
        amount: u64,
        slot: u64,
    ) -> Result<TransferOutcome> {
        require!(!self.in_swap, TokenError::SwapInProgress);
        require!(
            self.trading_enabled || from.is_fee_exempt || to.is_fee_exempt,
            TokenError::TradingNotEnabled
        );
        require!(from.balance >= amount, TokenError::InsufficientBalance);

        let fee = self.compute_fee(amount, from, to, slot)?;
        let received = sub(amount, fee)?;

        from.debit(amount)?;
        to.credit(received)?;
        if fee > 0 {
            fee_holder.credit(fee)?;
            self.total_fees_collected = add(self.total_fees_collected, fee)?;
        }

        Ok(TransferOutcome {
            received,
            fee,
            sweep_ready: fee > 0 && self.should_swap_back(fee_holder.balance),
        })
    }

    /// Untaxed move between two holders. Used for custody moves by the
    /// staking engine, vesting manager and fee sweep.
    pub fn move_balance(
        &self,
        from: &mut HolderAccount,
        to: &mut HolderAccount,
        amount: u64,
    ) -> Result<()> {
        from.debit(amount)?;
        to.credit(amount)
    }

    pub fn circulating_supply(&self, dead_balance: u64) -> Result<u64> {
        sub(self.total_supply, dead_balance)
    }

    // =========================================================================
    // Fee Sweep
    // =========================================================================

    pub fn should_swap_back(&self, held: u64) -> bool {
        self.swap_enabled && !self.in_swap && held > self.swap_threshold
    }

    /// `accuracy * pair_balance * 2 / circulating`
    pub fn liquidity_backing(&self, accuracy: u64, pair_balance: u64, dead_balance: u64) -> Result<u64> {
        let circulating = self.circulating_supply(dead_balance)?;
        if circulating == 0 {
            return Ok(0);
        }
        let doubled = pair_balance
            .checked_mul(2)
            .ok_or(TokenError::MathOverflow)?;
        mul_div(accuracy, doubled, circulating)
    }

    pub fn is_over_liquified(&self, pair_balance: u64, dead_balance: u64) -> Result<bool> {
        let backing = self.liquidity_backing(
            self.target_liquidity_denominator as u64,
            pair_balance,
            dead_balance,
        )?;
        Ok(backing > self.target_liquidity as u64)
    }

    /// Splits `swap_threshold` tokens of the fee holding into the staking
    /// top-up, the token half of the liquidity add and the amount to sell.
    pub fn plan_swap_back(&self, over_liquified: bool) -> Result<SwapBackPlan> {
        let total_fee = self.fees.total_fee();
        require!(total_fee > 0, TokenError::InvalidFeeConfig);

        let amount = self.swap_threshold;
        let liquidity_fee = if over_liquified {
            0
        } else {
            self.fees.liquidity_fee as u64
        };

        let to_staking = mul_div(amount, self.fees.staking_fee as u64, total_fee)?;
        let to_liquify = mul_div(amount, liquidity_fee, total_fee)? / 2;
        let to_swap = sub(sub(amount, to_staking)?, to_liquify)?;

        Ok(SwapBackPlan {
            amount,
            to_staking,
            to_liquify,
            to_swap,
            liquidity_fee,
        })
    }

    /// Divides the native proceeds of a sweep by fee weight. The staking
    /// share was paid in tokens and half the liquidity share is still in
    /// tokens, so both are taken out of the weight total.
    pub fn split_native(&self, plan: &SwapBackPlan, native_out: u64) -> Result<NativeSplit> {
        let native_fee_total = self
            .fees
            .total_fee()
            .saturating_sub(plan.liquidity_fee / 2)
            .saturating_sub(self.fees.staking_fee as u64);

        if native_fee_total == 0 {
            return Ok(NativeSplit {
                liquidity: 0,
                reflection: 0,
                marketing: 0,
                buyback: native_out,
            });
        }

        let liquidity = mul_div(native_out, plan.liquidity_fee, native_fee_total)? / 2;
        let reflection = mul_div(native_out, self.fees.reflection_fee as u64, native_fee_total)?;
        let marketing = mul_div(native_out, self.fees.marketing_fee as u64, native_fee_total)?;
        let buyback = sub(sub(sub(native_out, liquidity)?, reflection)?, marketing)?;

        Ok(NativeSplit {
            liquidity,
            reflection,
            marketing,
            buyback,
        })
    }
}
