// ============================================================================
// UNIT TESTS FOR THE DIVIDEND TOKEN PROGRAM
// ============================================================================
//
// Exercises the accounting on the state structs directly; no validator.
// Run with: cargo test --lib
//
// Test Categories:
// 1. Ledger - fee rates, launch window, exemptions, conservation
// 2. Fee Sweep - plan/split arithmetic and sweeps against a mock AMM
// 3. Distributor - reward-per-share accounting and the payout cursor
// 4. Staking - accrual, capacity, restake settlement, maturity, penalty
// 5. Vesting - tranche tables, activation, releases, forwarded dividends
// ============================================================================

#[cfg(test)]
mod tests {
    use anchor_lang::error::{Error, ERROR_CODE_OFFSET};
    use anchor_lang::prelude::*;

    use crate::amm::{Asset, SwapVenue};
    use crate::constants::*;
    use crate::error::TokenError;
    use crate::instructions::swap_back::{begin_sweep, finish_sweep, SweepOutcome};
    use crate::state::*;

    const SUPPLY: u64 = 1_000_000;

    fn assert_token_error<T: std::fmt::Debug>(result: Result<T>, expected: TokenError) {
        match result {
            Err(Error::AnchorError(err)) => assert_eq!(
                err.error_code_number,
                ERROR_CODE_OFFSET + expected as u32,
                "expected {:?}, got {}",
                expected,
                err.error_name
            ),
            other => panic!("expected {:?}, got {:?}", expected, other),
        }
    }

    fn new_ledger() -> Ledger {
        let owner = Pubkey::new_unique();
        Ledger {
            creator: owner,
            owner,
            authorized: vec![owner],
            total_supply: SUPPLY,
            decimals: TOKEN_DECIMALS,
            fees: FeeSchedule::launch_default(),
            sell_multiplier: 1,
            swap_enabled: true,
            swap_threshold: 10_000,
            target_liquidity: DEFAULT_TARGET_LIQUIDITY,
            target_liquidity_denominator: DEFAULT_TARGET_LIQUIDITY_DENOMINATOR,
            ..Default::default()
        }
    }

    /// Trading enabled with an already-expired anti-snipe window
    fn launched_ledger() -> Ledger {
        let mut ledger = new_ledger();
        ledger.enable_trading(0, 0, 0).unwrap();
        ledger
    }

    fn wallet(balance: u64) -> HolderAccount {
        HolderAccount {
            ledger: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            balance,
            ..Default::default()
        }
    }

    fn pair(balance: u64) -> HolderAccount {
        HolderAccount {
            is_amm_pair: true,
            is_dividend_exempt: true,
            ..wallet(balance)
        }
    }

    fn fee_holding() -> HolderAccount {
        HolderAccount {
            is_fee_exempt: true,
            is_dividend_exempt: true,
            ..wallet(0)
        }
    }

    // ========================================================================
    // 1. LEDGER
    // ========================================================================

    mod ledger_tests {
        use super::*;

        #[test]
        fn test_launch_window_buy_pays_heavy_tax() {
            let mut ledger = new_ledger();
            ledger.enable_trading(100, 10, 9_500).unwrap();

            let mut lp = pair(1_000);
            let mut buyer = wallet(0);
            let mut fees = fee_holding();

            let outcome = ledger
                .transfer(&mut lp, &mut buyer, &mut fees, 100, 105)
                .unwrap();

            assert_eq!(outcome.fee, 95);
            assert_eq!(outcome.received, 5);
            assert_eq!(buyer.balance, 5);
            assert_eq!(fees.balance, 95);
        }

        #[test]
        fn test_standard_tax_after_window_expires() {
            let mut ledger = new_ledger();
            ledger.enable_trading(100, 10, 9_500).unwrap();

            let mut lp = pair(1_000);
            let mut buyer = wallet(0);
            let mut fees = fee_holding();

            // Window is [100, 110)
            let outcome = ledger
                .transfer(&mut lp, &mut buyer, &mut fees, 100, 110)
                .unwrap();

            assert_eq!(outcome.fee, 20);
            assert_eq!(buyer.balance, 80);
            assert_eq!(fees.balance, 20);
            assert_eq!(ledger.total_fees_collected, 20);
        }

        #[test]
        fn test_transfer_conserves_supply() {
            let mut ledger = launched_ledger();
            let mut lp = pair(400_000);
            let mut alice = wallet(350_000);
            let mut bob = wallet(250_000);
            let mut fees = fee_holding();

            ledger.transfer(&mut lp, &mut alice, &mut fees, 12_345, 1).unwrap();
            ledger.transfer(&mut alice, &mut lp, &mut fees, 50_000, 2).unwrap();
            ledger.transfer(&mut alice, &mut bob, &mut fees, 7_777, 3).unwrap();
            ledger.transfer(&mut bob, &mut lp, &mut fees, 99_999, 4).unwrap();

            let total = lp.balance + alice.balance + bob.balance + fees.balance;
            assert_eq!(total, SUPPLY);
            assert_eq!(fees.balance, ledger.total_fees_collected);
        }

        #[test]
        fn test_wallet_transfers_are_untaxed() {
            let mut ledger = launched_ledger();
            let mut alice = wallet(1_000);
            let mut bob = wallet(0);
            let mut fees = fee_holding();

            let outcome = ledger
                .transfer(&mut alice, &mut bob, &mut fees, 1_000, 1)
                .unwrap();

            assert_eq!(outcome.fee, 0);
            assert_eq!(bob.balance, 1_000);
            assert_eq!(fees.balance, 0);
        }

        #[test]
        fn test_fee_exempt_side_is_untaxed() {
            let mut ledger = launched_ledger();
            let mut lp = pair(1_000);
            let mut treasury = HolderAccount {
                is_fee_exempt: true,
                ..wallet(0)
            };
            let mut fees = fee_holding();

            let outcome = ledger
                .transfer(&mut lp, &mut treasury, &mut fees, 500, 1)
                .unwrap();
            assert_eq!(outcome.fee, 0);
            assert_eq!(treasury.balance, 500);
        }

        #[test]
        fn test_sell_multiplier_applies_to_sells_only() {
            let mut ledger = launched_ledger();
            ledger.set_sell_multiplier(true, 2).unwrap();

            let mut lp = pair(10_000);
            let mut alice = wallet(10_000);
            let mut fees = fee_holding();

            let sell = ledger.transfer(&mut alice, &mut lp, &mut fees, 1_000, 1).unwrap();
            assert_eq!(sell.fee, 400);

            let buy = ledger.transfer(&mut lp, &mut alice, &mut fees, 1_000, 2).unwrap();
            assert_eq!(buy.fee, 200);
        }

        #[test]
        fn test_sell_multiplier_rate_capped_at_denominator() {
            let mut ledger = launched_ledger();
            ledger.set_sell_multiplier(true, MAX_SELL_MULTIPLIER).unwrap();

            let (numerator, denominator) = ledger.fee_rate(true, 1);
            assert_eq!(numerator, denominator);
        }

        #[test]
        fn test_invalid_sell_multiplier() {
            let mut ledger = launched_ledger();
            assert_token_error(ledger.set_sell_multiplier(true, 0), TokenError::InvalidMultiplier);
            assert_token_error(
                ledger.set_sell_multiplier(true, MAX_SELL_MULTIPLIER + 1),
                TokenError::InvalidMultiplier,
            );
        }

        #[test]
        fn test_trading_not_enabled() {
            let mut ledger = new_ledger();
            let mut alice = wallet(1_000);
            let mut bob = wallet(0);
            let mut fees = fee_holding();

            let result = ledger.transfer(&mut alice, &mut bob, &mut fees, 100, 1);
            assert_token_error(result, TokenError::TradingNotEnabled);
            assert_eq!(alice.balance, 1_000);

            // Exempt senders can seed liquidity before launch
            alice.is_fee_exempt = true;
            ledger.transfer(&mut alice, &mut bob, &mut fees, 100, 1).unwrap();
            assert_eq!(bob.balance, 100);
        }

        #[test]
        fn test_enable_trading_twice() {
            let mut ledger = new_ledger();
            ledger.enable_trading(5, 3, 9_900).unwrap();
            assert_token_error(ledger.enable_trading(6, 3, 9_900), TokenError::AlreadyEnabled);
            assert_eq!(ledger.anti_snipe.launch_slot, 5);
        }

        #[test]
        fn test_insufficient_balance() {
            let mut ledger = launched_ledger();
            let mut alice = wallet(10);
            let mut bob = wallet(0);
            let mut fees = fee_holding();

            let result = ledger.transfer(&mut alice, &mut bob, &mut fees, 11, 1);
            assert_token_error(result, TokenError::InsufficientBalance);
        }

        #[test]
        fn test_transfer_rejected_during_swap() {
            let mut ledger = launched_ledger();
            ledger.in_swap = true;
            let mut alice = wallet(10);
            let mut bob = wallet(0);
            let mut fees = fee_holding();

            let result = ledger.transfer(&mut alice, &mut bob, &mut fees, 1, 1);
            assert_token_error(result, TokenError::SwapInProgress);
        }

        #[test]
        fn test_fee_schedule_validation() {
            let mut ledger = launched_ledger();

            let too_high = FeeSchedule {
                reflection_fee: 9_900,
                ..FeeSchedule::launch_default()
            };
            assert_token_error(ledger.set_fees(too_high), TokenError::InvalidFeeConfig);

            let zero_denominator = FeeSchedule {
                fee_denominator: 0,
                ..FeeSchedule::launch_default()
            };
            assert_token_error(ledger.set_fees(zero_denominator), TokenError::InvalidFeeConfig);

            assert_eq!(ledger.fees, FeeSchedule::launch_default());
            assert_eq!(ledger.fees.total_fee(), 2_000);
        }

        #[test]
        fn test_sweep_ready_when_threshold_crossed() {
            let mut ledger = launched_ledger();
            let mut lp = pair(100_000);
            let mut buyer = wallet(0);
            let mut fees = HolderAccount {
                balance: 9_990,
                ..fee_holding()
            };

            let outcome = ledger.transfer(&mut lp, &mut buyer, &mut fees, 100, 1).unwrap();
            assert_eq!(outcome.fee, 20);
            assert!(outcome.sweep_ready);

            ledger.swap_enabled = false;
            let outcome = ledger.transfer(&mut lp, &mut buyer, &mut fees, 100, 2).unwrap();
            assert!(!outcome.sweep_ready);
        }

        #[test]
        fn test_authorization_roles() {
            let mut ledger = new_ledger();
            let owner = ledger.owner;
            let ops = Pubkey::new_unique();

            assert!(!ledger.is_authorized(&ops));
            ledger.authorize(ops).unwrap();
            ledger.authorize(ops).unwrap();
            assert!(ledger.is_authorized(&ops));
            assert_eq!(ledger.authorized.len(), 2);

            ledger.revoke(&ops).unwrap();
            assert!(!ledger.is_authorized(&ops));
            assert_token_error(ledger.revoke(&owner), TokenError::Unauthorized);
        }

        #[test]
        fn test_authorized_list_full() {
            let mut ledger = new_ledger();
            for _ in 1..MAX_AUTHORIZED {
                ledger.authorize(Pubkey::new_unique()).unwrap();
            }
            assert_token_error(
                ledger.authorize(Pubkey::new_unique()),
                TokenError::AuthorizedListFull,
            );
        }

        #[test]
        fn test_transfer_ownership() {
            let mut ledger = new_ledger();
            let previous = ledger.owner;
            let next = Pubkey::new_unique();

            ledger.transfer_ownership(next).unwrap();

            assert_eq!(ledger.owner, next);
            assert!(ledger.is_authorized(&next));
            assert!(!ledger.is_authorized(&previous));
            assert_eq!(ledger.creator, previous);
        }

        #[test]
        fn test_ownership_transfer_hands_over_control() {
            let mut ledger = new_ledger();
            let previous = ledger.owner;
            let operator = Pubkey::new_unique();
            ledger.authorize(operator).unwrap();

            ledger.transfer_ownership(Pubkey::new_unique()).unwrap();

            // Pools and vesting are gated on this set, not on who created them
            assert!(!ledger.is_authorized(&previous));
            assert!(ledger.is_authorized(&operator));

            ledger.revoke(&operator).unwrap();
            assert!(!ledger.is_authorized(&operator));
        }

        #[test]
        fn test_circulating_supply_excludes_dead() {
            let ledger = new_ledger();
            assert_eq!(ledger.circulating_supply(0).unwrap(), SUPPLY);
            assert_eq!(ledger.circulating_supply(250_000).unwrap(), 750_000);
        }

        #[test]
        fn test_allowance_spend() {
            let mut allowance = Allowance {
                amount: 100,
                ..Default::default()
            };
            allowance.spend(60).unwrap();
            assert_eq!(allowance.amount, 40);
            assert_token_error(allowance.spend(41), TokenError::InsufficientAllowance);

            let mut unlimited = Allowance {
                amount: u64::MAX,
                ..Default::default()
            };
            unlimited.spend(1_000_000).unwrap();
            assert_eq!(unlimited.amount, u64::MAX);
        }
    }

    // ========================================================================
    // 2. FEE SWEEP
    // ========================================================================

    mod swap_back_tests {
        use super::*;

        /// Fixed-rate venue: 1 token -> `lamports_per_token` lamports,
        /// 2 lamports -> 1 reward
        struct MockVenue {
            lamports_per_token: u64,
            swaps: Vec<(u64, Asset, Asset)>,
            liquidity_adds: Vec<(u64, u64)>,
        }

        impl MockVenue {
            fn new() -> Self {
                Self::with_rate(2)
            }

            fn with_rate(lamports_per_token: u64) -> Self {
                Self {
                    lamports_per_token,
                    swaps: Vec::new(),
                    liquidity_adds: Vec::new(),
                }
            }
        }

        impl SwapVenue for MockVenue {
            fn swap(&mut self, amount_in: u64, asset_in: Asset, asset_out: Asset) -> Result<u64> {
                self.swaps.push((amount_in, asset_in, asset_out));
                Ok(match (asset_in, asset_out) {
                    (Asset::Ledger, Asset::Native) => amount_in * self.lamports_per_token,
                    (Asset::Native, Asset::Reward) => amount_in / 2,
                    (Asset::Native, Asset::Ledger) => amount_in / 2,
                    _ => 0,
                })
            }

            fn add_liquidity(&mut self, token_amount: u64, native_amount: u64) -> Result<u64> {
                self.liquidity_adds.push((token_amount, native_amount));
                Ok(token_amount.min(native_amount))
            }
        }

        #[test]
        fn test_plan_splits_threshold() {
            let ledger = launched_ledger();
            let plan = ledger.plan_swap_back(false).unwrap();

            assert_eq!(plan.amount, 10_000);
            assert_eq!(plan.to_staking, 500);
            assert_eq!(plan.to_liquify, 500);
            assert_eq!(plan.to_swap, 9_000);
            assert_eq!(plan.to_staking + plan.to_liquify + plan.to_swap, plan.amount);
        }

        #[test]
        fn test_plan_skips_liquidity_when_over_liquified() {
            let ledger = launched_ledger();
            let plan = ledger.plan_swap_back(true).unwrap();

            assert_eq!(plan.liquidity_fee, 0);
            assert_eq!(plan.to_liquify, 0);
            assert_eq!(plan.to_swap, 9_500);
        }

        #[test]
        fn test_over_liquified_threshold() {
            let ledger = launched_ledger();
            // 100 * 2 * 200_000 / 1_000_000 = 40 > 25
            assert!(ledger.is_over_liquified(200_000, 0).unwrap());
            // 100 * 2 * 100_000 / 1_000_000 = 20
            assert!(!ledger.is_over_liquified(100_000, 0).unwrap());
        }

        #[test]
        fn test_native_split_sums_to_proceeds() {
            let ledger = launched_ledger();
            let plan = ledger.plan_swap_back(false).unwrap();
            let split = ledger.split_native(&plan, 1_000_000).unwrap();

            assert_eq!(split.reflection, 833_333);
            assert_eq!(split.marketing, 55_555);
            assert_eq!(split.liquidity, 55_555);
            assert_eq!(
                split.liquidity + split.reflection + split.marketing + split.buyback,
                1_000_000
            );
        }

        struct SweepFixture {
            ledger: Ledger,
            fees: HolderAccount,
            lp: HolderAccount,
            staking: HolderAccount,
            distributor: Distributor,
        }

        /// 12_000 tokens in the fee holding against a 50_000 token pair:
        /// 100 * 2 * 50_000 / 1_000_000 = 10, under the liquidity target
        fn fixture() -> SweepFixture {
            let mut ledger = launched_ledger();
            ledger.pair = Pubkey::new_unique();
            SweepFixture {
                ledger,
                fees: HolderAccount {
                    balance: 12_000,
                    ..fee_holding()
                },
                lp: pair(50_000),
                staking: HolderAccount {
                    is_fee_exempt: true,
                    is_dividend_exempt: true,
                    ..wallet(0)
                },
                distributor: Distributor::default(),
            }
        }

        fn sweep(f: &mut SweepFixture, venue: &mut MockVenue) -> Result<SweepOutcome> {
            let plan = begin_sweep(&mut f.ledger, &mut f.fees, &mut f.lp, &mut f.staking, 0)?;
            assert!(f.ledger.in_swap);
            finish_sweep(
                venue,
                &mut f.ledger,
                &mut f.fees,
                &mut f.lp,
                &mut f.distributor,
                &plan,
            )
        }

        #[test]
        fn test_full_sweep_against_mock_venue() {
            let mut f = fixture();
            let mut venue = MockVenue::new();
            let mut alice = wallet(100);
            f.distributor.sync_holder(Pubkey::new_unique(), &mut alice, 0).unwrap();

            let outcome = sweep(&mut f, &mut venue).unwrap();

            // 9_000 sold for 18_000: 15_000 dividends, 1_000 each to
            // liquidity, marketing and the buyback reserve
            assert_eq!(
                outcome,
                SweepOutcome {
                    native_received: 18_000,
                    to_dividends: 7_500,
                    to_liquidity: 1_000,
                    to_marketing: 1_000,
                    retained: 1_000,
                }
            );
            assert_eq!(f.distributor.unpaid_earnings(&alice.share).unwrap(), 7_500);
            assert_eq!(f.fees.balance, 2_000);
            assert_eq!(f.staking.balance, 500);
            assert_eq!(f.lp.balance, 59_500);
            assert_eq!(venue.swaps.len(), 2);
            assert_eq!(venue.liquidity_adds, vec![(500, 1_000)]);
            assert!(!f.ledger.in_swap);
        }

        #[test]
        fn test_zero_output_swap_skips_distribution() {
            let mut f = fixture();
            let mut venue = MockVenue::with_rate(0);
            let mut alice = wallet(100);
            f.distributor.sync_holder(Pubkey::new_unique(), &mut alice, 0).unwrap();

            let outcome = sweep(&mut f, &mut venue).unwrap();

            assert_eq!(outcome, SweepOutcome::default());
            assert!(!f.ledger.in_swap);
            assert_eq!(venue.swaps, vec![(9_000, Asset::Ledger, Asset::Native)]);
            assert!(venue.liquidity_adds.is_empty());
            assert_eq!(f.distributor.total_dividends, 0);

            // Sold tokens stay with the pair, the liquidity half stays put
            assert_eq!(f.fees.balance, 2_500);
            assert_eq!(f.lp.balance, 59_000);
            assert_eq!(f.staking.balance, 500);
            assert_eq!(f.fees.balance + f.lp.balance + f.staking.balance, 62_000);

            // Transfers work again
            let mut bob = wallet(10);
            let mut carol = wallet(0);
            let mut fees = fee_holding();
            f.ledger.transfer(&mut bob, &mut carol, &mut fees, 10, 1).unwrap();
        }

        #[test]
        fn test_sweep_without_shareholders_keeps_dividend_lamports() {
            let mut f = fixture();
            let mut venue = MockVenue::new();

            let outcome = sweep(&mut f, &mut venue).unwrap();

            assert_eq!(outcome.to_dividends, 0);
            assert_eq!(outcome.retained, 16_000);
            assert_eq!(outcome.to_liquidity, 1_000);
            assert_eq!(venue.swaps, vec![(9_000, Asset::Ledger, Asset::Native)]);
            assert_eq!(f.distributor.total_dividends, 0);
            assert_eq!(f.distributor.dividends_per_share, 0);
            assert!(!f.ledger.in_swap);
        }

        #[test]
        fn test_transfers_blocked_mid_sweep() {
            let mut f = fixture();
            begin_sweep(&mut f.ledger, &mut f.fees, &mut f.lp, &mut f.staking, 0).unwrap();

            let mut bob = wallet(10);
            let mut carol = wallet(0);
            let mut fees = fee_holding();
            assert_token_error(
                f.ledger.transfer(&mut bob, &mut carol, &mut fees, 10, 1),
                TokenError::SwapInProgress,
            );
        }

        #[test]
        fn test_sweep_not_due() {
            let mut f = fixture();
            f.fees.balance = 10_000;
            assert_token_error(
                begin_sweep(&mut f.ledger, &mut f.fees, &mut f.lp, &mut f.staking, 0),
                TokenError::SwapBackNotReady,
            );
            assert!(!f.ledger.in_swap);
            assert_eq!(f.fees.balance, 10_000);
        }

        #[test]
        fn test_not_ready_below_threshold_or_in_swap() {
            let mut ledger = launched_ledger();
            assert!(!ledger.should_swap_back(10_000));
            assert!(ledger.should_swap_back(10_001));

            ledger.in_swap = true;
            assert!(!ledger.should_swap_back(10_001));
        }
    }

    // ========================================================================
    // 3. DISTRIBUTOR
    // ========================================================================

    mod distributor_tests {
        use super::*;

        fn registered(distributor: &mut Distributor, balance: u64) -> (Pubkey, HolderAccount) {
            let key = Pubkey::new_unique();
            let mut holder = wallet(balance);
            distributor.sync_holder(key, &mut holder, 0).unwrap();
            (key, holder)
        }

        #[test]
        fn test_proportional_dividends() {
            let mut distributor = Distributor::default();
            let (_, mut alice) = registered(&mut distributor, 300);
            let (_, mut bob) = registered(&mut distributor, 100);
            assert_eq!(distributor.total_shares, 400);

            distributor.deposit(400).unwrap();

            assert_eq!(distributor.unpaid_earnings(&alice.share).unwrap(), 300);
            assert_eq!(distributor.unpaid_earnings(&bob.share).unwrap(), 100);

            assert_eq!(distributor.settle(&mut alice.share, 10).unwrap(), 300);
            assert_eq!(distributor.settle(&mut bob.share, 10).unwrap(), 100);
            assert_eq!(distributor.total_distributed, 400);
        }

        #[test]
        fn test_second_claim_pays_nothing() {
            let mut distributor = Distributor::default();
            let (_, mut alice) = registered(&mut distributor, 1_000);
            distributor.deposit(5_000).unwrap();

            assert_eq!(distributor.settle(&mut alice.share, 1).unwrap(), 5_000);
            assert_eq!(distributor.settle(&mut alice.share, 2).unwrap(), 0);
            assert_eq!(alice.share.last_claim, 1);
        }

        #[test]
        fn test_realised_plus_unpaid_matches_cumulative() {
            let mut distributor = Distributor::default();
            let (_, mut alice) = registered(&mut distributor, 300);
            let (_, _bob) = registered(&mut distributor, 100);

            distributor.deposit(400).unwrap();
            distributor.settle(&mut alice.share, 1).unwrap();
            distributor.deposit(400).unwrap();

            let unpaid = distributor.unpaid_earnings(&alice.share).unwrap();
            let cumulative = distributor.cumulative_dividends(alice.share.amount).unwrap();
            assert_eq!((alice.share.total_realised + unpaid) as u128, cumulative);
            assert_eq!(cumulative, 600);
        }

        #[test]
        fn test_large_holder_joins_after_large_deposit() {
            let mut distributor = Distributor::default();
            let (_, mut early) = registered(&mut distributor, 1_000_000);

            // 1e11 * 1e18 / 1e6 = 1e23 per share
            distributor.deposit(100_000_000_000).unwrap();

            // Baseline 2e15 * 1e23 / 1e18 = 2e20, past u64::MAX
            let (_, mut whale) = registered(&mut distributor, 2_000_000_000_000_000);
            assert_eq!(whale.share.total_excluded, 200_000_000_000_000_000_000);
            assert_eq!(distributor.unpaid_earnings(&whale.share).unwrap(), 0);
            assert_eq!(distributor.settle(&mut early.share, 1).unwrap(), 100_000_000_000);

            distributor.deposit(2_000_001).unwrap();
            assert_eq!(distributor.settle(&mut whale.share, 2).unwrap(), 2_000_000);
        }

        #[test]
        fn test_late_holder_earns_only_new_deposits() {
            let mut distributor = Distributor::default();
            let (_, _alice) = registered(&mut distributor, 100);
            distributor.deposit(1_000).unwrap();

            let (_, carol) = registered(&mut distributor, 100);
            assert_eq!(distributor.unpaid_earnings(&carol.share).unwrap(), 0);

            distributor.deposit(200).unwrap();
            assert_eq!(distributor.unpaid_earnings(&carol.share).unwrap(), 100);
        }

        #[test]
        fn test_deposit_without_shares() {
            let mut distributor = Distributor::default();
            assert_token_error(distributor.deposit(100), TokenError::NoShares);
        }

        #[test]
        fn test_exempt_holder_has_no_share() {
            let mut distributor = Distributor::default();
            let key = Pubkey::new_unique();
            let mut lp = pair(1_000_000);

            assert_eq!(distributor.sync_holder(key, &mut lp, 0).unwrap(), 0);
            assert_eq!(lp.share.amount, 0);
            assert_eq!(distributor.total_shares, 0);
            assert!(distributor.shareholders.is_empty());
        }

        #[test]
        fn test_share_change_settles_first() {
            let mut distributor = Distributor::default();
            let (alice_key, mut alice) = registered(&mut distributor, 300);
            let (_, _bob) = registered(&mut distributor, 100);
            distributor.deposit(400).unwrap();

            // Alice sells out: the settlement is due to her in the same step
            alice.balance = 0;
            let payout = distributor.sync_holder(alice_key, &mut alice, 5).unwrap();

            assert_eq!(payout, 300);
            assert_eq!(distributor.total_shares, 100);
            assert_eq!(distributor.shareholders.len(), 1);
            assert!(!distributor.shareholders.contains(&alice_key));
        }

        #[test]
        fn test_cursor_wraps() {
            let mut distributor = Distributor::default();
            let (k0, _) = registered(&mut distributor, 10);
            let (k1, _) = registered(&mut distributor, 10);
            let (k2, _) = registered(&mut distributor, 10);

            assert_eq!(distributor.next_batch(2), vec![k0, k1]);
            assert_eq!(distributor.payout_cursor, 2);
            assert_eq!(distributor.next_batch(2), vec![k2, k0]);
            assert_eq!(distributor.payout_cursor, 1);

            // Never more than one lap per call
            assert_eq!(distributor.next_batch(10), vec![k1, k2, k0]);
            assert_eq!(distributor.payout_cursor, 1);
        }

        #[test]
        fn test_cursor_resets_after_removal() {
            let mut distributor = Distributor::default();
            let (k0, _) = registered(&mut distributor, 10);
            let (k1, mut h1) = registered(&mut distributor, 10);
            let (k2, _) = registered(&mut distributor, 10);

            distributor.next_batch(2);
            assert_eq!(distributor.payout_cursor, 2);

            h1.balance = 0;
            distributor.sync_holder(k1, &mut h1, 0).unwrap();

            assert_eq!(distributor.shareholders, vec![k0, k2]);
            assert_eq!(distributor.payout_cursor, 0);
        }

        #[test]
        fn test_empty_batch() {
            let mut distributor = Distributor::default();
            assert!(distributor.next_batch(5).is_empty());
            assert_eq!(distributor.payout_cursor, 0);
        }

        #[test]
        fn test_holders_past_capacity_still_accrue() {
            let mut distributor = Distributor::default();
            for _ in 0..MAX_SHAREHOLDERS {
                registered(&mut distributor, 1);
            }
            let (late_key, late) = registered(&mut distributor, 1);

            assert_eq!(distributor.shareholders.len(), MAX_SHAREHOLDERS);
            assert!(!distributor.shareholders.contains(&late_key));
            assert_eq!(distributor.total_shares, MAX_SHAREHOLDERS as u64 + 1);

            distributor.deposit(201).unwrap();
            assert_eq!(distributor.unpaid_earnings(&late.share).unwrap(), 1);
        }

        #[test]
        fn test_distribution_criteria() {
            let mut distributor = Distributor {
                min_period: 3_600,
                min_distribution: 50,
                ..Default::default()
            };
            let (_, mut alice) = registered(&mut distributor, 100);
            let (_, _bob) = registered(&mut distributor, 100);

            distributor.deposit(400).unwrap();
            distributor.settle(&mut alice.share, 1_000).unwrap();

            // 50 owed: not above the minimum
            distributor.deposit(100).unwrap();
            assert!(!distributor.should_distribute(&alice.share, 10_000).unwrap());

            distributor.deposit(100).unwrap();
            assert!(!distributor.should_distribute(&alice.share, 4_599).unwrap());
            assert!(distributor.should_distribute(&alice.share, 4_600).unwrap());
        }
    }

    // ========================================================================
    // 4. STAKING
    // ========================================================================

    mod staking_tests {
        use super::*;

        const LOCK: i64 = 100;

        fn config() -> PoolConfig {
            PoolConfig {
                lock_duration: LOCK,
                reward_budget_a: 1_000_000,
                reward_budget_b: 1_000_000,
                capacity: 1_000,
                rate_a: 10,
                rate_b: 5,
                precision_divisor: 100,
            }
        }

        fn new_pool(config: &PoolConfig) -> StakePool {
            let mut pool = StakePool::default();
            pool.configure(Pubkey::new_unique(), 0, config, 0, 255).unwrap();
            pool
        }

        fn position() -> StakePosition {
            StakePosition {
                pool: Pubkey::new_unique(),
                owner: Pubkey::new_unique(),
                ..Default::default()
            }
        }

        #[test]
        fn test_invalid_pool_config() {
            let mut pool = StakePool::default();
            let zero_lock = PoolConfig {
                lock_duration: 0,
                ..config()
            };
            assert_token_error(
                pool.configure(Pubkey::new_unique(), 0, &zero_lock, 0, 255),
                TokenError::InvalidPoolConfig,
            );

            let zero_divisor = PoolConfig {
                precision_divisor: 0,
                ..config()
            };
            assert_token_error(
                pool.configure(Pubkey::new_unique(), 0, &zero_divisor, 0, 255),
                TokenError::InvalidPoolConfig,
            );
        }

        #[test]
        fn test_linear_accrual_capped_at_lock() {
            let mut pool = new_pool(&config());
            let mut stake = position();
            pool.stake(&mut stake, 500, 0).unwrap();

            let half = pool.current_owed(&stake, 50).unwrap();
            assert_eq!(half, OwedRewards { a: 25, b: 12 });

            let full = pool.current_owed(&stake, LOCK).unwrap();
            assert_eq!(full, OwedRewards { a: 50, b: 25 });

            let later = pool.current_owed(&stake, LOCK * 10).unwrap();
            assert_eq!(later, full);
        }

        #[test]
        fn test_capacity_invariant() {
            let mut pool = new_pool(&config());
            let mut alice = position();
            let mut bob = position();

            pool.stake(&mut alice, 600, 0).unwrap();
            assert_token_error(pool.stake(&mut bob, 500, 0), TokenError::CapacityExceeded);
            pool.stake(&mut bob, 400, 0).unwrap();

            assert_eq!(pool.total_staked, alice.amount + bob.amount);
            assert_eq!(pool.total_staked, pool.capacity);
            assert_eq!(pool.active_stakes, 2);
        }

        #[test]
        fn test_zero_stake_rejected() {
            let mut pool = new_pool(&config());
            let mut stake = position();
            assert_token_error(pool.stake(&mut stake, 0, 0), TokenError::InvalidAmount);
        }

        #[test]
        fn test_restake_settles_and_restarts() {
            let mut pool = new_pool(&config());
            let mut stake = position();
            pool.stake(&mut stake, 500, 0).unwrap();

            let owed_before = pool.current_owed(&stake, 50).unwrap();
            let settlement = pool.stake(&mut stake, 100, 50).unwrap();

            assert_eq!(settlement, owed_before);
            assert_eq!(stake.amount, 600);
            assert_eq!(stake.start_time, 50);
            assert_eq!(stake.accrued_a, 25);
            assert_eq!(stake.accrued_b, 12);
            assert_eq!(pool.reward_paid_a, 25);
            assert_eq!(pool.total_staked, 600);
            assert_eq!(pool.active_stakes, 1);
            assert_eq!(pool.current_owed(&stake, 50).unwrap(), OwedRewards::default());
        }

        #[test]
        fn test_claim_gated_by_maturity() {
            let mut pool = new_pool(&config());
            let mut stake = position();
            pool.stake(&mut stake, 500, 0).unwrap();

            assert_token_error(pool.claim(&mut stake, LOCK - 1), TokenError::NotMature);

            let release = pool.claim(&mut stake, LOCK).unwrap();
            assert_eq!(release.principal, 500);
            assert_eq!(release.penalty, 0);
            assert_eq!(release.rewards, OwedRewards { a: 50, b: 25 });
            assert_eq!(stake.amount, 0);
            assert_eq!(pool.total_staked, 0);
            assert_eq!(pool.active_stakes, 0);

            assert_token_error(pool.claim(&mut stake, LOCK * 2), TokenError::NoActiveStake);
        }

        #[test]
        fn test_reward_budget_enforced() {
            let tight = PoolConfig {
                reward_budget_a: 10,
                ..config()
            };
            let mut pool = new_pool(&tight);
            let mut stake = position();
            pool.stake(&mut stake, 500, 0).unwrap();

            assert_token_error(pool.claim(&mut stake, LOCK), TokenError::RewardBudgetExhausted);
            assert_eq!(stake.amount, 500);
        }

        #[test]
        fn test_emergency_withdraw_penalty() {
            let mut pool = new_pool(&config());
            let mut stake = position();
            pool.stake(&mut stake, 1_000, 0).unwrap();

            // 10% at open, 75% of the lock still to run
            assert_eq!(pool.calc_penalty(&stake, 25, 1_000).unwrap(), 75);

            let release = pool.emergency_withdraw(&mut stake, 25, 1_000).unwrap();
            assert_eq!(release.principal, 925);
            assert_eq!(release.penalty, 75);
            assert_eq!(release.rewards, OwedRewards::default());
            assert_eq!(pool.total_staked, 0);
            assert_eq!(pool.reward_paid_a, 0);
        }

        #[test]
        fn test_penalty_decays_to_zero_at_maturity() {
            let mut pool = new_pool(&config());
            let mut stake = position();
            pool.stake(&mut stake, 1_000, 0).unwrap();

            assert_eq!(pool.calc_penalty(&stake, 0, 1_000).unwrap(), 100);
            assert_eq!(pool.calc_penalty(&stake, LOCK, 1_000).unwrap(), 0);
        }

        #[test]
        fn test_emergency_withdraw_without_stake() {
            let mut pool = new_pool(&config());
            let mut stake = position();
            assert_token_error(
                pool.emergency_withdraw(&mut stake, 0, 1_000),
                TokenError::NoActiveStake,
            );
        }

        #[test]
        fn test_penalty_bounds() {
            let mut engine = StakingEngine::default();
            engine.set_penalty(MAX_PENALTY_BPS).unwrap();
            assert_token_error(engine.set_penalty(MAX_PENALTY_BPS + 1), TokenError::InvalidPenalty);
            assert_eq!(engine.penalty_bps, MAX_PENALTY_BPS);
        }

        #[test]
        fn test_pool_indices_are_sequential() {
            let mut engine = StakingEngine::default();
            assert_eq!(engine.next_pool_index().unwrap(), 0);
            assert_eq!(engine.next_pool_index().unwrap(), 1);
            assert_eq!(engine.pool_count, 2);
        }

        #[test]
        fn test_fund_pool_from_custody_surplus() {
            let mut engine = StakingEngine::default();
            let mut pool = new_pool(&config());
            engine.commit_reward_a(pool.reward_budget_a).unwrap();
            engine.total_principal = 500;

            // 500 principal, 1_000_000 committed budget, 300 swept top-ups
            let custody = 1_000_800;
            assert_eq!(engine.surplus(custody), 300);

            assert_token_error(
                engine.fund_pool(&mut pool, custody, 301),
                TokenError::InsufficientSurplus,
            );
            assert_token_error(engine.fund_pool(&mut pool, custody, 0), TokenError::InvalidAmount);

            engine.fund_pool(&mut pool, custody, 300).unwrap();
            assert_eq!(pool.reward_budget_a, 1_000_300);
            assert_eq!(engine.reward_reserved_a, 1_000_300);
            assert_eq!(engine.surplus(custody), 0);
        }

        #[test]
        fn test_funded_budget_unblocks_claim() {
            let tight = PoolConfig {
                reward_budget_a: 10,
                ..config()
            };
            let mut pool = new_pool(&tight);
            let mut engine = StakingEngine::default();
            engine.commit_reward_a(10).unwrap();

            let mut stake = position();
            pool.stake(&mut stake, 500, 0).unwrap();
            engine.total_principal = 500;
            assert_token_error(pool.claim(&mut stake, LOCK), TokenError::RewardBudgetExhausted);

            // 40 of retained penalties and top-ups on top of principal and budget
            engine.fund_pool(&mut pool, 550, 40).unwrap();
            let release = pool.claim(&mut stake, LOCK).unwrap();
            assert_eq!(release.rewards.a, 50);

            engine.spend_reward_a(release.rewards.a).unwrap();
            assert_eq!(engine.reward_reserved_a, 0);
        }

        #[test]
        fn test_staker_totals() {
            let mut staker = Staker::default();
            staker.record_stake(500).unwrap();
            staker.record_stake(300).unwrap();
            staker.record_release(500).unwrap();
            assert_eq!(staker.staked_tokens, 300);
            assert_token_error(staker.record_release(301), TokenError::MathUnderflow);
        }
    }

    // ========================================================================
    // 5. VESTING
    // ========================================================================

    mod vesting_tests {
        use super::*;

        const DAY: i64 = 24 * 60 * 60;

        fn instance(total: u64, count: u8, interval: i64) -> VestingInstance {
            VestingInstance {
                beneficiary: Pubkey::new_unique(),
                total_vested: total,
                tranches: VestingInstance::build_tranches(total, count, interval).unwrap(),
                ..Default::default()
            }
        }

        #[test]
        fn test_single_tranche_unlocks_after_thirty_days() {
            let mut vesting = instance(100, DEFAULT_TRANCHE_COUNT, DEFAULT_TRANCHE_INTERVAL);
            let start = 1_000;

            assert!(vesting.start(start).unwrap());
            assert_eq!(vesting.claimable_amount(start).unwrap(), 0);
            assert_eq!(vesting.claimable_amount(start + 30 * DAY - 1).unwrap(), 0);
            assert_eq!(vesting.claimable_amount(start + 30 * DAY).unwrap(), 100);

            vesting.record_claim(100).unwrap();
            assert_eq!(vesting.claimed, 100);
            assert_eq!(vesting.claimable_amount(start + 60 * DAY).unwrap(), 0);
        }

        #[test]
        fn test_tranches_sum_to_total() {
            let tranches = VestingInstance::build_tranches(100, 3, 10).unwrap();
            let amounts: Vec<u64> = tranches.iter().map(|t| t.amount).collect();
            let offsets: Vec<i64> = tranches.iter().map(|t| t.unlock_offset).collect();

            assert_eq!(amounts, vec![33, 33, 34]);
            assert_eq!(offsets, vec![10, 20, 30]);
            assert!(tranches.iter().all(|t| t.unlock_time == 0));
        }

        #[test]
        fn test_tranches_unlock_progressively() {
            let mut vesting = instance(100, 3, 10);
            vesting.start(1_000).unwrap();

            assert_eq!(vesting.claimable_amount(1_010).unwrap(), 33);
            vesting.record_claim(33).unwrap();
            assert_eq!(vesting.claimable_amount(1_025).unwrap(), 33);
            assert_eq!(vesting.claimable_amount(1_030).unwrap(), 67);
        }

        #[test]
        fn test_start_is_idempotent() {
            let mut vesting = instance(100, 2, 10);
            assert!(vesting.start(1_000).unwrap());
            assert!(!vesting.start(2_000).unwrap());

            assert_eq!(vesting.start_time, 1_000);
            assert_eq!(vesting.tranches[0].unlock_time, 1_010);
            assert_eq!(vesting.tranches[1].unlock_time, 1_020);
        }

        #[test]
        fn test_nothing_claimable_before_start() {
            let vesting = instance(100, 1, 10);
            assert!(!vesting.is_started());
            assert_eq!(vesting.claimable_amount(i64::MAX).unwrap(), 0);
        }

        #[test]
        fn test_claim_never_exceeds_total() {
            let mut vesting = instance(100, 1, 10);
            vesting.record_claim(100).unwrap();
            assert!(vesting.record_claim(1).is_err());
            assert_eq!(vesting.claimed, 100);
        }

        /// Escrow holder as `create_vesting_instance` opens it: fee-exempt,
        /// still earning dividends
        fn open_escrow(distributor: &mut Distributor, balance: u64) -> (Pubkey, HolderAccount) {
            let key = Pubkey::new_unique();
            let mut holder = HolderAccount {
                is_fee_exempt: true,
                ..wallet(balance)
            };
            distributor.sync_holder(key, &mut holder, 0).unwrap();
            (key, holder)
        }

        #[test]
        fn test_locked_escrow_earns_and_forwards_dividends() {
            let ledger = launched_ledger();
            let mut distributor = Distributor::default();
            let mut other = wallet(300);
            distributor.sync_holder(Pubkey::new_unique(), &mut other, 0).unwrap();
            let (escrow_key, mut escrow) = open_escrow(&mut distributor, 100);
            let beneficiary_key = Pubkey::new_unique();
            let mut beneficiary = wallet(0);

            let mut vesting = instance(100, 1, 10);
            vesting.start(1_000).unwrap();

            // Still locked: only the escrow's dividends move
            distributor.deposit(400).unwrap();
            let early = vesting
                .release(
                    &ledger,
                    &mut distributor,
                    escrow_key,
                    &mut escrow,
                    beneficiary_key,
                    &mut beneficiary,
                    1_005,
                )
                .unwrap();
            assert_eq!(
                early,
                VestingRelease {
                    amount: 0,
                    escrow_dividends: 100,
                    beneficiary_dividends: 0,
                }
            );
            assert_eq!(escrow.balance, 100);
            assert_eq!(escrow.share.amount, 100);

            // Unlocked: tokens and the second deposit's escrow earnings
            distributor.deposit(400).unwrap();
            let release = vesting
                .release(
                    &ledger,
                    &mut distributor,
                    escrow_key,
                    &mut escrow,
                    beneficiary_key,
                    &mut beneficiary,
                    1_010,
                )
                .unwrap();
            assert_eq!(release.amount, 100);
            assert_eq!(release.escrow_dividends, 100);
            assert_eq!(vesting.claimed, 100);
            assert_eq!(vesting.dividends_forwarded, 200);

            assert_eq!(escrow.balance, 0);
            assert_eq!(escrow.share.amount, 0);
            assert!(!distributor.shareholders.contains(&escrow_key));
            assert_eq!(beneficiary.balance, 100);
            assert_eq!(beneficiary.share.amount, 100);
            assert_eq!(distributor.total_shares, 400);

            // From here the beneficiary earns directly
            distributor.deposit(400).unwrap();
            assert_eq!(distributor.unpaid_earnings(&beneficiary.share).unwrap(), 100);
            assert_eq!(distributor.unpaid_earnings(&escrow.share).unwrap(), 0);
        }

        #[test]
        fn test_release_settles_beneficiary_separately() {
            let ledger = launched_ledger();
            let mut distributor = Distributor::default();
            let (escrow_key, mut escrow) = open_escrow(&mut distributor, 100);
            let beneficiary_key = Pubkey::new_unique();
            let mut beneficiary = wallet(100);
            distributor
                .sync_holder(beneficiary_key, &mut beneficiary, 0)
                .unwrap();

            let mut vesting = instance(100, 1, 10);
            vesting.start(1_000).unwrap();
            distributor.deposit(200).unwrap();

            let release = vesting
                .release(
                    &ledger,
                    &mut distributor,
                    escrow_key,
                    &mut escrow,
                    beneficiary_key,
                    &mut beneficiary,
                    1_010,
                )
                .unwrap();

            assert_eq!(
                release,
                VestingRelease {
                    amount: 100,
                    escrow_dividends: 100,
                    beneficiary_dividends: 100,
                }
            );
            assert_eq!(vesting.dividends_forwarded, 100);
            assert_eq!(beneficiary.balance, 200);
            assert_eq!(beneficiary.share.amount, 200);
            assert_eq!(distributor.total_distributed, 200);
        }

        #[test]
        fn test_release_before_start_moves_nothing() {
            let ledger = launched_ledger();
            let mut distributor = Distributor::default();
            let (escrow_key, mut escrow) = open_escrow(&mut distributor, 100);
            let mut beneficiary = wallet(0);
            let mut vesting = instance(100, 1, 10);

            let release = vesting
                .release(
                    &ledger,
                    &mut distributor,
                    escrow_key,
                    &mut escrow,
                    Pubkey::new_unique(),
                    &mut beneficiary,
                    i64::MAX,
                )
                .unwrap();

            assert_eq!(release, VestingRelease::default());
            assert_eq!(escrow.balance, 100);
            assert_eq!(vesting.claimed, 0);
        }

        #[test]
        fn test_beneficiary_totals_across_instances() {
            let mut record = BeneficiaryRecord::default();
            record.record_instance(100).unwrap();
            record.record_instance(250).unwrap();

            record
                .record_release(&VestingRelease {
                    amount: 100,
                    escrow_dividends: 7,
                    beneficiary_dividends: 3,
                })
                .unwrap();

            assert_eq!(record.instance_count, 2);
            assert_eq!(
                record.amounts(),
                VestedAmounts {
                    total_vested: 350,
                    claimed: 100,
                    dividends_forwarded: 7,
                }
            );
        }

        #[test]
        fn test_invalid_tranche_schedule() {
            let mut manager = VestingManager::default();
            assert_token_error(
                manager.set_tranche_schedule(0, DAY),
                TokenError::InvalidTrancheSchedule,
            );
            assert_token_error(
                manager.set_tranche_schedule(MAX_TRANCHES + 1, DAY),
                TokenError::InvalidTrancheSchedule,
            );
            assert_token_error(manager.set_tranche_schedule(4, 0), TokenError::InvalidTrancheSchedule);

            manager.set_tranche_schedule(MAX_TRANCHES, DAY).unwrap();
            assert_eq!(manager.tranche_count, MAX_TRANCHES);
        }

        #[test]
        fn test_instance_range_checks() {
            let mut manager = VestingManager::default();
            for expected in 0..3 {
                assert_eq!(manager.next_instance_index().unwrap(), expected);
            }

            manager.check_range(0, 2).unwrap();
            manager.check_range(1, 1).unwrap();
            assert_token_error(manager.check_range(2, 1), TokenError::InvalidRange);
            assert_token_error(manager.check_range(0, 3), TokenError::InvalidRange);
        }
    }
}
