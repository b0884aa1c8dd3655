use anchor_lang::prelude::Pubkey;
use escrow_pool::constants::{LIFETIME_VAULT_INDEX, MAX_VAULTS_PER_POOL, MIN_LOCK_DURATION};
use escrow_pool::math::{protocol_fee_embedded_in, protocol_fee_from_gross};
use escrow_pool::state::RewardPool;
use fuzz_accounts::*;
use trident_fuzz::fuzzing::*;
mod fuzz_accounts;

const GENESIS: i64 = 1_700_000_000;

/// Reward ledger plus the token balance it is accounted against
#[derive(Default)]
struct PoolTracker {
    pool: Option<RewardPool>,
    /// Reward account balance
    balance: u64,
    now: i64,
    /// Weights seen at the last check, by handle
    weights: Vec<u64>,
}

#[derive(FuzzTestMethods)]
struct FuzzTest {
    trident: Trident,
    fuzz_accounts: AccountAddresses,
    pool_tracker: PoolTracker,
}

#[flow_executor]
impl FuzzTest {
    fn new() -> Self {
        Self {
            trident: Trident::default(),
            fuzz_accounts: AccountAddresses::default(),
            pool_tracker: PoolTracker::default(),
        }
    }

    #[init]
    fn start(&mut self) {
        self.pool_tracker = PoolTracker {
            now: GENESIS,
            ..PoolTracker::default()
        };
    }

    /// Create and fund the lifetime vault
    #[flow]
    fn flow_bootstrap(&mut self) {
        if self.pool_tracker.pool.is_some() {
            return;
        }

        let amount = rand::random::<u64>() % 1_000_000_000_000;
        let fee = protocol_fee_embedded_in(amount).unwrap();
        if fee == 0 {
            return;
        }

        let mut pool = RewardPool {
            owner: Pubkey::new_unique(),
            protocol_mint: Pubkey::new_unique(),
            reward_account: Pubkey::new_unique(),
            lifetime_vault: Pubkey::default(),
            vaults: Vec::new(),
            bump: 255,
            _reserved: [0u8; 32],
        };

        let lifetime = Pubkey::new_unique();
        pool.register_lifetime_vault(lifetime).unwrap();
        pool.mark_deposited(&lifetime).unwrap();
        pool.seed_lifetime_rewards(fee).unwrap();

        // Only the fee stays behind, the rest becomes collateral
        self.pool_tracker.balance = fee;
        self.pool_tracker.pool = Some(pool);
        self.check_invariants();
    }

    /// Open a vault and distribute its creation fee
    #[flow]
    fn flow_create_vault(&mut self) {
        let now = self.pool_tracker.now;
        let Some(pool) = self.pool_tracker.pool.as_mut() else {
            return;
        };
        if !pool.is_lifetime_vault_rewardable(now).unwrap()
            || pool.vaults.len() >= MAX_VAULTS_PER_POOL
        {
            return;
        }

        let basis = rand::random::<u64>() % 1_000_000_000_000;
        let fee = protocol_fee_from_gross(basis).unwrap();

        let recipients = pool
            .vaults
            .iter()
            .filter(|record| record.is_rewardable(now))
            .count() as u64;
        let total_weight = pool.rewardable_weight(now, None).unwrap();
        let before: Vec<u64> = pool.vaults.iter().map(|r| r.collected_rewards).collect();

        let credited = pool.distribute(fee, now, None).unwrap();

        // Invariant: never more than the fee, and at most one unit lost per recipient
        assert!(credited <= fee, "Invariant: distributed more than the fee");
        assert!(
            fee - credited < recipients.max(1),
            "Invariant: floor remainder exceeds recipient count"
        );

        // Invariant: each share is the floor of its pro-rata part
        for (record, previous) in pool.vaults.iter().zip(before) {
            let share = record.collected_rewards - previous;
            let exact = (fee as u128) * (record.reward_weight as u128);
            assert!(
                (share as u128) * (total_weight as u128) <= exact,
                "Invariant: share above pro-rata"
            );
        }

        let lock = MIN_LOCK_DURATION + (rand::random::<u32>() % 604_800) as i64;
        pool.register_vault(Pubkey::new_unique(), now + lock, fee).unwrap();

        self.pool_tracker.balance += fee;
        self.check_invariants();
    }

    /// Deposit into a random vault that still accepts it
    #[flow]
    fn flow_deposit(&mut self) {
        let now = self.pool_tracker.now;
        let Some(pool) = self.pool_tracker.pool.as_mut() else {
            return;
        };

        let open: Vec<Pubkey> = pool
            .vaults
            .iter()
            .filter(|r| !r.is_deposited && now < r.locked_until)
            .map(|r| r.vault)
            .collect();
        if open.is_empty() {
            return;
        }

        let vault = open[rand::random::<usize>() % open.len()];
        pool.mark_deposited(&vault).unwrap();
        self.check_invariants();
    }

    /// Withdraw a random deposited vault, harvesting when unlocked and
    /// reinvesting when early
    #[flow]
    fn flow_withdraw(&mut self) {
        let now = self.pool_tracker.now;
        let Some(pool) = self.pool_tracker.pool.as_mut() else {
            return;
        };

        let live: Vec<(Pubkey, i64)> = pool
            .vaults
            .iter()
            .skip(LIFETIME_VAULT_INDEX + 1)
            .filter(|r| r.is_deposited && !r.is_withdrawn)
            .map(|r| (r.vault, r.locked_until))
            .collect();
        if live.is_empty() {
            return;
        }

        let (vault, locked_until) = live[rand::random::<usize>() % live.len()];
        pool.mark_withdrawn(&vault).unwrap();

        if now >= locked_until {
            let harvested = pool.harvest(&vault).unwrap();
            self.pool_tracker.balance -= harvested;
        } else {
            let outcome = pool.reinvest(&vault, now).unwrap();
            assert!(
                outcome.distributed <= outcome.amount,
                "Invariant: reinvested more than was taken"
            );
            assert_eq!(pool.record(&vault).unwrap().collected_rewards, 0);
        }

        self.check_invariants();
    }

    #[flow]
    fn flow_advance_time(&mut self) {
        self.pool_tracker.now += (rand::random::<u32>() % 172_800) as i64;
        self.check_invariants();
    }

    /// Close the lifetime vault once nothing else earns, then sweep the dust
    #[flow]
    fn flow_close_pool(&mut self) {
        let now = self.pool_tracker.now;
        let Some(pool) = self.pool_tracker.pool.as_mut() else {
            return;
        };
        let lifetime = pool.lifetime_vault;
        let record = *pool.lifetime_record().unwrap();
        if record.is_withdrawn || pool.has_rewardable_vaults_besides_lifetime(now) {
            return;
        }

        pool.mark_withdrawn(&lifetime).unwrap();
        let harvested = pool.harvest(&lifetime).unwrap();

        let payout = pool.close_payout(self.pool_tracker.balance, harvested).unwrap();
        assert_eq!(payout.total, payout.harvested + payout.dust);
        self.pool_tracker.balance -= payout.total;

        // Invariant: after closing, the balance is exactly what other vaults are owed
        assert_eq!(pool.dust(self.pool_tracker.balance).unwrap(), 0);

        self.check_invariants();
    }

    #[end]
    fn end(&mut self) {
        self.check_invariants();
    }

    fn check_invariants(&mut self) {
        let Some(pool) = self.pool_tracker.pool.as_ref() else {
            return;
        };

        // Invariant: the reward account covers everything owed
        let owed = pool.total_collected().unwrap();
        assert!(
            owed <= self.pool_tracker.balance,
            "Invariant: collected rewards exceed reward balance"
        );

        // Invariant: weights never decrease and handles are never reused
        let weights: Vec<u64> = pool.vaults.iter().map(|r| r.reward_weight).collect();
        assert!(weights.len() >= self.pool_tracker.weights.len());
        for (current, before) in weights.iter().zip(&self.pool_tracker.weights) {
            assert!(current >= before, "Invariant: reward weight decreased");
        }
        self.pool_tracker.weights = weights;
    }
}

fn main() {
    // Run 1000 iterations with up to 100 flows per iteration
    FuzzTest::fuzz(1000, 100);
}
