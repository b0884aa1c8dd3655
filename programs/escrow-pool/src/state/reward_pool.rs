use anchor_lang::prelude::*;

use crate::constants::{
    LIFETIME_LOCKED_UNTIL, LIFETIME_VAULT_INDEX, MAX_VAULTS_PER_POOL, MIN_LOCK_DURATION,
    REWARD_POOL_SEED,
};
use crate::error::EscrowError;
use crate::math::mul_div;
use crate::state::FeeSchedule;

/// Ledger entry for one vault, addressed by its index in `RewardPool::vaults`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VaultRecord {
    /// Escrow vault account this entry belongs to
    pub vault: Pubkey,
    /// Pro-rata divisor, assigned once and never lowered
    pub reward_weight: u64,
    /// Accrued rewards not yet harvested or reinvested
    pub collected_rewards: u64,
    /// Copy of the vault's lock deadline
    pub locked_until: i64,
    pub is_deposited: bool,
    pub is_withdrawn: bool,
}

impl VaultRecord {
    pub const LEN: usize = 32 + // vault
        8 +  // reward_weight
        8 +  // collected_rewards
        8 +  // locked_until
        1 +  // is_deposited
        1; // is_withdrawn

    pub fn is_rewardable(&self, now: i64) -> bool {
        self.is_deposited && !self.is_withdrawn && now < self.locked_until
    }
}

/// Outcome of returning a vault's rewards to the pool
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reinvestment {
    /// Rewards taken from the withdrawing vault
    pub amount: u64,
    /// Part of `amount` credited to the remaining rewardable vaults
    pub distributed: u64,
}

/// Amounts leaving the reward account when the lifetime vault is closed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClosePayout {
    /// Lifetime vault rewards already taken from the ledger
    pub harvested: u64,
    /// Balance owed to no vault once the harvest is paid
    pub dust: u64,
    pub total: u64,
}

#[account]
pub struct RewardPool {
    /// Creator of the pool, the only account allowed to open vaults in it
    pub owner: Pubkey,
    /// Asset fees and rewards are paid in
    pub protocol_mint: Pubkey,
    /// Token account (pool PDA authority) holding every fee and reward
    pub reward_account: Pubkey,
    /// Bootstrap vault, `Pubkey::default()` until created
    pub lifetime_vault: Pubkey,
    /// Append-only arena of vaults in creation order
    pub vaults: Vec<VaultRecord>,
    /// PDA bump seed
    pub bump: u8,
    /// Reserved for future upgrades
    pub _reserved: [u8; 32],
}

impl RewardPool {
    pub const LEN: usize = 8 +  // discriminator
        32 +  // owner
        32 +  // protocol_mint
        32 +  // reward_account
        32 +  // lifetime_vault
        4 + MAX_VAULTS_PER_POOL * VaultRecord::LEN + // vaults
        1 +   // bump
        32; // _reserved

    pub const SEED_PREFIX: &'static [u8] = REWARD_POOL_SEED;

    pub fn has_lifetime_vault(&self) -> bool {
        self.lifetime_vault != Pubkey::default()
    }

    /// Handle the next registered vault will receive
    pub fn next_index(&self) -> u32 {
        self.vaults.len() as u32
    }

    pub fn lifetime_record(&self) -> Result<&VaultRecord> {
        require!(
            self.has_lifetime_vault(),
            EscrowError::LifetimeVaultDoesNotExist
        );
        self.vaults
            .get(LIFETIME_VAULT_INDEX)
            .ok_or_else(|| error!(EscrowError::LifetimeVaultDoesNotExist))
    }

    pub fn is_lifetime_vault_rewardable(&self, now: i64) -> Result<bool> {
        Ok(self.lifetime_record()?.is_rewardable(now))
    }

    /// Guards for opening a new vault, in the order they are reported
    pub fn check_create(
        &self,
        locked_until: i64,
        wanted_amount: u64,
        fees: &FeeSchedule,
        non_fungible_collateral: bool,
        now: i64,
    ) -> Result<()> {
        require!(
            self.is_lifetime_vault_rewardable(now)?,
            EscrowError::LifetimeVaultIsNotRewardable
        );

        let min_locked_until = now
            .checked_add(MIN_LOCK_DURATION)
            .ok_or(EscrowError::MathOverflow)?;
        require!(
            locked_until >= min_locked_until,
            EscrowError::LockedUntilTooShort
        );

        fees.validate(non_fungible_collateral)?;

        require!(wanted_amount > 0, EscrowError::ZeroAmount);
        require!(
            !non_fungible_collateral || wanted_amount == 1,
            EscrowError::InvalidNonFungibleAmount
        );
        require!(
            self.vaults.len() < MAX_VAULTS_PER_POOL,
            EscrowError::VaultLimitReached
        );
        Ok(())
    }

    /// Append a vault to the arena and return its handle
    pub fn register_vault(
        &mut self,
        vault: Pubkey,
        locked_until: i64,
        reward_weight: u64,
    ) -> Result<u32> {
        require!(
            self.vaults.len() < MAX_VAULTS_PER_POOL,
            EscrowError::VaultLimitReached
        );

        let index = self.next_index();
        self.vaults.push(VaultRecord {
            vault,
            reward_weight,
            collected_rewards: 0,
            locked_until,
            is_deposited: false,
            is_withdrawn: false,
        });

        Ok(index)
    }

    /// Register the bootstrap vault. It always takes handle 0 and receives
    /// its weight only once it is funded.
    pub fn register_lifetime_vault(&mut self, vault: Pubkey) -> Result<u32> {
        require!(
            !self.has_lifetime_vault() && self.vaults.is_empty(),
            EscrowError::LifetimeVaultAlreadyExists
        );

        let index = self.register_vault(vault, LIFETIME_LOCKED_UNTIL, 0)?;
        self.lifetime_vault = vault;

        Ok(index)
    }

    /// Handle of a registered vault
    pub fn position(&self, vault: &Pubkey) -> Result<usize> {
        self.vaults
            .iter()
            .position(|record| record.vault == *vault)
            .ok_or_else(|| error!(EscrowError::CallerNotVault))
    }

    pub fn record(&self, vault: &Pubkey) -> Result<&VaultRecord> {
        let index = self.position(vault)?;
        Ok(&self.vaults[index])
    }

    fn record_mut(&mut self, vault: &Pubkey) -> Result<&mut VaultRecord> {
        let index = self.position(vault)?;
        Ok(&mut self.vaults[index])
    }

    pub fn mark_deposited(&mut self, vault: &Pubkey) -> Result<()> {
        let record = self.record_mut(vault)?;
        require!(!record.is_deposited, EscrowError::AlreadyDeposited);

        record.is_deposited = true;
        Ok(())
    }

    pub fn mark_withdrawn(&mut self, vault: &Pubkey) -> Result<()> {
        let record = self.record_mut(vault)?;
        require!(record.is_deposited, EscrowError::NotDeposited);
        require!(!record.is_withdrawn, EscrowError::AlreadyWithdrawn);

        record.is_withdrawn = true;
        Ok(())
    }

    /// Give the funded lifetime vault its weight and credit it the fee the
    /// pool retained while sizing it.
    pub fn seed_lifetime_rewards(&mut self, retained_fee: u64) -> Result<()> {
        require!(
            self.has_lifetime_vault(),
            EscrowError::LifetimeVaultDoesNotExist
        );

        let record = &mut self.vaults[LIFETIME_VAULT_INDEX];
        require!(record.reward_weight == 0, EscrowError::AlreadyDeposited);

        record.reward_weight = retained_fee;
        record.collected_rewards = record
            .collected_rewards
            .checked_add(retained_fee)
            .ok_or(EscrowError::MathOverflow)?;

        Ok(())
    }

    /// Sum of weights over the rewardable vaults, optionally skipping one handle
    pub fn rewardable_weight(&self, now: i64, exclude: Option<usize>) -> Result<u64> {
        self.vaults
            .iter()
            .enumerate()
            .filter(|(index, record)| Some(*index) != exclude && record.is_rewardable(now))
            .try_fold(0u64, |total, (_, record)| {
                total
                    .checked_add(record.reward_weight)
                    .ok_or_else(|| error!(EscrowError::MathOverflow))
            })
    }

    /// Whether any vault other than the lifetime vault is still rewardable
    pub fn has_rewardable_vaults_besides_lifetime(&self, now: i64) -> bool {
        self.vaults
            .iter()
            .skip(LIFETIME_VAULT_INDEX + 1)
            .any(|record| record.is_rewardable(now))
    }

    /// Split `amount` across the rewardable vaults by weight.
    ///
    /// Formula: share = amount × weight / total_weight (floor), applied in
    /// ascending handle order. The truncated remainder is not reassigned and
    /// stays in the reward account as dust. Returns the total credited.
    pub fn distribute(&mut self, amount: u64, now: i64, exclude: Option<usize>) -> Result<u64> {
        let total_weight = self.rewardable_weight(now, exclude)?;
        if amount == 0 || total_weight == 0 {
            return Ok(0);
        }

        let mut credited = 0u64;
        for (index, record) in self.vaults.iter_mut().enumerate() {
            if Some(index) == exclude || !record.is_rewardable(now) {
                continue;
            }

            let share = mul_div(amount, record.reward_weight, total_weight)?;

            record.collected_rewards = record
                .collected_rewards
                .checked_add(share)
                .ok_or(EscrowError::MathOverflow)?;

            credited = credited
                .checked_add(share)
                .ok_or(EscrowError::MathOverflow)?;
        }

        Ok(credited)
    }

    /// Zero a vault's accrued rewards and return them for direct payout
    pub fn harvest(&mut self, vault: &Pubkey) -> Result<u64> {
        let record = self.record_mut(vault)?;
        Ok(std::mem::take(&mut record.collected_rewards))
    }

    /// Zero a vault's accrued rewards and spread them over the other
    /// rewardable vaults instead of paying them out
    pub fn reinvest(&mut self, vault: &Pubkey, now: i64) -> Result<Reinvestment> {
        let index = self.position(vault)?;
        let amount = std::mem::take(&mut self.vaults[index].collected_rewards);
        let distributed = self.distribute(amount, now, Some(index))?;

        Ok(Reinvestment {
            amount,
            distributed,
        })
    }

    pub fn total_collected(&self) -> Result<u64> {
        self.vaults.iter().try_fold(0u64, |total, record| {
            total
                .checked_add(record.collected_rewards)
                .ok_or_else(|| error!(EscrowError::MathOverflow))
        })
    }

    /// Part of the reward balance owed to no vault
    pub fn dust(&self, reward_balance: u64) -> Result<u64> {
        let owed = self.total_collected()?;
        reward_balance
            .checked_sub(owed)
            .ok_or_else(|| error!(EscrowError::MathOverflow))
    }

    /// Split the closing transfer out of `reward_balance` into the lifetime
    /// vault's harvest and the dust left once it is paid. Call after the
    /// harvest has been taken from the ledger.
    pub fn close_payout(&self, reward_balance: u64, harvested: u64) -> Result<ClosePayout> {
        let remaining = reward_balance
            .checked_sub(harvested)
            .ok_or(EscrowError::MathOverflow)?;
        let dust = self.dust(remaining)?;
        let total = harvested.checked_add(dust).ok_or(EscrowError::MathOverflow)?;

        Ok(ClosePayout {
            harvested,
            dust,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const DAY: i64 = 86_400;
    const ONE: u64 = 1_000_000_000;

    fn empty_pool() -> RewardPool {
        RewardPool {
            owner: Pubkey::new_unique(),
            protocol_mint: Pubkey::new_unique(),
            reward_account: Pubkey::new_unique(),
            lifetime_vault: Pubkey::default(),
            vaults: Vec::new(),
            bump: 255,
            _reserved: [0u8; 32],
        }
    }

    /// Pool with a funded lifetime vault holding `retained_fee` as weight and rewards
    fn bootstrapped_pool(retained_fee: u64) -> (RewardPool, Pubkey) {
        let mut pool = empty_pool();
        let lifetime = Pubkey::new_unique();
        pool.register_lifetime_vault(lifetime).unwrap();
        pool.mark_deposited(&lifetime).unwrap();
        pool.seed_lifetime_rewards(retained_fee).unwrap();
        (pool, lifetime)
    }

    fn open_vault(pool: &mut RewardPool, fee: u64, locked_until: i64) -> Pubkey {
        let vault = Pubkey::new_unique();
        pool.distribute(fee, NOW, None).unwrap();
        pool.register_vault(vault, locked_until, fee).unwrap();
        pool.mark_deposited(&vault).unwrap();
        vault
    }

    fn expect_err<T: std::fmt::Debug>(result: Result<T>, expected: EscrowError) {
        assert_eq!(result.unwrap_err(), anchor_lang::error::Error::from(expected));
    }

    #[test]
    fn test_lifetime_vault_takes_first_handle() {
        let mut pool = empty_pool();
        let lifetime = Pubkey::new_unique();

        assert_eq!(pool.register_lifetime_vault(lifetime).unwrap(), 0);
        assert_eq!(pool.lifetime_vault, lifetime);
        assert_eq!(pool.next_index(), 1);

        expect_err(
            pool.register_lifetime_vault(Pubkey::new_unique()),
            EscrowError::LifetimeVaultAlreadyExists,
        );
    }

    #[test]
    fn test_lifetime_record_missing() {
        let pool = empty_pool();
        expect_err(pool.lifetime_record(), EscrowError::LifetimeVaultDoesNotExist);
        expect_err(
            pool.is_lifetime_vault_rewardable(NOW),
            EscrowError::LifetimeVaultDoesNotExist,
        );
    }

    #[test]
    fn test_lifetime_not_rewardable_until_deposited() {
        let mut pool = empty_pool();
        let lifetime = Pubkey::new_unique();
        pool.register_lifetime_vault(lifetime).unwrap();

        assert!(!pool.is_lifetime_vault_rewardable(NOW).unwrap());
        pool.mark_deposited(&lifetime).unwrap();
        assert!(pool.is_lifetime_vault_rewardable(NOW).unwrap());
    }

    #[test]
    fn test_bootstrap_example() {
        // Lifetime vault sized from 1.0 keeps 19_607_843 as its own rewards
        let (mut pool, lifetime) = bootstrapped_pool(19_607_843);
        assert_eq!(pool.record(&lifetime).unwrap().collected_rewards, 19_607_843);

        // Second vault pays 20_000_000, all of it to the sole rewardable vault
        let first = open_vault(&mut pool, 20_000_000, NOW + 30 * DAY);
        assert_eq!(pool.record(&lifetime).unwrap().collected_rewards, 39_607_843);
        assert_eq!(pool.record(&first).unwrap().collected_rewards, 0);
        assert_eq!(pool.record(&first).unwrap().reward_weight, 20_000_000);

        // Third vault's fee is split by weight 19_607_843 : 20_000_000
        let credited = pool.distribute(20_000_000, NOW, None).unwrap();
        assert_eq!(pool.record(&lifetime).unwrap().collected_rewards, 39_607_843 + 9_900_990);
        assert_eq!(pool.record(&first).unwrap().collected_rewards, 10_099_009);
        assert_eq!(credited, 19_999_999);

        // Reward account holds both retained fee and every creation fee
        let balance = 19_607_843 + 20_000_000 + 20_000_000;
        assert_eq!(pool.dust(balance).unwrap(), 1);
    }

    #[test]
    fn test_distribute_pro_rata_floor() {
        let (mut pool, lifetime) = bootstrapped_pool(3);
        let a = open_vault(&mut pool, 5, NOW + DAY);
        let b = open_vault(&mut pool, 7, NOW + DAY);

        let before: Vec<u64> = pool.vaults.iter().map(|r| r.collected_rewards).collect();
        let credited = pool.distribute(1_000, NOW, None).unwrap();

        // weights 3, 5, 7 -> 200, 333, 466
        assert_eq!(pool.record(&lifetime).unwrap().collected_rewards - before[0], 200);
        assert_eq!(pool.record(&a).unwrap().collected_rewards - before[1], 333);
        assert_eq!(pool.record(&b).unwrap().collected_rewards - before[2], 466);
        assert_eq!(credited, 999);
    }

    #[test]
    fn test_remainder_is_not_reassigned() {
        let (mut pool, _) = bootstrapped_pool(1);
        open_vault(&mut pool, 1, NOW + DAY);
        open_vault(&mut pool, 1, NOW + DAY);
        let owed = pool.total_collected().unwrap();

        // 2 units over three equal weights floors to nothing for everyone
        assert_eq!(pool.distribute(2, NOW, None).unwrap(), 0);
        assert_eq!(pool.total_collected().unwrap(), owed);
    }

    #[test]
    fn test_distribute_skips_non_rewardable() {
        let (mut pool, lifetime) = bootstrapped_pool(ONE);

        let expired = open_vault(&mut pool, ONE, NOW + 1);
        let withdrawn = open_vault(&mut pool, ONE, NOW + DAY);
        pool.mark_withdrawn(&withdrawn).unwrap();

        let undeposited = Pubkey::new_unique();
        pool.register_vault(undeposited, NOW + DAY, ONE).unwrap();

        let later = NOW + 1;
        assert_eq!(pool.rewardable_weight(later, None).unwrap(), ONE);

        let expired_before = pool.record(&expired).unwrap().collected_rewards;
        let lifetime_before = pool.record(&lifetime).unwrap().collected_rewards;
        pool.distribute(500, later, None).unwrap();

        assert_eq!(pool.record(&lifetime).unwrap().collected_rewards, lifetime_before + 500);
        assert_eq!(pool.record(&expired).unwrap().collected_rewards, expired_before);
        assert_eq!(pool.record(&undeposited).unwrap().collected_rewards, 0);
    }

    #[test]
    fn test_distribute_without_recipients() {
        let mut pool = empty_pool();
        pool.register_lifetime_vault(Pubkey::new_unique()).unwrap();

        assert_eq!(pool.distribute(1_000, NOW, None).unwrap(), 0);
        assert_eq!(pool.total_collected().unwrap(), 0);
    }

    #[test]
    fn test_harvest_pays_and_zeroes() {
        let (mut pool, lifetime) = bootstrapped_pool(ONE);

        assert_eq!(pool.harvest(&lifetime).unwrap(), ONE);
        assert_eq!(pool.record(&lifetime).unwrap().collected_rewards, 0);
        assert_eq!(pool.harvest(&lifetime).unwrap(), 0);
    }

    #[test]
    fn test_unknown_caller_rejected() {
        let (mut pool, _) = bootstrapped_pool(ONE);
        let stranger = Pubkey::new_unique();

        expect_err(pool.harvest(&stranger), EscrowError::CallerNotVault);
        expect_err(pool.reinvest(&stranger, NOW), EscrowError::CallerNotVault);
        expect_err(pool.mark_deposited(&stranger), EscrowError::CallerNotVault);
    }

    #[test]
    fn test_reinvest_goes_to_other_vaults() {
        let (mut pool, lifetime) = bootstrapped_pool(100);
        let early = open_vault(&mut pool, 100, NOW + DAY);
        let other = open_vault(&mut pool, 200, NOW + DAY);

        let early_rewards = pool.record(&early).unwrap().collected_rewards;
        assert!(early_rewards > 0);
        let lifetime_before = pool.record(&lifetime).unwrap().collected_rewards;
        let other_before = pool.record(&other).unwrap().collected_rewards;

        pool.mark_withdrawn(&early).unwrap();
        let outcome = pool.reinvest(&early, NOW).unwrap();

        assert_eq!(outcome.amount, early_rewards);
        assert_eq!(pool.record(&early).unwrap().collected_rewards, 0);

        let lifetime_gain = pool.record(&lifetime).unwrap().collected_rewards - lifetime_before;
        let other_gain = pool.record(&other).unwrap().collected_rewards - other_before;
        assert_eq!(lifetime_gain, early_rewards * 100 / 300);
        assert_eq!(other_gain, early_rewards * 200 / 300);
        assert_eq!(outcome.distributed, lifetime_gain + other_gain);
    }

    #[test]
    fn test_reinvest_excludes_caller_even_if_still_flagged() {
        let (mut pool, lifetime) = bootstrapped_pool(50);
        let vault = open_vault(&mut pool, 50, NOW + DAY);
        pool.distribute(100, NOW, None).unwrap();

        let vault_rewards = pool.record(&vault).unwrap().collected_rewards;
        let lifetime_before = pool.record(&lifetime).unwrap().collected_rewards;

        let outcome = pool.reinvest(&vault, NOW).unwrap();

        assert_eq!(outcome.distributed, vault_rewards);
        assert_eq!(pool.record(&vault).unwrap().collected_rewards, 0);
        assert_eq!(
            pool.record(&lifetime).unwrap().collected_rewards,
            lifetime_before + vault_rewards
        );
    }

    #[test]
    fn test_reinvest_with_nobody_left_becomes_dust() {
        let mut pool = empty_pool();
        let lifetime = Pubkey::new_unique();
        pool.register_lifetime_vault(lifetime).unwrap();
        pool.mark_deposited(&lifetime).unwrap();
        pool.seed_lifetime_rewards(40).unwrap();
        pool.mark_withdrawn(&lifetime).unwrap();

        let outcome = pool.reinvest(&lifetime, NOW).unwrap();
        assert_eq!(outcome, Reinvestment { amount: 40, distributed: 0 });
        assert_eq!(pool.dust(40).unwrap(), 40);
    }

    #[test]
    fn test_lifetime_weight_assigned_once() {
        let (mut pool, lifetime) = bootstrapped_pool(10);

        expect_err(pool.seed_lifetime_rewards(99), EscrowError::AlreadyDeposited);
        assert_eq!(pool.record(&lifetime).unwrap().reward_weight, 10);

        pool.mark_withdrawn(&lifetime).unwrap();
        assert_eq!(pool.record(&lifetime).unwrap().reward_weight, 10);
    }

    #[test]
    fn test_mark_transitions() {
        let (mut pool, _) = bootstrapped_pool(10);
        let vault = Pubkey::new_unique();
        pool.register_vault(vault, NOW + DAY, 10).unwrap();

        expect_err(pool.mark_withdrawn(&vault), EscrowError::NotDeposited);
        pool.mark_deposited(&vault).unwrap();
        expect_err(pool.mark_deposited(&vault), EscrowError::AlreadyDeposited);
        pool.mark_withdrawn(&vault).unwrap();
        expect_err(pool.mark_withdrawn(&vault), EscrowError::AlreadyWithdrawn);
    }

    #[test]
    fn test_rewardable_besides_lifetime() {
        let (mut pool, _) = bootstrapped_pool(10);
        assert!(!pool.has_rewardable_vaults_besides_lifetime(NOW));

        let vault = open_vault(&mut pool, 10, NOW + DAY);
        assert!(pool.has_rewardable_vaults_besides_lifetime(NOW));
        assert!(!pool.has_rewardable_vaults_besides_lifetime(NOW + DAY));

        pool.mark_withdrawn(&vault).unwrap();
        assert!(!pool.has_rewardable_vaults_besides_lifetime(NOW));
    }

    #[test]
    fn test_vault_limit() {
        let mut pool = empty_pool();
        pool.register_lifetime_vault(Pubkey::new_unique()).unwrap();
        for _ in 1..MAX_VAULTS_PER_POOL {
            pool.register_vault(Pubkey::new_unique(), NOW + DAY, 1).unwrap();
        }

        expect_err(
            pool.register_vault(Pubkey::new_unique(), NOW + DAY, 1),
            EscrowError::VaultLimitReached,
        );
    }

    #[test]
    fn test_dust_never_negative() {
        let (pool, _) = bootstrapped_pool(100);
        assert_eq!(pool.dust(100).unwrap(), 0);
        assert_eq!(pool.dust(130).unwrap(), 30);
        expect_err(pool.dust(99), EscrowError::MathOverflow);
    }

    fn no_fees() -> FeeSchedule {
        FeeSchedule::none(Pubkey::new_unique())
    }

    #[test]
    fn test_create_requires_funded_lifetime_vault() {
        let mut pool = empty_pool();
        expect_err(
            pool.check_create(NOW + DAY, ONE, &no_fees(), false, NOW),
            EscrowError::LifetimeVaultDoesNotExist,
        );

        // Registered but not yet deposited
        let lifetime = Pubkey::new_unique();
        pool.register_lifetime_vault(lifetime).unwrap();
        expect_err(
            pool.check_create(NOW + DAY, ONE, &no_fees(), false, NOW),
            EscrowError::LifetimeVaultIsNotRewardable,
        );

        pool.mark_deposited(&lifetime).unwrap();
        pool.seed_lifetime_rewards(19_607_843).unwrap();
        assert!(pool.check_create(NOW + DAY, ONE, &no_fees(), false, NOW).is_ok());

        pool.mark_withdrawn(&lifetime).unwrap();
        expect_err(
            pool.check_create(NOW + DAY, ONE, &no_fees(), false, NOW),
            EscrowError::LifetimeVaultIsNotRewardable,
        );
    }

    #[test]
    fn test_create_lock_boundary() {
        let (pool, _) = bootstrapped_pool(ONE);
        assert!(pool.check_create(NOW + DAY, ONE, &no_fees(), false, NOW).is_ok());
        expect_err(
            pool.check_create(NOW + DAY - 1, ONE, &no_fees(), false, NOW),
            EscrowError::LockedUntilTooShort,
        );
        expect_err(
            pool.check_create(i64::MIN, ONE, &no_fees(), false, NOW),
            EscrowError::LockedUntilTooShort,
        );
    }

    #[test]
    fn test_create_guard_order() {
        let (pool, _) = bootstrapped_pool(ONE);
        let bad_fees = FeeSchedule {
            deposit_fee_percent: 100_001,
            ..no_fees()
        };
        let some_fee = FeeSchedule {
            withdraw_late_fee_percent: 1,
            ..no_fees()
        };

        // Lock duration is reported before fee problems
        expect_err(
            pool.check_create(NOW, ONE, &bad_fees, false, NOW),
            EscrowError::LockedUntilTooShort,
        );
        // Fee problems before the amount
        expect_err(
            pool.check_create(NOW + DAY, 0, &bad_fees, false, NOW),
            EscrowError::InvalidFeePercent,
        );
        expect_err(
            pool.check_create(NOW + DAY, 0, &some_fee, true, NOW),
            EscrowError::FeesNotSupportedForNonFungibleCollateral,
        );
        expect_err(
            pool.check_create(NOW + DAY, 0, &no_fees(), false, NOW),
            EscrowError::ZeroAmount,
        );
    }

    #[test]
    fn test_create_non_fungible_amount() {
        let (pool, _) = bootstrapped_pool(ONE);
        assert!(pool.check_create(NOW + DAY, 1, &no_fees(), true, NOW).is_ok());
        expect_err(
            pool.check_create(NOW + DAY, 2, &no_fees(), true, NOW),
            EscrowError::InvalidNonFungibleAmount,
        );
        assert!(pool.check_create(NOW + DAY, 2, &no_fees(), false, NOW).is_ok());
    }

    #[test]
    fn test_create_vault_limit_comes_last() {
        let (mut pool, _) = bootstrapped_pool(ONE);
        for _ in 1..MAX_VAULTS_PER_POOL {
            pool.register_vault(Pubkey::new_unique(), NOW + DAY, 1).unwrap();
        }
        expect_err(
            pool.check_create(NOW + DAY, 0, &no_fees(), false, NOW),
            EscrowError::ZeroAmount,
        );
        expect_err(
            pool.check_create(NOW + DAY, ONE, &no_fees(), false, NOW),
            EscrowError::VaultLimitReached,
        );
    }

    #[test]
    fn test_close_payout_includes_dust() {
        // Worked example: after three vaults the pool holds one unit of dust
        let (mut pool, lifetime) = bootstrapped_pool(19_607_843);
        let first = open_vault(&mut pool, 20_000_000, NOW + DAY);
        pool.distribute(20_000_000, NOW, None).unwrap();
        let balance = 19_607_843 + 20_000_000 + 20_000_000;

        // First vault leaves on time with its rewards
        pool.mark_withdrawn(&first).unwrap();
        let paid_out = pool.harvest(&first).unwrap();
        assert_eq!(paid_out, 10_099_009);
        let balance = balance - paid_out;

        pool.mark_withdrawn(&lifetime).unwrap();
        let harvested = pool.harvest(&lifetime).unwrap();
        assert_eq!(harvested, 49_508_833);

        let payout = pool.close_payout(balance, harvested).unwrap();
        assert_eq!(
            payout,
            ClosePayout {
                harvested: 49_508_833,
                dust: 1,
                total: 49_508_834,
            }
        );
        assert_eq!(payout.total, balance);
    }

    #[test]
    fn test_close_payout_leaves_rewards_owed_to_others() {
        let (mut pool, lifetime) = bootstrapped_pool(100);
        let other = open_vault(&mut pool, 100, NOW + DAY);
        // The other vault is withdrawn but its rewards have not been paid yet
        pool.distribute(100, NOW, None).unwrap();
        pool.mark_withdrawn(&other).unwrap();
        let owed_to_other = pool.record(&other).unwrap().collected_rewards;
        assert_eq!(owed_to_other, 50);

        pool.mark_withdrawn(&lifetime).unwrap();
        let harvested = pool.harvest(&lifetime).unwrap();
        assert_eq!(harvested, 250);

        // 100 retained + 100 + 100 in fees, plus 7 stray units
        let payout = pool.close_payout(307, harvested).unwrap();
        assert_eq!(payout.dust, 7);
        assert_eq!(payout.total, 257);
        assert_eq!(307 - payout.total, owed_to_other);

        expect_err(pool.close_payout(200, harvested), EscrowError::MathOverflow);
    }
}
