use anchor_lang::prelude::*;

use crate::constants::{
    DEPOSIT_QUORUM, EARLY_WITHDRAW_QUORUM, FEE_PRECISION, KEY_COUNT, LATE_WITHDRAW_QUORUM,
    MAX_FEE_PERCENT, VAULT_SEED,
};
use crate::error::EscrowError;
use crate::math::fee_from_gross;

/// Who may move collateral in and out of a vault
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Custody {
    /// Holders of the vault's key tokens
    KeyQuorum,
    /// The owner of the reward pool (lifetime vault)
    PoolOwner,
}

impl Custody {
    /// Distinct keys needed to withdraw, `None` when keys grant nothing
    pub fn required_keys(&self, now: i64, locked_until: i64) -> Option<u8> {
        match self {
            Custody::KeyQuorum if now >= locked_until => Some(LATE_WITHDRAW_QUORUM),
            Custody::KeyQuorum => Some(EARLY_WITHDRAW_QUORUM),
            Custody::PoolOwner => None,
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Taken from the deposit, 1_000 = 1.000%
    pub deposit_fee_percent: u32,
    /// Taken from the collateral on withdrawal before the deadline
    pub withdraw_early_fee_percent: u32,
    /// Taken from the collateral on withdrawal at or after the deadline
    pub withdraw_late_fee_percent: u32,
    /// Wallet receiving every fee above
    pub fee_beneficiary: Pubkey,
}

impl FeeSchedule {
    pub const LEN: usize = 4 + // deposit_fee_percent
        4 +  // withdraw_early_fee_percent
        4 +  // withdraw_late_fee_percent
        32; // fee_beneficiary

    /// No fees, beneficiary is the creator
    pub fn none(creator: Pubkey) -> Self {
        Self {
            deposit_fee_percent: 0,
            withdraw_early_fee_percent: 0,
            withdraw_late_fee_percent: 0,
            fee_beneficiary: creator,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.deposit_fee_percent == 0
            && self.withdraw_early_fee_percent == 0
            && self.withdraw_late_fee_percent == 0
    }

    pub fn validate(&self, non_fungible_collateral: bool) -> Result<()> {
        require!(
            self.deposit_fee_percent <= MAX_FEE_PERCENT
                && self.withdraw_early_fee_percent <= MAX_FEE_PERCENT
                && self.withdraw_late_fee_percent <= MAX_FEE_PERCENT,
            EscrowError::InvalidFeePercent
        );
        require!(
            !non_fungible_collateral || self.is_zero(),
            EscrowError::FeesNotSupportedForNonFungibleCollateral
        );
        Ok(())
    }
}

/// What happens to a vault's accrued rewards when it is withdrawn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payout {
    /// Paid to the withdrawer
    Harvest,
    /// Spread over the other rewardable vaults
    Reinvest,
}

#[account]
pub struct EscrowVault {
    /// Reward pool this vault is registered with
    pub reward_pool: Pubkey,
    /// Account that opened the vault and received the keys
    pub creator: Pubkey,
    /// Handle in the pool's ledger
    pub index: u32,
    pub custody: Custody,
    /// Key token mints, ids 1..=3 (unset for the lifetime vault)
    pub key_mints: [Pubkey; KEY_COUNT],
    /// Collateral asset
    pub wanted_mint: Pubkey,
    /// Collateral expected on deposit
    pub wanted_amount: u64,
    /// Protocol fee charged (or retained, for the lifetime vault) at creation
    pub creation_fee: u64,
    /// Token account (vault PDA authority) holding the collateral
    pub collateral_account: Pubkey,
    /// Deposits close and the late quorum applies from this timestamp
    pub locked_until: i64,
    pub fees: FeeSchedule,
    pub is_deposited: bool,
    pub deposit_timestamp: i64,
    pub is_withdrawn: bool,
    /// PDA bump seed
    pub bump: u8,
    /// Reserved for future upgrades
    pub _reserved: [u8; 32],
}

impl EscrowVault {
    pub const LEN: usize = 8 +  // discriminator
        32 +  // reward_pool
        32 +  // creator
        4 +   // index
        1 +   // custody
        32 * KEY_COUNT + // key_mints
        32 +  // wanted_mint
        8 +   // wanted_amount
        8 +   // creation_fee
        32 +  // collateral_account
        8 +   // locked_until
        FeeSchedule::LEN + // fees
        1 +   // is_deposited
        8 +   // deposit_timestamp
        1 +   // is_withdrawn
        1 +   // bump
        32; // _reserved

    pub const SEED_PREFIX: &'static [u8] = VAULT_SEED;

    pub fn is_rewardable(&self, now: i64) -> bool {
        self.is_deposited && !self.is_withdrawn && now < self.locked_until
    }

    pub fn is_late(&self, now: i64) -> bool {
        now >= self.locked_until
    }

    pub fn check_deposit(&self, keys_held: u8, now: i64) -> Result<()> {
        require!(
            keys_held >= DEPOSIT_QUORUM,
            EscrowError::NotEnoughKeysToDeposit
        );
        require!(!self.is_deposited, EscrowError::AlreadyDeposited);
        require!(now < self.locked_until, EscrowError::TooLateToDeposit);
        Ok(())
    }

    /// Lifecycle checks shared by every withdrawal path
    pub fn check_withdrawable(&self) -> Result<()> {
        require!(self.is_deposited, EscrowError::NotDeposited);
        require!(!self.is_withdrawn, EscrowError::AlreadyWithdrawn);
        Ok(())
    }

    pub fn check_withdraw(&self, keys_held: u8, now: i64) -> Result<()> {
        self.check_withdrawable()?;

        let required = self
            .custody
            .required_keys(now, self.locked_until)
            .ok_or(EscrowError::Unauthorized)?;
        require!(
            keys_held >= required,
            EscrowError::NotEnoughKeysToWithdraw
        );
        Ok(())
    }

    pub fn payout(&self, now: i64) -> Payout {
        if self.is_late(now) {
            Payout::Harvest
        } else {
            Payout::Reinvest
        }
    }

    pub fn deposit_fee(&self) -> Result<u64> {
        fee_from_gross(
            self.wanted_amount,
            self.fees.deposit_fee_percent,
            FEE_PRECISION,
        )
    }

    /// Fee on the collateral currently held, early or late by `now`
    pub fn withdraw_fee(&self, collateral_balance: u64, now: i64) -> Result<u64> {
        let fee_percent = if self.is_late(now) {
            self.fees.withdraw_late_fee_percent
        } else {
            self.fees.withdraw_early_fee_percent
        };
        fee_from_gross(collateral_balance, fee_percent, FEE_PRECISION)
    }

    pub fn record_deposit(&mut self, now: i64) -> Result<()> {
        require!(!self.is_deposited, EscrowError::AlreadyDeposited);
        self.is_deposited = true;
        self.deposit_timestamp = now;
        Ok(())
    }

    pub fn record_withdrawal(&mut self) -> Result<()> {
        self.check_withdrawable()?;
        self.is_withdrawn = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const DAY: i64 = 86_400;

    fn vault(custody: Custody, fees: FeeSchedule) -> EscrowVault {
        EscrowVault {
            reward_pool: Pubkey::new_unique(),
            creator: Pubkey::new_unique(),
            index: 1,
            custody,
            key_mints: [
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
            ],
            wanted_mint: Pubkey::new_unique(),
            wanted_amount: 1_000_000,
            creation_fee: 20_000,
            collateral_account: Pubkey::new_unique(),
            locked_until: NOW + DAY,
            fees,
            is_deposited: false,
            deposit_timestamp: 0,
            is_withdrawn: false,
            bump: 255,
            _reserved: [0u8; 32],
        }
    }

    fn keyed_vault() -> EscrowVault {
        vault(Custody::KeyQuorum, FeeSchedule::none(Pubkey::new_unique()))
    }

    fn fees(deposit: u32, early: u32, late: u32) -> FeeSchedule {
        FeeSchedule {
            deposit_fee_percent: deposit,
            withdraw_early_fee_percent: early,
            withdraw_late_fee_percent: late,
            fee_beneficiary: Pubkey::new_unique(),
        }
    }

    fn expect_err<T: std::fmt::Debug>(result: Result<T>, expected: EscrowError) {
        assert_eq!(result.unwrap_err(), anchor_lang::error::Error::from(expected));
    }

    #[test]
    fn test_required_keys() {
        let custody = Custody::KeyQuorum;
        assert_eq!(custody.required_keys(NOW, NOW + 1), Some(2));
        assert_eq!(custody.required_keys(NOW + 1, NOW + 1), Some(1));
        assert_eq!(custody.required_keys(NOW + DAY, NOW + 1), Some(1));
        assert_eq!(Custody::PoolOwner.required_keys(NOW, NOW + 1), None);
    }

    #[test]
    fn test_deposit_guard_order() {
        let mut v = keyed_vault();

        // Keys are checked before anything else
        v.is_deposited = true;
        expect_err(v.check_deposit(0, NOW + DAY), EscrowError::NotEnoughKeysToDeposit);
        expect_err(v.check_deposit(1, NOW + DAY), EscrowError::AlreadyDeposited);

        v.is_deposited = false;
        expect_err(v.check_deposit(1, NOW + DAY), EscrowError::TooLateToDeposit);
        assert!(v.check_deposit(1, NOW + DAY - 1).is_ok());
        assert!(v.check_deposit(3, NOW).is_ok());
    }

    #[test]
    fn test_withdraw_guard_order() {
        let mut v = keyed_vault();
        expect_err(v.check_withdraw(3, NOW), EscrowError::NotDeposited);

        v.record_deposit(NOW).unwrap();
        assert_eq!(v.deposit_timestamp, NOW);

        // Early: two keys
        expect_err(v.check_withdraw(1, NOW), EscrowError::NotEnoughKeysToWithdraw);
        assert!(v.check_withdraw(2, NOW).is_ok());

        // Late: one key
        assert!(v.check_withdraw(1, NOW + DAY).is_ok());
        expect_err(v.check_withdraw(0, NOW + DAY), EscrowError::NotEnoughKeysToWithdraw);

        v.record_withdrawal().unwrap();
        expect_err(v.check_withdraw(3, NOW + DAY), EscrowError::AlreadyWithdrawn);
        expect_err(v.record_withdrawal(), EscrowError::AlreadyWithdrawn);
    }

    #[test]
    fn test_pool_owner_custody_ignores_keys() {
        let mut v = vault(Custody::PoolOwner, FeeSchedule::none(Pubkey::new_unique()));
        v.record_deposit(NOW).unwrap();
        expect_err(v.check_withdraw(3, NOW + DAY), EscrowError::Unauthorized);
        assert!(v.check_withdrawable().is_ok());
    }

    #[test]
    fn test_rewardable_window() {
        let mut v = keyed_vault();
        assert!(!v.is_rewardable(NOW));

        v.record_deposit(NOW).unwrap();
        assert!(v.is_rewardable(NOW));
        assert!(!v.is_rewardable(NOW + DAY));

        v.record_withdrawal().unwrap();
        assert!(!v.is_rewardable(NOW));
    }

    #[test]
    fn test_payout_is_exclusive() {
        let v = keyed_vault();
        assert_eq!(v.payout(NOW), Payout::Reinvest);
        assert_eq!(v.payout(NOW + DAY - 1), Payout::Reinvest);
        assert_eq!(v.payout(NOW + DAY), Payout::Harvest);
        assert_eq!(v.payout(NOW + 2 * DAY), Payout::Harvest);
    }

    #[test]
    fn test_fees_from_schedule() {
        // 1%, 5%, 0.5%
        let v = vault(Custody::KeyQuorum, fees(1_000, 5_000, 500));
        assert_eq!(v.deposit_fee().unwrap(), 10_000);

        // Withdraw fees apply to the balance left after the deposit fee
        let balance = v.wanted_amount - v.deposit_fee().unwrap();
        assert_eq!(v.withdraw_fee(balance, NOW).unwrap(), 49_500);
        assert_eq!(v.withdraw_fee(balance, NOW + DAY).unwrap(), 4_950);
    }

    #[test]
    fn test_fee_schedule_validation() {
        assert!(fees(0, 0, 0).validate(true).is_ok());
        assert!(fees(MAX_FEE_PERCENT, 1, 0).validate(false).is_ok());

        expect_err(fees(MAX_FEE_PERCENT + 1, 0, 0).validate(false), EscrowError::InvalidFeePercent);
        expect_err(fees(0, 0, u32::MAX).validate(false), EscrowError::InvalidFeePercent);

        // Range is checked before the non-fungible rule
        expect_err(fees(0, MAX_FEE_PERCENT + 1, 0).validate(true), EscrowError::InvalidFeePercent);
        expect_err(
            fees(0, 0, 1).validate(true),
            EscrowError::FeesNotSupportedForNonFungibleCollateral,
        );
    }

    #[test]
    fn test_default_schedule() {
        let creator = Pubkey::new_unique();
        let schedule = FeeSchedule::none(creator);
        assert!(schedule.is_zero());
        assert_eq!(schedule.fee_beneficiary, creator);
    }
}
