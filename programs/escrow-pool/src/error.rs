use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    // Authorization
    #[msg("Unauthorized - caller is not the reward pool owner")]
    Unauthorized,

    #[msg("Caller is not a vault registered with this reward pool")]
    CallerNotVault,

    #[msg("Not enough key tokens held to deposit")]
    NotEnoughKeysToDeposit,

    #[msg("Not enough key tokens held to withdraw")]
    NotEnoughKeysToWithdraw,

    #[msg("Key token account could not be read")]
    InvalidKeyAccount,

    // Lifecycle
    #[msg("Vault has already been deposited into")]
    AlreadyDeposited,

    #[msg("Vault has already been withdrawn")]
    AlreadyWithdrawn,

    #[msg("Vault has not been deposited into")]
    NotDeposited,

    #[msg("Lock deadline has passed, deposits are closed")]
    TooLateToDeposit,

    #[msg("Lock deadline is too close to the current time")]
    LockedUntilTooShort,

    #[msg("Lifetime vault already exists")]
    LifetimeVaultAlreadyExists,

    #[msg("Lifetime vault does not exist")]
    LifetimeVaultDoesNotExist,

    // Economic preconditions
    #[msg("Lifetime vault is not rewardable")]
    LifetimeVaultIsNotRewardable,

    #[msg("Lifetime vault is still rewardable")]
    LifetimeVaultIsRewardable,

    #[msg("Rewardable vaults remain in the pool")]
    RemainingRewardableVaults,

    #[msg("No dust to collect")]
    NoDustToCollect,

    #[msg("Fee percent exceeds the allowed maximum")]
    InvalidFeePercent,

    #[msg("Fees are not supported for non-fungible collateral")]
    FeesNotSupportedForNonFungibleCollateral,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Amount too small to carry a protocol fee")]
    AmountTooSmall,

    #[msg("Non-fungible collateral must be wanted in an amount of exactly one")]
    InvalidNonFungibleAmount,

    // Resources and math
    #[msg("Reward pool cannot hold more vaults")]
    VaultLimitReached,

    #[msg("Arithmetic overflow")]
    MathOverflow,

    #[msg("Division by zero")]
    DivisionByZero,

    #[msg("Mint does not match the expected asset")]
    InvalidMint,

    #[msg("Fee beneficiary token account missing or not owned by the beneficiary")]
    InvalidBeneficiary,
}
