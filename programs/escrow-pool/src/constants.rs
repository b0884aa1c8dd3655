pub const REWARD_POOL_SEED: &[u8] = b"reward_pool";
pub const VAULT_SEED: &[u8] = b"vault";
pub const KEY_MINT_SEED: &[u8] = b"key";

/// Fixed-point precision for per-vault fee percentages (1_000 = 1.000%)
pub const FEE_PRECISION: u64 = 100_000;
pub const MAX_FEE_PERCENT: u32 = 100_000;

/// Flat protocol fee charged on every vault creation
pub const PROTOCOL_FEE_PERCENT: u64 = 2;
pub const PROTOCOL_FEE_DENOMINATOR: u64 = 100;

pub const MIN_LOCK_DURATION: i64 = 86_400;

pub const MAX_VAULTS_PER_POOL: usize = 128;

pub const KEY_COUNT: usize = 3;
pub const KEY_DECIMALS: u8 = 0;

/// Keys needed to withdraw at or after the deadline
pub const LATE_WITHDRAW_QUORUM: u8 = 1;
/// Keys needed to break the lock before the deadline
pub const EARLY_WITHDRAW_QUORUM: u8 = 2;
pub const DEPOSIT_QUORUM: u8 = 1;

pub const LIFETIME_VAULT_INDEX: usize = 0;
pub const LIFETIME_LOCKED_UNTIL: i64 = i64::MAX;
