use anchor_lang::prelude::*;

#[event]
pub struct RewardPoolInitialized {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub protocol_mint: Pubkey,
    pub reward_account: Pubkey,
}

#[event]
pub struct VaultCreated {
    pub pool: Pubkey,
    pub vault: Pubkey,
    pub creator: Pubkey,
    pub index: u32,
    pub wanted_mint: Pubkey,
    pub wanted_amount: u64,
    pub locked_until: i64,
    pub fee: u64,
}

#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub amount: u64,
}

#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub amount: u64,
}

#[event]
pub struct Harvested {
    pub vault: Pubkey,
    pub amount: u64,
}

#[event]
pub struct Reinvested {
    pub vault: Pubkey,
    pub amount: u64,
}

#[event]
pub struct DustCollected {
    pub pool: Pubkey,
    pub amount: u64,
}

#[event]
pub struct RewardPoolClosed {
    pub pool: Pubkey,
}
