use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod keys;
pub mod math;
pub mod state;

use instructions::*;
use state::FeeSchedule;

declare_id!("8zNpjhdKaEBeYhciSQtHtejvamKv1h4LZGhVfV5WxQEk");

#[program]
pub mod escrow_pool {
    use super::*;

    /// Create a reward pool for the given protocol asset
    pub fn initialize_pool(ctx: Context<InitializePool>) -> Result<()> {
        instructions::initialize_pool::handler(ctx)
    }

    /// Open the bootstrap vault, funded from `amount` minus the embedded 2% fee
    pub fn create_lifetime_vault(ctx: Context<CreateLifetimeVault>, amount: u64) -> Result<()> {
        instructions::lifetime_vault::create(ctx, amount)
    }

    /// Lock the lifetime vault's collateral and give it its reward weight
    pub fn deposit_to_lifetime_vault(ctx: Context<DepositToLifetimeVault>) -> Result<()> {
        instructions::lifetime_vault::deposit(ctx)
    }

    /// Withdraw the lifetime vault and sweep the pool once no vault earns
    pub fn close_and_collect_lifetime_vault(ctx: Context<CloseLifetimeVault>) -> Result<()> {
        instructions::lifetime_vault::close_and_collect(ctx)
    }

    /// Create a key-gated vault without deposit or withdrawal fees
    pub fn create_vault(ctx: Context<CreateVault>, params: CreateVaultParams) -> Result<()> {
        let fees = FeeSchedule::none(ctx.accounts.creator.key());
        instructions::create_vault::handler(ctx, params, fees)
    }

    /// Create a key-gated vault with its own fee schedule
    pub fn create_vault_with_fees(
        ctx: Context<CreateVault>,
        params: CreateVaultParams,
        fees: FeeSchedule,
    ) -> Result<()> {
        instructions::create_vault::handler(ctx, params, fees)
    }

    /// Deposit the wanted collateral (one key)
    pub fn deposit(ctx: Context<Deposit>) -> Result<()> {
        instructions::deposit::handler(ctx)
    }

    /// Withdraw the collateral (one key once unlocked, two keys before)
    pub fn withdraw(ctx: Context<Withdraw>) -> Result<()> {
        instructions::withdraw::handler(ctx)
    }

    /// Sweep undistributed rewards to the pool owner
    pub fn collect_dust(ctx: Context<CollectDust>) -> Result<()> {
        instructions::collect_dust::handler(ctx)
    }

    // ============ View Functions (CPI composable) ============

    /// Accrued rewards of a vault
    pub fn pending_rewards(ctx: Context<PoolView>, vault: Pubkey) -> Result<()> {
        instructions::view::pending_rewards(ctx, vault)
    }

    /// Reward balance owed to no vault
    pub fn pool_dust(ctx: Context<PoolView>) -> Result<()> {
        instructions::view::pool_dust(ctx)
    }

    /// Whether a vault currently shares in distributed fees (1 or 0)
    pub fn is_rewardable(ctx: Context<PoolView>, vault: Pubkey) -> Result<()> {
        instructions::view::is_rewardable(ctx, vault)
    }

    /// Sum of weights over the currently rewardable vaults
    pub fn total_rewardable_weight(ctx: Context<PoolView>) -> Result<()> {
        instructions::view::total_rewardable_weight(ctx)
    }
}
