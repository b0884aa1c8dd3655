use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;
use anchor_spl::token_interface::TokenAccount;

use crate::state::RewardPool;

#[derive(Accounts)]
pub struct PoolView<'info> {
    pub reward_pool: Account<'info, RewardPool>,

    #[account(address = reward_pool.reward_account)]
    pub reward_account: InterfaceAccount<'info, TokenAccount>,
}

/// Rewards accrued by `vault` and not yet paid out or reinvested
pub fn pending_rewards(ctx: Context<PoolView>, vault: Pubkey) -> Result<()> {
    let record = ctx.accounts.reward_pool.record(&vault)?;
    set_return_data(&record.collected_rewards.to_le_bytes());
    Ok(())
}

/// Reward balance owed to no vault
pub fn pool_dust(ctx: Context<PoolView>) -> Result<()> {
    let dust = ctx
        .accounts
        .reward_pool
        .dust(ctx.accounts.reward_account.amount)?;
    set_return_data(&dust.to_le_bytes());
    Ok(())
}

/// 1 if `vault` would share in a fee distributed now, else 0
pub fn is_rewardable(ctx: Context<PoolView>, vault: Pubkey) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let record = ctx.accounts.reward_pool.record(&vault)?;
    set_return_data(&[record.is_rewardable(now) as u8]);
    Ok(())
}

pub fn total_rewardable_weight(ctx: Context<PoolView>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let weight = ctx.accounts.reward_pool.rewardable_weight(now, None)?;
    set_return_data(&weight.to_le_bytes());
    Ok(())
}
