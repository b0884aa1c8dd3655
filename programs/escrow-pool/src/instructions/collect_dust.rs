use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::{
    constants::REWARD_POOL_SEED, error::EscrowError, events::DustCollected, state::RewardPool,
};

#[derive(Accounts)]
pub struct CollectDust<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [REWARD_POOL_SEED, reward_pool.owner.as_ref(), reward_pool.protocol_mint.as_ref()],
        bump = reward_pool.bump,
        has_one = owner @ EscrowError::Unauthorized,
        has_one = protocol_mint @ EscrowError::InvalidMint,
        has_one = reward_account,
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    pub protocol_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub reward_account: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        constraint = owner_protocol_account.mint == protocol_mint.key() @ EscrowError::InvalidMint,
        constraint = owner_protocol_account.owner == owner.key(),
    )]
    pub owner_protocol_account: InterfaceAccount<'info, TokenAccount>,

    pub protocol_token_program: Interface<'info, TokenInterface>,
}

/// Sweep the part of the reward balance owed to no vault. Only possible
/// once the lifetime vault has stopped earning.
pub fn handler(ctx: Context<CollectDust>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool = &ctx.accounts.reward_pool;

    require!(
        !pool.is_lifetime_vault_rewardable(now)?,
        EscrowError::LifetimeVaultIsRewardable
    );

    let dust = pool.dust(ctx.accounts.reward_account.amount)?;
    require!(dust > 0, EscrowError::NoDustToCollect);

    let owner_key = pool.owner;
    let protocol_mint_key = pool.protocol_mint;
    let bump = pool.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[
        REWARD_POOL_SEED,
        owner_key.as_ref(),
        protocol_mint_key.as_ref(),
        &[bump],
    ]];

    transfer_checked(
        CpiContext::new_with_signer(
            ctx.accounts.protocol_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.reward_account.to_account_info(),
                to: ctx.accounts.owner_protocol_account.to_account_info(),
                mint: ctx.accounts.protocol_mint.to_account_info(),
                authority: pool.to_account_info(),
            },
            signer_seeds,
        ),
        dust,
        ctx.accounts.protocol_mint.decimals,
    )?;

    emit!(DustCollected {
        pool: pool.key(),
        amount: dust,
    });

    msg!("Collected {} dust from reward pool", dust);

    Ok(())
}
