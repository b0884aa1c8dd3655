use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenAccount, TokenInterface},
};

use crate::{constants::REWARD_POOL_SEED, events::RewardPoolInitialized, state::RewardPool};

#[derive(Accounts)]
pub struct InitializePool<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        init,
        payer = owner,
        space = RewardPool::LEN,
        seeds = [REWARD_POOL_SEED, owner.key().as_ref(), protocol_mint.key().as_ref()],
        bump
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    pub protocol_mint: InterfaceAccount<'info, Mint>,

    #[account(
        init,
        payer = owner,
        associated_token::mint = protocol_mint,
        associated_token::authority = reward_pool,
        associated_token::token_program = protocol_token_program,
    )]
    pub reward_account: InterfaceAccount<'info, TokenAccount>,

    pub protocol_token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializePool>) -> Result<()> {
    let pool = &mut ctx.accounts.reward_pool;
    pool.owner = ctx.accounts.owner.key();
    pool.protocol_mint = ctx.accounts.protocol_mint.key();
    pool.reward_account = ctx.accounts.reward_account.key();
    pool.lifetime_vault = Pubkey::default();
    pool.vaults = Vec::new();
    pool.bump = ctx.bumps.reward_pool;
    pool._reserved = [0u8; 32];

    emit!(RewardPoolInitialized {
        pool: pool.key(),
        owner: pool.owner,
        protocol_mint: pool.protocol_mint,
        reward_account: pool.reward_account,
    });

    msg!("Reward pool initialized for {}", pool.protocol_mint);

    Ok(())
}
