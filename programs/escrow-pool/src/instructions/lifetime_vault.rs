use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::{
    constants::{KEY_COUNT, LIFETIME_LOCKED_UNTIL, REWARD_POOL_SEED, VAULT_SEED},
    error::EscrowError,
    events::{
        Deposited, DustCollected, Harvested, RewardPoolClosed, VaultCreated, Withdrawn,
    },
    math::protocol_fee_embedded_in,
    state::{Custody, EscrowVault, FeeSchedule, RewardPool},
};

// =============================================================================
// Create
// =============================================================================

#[derive(Accounts)]
pub struct CreateLifetimeVault<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED, reward_pool.owner.as_ref(), reward_pool.protocol_mint.as_ref()],
        bump = reward_pool.bump,
        has_one = owner @ EscrowError::Unauthorized,
        constraint = !reward_pool.has_lifetime_vault() @ EscrowError::LifetimeVaultAlreadyExists,
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        init,
        payer = owner,
        space = EscrowVault::LEN,
        seeds = [VAULT_SEED, reward_pool.key().as_ref(), &reward_pool.next_index().to_le_bytes()],
        bump
    )]
    pub lifetime_vault: Box<Account<'info, EscrowVault>>,

    #[account(address = reward_pool.protocol_mint @ EscrowError::InvalidMint)]
    pub protocol_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = owner_protocol_account.mint == protocol_mint.key() @ EscrowError::InvalidMint,
        constraint = owner_protocol_account.owner == owner.key(),
    )]
    pub owner_protocol_account: InterfaceAccount<'info, TokenAccount>,

    #[account(mut, address = reward_pool.reward_account)]
    pub reward_account: InterfaceAccount<'info, TokenAccount>,

    #[account(
        init,
        payer = owner,
        associated_token::mint = protocol_mint,
        associated_token::authority = lifetime_vault,
        associated_token::token_program = protocol_token_program,
    )]
    pub collateral_account: InterfaceAccount<'info, TokenAccount>,

    pub protocol_token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

/// Fund the pool's bootstrap vault with `amount`, of which the embedded
/// protocol fee stays in the reward account.
pub fn create(ctx: Context<CreateLifetimeVault>, amount: u64) -> Result<()> {
    require!(amount > 0, EscrowError::ZeroAmount);

    let fee = protocol_fee_embedded_in(amount)?;
    require!(fee > 0, EscrowError::AmountTooSmall);
    let wanted_amount = amount.checked_sub(fee).ok_or(EscrowError::MathOverflow)?;

    transfer_checked(
        CpiContext::new(
            ctx.accounts.protocol_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.owner_protocol_account.to_account_info(),
                to: ctx.accounts.reward_account.to_account_info(),
                mint: ctx.accounts.protocol_mint.to_account_info(),
                authority: ctx.accounts.owner.to_account_info(),
            },
        ),
        amount,
        ctx.accounts.protocol_mint.decimals,
    )?;

    let vault_key = ctx.accounts.lifetime_vault.key();
    let index = ctx.accounts.reward_pool.register_lifetime_vault(vault_key)?;

    let owner = ctx.accounts.owner.key();
    let vault = &mut ctx.accounts.lifetime_vault;
    vault.reward_pool = ctx.accounts.reward_pool.key();
    vault.creator = owner;
    vault.index = index;
    vault.custody = Custody::PoolOwner;
    vault.key_mints = [Pubkey::default(); KEY_COUNT];
    vault.wanted_mint = ctx.accounts.protocol_mint.key();
    vault.wanted_amount = wanted_amount;
    vault.creation_fee = fee;
    vault.collateral_account = ctx.accounts.collateral_account.key();
    vault.locked_until = LIFETIME_LOCKED_UNTIL;
    vault.fees = FeeSchedule::none(owner);
    vault.is_deposited = false;
    vault.deposit_timestamp = 0;
    vault.is_withdrawn = false;
    vault.bump = ctx.bumps.lifetime_vault;
    vault._reserved = [0u8; 32];

    emit!(VaultCreated {
        pool: vault.reward_pool,
        vault: vault_key,
        creator: owner,
        index,
        wanted_mint: vault.wanted_mint,
        wanted_amount,
        locked_until: vault.locked_until,
        fee,
    });

    msg!(
        "Lifetime vault opened: {} wanted, {} retained as fee",
        wanted_amount,
        fee
    );

    Ok(())
}

// =============================================================================
// Deposit
// =============================================================================

#[derive(Accounts)]
pub struct DepositToLifetimeVault<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED, reward_pool.owner.as_ref(), reward_pool.protocol_mint.as_ref()],
        bump = reward_pool.bump,
        has_one = owner @ EscrowError::Unauthorized,
        has_one = protocol_mint @ EscrowError::InvalidMint,
        has_one = reward_account,
        constraint = reward_pool.has_lifetime_vault() @ EscrowError::LifetimeVaultDoesNotExist,
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        mut,
        address = reward_pool.lifetime_vault @ EscrowError::LifetimeVaultDoesNotExist,
        has_one = collateral_account,
    )]
    pub lifetime_vault: Box<Account<'info, EscrowVault>>,

    pub protocol_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub reward_account: InterfaceAccount<'info, TokenAccount>,

    #[account(mut)]
    pub collateral_account: InterfaceAccount<'info, TokenAccount>,

    pub protocol_token_program: Interface<'info, TokenInterface>,
}

/// Move the lifetime vault's collateral out of the reward account and make
/// the vault the pool's first rewardable entry.
pub fn deposit(ctx: Context<DepositToLifetimeVault>) -> Result<()> {
    require!(
        !ctx.accounts.lifetime_vault.is_deposited,
        EscrowError::AlreadyDeposited
    );

    let amount = ctx.accounts.lifetime_vault.wanted_amount;

    let owner_key = ctx.accounts.reward_pool.owner;
    let protocol_mint_key = ctx.accounts.reward_pool.protocol_mint;
    let bump = ctx.accounts.reward_pool.bump;
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
                to: ctx.accounts.collateral_account.to_account_info(),
                mint: ctx.accounts.protocol_mint.to_account_info(),
                authority: ctx.accounts.reward_pool.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
        ctx.accounts.protocol_mint.decimals,
    )?;

    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.lifetime_vault.key();
    let retained_fee = ctx.accounts.lifetime_vault.creation_fee;

    ctx.accounts.lifetime_vault.record_deposit(now)?;

    let pool = &mut ctx.accounts.reward_pool;
    pool.mark_deposited(&vault_key)?;
    pool.seed_lifetime_rewards(retained_fee)?;

    emit!(Deposited {
        vault: vault_key,
        amount,
    });

    Ok(())
}

// =============================================================================
// Close
// =============================================================================

#[derive(Accounts)]
pub struct CloseLifetimeVault<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED, reward_pool.owner.as_ref(), reward_pool.protocol_mint.as_ref()],
        bump = reward_pool.bump,
        has_one = owner @ EscrowError::Unauthorized,
        has_one = protocol_mint @ EscrowError::InvalidMint,
        has_one = reward_account,
        constraint = reward_pool.has_lifetime_vault() @ EscrowError::LifetimeVaultDoesNotExist,
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        mut,
        address = reward_pool.lifetime_vault @ EscrowError::LifetimeVaultDoesNotExist,
        has_one = collateral_account,
    )]
    pub lifetime_vault: Box<Account<'info, EscrowVault>>,

    pub protocol_mint: InterfaceAccount<'info, Mint>,

    #[account(mut)]
    pub reward_account: InterfaceAccount<'info, TokenAccount>,

    #[account(mut)]
    pub collateral_account: InterfaceAccount<'info, TokenAccount>,

    #[account(
        mut,
        constraint = owner_protocol_account.mint == protocol_mint.key() @ EscrowError::InvalidMint,
        constraint = owner_protocol_account.owner == owner.key(),
    )]
    pub owner_protocol_account: InterfaceAccount<'info, TokenAccount>,

    pub protocol_token_program: Interface<'info, TokenInterface>,
}

/// Withdraw the lifetime vault to the owner, pay out its rewards and sweep
/// whatever the pool owes to no one.
pub fn close_and_collect(ctx: Context<CloseLifetimeVault>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.reward_pool.key();
    let vault_key = ctx.accounts.lifetime_vault.key();

    ctx.accounts.lifetime_vault.check_withdrawable()?;
    require!(
        !ctx.accounts
            .reward_pool
            .has_rewardable_vaults_besides_lifetime(now),
        EscrowError::RemainingRewardableVaults
    );

    // Commit before moving any value
    ctx.accounts.lifetime_vault.record_withdrawal()?;
    ctx.accounts.reward_pool.mark_withdrawn(&vault_key)?;
    let harvested = ctx.accounts.reward_pool.harvest(&vault_key)?;

    let decimals = ctx.accounts.protocol_mint.decimals;

    // Collateral back to the owner, signed by the vault
    let collateral = ctx.accounts.collateral_account.amount;
    if collateral > 0 {
        let index_bytes = ctx.accounts.lifetime_vault.index.to_le_bytes();
        let vault_bump = ctx.accounts.lifetime_vault.bump;
        let vault_seeds: &[&[&[u8]]] = &[&[
            VAULT_SEED,
            pool_key.as_ref(),
            index_bytes.as_ref(),
            &[vault_bump],
        ]];

        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.protocol_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.collateral_account.to_account_info(),
                    to: ctx.accounts.owner_protocol_account.to_account_info(),
                    mint: ctx.accounts.protocol_mint.to_account_info(),
                    authority: ctx.accounts.lifetime_vault.to_account_info(),
                },
                vault_seeds,
            ),
            collateral,
            decimals,
        )?;
    }

    emit!(Withdrawn {
        vault: vault_key,
        amount: collateral,
    });

    // Rewards and dust leave the reward account, signed by the pool
    let owner_key = ctx.accounts.reward_pool.owner;
    let protocol_mint_key = ctx.accounts.reward_pool.protocol_mint;
    let pool_bump = ctx.accounts.reward_pool.bump;
    let pool_seeds: &[&[&[u8]]] = &[&[
        REWARD_POOL_SEED,
        owner_key.as_ref(),
        protocol_mint_key.as_ref(),
        &[pool_bump],
    ]];

    let payout = ctx
        .accounts
        .reward_pool
        .close_payout(ctx.accounts.reward_account.amount, harvested)?;
    let dust = payout.dust;

    if payout.total > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.protocol_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.reward_account.to_account_info(),
                    to: ctx.accounts.owner_protocol_account.to_account_info(),
                    mint: ctx.accounts.protocol_mint.to_account_info(),
                    authority: ctx.accounts.reward_pool.to_account_info(),
                },
                pool_seeds,
            ),
            payout.total,
            decimals,
        )?;
    }

    emit!(Harvested {
        vault: vault_key,
        amount: harvested,
    });

    if dust > 0 {
        emit!(DustCollected {
            pool: pool_key,
            amount: dust,
        });
    }

    emit!(RewardPoolClosed { pool: pool_key });

    msg!(
        "Lifetime vault closed: {} collateral, {} rewards, {} dust",
        collateral,
        harvested,
        dust
    );

    Ok(())
}
