use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_2022::{self, MintTo, SetAuthority, Token2022},
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use spl_token_2022::instruction::AuthorityType;

use crate::{
    constants::{KEY_DECIMALS, KEY_MINT_SEED, REWARD_POOL_SEED, VAULT_SEED},
    error::EscrowError,
    events::VaultCreated,
    math::protocol_fee_from_gross,
    state::{Custody, EscrowVault, FeeSchedule, RewardPool},
};

/// Terms of a new vault
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateVaultParams {
    /// Collateral the vault expects on deposit
    pub wanted_amount: u64,
    /// Collateral value in protocol asset units, the fee basis for foreign
    /// collateral (and an override for protocol collateral when non-zero)
    pub backed_value: u64,
    pub locked_until: i64,
}

impl CreateVaultParams {
    /// Amount the 2% creation fee is charged on
    pub fn fee_basis(&self, wanted_mint: &Pubkey, protocol_mint: &Pubkey) -> u64 {
        if wanted_mint == protocol_mint && self.backed_value == 0 {
            self.wanted_amount
        } else {
            self.backed_value
        }
    }
}

#[derive(Accounts)]
pub struct CreateVault<'info> {
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED, reward_pool.owner.as_ref(), reward_pool.protocol_mint.as_ref()],
        bump = reward_pool.bump,
        constraint = reward_pool.owner == creator.key() @ EscrowError::Unauthorized,
        has_one = protocol_mint @ EscrowError::InvalidMint,
        has_one = reward_account,
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        init,
        payer = creator,
        space = EscrowVault::LEN,
        seeds = [VAULT_SEED, reward_pool.key().as_ref(), &reward_pool.next_index().to_le_bytes()],
        bump
    )]
    pub vault: Box<Account<'info, EscrowVault>>,

    pub protocol_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub reward_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = creator_protocol_account.mint == protocol_mint.key() @ EscrowError::InvalidMint,
        constraint = creator_protocol_account.owner == creator.key(),
    )]
    pub creator_protocol_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub wanted_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = creator,
        associated_token::mint = wanted_mint,
        associated_token::authority = vault,
        associated_token::token_program = wanted_token_program,
    )]
    pub collateral_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = creator,
        seeds = [KEY_MINT_SEED, vault.key().as_ref(), &[1u8]],
        bump,
        mint::decimals = KEY_DECIMALS,
        mint::authority = vault,
        mint::token_program = token_2022_program,
    )]
    pub key_mint_1: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = creator,
        seeds = [KEY_MINT_SEED, vault.key().as_ref(), &[2u8]],
        bump,
        mint::decimals = KEY_DECIMALS,
        mint::authority = vault,
        mint::token_program = token_2022_program,
    )]
    pub key_mint_2: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = creator,
        seeds = [KEY_MINT_SEED, vault.key().as_ref(), &[3u8]],
        bump,
        mint::decimals = KEY_DECIMALS,
        mint::authority = vault,
        mint::token_program = token_2022_program,
    )]
    pub key_mint_3: Box<InterfaceAccount<'info, Mint>>,

    #[account(
        init,
        payer = creator,
        associated_token::mint = key_mint_1,
        associated_token::authority = creator,
        associated_token::token_program = token_2022_program,
    )]
    pub creator_key_account_1: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = creator,
        associated_token::mint = key_mint_2,
        associated_token::authority = creator,
        associated_token::token_program = token_2022_program,
    )]
    pub creator_key_account_2: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = creator,
        associated_token::mint = key_mint_3,
        associated_token::authority = creator,
        associated_token::token_program = token_2022_program,
    )]
    pub creator_key_account_3: Box<InterfaceAccount<'info, TokenAccount>>,

    pub protocol_token_program: Interface<'info, TokenInterface>,
    pub wanted_token_program: Interface<'info, TokenInterface>,
    pub token_2022_program: Program<'info, Token2022>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<CreateVault>,
    params: CreateVaultParams,
    fees: FeeSchedule,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    let pool = &ctx.accounts.reward_pool;
    let wanted_mint = &ctx.accounts.wanted_mint;
    let wanted_mint_key = wanted_mint.key();
    let non_fungible = wanted_mint.decimals == 0 && wanted_mint.supply == 1;

    pool.check_create(
        params.locked_until,
        params.wanted_amount,
        &fees,
        non_fungible,
        now,
    )?;

    // Charge and distribute the creation fee before the new vault joins
    let basis = params.fee_basis(&wanted_mint_key, &pool.protocol_mint);
    let fee = protocol_fee_from_gross(basis)?;

    if fee > 0 {
        transfer_checked(
            CpiContext::new(
                ctx.accounts.protocol_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.creator_protocol_account.to_account_info(),
                    to: ctx.accounts.reward_account.to_account_info(),
                    mint: ctx.accounts.protocol_mint.to_account_info(),
                    authority: ctx.accounts.creator.to_account_info(),
                },
            ),
            fee,
            ctx.accounts.protocol_mint.decimals,
        )?;
    }

    let vault_key = ctx.accounts.vault.key();
    let pool = &mut ctx.accounts.reward_pool;
    pool.distribute(fee, now, None)?;
    let index = pool.register_vault(vault_key, params.locked_until, fee)?;

    let pool_key = pool.key();
    let creator = ctx.accounts.creator.key();
    let key_mints = [
        ctx.accounts.key_mint_1.key(),
        ctx.accounts.key_mint_2.key(),
        ctx.accounts.key_mint_3.key(),
    ];

    let vault = &mut ctx.accounts.vault;
    vault.reward_pool = pool_key;
    vault.creator = creator;
    vault.index = index;
    vault.custody = Custody::KeyQuorum;
    vault.key_mints = key_mints;
    vault.wanted_mint = wanted_mint_key;
    vault.wanted_amount = params.wanted_amount;
    vault.creation_fee = fee;
    vault.collateral_account = ctx.accounts.collateral_account.key();
    vault.locked_until = params.locked_until;
    vault.fees = fees;
    vault.is_deposited = false;
    vault.deposit_timestamp = 0;
    vault.is_withdrawn = false;
    vault.bump = ctx.bumps.vault;
    vault._reserved = [0u8; 32];

    issue_keys(&ctx, pool_key, index)?;

    emit!(VaultCreated {
        pool: pool_key,
        vault: vault_key,
        creator,
        index,
        wanted_mint: wanted_mint_key,
        wanted_amount: params.wanted_amount,
        locked_until: params.locked_until,
        fee,
    });

    Ok(())
}

/// Mint one of each key to the creator and drop the mint authority so the
/// supply of every key stays at one.
fn issue_keys(ctx: &Context<CreateVault>, pool_key: Pubkey, index: u32) -> Result<()> {
    let index_bytes = index.to_le_bytes();
    let bump = ctx.bumps.vault;
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        pool_key.as_ref(),
        index_bytes.as_ref(),
        &[bump],
    ]];

    let keys = [
        (&ctx.accounts.key_mint_1, &ctx.accounts.creator_key_account_1),
        (&ctx.accounts.key_mint_2, &ctx.accounts.creator_key_account_2),
        (&ctx.accounts.key_mint_3, &ctx.accounts.creator_key_account_3),
    ];

    for (mint, holder) in keys {
        token_2022::mint_to(
            CpiContext::new_with_signer(
                ctx.accounts.token_2022_program.to_account_info(),
                MintTo {
                    mint: mint.to_account_info(),
                    to: holder.to_account_info(),
                    authority: ctx.accounts.vault.to_account_info(),
                },
                signer_seeds,
            ),
            1,
        )?;

        token_2022::set_authority(
            CpiContext::new_with_signer(
                ctx.accounts.token_2022_program.to_account_info(),
                SetAuthority {
                    current_authority: ctx.accounts.vault.to_account_info(),
                    account_or_mint: mint.to_account_info(),
                },
                signer_seeds,
            ),
            AuthorityType::MintTokens,
            None,
        )?;
    }

    Ok(())
}
