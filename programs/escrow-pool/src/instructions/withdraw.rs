use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked},
};

use crate::{
    constants::{REWARD_POOL_SEED, VAULT_SEED},
    error::EscrowError,
    events::{Harvested, Reinvested, Withdrawn},
    instructions::deposit::fee_beneficiary_account,
    keys::keys_held,
    state::{Custody, EscrowVault, Payout, RewardPool},
};

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub withdrawer: Signer<'info>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED, reward_pool.owner.as_ref(), reward_pool.protocol_mint.as_ref()],
        bump = reward_pool.bump,
        has_one = protocol_mint @ EscrowError::InvalidMint,
        has_one = reward_account,
    )]
    pub reward_pool: Box<Account<'info, RewardPool>>,

    #[account(
        mut,
        has_one = reward_pool,
        has_one = wanted_mint @ EscrowError::InvalidMint,
        has_one = collateral_account,
        constraint = vault.custody == Custody::KeyQuorum @ EscrowError::Unauthorized,
    )]
    pub vault: Box<Account<'info, EscrowVault>>,

    pub wanted_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub collateral_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = withdrawer,
        associated_token::mint = wanted_mint,
        associated_token::authority = withdrawer,
        associated_token::token_program = wanted_token_program,
    )]
    pub withdrawer_collateral_account: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Required when the vault charges a withdrawal fee
    #[account(mut)]
    pub beneficiary_account: Option<InterfaceAccount<'info, TokenAccount>>,

    pub protocol_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub reward_account: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = withdrawer,
        associated_token::mint = protocol_mint,
        associated_token::authority = withdrawer,
        associated_token::token_program = protocol_token_program,
    )]
    pub withdrawer_protocol_account: Box<InterfaceAccount<'info, TokenAccount>>,

    pub wanted_token_program: Interface<'info, TokenInterface>,
    pub protocol_token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
    // remaining_accounts: the withdrawer's key token accounts
}

/// Keys proven by the withdrawer. Lifecycle errors take precedence over
/// unreadable key accounts.
fn withdrawal_keys(
    vault: &EscrowVault,
    withdrawer: &Pubkey,
    accounts: &[AccountInfo],
) -> Result<u8> {
    vault.check_withdrawable()?;
    keys_held(withdrawer, &vault.key_mints, accounts)
}

/// Release the collateral. At or after the deadline one key suffices and
/// the vault's rewards are paid out; before it two keys are needed and the
/// rewards go back to the other vaults.
pub fn handler(ctx: Context<Withdraw>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault_key = ctx.accounts.vault.key();

    let keys = withdrawal_keys(
        &ctx.accounts.vault,
        &ctx.accounts.withdrawer.key(),
        ctx.remaining_accounts,
    )?;
    ctx.accounts.vault.check_withdraw(keys, now)?;

    // Commit before moving any value
    ctx.accounts.vault.record_withdrawal()?;
    ctx.accounts.reward_pool.mark_withdrawn(&vault_key)?;

    let payout = ctx.accounts.vault.payout(now);
    let rewards = match payout {
        Payout::Harvest => ctx.accounts.reward_pool.harvest(&vault_key)?,
        Payout::Reinvest => ctx.accounts.reward_pool.reinvest(&vault_key, now)?.amount,
    };

    let vault = &ctx.accounts.vault;
    let balance = ctx.accounts.collateral_account.amount;
    let fee = vault.withdraw_fee(balance, now)?;
    let amount = balance.checked_sub(fee).ok_or(EscrowError::MathOverflow)?;
    let decimals = ctx.accounts.wanted_mint.decimals;

    let pool_key = vault.reward_pool;
    let index_bytes = vault.index.to_le_bytes();
    let vault_bump = vault.bump;
    let vault_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        pool_key.as_ref(),
        index_bytes.as_ref(),
        &[vault_bump],
    ]];

    if fee > 0 {
        let beneficiary = fee_beneficiary_account(&ctx.accounts.beneficiary_account, vault)?;

        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.wanted_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.collateral_account.to_account_info(),
                    to: beneficiary.to_account_info(),
                    mint: ctx.accounts.wanted_mint.to_account_info(),
                    authority: vault.to_account_info(),
                },
                vault_seeds,
            ),
            fee,
            decimals,
        )?;
    }

    if amount > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.wanted_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.collateral_account.to_account_info(),
                    to: ctx.accounts.withdrawer_collateral_account.to_account_info(),
                    mint: ctx.accounts.wanted_mint.to_account_info(),
                    authority: vault.to_account_info(),
                },
                vault_seeds,
            ),
            amount,
            decimals,
        )?;
    }

    match payout {
        Payout::Harvest => {
            if rewards > 0 {
                let owner_key = ctx.accounts.reward_pool.owner;
                let protocol_mint_key = ctx.accounts.reward_pool.protocol_mint;
                let pool_bump = ctx.accounts.reward_pool.bump;
                let pool_seeds: &[&[&[u8]]] = &[&[
                    REWARD_POOL_SEED,
                    owner_key.as_ref(),
                    protocol_mint_key.as_ref(),
                    &[pool_bump],
                ]];

                transfer_checked(
                    CpiContext::new_with_signer(
                        ctx.accounts.protocol_token_program.to_account_info(),
                        TransferChecked {
                            from: ctx.accounts.reward_account.to_account_info(),
                            to: ctx.accounts.withdrawer_protocol_account.to_account_info(),
                            mint: ctx.accounts.protocol_mint.to_account_info(),
                            authority: ctx.accounts.reward_pool.to_account_info(),
                        },
                        pool_seeds,
                    ),
                    rewards,
                    ctx.accounts.protocol_mint.decimals,
                )?;
            }

            emit!(Harvested {
                vault: vault_key,
                amount: rewards,
            });
        }
        Payout::Reinvest => {
            emit!(Reinvested {
                vault: vault_key,
                amount: rewards,
            });
        }
    }

    emit!(Withdrawn {
        vault: vault_key,
        amount,
    });

    Ok(())
}
