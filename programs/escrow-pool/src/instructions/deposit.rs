use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

use crate::{
    constants::{REWARD_POOL_SEED, VAULT_SEED},
    error::EscrowError,
    events::Deposited,
    keys::keys_held,
    state::{Custody, EscrowVault, RewardPool},
};

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,

    #[account(
        mut,
        seeds = [REWARD_POOL_SEED, reward_pool.owner.as_ref(), reward_pool.protocol_mint.as_ref()],
        bump = reward_pool.bump,
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

    pub wanted_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = depositor_collateral_account.mint == wanted_mint.key() @ EscrowError::InvalidMint,
        constraint = depositor_collateral_account.owner == depositor.key(),
    )]
    pub depositor_collateral_account: InterfaceAccount<'info, TokenAccount>,

    #[account(mut)]
    pub collateral_account: InterfaceAccount<'info, TokenAccount>,

    /// Required when the vault charges a deposit fee
    #[account(mut)]
    pub beneficiary_account: Option<InterfaceAccount<'info, TokenAccount>>,

    pub wanted_token_program: Interface<'info, TokenInterface>,
    // remaining_accounts: the depositor's key token accounts
}

/// Resolve the token account fees of `vault` are paid to
pub(crate) fn fee_beneficiary_account<'a, 'info>(
    account: &'a Option<InterfaceAccount<'info, TokenAccount>>,
    vault: &EscrowVault,
) -> Result<&'a InterfaceAccount<'info, TokenAccount>> {
    let account = account.as_ref().ok_or(EscrowError::InvalidBeneficiary)?;
    require!(
        account.mint == vault.wanted_mint && account.owner == vault.fees.fee_beneficiary,
        EscrowError::InvalidBeneficiary
    );
    Ok(account)
}

/// Lock the wanted collateral in the vault. Holding any one key is enough.
pub fn handler(ctx: Context<Deposit>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let vault = &ctx.accounts.vault;

    let keys = keys_held(
        &ctx.accounts.depositor.key(),
        &vault.key_mints,
        ctx.remaining_accounts,
    )?;
    vault.check_deposit(keys, now)?;

    let amount = vault.wanted_amount;
    let fee = vault.deposit_fee()?;
    let decimals = ctx.accounts.wanted_mint.decimals;

    transfer_checked(
        CpiContext::new(
            ctx.accounts.wanted_token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.depositor_collateral_account.to_account_info(),
                to: ctx.accounts.collateral_account.to_account_info(),
                mint: ctx.accounts.wanted_mint.to_account_info(),
                authority: ctx.accounts.depositor.to_account_info(),
            },
        ),
        amount,
        decimals,
    )?;

    // Forward the deposit fee out of the collateral
    if fee > 0 {
        let beneficiary = fee_beneficiary_account(&ctx.accounts.beneficiary_account, vault)?;

        let pool_key = vault.reward_pool;
        let index_bytes = vault.index.to_le_bytes();
        let bump = vault.bump;
        let signer_seeds: &[&[&[u8]]] = &[&[
            VAULT_SEED,
            pool_key.as_ref(),
            index_bytes.as_ref(),
            &[bump],
        ]];

        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.wanted_token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.collateral_account.to_account_info(),
                    to: beneficiary.to_account_info(),
                    mint: ctx.accounts.wanted_mint.to_account_info(),
                    authority: vault.to_account_info(),
                },
                signer_seeds,
            ),
            fee,
            decimals,
        )?;
    }

    let vault_key = ctx.accounts.vault.key();
    ctx.accounts.vault.record_deposit(now)?;
    ctx.accounts.reward_pool.mark_deposited(&vault_key)?;

    emit!(Deposited {
        vault: vault_key,
        amount,
    });

    Ok(())
}
