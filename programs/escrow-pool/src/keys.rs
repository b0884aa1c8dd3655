use anchor_lang::prelude::*;
use spl_token_2022::{extension::StateWithExtensions, state::Account as SplTokenAccount};

use crate::constants::KEY_COUNT;
use crate::error::EscrowError;

/// Key token balance as read from a token account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyHolding {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

/// Number of distinct key mints of a vault that `holder` holds.
///
/// Holdings owned by someone else, empty, or of a foreign mint are ignored,
/// and a mint counts once however many accounts carry it.
pub fn count_distinct_keys(
    holder: &Pubkey,
    key_mints: &[Pubkey; KEY_COUNT],
    holdings: &[KeyHolding],
) -> u8 {
    let mut held = [false; KEY_COUNT];

    for holding in holdings {
        if holding.owner != *holder || holding.amount == 0 {
            continue;
        }
        if let Some(slot) = key_mints.iter().position(|mint| *mint == holding.mint) {
            held[slot] = true;
        }
    }

    held.iter().filter(|held| **held).count() as u8
}

/// Decode Token-2022 accounts passed as remaining accounts
pub fn read_key_holdings(accounts: &[AccountInfo]) -> Result<Vec<KeyHolding>> {
    accounts
        .iter()
        .map(|account| {
            require_keys_eq!(
                *account.owner,
                spl_token_2022::ID,
                EscrowError::InvalidKeyAccount
            );

            let data = account.try_borrow_data()?;
            let state = StateWithExtensions::<SplTokenAccount>::unpack(&data)
                .map_err(|_| error!(EscrowError::InvalidKeyAccount))?;

            Ok(KeyHolding {
                mint: state.base.mint,
                owner: state.base.owner,
                amount: state.base.amount,
            })
        })
        .collect()
}

/// Distinct keys of `key_mints` that `holder` proves in `accounts`
pub fn keys_held(
    holder: &Pubkey,
    key_mints: &[Pubkey; KEY_COUNT],
    accounts: &[AccountInfo],
) -> Result<u8> {
    let holdings = read_key_holdings(accounts)?;
    Ok(count_distinct_keys(holder, key_mints, &holdings))
}
