use trident_fuzz::fuzzing::*;

/// Storage for all account addresses used in fuzz testing.
///
/// Docs: https://ackee.xyz/trident/docs/latest/trident-api-macro/trident-types/fuzz-accounts/
#[derive(Default)]
pub struct AccountAddresses {
    pub owner: AddressStorage,

    pub reward_pool: AddressStorage,

    pub protocol_mint: AddressStorage,

    pub reward_account: AddressStorage,

    pub lifetime_vault: AddressStorage,

    pub vault: AddressStorage,

    pub collateral_account: AddressStorage,

    pub key_mint: AddressStorage,

    pub protocol_token_program: AddressStorage,

    pub token_2022_program: AddressStorage,

    pub associated_token_program: AddressStorage,

    pub system_program: AddressStorage,
}
