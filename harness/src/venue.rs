//! Capability contract of the external margin program.
//!
//! The program and its client SDK are not part of this crate. A
//! [`MarginVenue`] submits each operation as one transaction, waits for
//! confirmation and decodes accounts into the views in [`crate::state`].
//! Reads may lag behind confirmation and then return `Ok(None)`.

use {
    crate::{
        error::Result,
        group::GroupInitParams,
        state::{BankRoute, MarginAccount, MarginCache, MarginGroup, NodeBank, RootBank},
    },
    async_trait::async_trait,
    solana_sdk::{pubkey::Pubkey, signature::Keypair},
};

/// Move `quantity` native units from `token_account` into the route's vault
/// and credit the margin account.
pub struct DepositRequest<'a> {
    pub group: &'a MarginGroup,
    pub account: &'a MarginAccount,
    pub owner: &'a Keypair,
    pub route: &'a BankRoute,
    pub token_account: Pubkey,
    pub quantity: u64,
}

/// Debit the margin account by `quantity` native units and transfer them
/// from the route's vault to `token_account`. With `allow_borrow` the
/// balance may go negative.
pub struct WithdrawRequest<'a> {
    pub group: &'a MarginGroup,
    pub account: &'a MarginAccount,
    pub owner: &'a Keypair,
    pub route: &'a BankRoute,
    pub token_account: Pubkey,
    pub quantity: u64,
    pub allow_borrow: bool,
}

#[async_trait]
pub trait MarginVenue: Send + Sync {
    /// Initialize a group administered by `admin`; returns its address.
    async fn init_group(&self, params: &GroupInitParams, admin: &Keypair) -> Result<Pubkey>;

    async fn fetch_group(&self, group: &Pubkey) -> Result<Option<MarginGroup>>;

    async fn fetch_root_bank(&self, root_bank: &Pubkey) -> Result<Option<RootBank>>;

    async fn fetch_node_bank(&self, node_bank: &Pubkey) -> Result<Option<NodeBank>>;

    /// Refresh the cache entries of every listed root bank in one transaction.
    async fn cache_root_banks(
        &self,
        group: &Pubkey,
        cache: &Pubkey,
        root_banks: &[Pubkey],
        payer: &Keypair,
    ) -> Result<()>;

    async fn fetch_cache(&self, cache: &Pubkey) -> Result<Option<MarginCache>>;

    /// Open a margin account owned by `owner`; returns its address.
    async fn init_account(&self, group: &MarginGroup, owner: &Keypair) -> Result<Pubkey>;

    async fn fetch_account(&self, account: &Pubkey) -> Result<Option<MarginAccount>>;

    async fn deposit(&self, request: DepositRequest<'_>) -> Result<()>;

    async fn withdraw(&self, request: WithdrawRequest<'_>) -> Result<()>;
}

/// Root banks of every slot of `group`, by slot. Unconfigured slots and
/// root banks that cannot be read yield `None`.
pub async fn load_root_banks<V: MarginVenue + ?Sized>(
    venue: &V,
    group: &MarginGroup,
) -> Result<Vec<Option<RootBank>>> {
    let mut root_banks = Vec::with_capacity(group.tokens.len());
    for token in group.tokens.iter() {
        if token.is_empty() || token.root_bank == Pubkey::default() {
            root_banks.push(None);
        } else {
            root_banks.push(venue.fetch_root_bank(&token.root_bank).await?);
        }
    }
    Ok(root_banks)
}

/// Node banks of `root_bank`, in slot order of its active node bank keys.
pub async fn load_node_banks<V: MarginVenue + ?Sized>(
    venue: &V,
    root_bank: &RootBank,
) -> Result<Vec<Option<NodeBank>>> {
    let mut node_banks = Vec::new();
    for key in root_bank.active_node_banks() {
        node_banks.push(venue.fetch_node_bank(key).await?);
    }
    Ok(node_banks)
}
