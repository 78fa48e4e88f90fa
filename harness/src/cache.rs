//! Cache refresh for a group's configured root banks.

use {
    crate::{
        error::{HarnessError, Result},
        state::{MarginCache, MarginGroup},
        venue::MarginVenue,
    },
    solana_sdk::{pubkey::Pubkey, signature::Keypair},
};

/// Root banks of the configured slots, in slot order. Placeholder slots
/// (zero mint) are left out.
pub fn active_root_banks(group: &MarginGroup) -> Vec<Pubkey> {
    group
        .active_tokens()
        .map(|(_, token)| token.root_bank)
        .filter(|root_bank| *root_bank != Pubkey::default())
        .collect()
}

pub struct CacheRefresher<'a, V: MarginVenue + ?Sized> {
    venue: &'a V,
}

impl<'a, V: MarginVenue + ?Sized> CacheRefresher<'a, V> {
    pub fn new(venue: &'a V) -> Self {
        Self { venue }
    }

    /// Refresh every listed root bank in a single transaction. One invalid
    /// address rejects the whole refresh.
    pub async fn refresh(
        &self,
        group: &Pubkey,
        cache: &Pubkey,
        root_banks: &[Pubkey],
        payer: &Keypair,
    ) -> Result<()> {
        if root_banks.is_empty() {
            return Err(HarnessError::FailedPrecondition(format!(
                "group {} has no root banks to cache",
                group
            )));
        }
        self.venue
            .cache_root_banks(group, cache, root_banks, payer)
            .await?;
        log::info!("refreshed {} cache entries of group {}", root_banks.len(), group);
        Ok(())
    }

    /// Refresh the cache entries of every configured slot of `group`.
    pub async fn refresh_group(&self, group: &MarginGroup, payer: &Keypair) -> Result<()> {
        let root_banks = active_root_banks(group);
        self.refresh(&group.pubkey, &group.cache, &root_banks, payer)
            .await
    }

    pub async fn fetch(&self, group: &MarginGroup) -> Result<MarginCache> {
        self.venue.fetch_cache(&group.cache).await?.ok_or_else(|| {
            HarnessError::FailedPrecondition(format!("cache {} not found", group.cache))
        })
    }
}
