use {
    super::{MAX_TOKENS, QUOTE_INDEX},
    solana_sdk::pubkey::Pubkey,
};

/// One token slot of a group. Unconfigured slots carry the all-zero mint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenInfo {
    pub mint: Pubkey,
    pub root_bank: Pubkey,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn is_empty(&self) -> bool {
        self.mint == Pubkey::default()
    }
}

/// Top-level margin group
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarginGroup {
    pub pubkey: Pubkey,
    /// Authority that initialized the group
    pub admin: Pubkey,
    /// Settlement venue (dex) program
    pub dex_program_id: Pubkey,
    /// Token account receiving fees, denominated in the quote mint
    pub fee_vault: Pubkey,
    /// Vault for the secondary reserve asset
    pub msrm_vault: Pubkey,
    /// Cache account holding per-slot snapshots
    pub cache: Pubkey,
    /// Number of slots a cache entry stays valid
    pub valid_interval: u64,
    pub tokens: [TokenInfo; MAX_TOKENS],
}

impl MarginGroup {
    pub fn quote_token(&self) -> &TokenInfo {
        &self.tokens[QUOTE_INDEX]
    }

    pub fn quote_mint(&self) -> Pubkey {
        self.quote_token().mint
    }

    pub fn find_token_index(&self, mint: &Pubkey) -> Option<usize> {
        self.tokens
            .iter()
            .position(|token| !token.is_empty() && token.mint == *mint)
    }

    /// Configured slots, in slot order.
    pub fn active_tokens(&self) -> impl Iterator<Item = (usize, &TokenInfo)> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.is_empty())
    }

    /// True once the group is readable with its quote slot and cache set.
    pub fn is_populated(&self) -> bool {
        !self.quote_token().is_empty()
            && self.quote_token().root_bank != Pubkey::default()
            && self.cache != Pubkey::default()
    }
}
