use {super::MAX_TOKENS, solana_sdk::pubkey::Pubkey};

/// Rate snapshot of one root bank
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RootBankCache {
    pub deposit_index: f64,
    pub borrow_index: f64,
    /// Annualized borrow rate at the time of the refresh
    pub borrow_rate: f64,
    /// Slot of the last refresh; 0 means never refreshed
    pub last_update: u64,
}

/// Per-slot snapshots attached to a group
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarginCache {
    pub pubkey: Pubkey,
    pub root_bank_cache: [RootBankCache; MAX_TOKENS],
}

impl MarginCache {
    pub fn is_refreshed(&self, token_index: usize) -> bool {
        self.root_bank_cache[token_index].last_update > 0
    }

    /// True when the slot was refreshed within `valid_interval` slots of `slot`.
    pub fn is_valid(&self, token_index: usize, slot: u64, valid_interval: u64) -> bool {
        let entry = &self.root_bank_cache[token_index];
        entry.last_update > 0 && slot.saturating_sub(entry.last_update) <= valid_interval
    }
}
