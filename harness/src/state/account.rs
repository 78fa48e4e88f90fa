use {
    super::MAX_TOKENS,
    crate::error::{HarnessError, Result},
    solana_sdk::pubkey::Pubkey,
};

/// A user's position ledger within a group. Amounts are native units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarginAccount {
    pub pubkey: Pubkey,
    pub group: Pubkey,
    pub owner: Pubkey,
    pub deposits: [u64; MAX_TOKENS],
    pub borrows: [u64; MAX_TOKENS],
}

impl MarginAccount {
    /// Deposits minus borrows of one slot; negative when borrowing.
    pub fn net_balance(&self, token_index: usize) -> Result<i128> {
        match (
            self.deposits.get(token_index),
            self.borrows.get(token_index),
        ) {
            (Some(deposits), Some(borrows)) => Ok(*deposits as i128 - *borrows as i128),
            _ => Err(HarnessError::FailedPrecondition(format!(
                "token slot {} is out of range (max {})",
                token_index, MAX_TOKENS
            ))),
        }
    }
}
