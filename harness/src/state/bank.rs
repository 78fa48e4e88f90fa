use {
    super::MAX_NODE_BANKS,
    crate::group::RiskCurve,
    solana_sdk::pubkey::Pubkey,
};

/// Accounting root of one pooled asset
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootBank {
    pub pubkey: Pubkey,
    pub risk_curve: RiskCurve,
    /// Node bank slots; unused slots hold the all-zero key
    pub node_banks: [Pubkey; MAX_NODE_BANKS],
}

impl RootBank {
    pub fn active_node_banks(&self) -> impl Iterator<Item = &Pubkey> {
        self.node_banks
            .iter()
            .filter(|key| **key != Pubkey::default())
    }

    pub fn owns_node_bank(&self, node_bank: &Pubkey) -> bool {
        self.active_node_banks().any(|key| key == node_bank)
    }
}

/// Liquidity pool of a root bank
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeBank {
    pub pubkey: Pubkey,
    /// Root bank this pool reports to
    pub root_bank: Pubkey,
    /// Token account holding the pooled liquidity
    pub vault: Pubkey,
    /// Native units deposited
    pub deposits: u64,
    /// Native units lent out
    pub borrows: u64,
}

impl NodeBank {
    /// Fraction of deposits currently lent out, in [0, 1].
    pub fn utilization(&self) -> f64 {
        if self.deposits == 0 {
            0.0
        } else {
            (self.borrows as f64 / self.deposits as f64).min(1.0)
        }
    }
}

/// Accounts a deposit or withdrawal of one token slot goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BankRoute {
    pub token_index: usize,
    pub root_bank: Pubkey,
    pub node_bank: Pubkey,
    pub vault: Pubkey,
}
