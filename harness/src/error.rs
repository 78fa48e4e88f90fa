//! Error types

use {
    solana_sdk::{pubkey::Pubkey, transaction::TransactionError},
    thiserror::Error,
};

/// Errors that may be returned by the harness.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum HarnessError {
    // 0
    /// The endpoint could not be reached or answered with a non-transaction error.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The transaction was submitted and rejected.
    #[error("Transaction rejected: {0}")]
    Transaction(#[from] TransactionError),
    /// An account that must be fresh already exists.
    #[error("Account {0} already exists")]
    AlreadyExists(Pubkey),
    /// Confirmed, but the account state could not be read within the poll budget.
    #[error("Account {address} not observable after {attempts} attempts ({elapsed_ms} ms)")]
    NotYetObservable {
        address: Pubkey,
        attempts: u32,
        elapsed_ms: u64,
    },
    /// A required prior state is missing.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    // 5
    /// The seed table has no entry for the name.
    #[error("No seed named `{0}` in the seed table")]
    UnknownSeed(String),
    /// The seed bytes do not form a keypair.
    #[error("Seed `{name}` is invalid: {reason}")]
    InvalidSeed { name: String, reason: String },
    /// Risk curve values are out of range.
    #[error("Invalid risk curve: {0}")]
    InvalidRiskCurve(String),
    /// Configuration could not be read or parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Amount scaling overflowed.
    #[error("Math operation overflow")]
    MathOverflow,

    // 10
    /// The margin program rejected the operation.
    #[error("Margin venue error: {0}")]
    Venue(#[from] VenueError),
}

/// Rejections raised by the margin program itself.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum VenueError {
    #[error("Account {0} is not known to the margin program")]
    UnknownAccount(Pubkey),
    #[error("Node bank {node_bank} does not belong to root bank {root_bank}")]
    NodeBankMismatch { root_bank: Pubkey, node_bank: Pubkey },
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: i128 },
    #[error("Insufficient vault liquidity: requested {requested}, vault holds {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },
    #[error("Signer {0} is not the owner of the margin account")]
    InvalidOwner(Pubkey),
    #[error("Token slot {0} is not configured in the group")]
    InvalidToken(usize),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl From<solana_client::client_error::ClientError> for HarnessError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        match err.get_transaction_error() {
            Some(tx_err) => HarnessError::Transaction(tx_err),
            None => HarnessError::Transport(err.to_string()),
        }
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::InvalidConfig(err.to_string())
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::InvalidConfig(err.to_string())
    }
}
