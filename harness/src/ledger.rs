//! Network endpoint contract.
//!
//! Everything the harness sends or reads goes through [`Ledger`]. A
//! successful [`Ledger::process_transaction`] means the transaction was
//! confirmed; it does not mean every account it touched is already readable.

use {
    crate::error::{HarnessError, Result},
    async_trait::async_trait,
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_program::program_pack::{IsInitialized, Pack},
    solana_sdk::{
        account::Account,
        commitment_config::CommitmentConfig,
        hash::Hash,
        instruction::Instruction,
        pubkey::Pubkey,
        signature::{Keypair, Signer},
        transaction::Transaction,
    },
};

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Credit `lamports` to `to` and wait for confirmation.
    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<()>;

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Submit a signed transaction and wait for confirmation.
    async fn process_transaction(&self, transaction: Transaction) -> Result<()>;

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;

    async fn balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self
            .get_account(address)
            .await?
            .map(|account| account.lamports)
            .unwrap_or_default())
    }
}

/// Build a transaction paid by `payer`, sign it with `payer` and `signers`,
/// submit it and wait for confirmation.
pub async fn process_instructions<L: Ledger + ?Sized>(
    ledger: &L,
    instructions: &[Instruction],
    payer: &Keypair,
    signers: &[&Keypair],
) -> Result<()> {
    let mut transaction = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
    let mut all_signers: Vec<&Keypair> = Vec::with_capacity(signers.len() + 1);
    all_signers.push(payer);
    all_signers.extend(
        signers
            .iter()
            .copied()
            .filter(|signer| signer.pubkey() != payer.pubkey()),
    );
    let recent_blockhash = ledger.latest_blockhash().await?;
    transaction.sign(&all_signers, recent_blockhash);
    ledger.process_transaction(transaction).await
}

/// Read and unpack an account; `None` when it does not exist.
pub async fn get_packed<T: Pack + IsInitialized, L: Ledger + ?Sized>(
    ledger: &L,
    address: &Pubkey,
) -> Result<Option<T>> {
    match ledger.get_account(address).await? {
        Some(account) => T::unpack(&account.data)
            .map(Some)
            .map_err(|e| {
                HarnessError::FailedPrecondition(format!("{} cannot be unpacked: {}", address, e))
            }),
        None => Ok(None),
    }
}

/// [`Ledger`] over a JSON RPC endpoint, e.g. a local test validator.
pub struct RpcLedger {
    client: RpcClient,
}

impl RpcLedger {
    pub fn new(url: String, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url, commitment),
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<()> {
        let signature = self.client.request_airdrop(to, lamports).await?;
        log::debug!("airdrop {} lamports to {}: {}", lamports, to, signature);
        self.client
            .poll_for_signature_with_commitment(&signature, self.client.commitment())
            .await?;
        Ok(())
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64> {
        Ok(self
            .client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await?)
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.client.get_latest_blockhash().await?)
    }

    async fn process_transaction(&self, transaction: Transaction) -> Result<()> {
        let signature = self
            .client
            .send_and_confirm_transaction(&transaction)
            .await?;
        log::debug!("confirmed {}", signature);
        Ok(())
    }

    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        Ok(self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await?
            .value)
    }
}
