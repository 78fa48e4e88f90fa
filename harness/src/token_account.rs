//! Holding accounts: provisioning, issuance and balances.

use {
    crate::{
        config::DEFAULT_DECIMALS,
        error::{HarnessError, Result},
        ledger::{get_packed, process_instructions, Ledger},
    },
    solana_sdk::{
        pubkey::Pubkey,
        signature::{Keypair, Signer},
    },
    spl_associated_token_account::{
        get_associated_token_address, instruction::create_associated_token_account,
    },
    spl_token::state::Account as TokenAccount,
};

/// Canonical holding account of (`owner`, `mint`).
pub fn holding_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, mint)
}

/// Create the associated token account of (`owner`, `mint`), paid by `payer`.
/// Fails with [`HarnessError::AlreadyExists`] if it is already there.
pub async fn create_holding_account<L: Ledger + ?Sized>(
    ledger: &L,
    mint: &Pubkey,
    payer: &Keypair,
    owner: &Pubkey,
) -> Result<Pubkey> {
    let address = holding_address(owner, mint);
    if ledger.get_account(&address).await?.is_some() {
        return Err(HarnessError::AlreadyExists(address));
    }
    let instruction =
        create_associated_token_account(&payer.pubkey(), owner, mint, &spl_token::id());
    process_instructions(ledger, &[instruction], payer, &[]).await?;
    log::debug!("holding account {} for owner {} mint {}", address, owner, mint);
    Ok(address)
}

/// Scale a whole-token amount to native units.
pub fn to_native(amount: u64, decimals: u8) -> Result<u64> {
    10u64
        .checked_pow(decimals as u32)
        .and_then(|scale| amount.checked_mul(scale))
        .ok_or(HarnessError::MathOverflow)
}

/// Mint `amount` whole tokens into `destination`. `authority` is the mint
/// authority and pays the fee.
pub async fn issue<L: Ledger + ?Sized>(
    ledger: &L,
    mint: &Pubkey,
    authority: &Keypair,
    destination: &Pubkey,
    amount: u64,
    decimals: Option<u8>,
) -> Result<u64> {
    let decimals = decimals.unwrap_or(DEFAULT_DECIMALS);
    let native_amount = to_native(amount, decimals)?;
    let instruction = spl_token::instruction::mint_to_checked(
        &spl_token::id(),
        mint,
        destination,
        &authority.pubkey(),
        &[],
        native_amount,
        decimals,
    )
    .map_err(|e| HarnessError::FailedPrecondition(e.to_string()))?;
    process_instructions(ledger, &[instruction], authority, &[]).await?;
    log::debug!("issued {} of mint {} to {}", native_amount, mint, destination);
    Ok(native_amount)
}

pub async fn fetch_token_account<L: Ledger + ?Sized>(
    ledger: &L,
    address: &Pubkey,
) -> Result<Option<TokenAccount>> {
    get_packed::<TokenAccount, L>(ledger, address).await
}

/// Native amount held by a token account.
pub async fn token_balance<L: Ledger + ?Sized>(ledger: &L, address: &Pubkey) -> Result<u64> {
    fetch_token_account(ledger, address)
        .await?
        .map(|account| account.amount)
        .ok_or_else(|| {
            HarnessError::FailedPrecondition(format!("token account {} not found", address))
        })
}

/// Transfer native units between token accounts of the same mint.
pub async fn transfer<L: Ledger + ?Sized>(
    ledger: &L,
    source: &Pubkey,
    destination: &Pubkey,
    authority: &Keypair,
    payer: &Keypair,
    amount: u64,
) -> Result<()> {
    let instruction = spl_token::instruction::transfer(
        &spl_token::id(),
        source,
        destination,
        &authority.pubkey(),
        &[],
        amount,
    )
    .map_err(|e| HarnessError::FailedPrecondition(e.to_string()))?;
    process_instructions(ledger, &[instruction], payer, &[authority]).await
}
