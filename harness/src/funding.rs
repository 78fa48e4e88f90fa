use {
    crate::{
        error::{HarnessError, Result},
        ledger::Ledger,
    },
    solana_program::native_token::LAMPORTS_PER_SOL,
    solana_sdk::pubkey::Pubkey,
};

/// Credit `lamports` to `identity` and wait for confirmation. No retry: a
/// failed airdrop aborts the caller.
pub async fn fund<L: Ledger + ?Sized>(ledger: &L, identity: &Pubkey, lamports: u64) -> Result<()> {
    ledger.request_airdrop(identity, lamports).await?;
    log::info!("funded {} with {} lamports", identity, lamports);
    Ok(())
}

/// [`fund`] with a whole-SOL amount.
pub async fn fund_sol<L: Ledger + ?Sized>(ledger: &L, identity: &Pubkey, sol: u64) -> Result<()> {
    fund(ledger, identity, sol_to_lamports(sol)?).await
}

pub fn sol_to_lamports(sol: u64) -> Result<u64> {
    sol.checked_mul(LAMPORTS_PER_SOL)
        .ok_or(HarnessError::MathOverflow)
}
