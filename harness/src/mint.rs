//! Deterministic SPL Token mints.

use {
    crate::{
        error::{HarnessError, Result},
        ledger::{get_packed, process_instructions, Ledger},
        seeds::SeedTable,
    },
    solana_program::program_pack::Pack,
    solana_sdk::{
        pubkey::Pubkey,
        signature::{Keypair, Signer},
        system_instruction::create_account,
    },
    spl_token::state::Mint,
};

pub struct MintFactory<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    seeds: &'a SeedTable,
    decimals: u8,
}

impl<'a, L: Ledger + ?Sized> MintFactory<'a, L> {
    pub fn new(ledger: &'a L, seeds: &'a SeedTable, decimals: u8) -> Self {
        Self {
            ledger,
            seeds,
            decimals,
        }
    }

    /// Address the mint named `name` is created at.
    pub fn address(&self, name: &str) -> Result<Pubkey> {
        self.seeds.address(name)
    }

    /// Create and initialize the mint named `name` in one transaction. `payer`
    /// funds it and becomes both mint and freeze authority.
    pub async fn create_mint(&self, name: &str, payer: &Keypair) -> Result<Pubkey> {
        let mint_keypair = self.seeds.derive_keypair(name)?;
        let mint = mint_keypair.pubkey();
        if self.ledger.get_account(&mint).await?.is_some() {
            return Err(HarnessError::AlreadyExists(mint));
        }
        let lamports = self
            .ledger
            .minimum_balance_for_rent_exemption(Mint::LEN)
            .await?;
        let instructions = [
            create_account(
                &payer.pubkey(),
                &mint,
                lamports,
                Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint(
                &spl_token::id(),
                &mint,
                &payer.pubkey(),
                Some(&payer.pubkey()),
                self.decimals,
            )
            .map_err(|e| HarnessError::FailedPrecondition(e.to_string()))?,
        ];
        process_instructions(self.ledger, &instructions, payer, &[&mint_keypair]).await?;
        log::info!("{} mint: {}", name, mint);
        Ok(mint)
    }
}

pub async fn fetch_mint<L: Ledger + ?Sized>(ledger: &L, mint: &Pubkey) -> Result<Option<Mint>> {
    get_packed::<Mint, L>(ledger, mint).await
}
