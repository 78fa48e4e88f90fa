//! The full linear fixture flow, from funding to the final withdrawal.
//!
//! Every step waits for the previous one to be confirmed (and, where the next
//! step reads state, observable) before it is issued.

use {
    crate::{
        cache::CacheRefresher,
        config::HarnessConfig,
        error::Result,
        funding::fund_sol,
        group::{GroupInitParams, GroupLifecycle},
        ledger::Ledger,
        mint::MintFactory,
        position::PositionOperator,
        seeds::SeedTable,
        state::{BankRoute, MarginGroup, QUOTE_INDEX},
        token_account::{create_holding_account, issue, token_balance},
        venue::MarginVenue,
    },
    solana_sdk::{
        pubkey::Pubkey,
        signature::{Keypair, Signer},
    },
};

/// Everything the flow created, plus the balances it ended with.
#[derive(Clone, Debug)]
pub struct ScenarioReport {
    pub quote_mint: Pubkey,
    pub msrm_mint: Pubkey,
    pub fee_vault: Pubkey,
    pub user_token_account: Pubkey,
    pub group: MarginGroup,
    pub margin_account: Pubkey,
    pub route: BankRoute,
    /// Native units moved by the deposit and the withdrawal
    pub quantity: u64,
    /// Net balance of the quote slot right after the deposit
    pub balance_after_deposit: i128,
    /// Net balance of the quote slot at the end
    pub final_balance: i128,
    /// Holding account balance at the end
    pub final_token_balance: u64,
}

pub struct Scenario<'a, L: Ledger + ?Sized, V: MarginVenue + ?Sized> {
    ledger: &'a L,
    venue: &'a V,
    config: &'a HarnessConfig,
    seeds: &'a SeedTable,
}

impl<'a, L: Ledger + ?Sized, V: MarginVenue + ?Sized> Scenario<'a, L, V> {
    pub fn new(
        ledger: &'a L,
        venue: &'a V,
        config: &'a HarnessConfig,
        seeds: &'a SeedTable,
    ) -> Self {
        Self {
            ledger,
            venue,
            config,
            seeds,
        }
    }

    /// Fund `payer`, create the quote and reserve mints, the fee vault and the
    /// payer's holding account, initialize and cache the group, then deposit
    /// and withdraw `deposit_amount` of the quote token with borrowing allowed.
    pub async fn run(&self, payer: &Keypair) -> Result<ScenarioReport> {
        let config = self.config;
        config.validate()?;

        fund_sol(self.ledger, &payer.pubkey(), config.airdrop_sol).await?;

        let mints = MintFactory::new(self.ledger, self.seeds, config.decimals);
        let quote_mint = mints.create_mint(&config.quote_mint, payer).await?;
        let msrm_mint = mints.create_mint(&config.reserve_mint, payer).await?;

        let fee_vault =
            create_holding_account(self.ledger, &quote_mint, payer, &config.fee_vault_owner)
                .await?;
        let user_token_account =
            create_holding_account(self.ledger, &quote_mint, payer, &payer.pubkey()).await?;

        let lifecycle = GroupLifecycle::new(self.venue, config.poll);
        let group = lifecycle
            .init_group(
                &GroupInitParams {
                    quote_mint,
                    msrm_mint,
                    dex_program_id: config.dex_program_id,
                    fee_vault,
                    risk_curve: config.risk_curve,
                },
                payer,
            )
            .await?;

        CacheRefresher::new(self.venue)
            .refresh_group(&group, payer)
            .await?;

        let positions = PositionOperator::new(self.venue, config.poll);
        let account = positions.open_account(&group, payer).await?;
        let route = positions.resolve_route(&group, QUOTE_INDEX).await?;

        issue(
            self.ledger,
            &quote_mint,
            payer,
            &user_token_account,
            config.deposit_amount,
            Some(config.decimals),
        )
        .await?;

        let quantity = positions
            .deposit_ui(
                &group,
                &account,
                payer,
                &route,
                &user_token_account,
                config.deposit_amount,
            )
            .await?;
        let balance_after_deposit = positions.balance(&account.pubkey, QUOTE_INDEX).await?;

        positions
            .withdraw(
                &group,
                &account,
                payer,
                &route,
                &user_token_account,
                quantity,
                true,
            )
            .await?;
        let final_balance = positions.balance(&account.pubkey, QUOTE_INDEX).await?;
        let final_token_balance = token_balance(self.ledger, &user_token_account).await?;

        log::info!(
            "scenario complete: group {}, account {}, final balance {}",
            group.pubkey,
            account.pubkey,
            final_balance
        );

        Ok(ScenarioReport {
            quote_mint,
            msrm_mint,
            fee_vault,
            user_token_account,
            margin_account: account.pubkey,
            group,
            route,
            quantity,
            balance_after_deposit,
            final_balance,
            final_token_balance,
        })
    }
}
