//! Margin accounts: open, route resolution, deposit and withdraw.

use {
    crate::{
        config::PollPolicy,
        error::{HarnessError, Result},
        poll::poll_until,
        state::{BankRoute, MarginAccount, MarginGroup},
        token_account::to_native,
        venue::{load_node_banks, DepositRequest, MarginVenue, WithdrawRequest},
    },
    solana_sdk::{
        pubkey::Pubkey,
        signature::{Keypair, Signer},
    },
    std::cmp::Ordering,
};

/// Where one slot of a margin account stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceState {
    /// The margin account does not exist yet
    Uninitialized,
    Zero,
    /// Net deposit
    Positive,
    /// Net borrow
    Negative,
}

impl BalanceState {
    /// Fails with [`HarnessError::FailedPrecondition`] for a slot past the
    /// last one, even when the account does not exist yet.
    pub fn classify(account: Option<&MarginAccount>, token_index: usize) -> Result<Self> {
        let account = match account {
            Some(account) => account,
            None => {
                MarginAccount::default().net_balance(token_index)?;
                return Ok(BalanceState::Uninitialized);
            }
        };
        Ok(match account.net_balance(token_index)?.cmp(&0) {
            Ordering::Less => BalanceState::Negative,
            Ordering::Equal => BalanceState::Zero,
            Ordering::Greater => BalanceState::Positive,
        })
    }
}

pub struct PositionOperator<'a, V: MarginVenue + ?Sized> {
    venue: &'a V,
    poll: PollPolicy,
}

impl<'a, V: MarginVenue + ?Sized> PositionOperator<'a, V> {
    pub fn new(venue: &'a V, poll: PollPolicy) -> Self {
        Self { venue, poll }
    }

    /// Open a margin account for `owner` and return it once readable.
    pub async fn open_account(&self, group: &MarginGroup, owner: &Keypair) -> Result<MarginAccount> {
        let key = self.venue.init_account(group, owner).await?;
        log::info!("opened margin account {} for {}", key, owner.pubkey());
        let venue = self.venue;
        poll_until(&self.poll, key, move || async move {
            venue.fetch_account(&key).await
        })
        .await
    }

    pub async fn fetch_account(&self, account: &Pubkey) -> Result<MarginAccount> {
        self.venue.fetch_account(account).await?.ok_or_else(|| {
            HarnessError::FailedPrecondition(format!("margin account {} not found", account))
        })
    }

    /// Net native balance of one slot.
    pub async fn balance(&self, account: &Pubkey, token_index: usize) -> Result<i128> {
        self.fetch_account(account).await?.net_balance(token_index)
    }

    pub async fn balance_state(&self, account: &Pubkey, token_index: usize) -> Result<BalanceState> {
        let account = self.venue.fetch_account(account).await?;
        BalanceState::classify(account.as_ref(), token_index)
    }

    /// Resolve the root bank, its single active node bank and the vault of
    /// slot `token_index`.
    pub async fn resolve_route(&self, group: &MarginGroup, token_index: usize) -> Result<BankRoute> {
        let token = group
            .tokens
            .get(token_index)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                HarnessError::FailedPrecondition(format!(
                    "token slot {} of group {} is not configured",
                    token_index, group.pubkey
                ))
            })?;
        let root_bank = self
            .venue
            .fetch_root_bank(&token.root_bank)
            .await?
            .ok_or_else(|| {
                HarnessError::FailedPrecondition(format!(
                    "no root bank for token slot {} (expected {})",
                    token_index, token.root_bank
                ))
            })?;
        let node_banks: Vec<_> = load_node_banks(self.venue, &root_bank)
            .await?
            .into_iter()
            .flatten()
            .collect();
        if node_banks.len() != 1 {
            return Err(HarnessError::FailedPrecondition(format!(
                "root bank {} has {} active node banks, expected exactly 1",
                root_bank.pubkey,
                node_banks.len()
            )));
        }
        let node_bank = &node_banks[0];
        if node_bank.root_bank != root_bank.pubkey || !root_bank.owns_node_bank(&node_bank.pubkey)
        {
            return Err(HarnessError::FailedPrecondition(format!(
                "node bank {} does not belong to root bank {}",
                node_bank.pubkey, root_bank.pubkey
            )));
        }
        Ok(BankRoute {
            token_index,
            root_bank: root_bank.pubkey,
            node_bank: node_bank.pubkey,
            vault: node_bank.vault,
        })
    }

    pub async fn deposit(
        &self,
        group: &MarginGroup,
        account: &MarginAccount,
        owner: &Keypair,
        route: &BankRoute,
        source: &Pubkey,
        quantity: u64,
    ) -> Result<()> {
        self.venue
            .deposit(DepositRequest {
                group,
                account,
                owner,
                route,
                token_account: *source,
                quantity,
            })
            .await?;
        log::info!(
            "deposited {} into slot {} of {}",
            quantity,
            route.token_index,
            account.pubkey
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn withdraw(
        &self,
        group: &MarginGroup,
        account: &MarginAccount,
        owner: &Keypair,
        route: &BankRoute,
        destination: &Pubkey,
        quantity: u64,
        allow_borrow: bool,
    ) -> Result<()> {
        self.venue
            .withdraw(WithdrawRequest {
                group,
                account,
                owner,
                route,
                token_account: *destination,
                quantity,
                allow_borrow,
            })
            .await?;
        log::info!(
            "withdrew {} from slot {} of {} (allow_borrow: {})",
            quantity,
            route.token_index,
            account.pubkey,
            allow_borrow
        );
        Ok(())
    }

    /// [`Self::deposit`] with a whole-token amount scaled by the slot's decimals.
    pub async fn deposit_ui(
        &self,
        group: &MarginGroup,
        account: &MarginAccount,
        owner: &Keypair,
        route: &BankRoute,
        source: &Pubkey,
        amount: u64,
    ) -> Result<u64> {
        let quantity = to_native(amount, group.tokens[route.token_index].decimals)?;
        self.deposit(group, account, owner, route, source, quantity)
            .await?;
        Ok(quantity)
    }

    /// [`Self::withdraw`] with a whole-token amount scaled by the slot's decimals.
    #[allow(clippy::too_many_arguments)]
    pub async fn withdraw_ui(
        &self,
        group: &MarginGroup,
        account: &MarginAccount,
        owner: &Keypair,
        route: &BankRoute,
        destination: &Pubkey,
        amount: u64,
        allow_borrow: bool,
    ) -> Result<u64> {
        let quantity = to_native(amount, group.tokens[route.token_index].decimals)?;
        self.withdraw(
            group,
            account,
            owner,
            route,
            destination,
            quantity,
            allow_borrow,
        )
        .await?;
        Ok(quantity)
    }
}
