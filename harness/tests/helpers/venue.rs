//! In-process stand-in for the margin program.
//!
//! Group, bank, cache and account state lives in memory; deposits and
//! withdrawals move real SPL tokens on the test ledger between the user's
//! holding account and a vault owned by the venue. Borrowing skips health
//! checks and is only bounded by vault liquidity.

use {
    async_trait::async_trait,
    margin_harness::{
        error::{Result, VenueError},
        group::GroupInitParams,
        ledger::{process_instructions, Ledger},
        mint::fetch_mint,
        state::{
            BankRoute, MarginAccount, MarginCache, MarginGroup, NodeBank, RootBank,
            RootBankCache, TokenInfo, MAX_NODE_BANKS, QUOTE_INDEX,
        },
        token_account::{token_balance, transfer},
        venue::{DepositRequest, MarginVenue, WithdrawRequest},
    },
    solana_sdk::{
        program_pack::Pack,
        pubkey::Pubkey,
        signature::{Keypair, Signer},
        system_instruction::create_account,
    },
    spl_token::state::Account as TokenAccount,
    std::{collections::HashMap, sync::Mutex},
};

#[derive(Clone, Debug)]
pub struct VenueOptions {
    /// Reads of a freshly created group or account that come back empty
    pub visibility_lag: u32,
    /// Node banks created under the quote root bank
    pub node_banks_per_root: usize,
    /// Leave the quote root bank out of the program state
    pub omit_quote_root_bank: bool,
}

impl Default for VenueOptions {
    fn default() -> Self {
        Self {
            visibility_lag: 2,
            node_banks_per_root: 1,
            omit_quote_root_bank: false,
        }
    }
}

#[derive(Default)]
struct VenueState {
    groups: HashMap<Pubkey, MarginGroup>,
    root_banks: HashMap<Pubkey, RootBank>,
    node_banks: HashMap<Pubkey, NodeBank>,
    caches: HashMap<Pubkey, MarginCache>,
    accounts: HashMap<Pubkey, MarginAccount>,
    hidden_reads: HashMap<Pubkey, u32>,
    slot: u64,
}

impl VenueState {
    /// Consume one hidden read of `key`; true once the key is visible.
    fn observe(&mut self, key: &Pubkey) -> bool {
        match self.hidden_reads.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                false
            }
            _ => true,
        }
    }
}

pub struct SimulatedVenue<L: Ledger> {
    ledger: L,
    options: VenueOptions,
    vault_authority: Keypair,
    state: Mutex<VenueState>,
}

impl<L: Ledger> SimulatedVenue<L> {
    pub fn new(ledger: L, options: VenueOptions) -> Self {
        Self {
            ledger,
            options,
            vault_authority: Keypair::new(),
            state: Mutex::new(VenueState::default()),
        }
    }

    pub fn vault_authority(&self) -> Pubkey {
        self.vault_authority.pubkey()
    }

    async fn create_vault(&self, mint: &Pubkey, payer: &Keypair) -> Result<Pubkey> {
        let vault = Keypair::new();
        let lamports = self
            .ledger
            .minimum_balance_for_rent_exemption(TokenAccount::LEN)
            .await?;
        let instructions = [
            create_account(
                &payer.pubkey(),
                &vault.pubkey(),
                lamports,
                TokenAccount::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_account(
                &spl_token::id(),
                &vault.pubkey(),
                mint,
                &self.vault_authority.pubkey(),
            )
            .unwrap(),
        ];
        process_instructions(&self.ledger, &instructions, payer, &[&vault]).await?;
        Ok(vault.pubkey())
    }

    fn check_route(&self, group: &MarginGroup, route: &BankRoute) -> Result<()> {
        let state = self.state.lock().unwrap();
        let token = group
            .tokens
            .get(route.token_index)
            .filter(|token| !token.is_empty())
            .ok_or(VenueError::InvalidToken(route.token_index))?;
        if token.root_bank != route.root_bank {
            return Err(VenueError::UnknownAccount(route.root_bank).into());
        }
        let root_bank = state
            .root_banks
            .get(&route.root_bank)
            .ok_or(VenueError::UnknownAccount(route.root_bank))?;
        let node_bank = state
            .node_banks
            .get(&route.node_bank)
            .ok_or(VenueError::UnknownAccount(route.node_bank))?;
        if node_bank.root_bank != root_bank.pubkey || !root_bank.owns_node_bank(&node_bank.pubkey)
        {
            return Err(VenueError::NodeBankMismatch {
                root_bank: root_bank.pubkey,
                node_bank: node_bank.pubkey,
            }
            .into());
        }
        if node_bank.vault != route.vault {
            return Err(VenueError::UnknownAccount(route.vault).into());
        }
        Ok(())
    }

    fn check_owner(&self, account: &Pubkey, owner: &Keypair) -> Result<MarginAccount> {
        let state = self.state.lock().unwrap();
        let account = state
            .accounts
            .get(account)
            .ok_or(VenueError::UnknownAccount(*account))?;
        if account.owner != owner.pubkey() {
            return Err(VenueError::InvalidOwner(owner.pubkey()).into());
        }
        Ok(account.clone())
    }
}

#[async_trait]
impl<L: Ledger> MarginVenue for SimulatedVenue<L> {
    async fn init_group(&self, params: &GroupInitParams, admin: &Keypair) -> Result<Pubkey> {
        let quote = fetch_mint(&self.ledger, &params.quote_mint)
            .await?
            .ok_or(VenueError::UnknownAccount(params.quote_mint))?;
        fetch_mint(&self.ledger, &params.msrm_mint)
            .await?
            .ok_or(VenueError::UnknownAccount(params.msrm_mint))?;

        let msrm_vault = self.create_vault(&params.msrm_mint, admin).await?;
        let root_key = Pubkey::new_unique();
        let mut node_banks = Vec::with_capacity(self.options.node_banks_per_root);
        for _ in 0..self.options.node_banks_per_root.min(MAX_NODE_BANKS) {
            let vault = self.create_vault(&params.quote_mint, admin).await?;
            node_banks.push(NodeBank {
                pubkey: Pubkey::new_unique(),
                root_bank: root_key,
                vault,
                deposits: 0,
                borrows: 0,
            });
        }

        let mut root_bank = RootBank {
            pubkey: root_key,
            risk_curve: params.risk_curve,
            ..RootBank::default()
        };
        for (slot, node_bank) in root_bank.node_banks.iter_mut().zip(node_banks.iter()) {
            *slot = node_bank.pubkey;
        }

        let group_key = Pubkey::new_unique();
        let cache_key = Pubkey::new_unique();
        let mut group = MarginGroup {
            pubkey: group_key,
            admin: admin.pubkey(),
            dex_program_id: params.dex_program_id,
            fee_vault: params.fee_vault,
            msrm_vault,
            cache: cache_key,
            valid_interval: params.risk_curve.valid_interval,
            ..MarginGroup::default()
        };
        group.tokens[QUOTE_INDEX] = TokenInfo {
            mint: params.quote_mint,
            root_bank: root_key,
            decimals: quote.decimals,
        };

        let mut state = self.state.lock().unwrap();
        if !self.options.omit_quote_root_bank {
            state.root_banks.insert(root_key, root_bank);
        }
        for node_bank in node_banks {
            state.node_banks.insert(node_bank.pubkey, node_bank);
        }
        state.caches.insert(
            cache_key,
            MarginCache {
                pubkey: cache_key,
                ..MarginCache::default()
            },
        );
        state.groups.insert(group_key, group);
        state
            .hidden_reads
            .insert(group_key, self.options.visibility_lag);
        Ok(group_key)
    }

    async fn fetch_group(&self, group: &Pubkey) -> Result<Option<MarginGroup>> {
        let mut state = self.state.lock().unwrap();
        if !state.observe(group) {
            return Ok(None);
        }
        Ok(state.groups.get(group).cloned())
    }

    async fn fetch_root_bank(&self, root_bank: &Pubkey) -> Result<Option<RootBank>> {
        Ok(self.state.lock().unwrap().root_banks.get(root_bank).cloned())
    }

    async fn fetch_node_bank(&self, node_bank: &Pubkey) -> Result<Option<NodeBank>> {
        Ok(self.state.lock().unwrap().node_banks.get(node_bank).cloned())
    }

    async fn cache_root_banks(
        &self,
        group: &Pubkey,
        cache: &Pubkey,
        root_banks: &[Pubkey],
        _payer: &Keypair,
    ) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let group = state
            .groups
            .get(group)
            .ok_or(VenueError::UnknownAccount(*group))?;
        if group.cache != *cache {
            return Err(VenueError::UnknownAccount(*cache).into());
        }

        // Validate every entry before touching the cache.
        let mut updates = Vec::with_capacity(root_banks.len());
        for key in root_banks {
            let token_index = group
                .tokens
                .iter()
                .position(|token| !token.is_empty() && token.root_bank == *key)
                .ok_or(VenueError::UnknownAccount(*key))?;
            let root_bank = state
                .root_banks
                .get(key)
                .ok_or(VenueError::UnknownAccount(*key))?;
            let (deposits, borrows) = root_bank
                .active_node_banks()
                .filter_map(|node_key| state.node_banks.get(node_key))
                .fold((0u64, 0u64), |(deposits, borrows), node_bank| {
                    (deposits + node_bank.deposits, borrows + node_bank.borrows)
                });
            let pooled = NodeBank {
                deposits,
                borrows,
                ..NodeBank::default()
            };
            updates.push((token_index, root_bank.risk_curve.borrow_rate(pooled.utilization())));
        }

        state.slot += 1;
        let slot = state.slot;
        let cache = state
            .caches
            .get_mut(cache)
            .ok_or(VenueError::UnknownAccount(*cache))?;
        for (token_index, borrow_rate) in updates {
            cache.root_bank_cache[token_index] = RootBankCache {
                deposit_index: 1.0,
                borrow_index: 1.0,
                borrow_rate,
                last_update: slot,
            };
        }
        Ok(())
    }

    async fn fetch_cache(&self, cache: &Pubkey) -> Result<Option<MarginCache>> {
        Ok(self.state.lock().unwrap().caches.get(cache).cloned())
    }

    async fn init_account(&self, group: &MarginGroup, owner: &Keypair) -> Result<Pubkey> {
        let mut state = self.state.lock().unwrap();
        if !state.groups.contains_key(&group.pubkey) {
            return Err(VenueError::UnknownAccount(group.pubkey).into());
        }
        let key = Pubkey::new_unique();
        state.accounts.insert(
            key,
            MarginAccount {
                pubkey: key,
                group: group.pubkey,
                owner: owner.pubkey(),
                ..MarginAccount::default()
            },
        );
        state.hidden_reads.insert(key, self.options.visibility_lag);
        Ok(key)
    }

    async fn fetch_account(&self, account: &Pubkey) -> Result<Option<MarginAccount>> {
        let mut state = self.state.lock().unwrap();
        if !state.observe(account) {
            return Ok(None);
        }
        Ok(state.accounts.get(account).cloned())
    }

    async fn deposit(&self, request: DepositRequest<'_>) -> Result<()> {
        let DepositRequest {
            group,
            account,
            owner,
            route,
            token_account,
            quantity,
        } = request;
        self.check_route(group, route)?;
        self.check_owner(&account.pubkey, owner)?;

        transfer(
            &self.ledger,
            &token_account,
            &route.vault,
            owner,
            owner,
            quantity,
        )
        .await?;

        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let index = route.token_index;
        let margin_account = state
            .accounts
            .get_mut(&account.pubkey)
            .ok_or(VenueError::UnknownAccount(account.pubkey))?;
        let repaid = margin_account.borrows[index].min(quantity);
        margin_account.borrows[index] -= repaid;
        margin_account.deposits[index] += quantity - repaid;
        let node_bank = state
            .node_banks
            .get_mut(&route.node_bank)
            .ok_or(VenueError::UnknownAccount(route.node_bank))?;
        node_bank.borrows -= repaid;
        node_bank.deposits += quantity - repaid;
        Ok(())
    }

    async fn withdraw(&self, request: WithdrawRequest<'_>) -> Result<()> {
        let WithdrawRequest {
            group,
            account,
            owner,
            route,
            token_account,
            quantity,
            allow_borrow,
        } = request;
        self.check_route(group, route)?;
        let current = self.check_owner(&account.pubkey, owner)?;
        let index = route.token_index;
        if quantity > current.deposits[index] && !allow_borrow {
            return Err(VenueError::InsufficientFunds {
                requested: quantity,
                available: current.net_balance(index)?,
            }
            .into());
        }
        let liquidity = token_balance(&self.ledger, &route.vault).await?;
        if quantity > liquidity {
            return Err(VenueError::InsufficientLiquidity {
                requested: quantity,
                available: liquidity,
            }
            .into());
        }

        transfer(
            &self.ledger,
            &route.vault,
            &token_account,
            &self.vault_authority,
            owner,
            quantity,
        )
        .await?;

        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let margin_account = state
            .accounts
            .get_mut(&account.pubkey)
            .ok_or(VenueError::UnknownAccount(account.pubkey))?;
        let from_deposits = margin_account.deposits[index].min(quantity);
        margin_account.deposits[index] -= from_deposits;
        margin_account.borrows[index] += quantity - from_deposits;
        let node_bank = state
            .node_banks
            .get_mut(&route.node_bank)
            .ok_or(VenueError::UnknownAccount(route.node_bank))?;
        node_bank.deposits -= from_deposits;
        node_bank.borrows += quantity - from_deposits;
        Ok(())
    }
}
