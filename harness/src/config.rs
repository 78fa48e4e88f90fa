//! Harness configuration.
//!
//! Every field has a localnet default, so a config file only needs to list
//! what it overrides. Pubkeys are written as base58 strings.

use {
    crate::{
        error::{HarnessError, Result},
        group::RiskCurve,
        ledger::RpcLedger,
        seeds::SeedTable,
    },
    serde::{Deserialize, Serialize},
    solana_sdk::{commitment_config::CommitmentConfig, pubkey, pubkey::Pubkey},
    std::{fs, path::Path, path::PathBuf, str::FromStr, time::Duration},
};

pub const LOCALNET_RPC_URL: &str = "http://localhost:8899";
pub const DEX_PROGRAM_ID: Pubkey = pubkey!("DESVgJVGajEgKGXhb6XmqDHGz3VjdgP7rEVESBgxmroY");
/// Owner of the group's fee vault.
pub const FEE_VAULT_OWNER: Pubkey = pubkey!("Cwg1f6m4m3DGwMEbmsbAfDtUToUf5jRdKrJSGD7GfZCB");

pub const DEFAULT_DECIMALS: u8 = 6;
pub const DEFAULT_AIRDROP_SOL: u64 = 100;
pub const DEFAULT_DEPOSIT_AMOUNT: u64 = 10;

/// Bounded exponential backoff used while waiting for confirmed state to
/// become readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: u32,
    pub timeout_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 50,
            max_delay_ms: 1_000,
            backoff_factor: 2,
            timeout_ms: 10_000,
        }
    }
}

impl PollPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before the attempt following one that waited `current`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let factor = self.backoff_factor.max(1);
        current
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(Duration::from_millis(self.max_delay_ms))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub rpc_url: String,
    pub commitment: String,
    #[serde(with = "base58")]
    pub dex_program_id: Pubkey,
    #[serde(with = "base58")]
    pub fee_vault_owner: Pubkey,
    pub airdrop_sol: u64,
    pub decimals: u8,
    pub deposit_amount: u64,
    pub quote_mint: String,
    pub reserve_mint: String,
    pub risk_curve: RiskCurve,
    pub poll: PollPolicy,
    pub seed_file: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            rpc_url: LOCALNET_RPC_URL.to_owned(),
            commitment: "confirmed".to_owned(),
            dex_program_id: DEX_PROGRAM_ID,
            fee_vault_owner: FEE_VAULT_OWNER,
            airdrop_sol: DEFAULT_AIRDROP_SOL,
            decimals: DEFAULT_DECIMALS,
            deposit_amount: DEFAULT_DEPOSIT_AMOUNT,
            quote_mint: "usdc".to_owned(),
            reserve_mint: "msrm".to_owned(),
            risk_curve: RiskCurve::default(),
            poll: PollPolicy::default(),
            seed_file: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            HarnessError::InvalidConfig(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.commitment_config()?;
        self.risk_curve.validate()?;
        if self.poll.timeout_ms == 0 {
            return Err(HarnessError::InvalidConfig(
                "poll.timeout_ms must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment).map_err(|_| {
            HarnessError::InvalidConfig(format!("unknown commitment `{}`", self.commitment))
        })
    }

    /// Connect to `rpc_url` at the configured commitment.
    pub fn connect(&self) -> Result<RpcLedger> {
        Ok(RpcLedger::new(self.rpc_url.clone(), self.commitment_config()?))
    }

    pub fn seed_table(&self) -> Result<SeedTable> {
        let path = self
            .seed_file
            .as_ref()
            .ok_or_else(|| HarnessError::InvalidConfig("seed_file is not set".to_owned()))?;
        SeedTable::from_file(path)
    }
}

mod base58 {
    use {
        serde::{de::Error, Deserialize, Deserializer, Serializer},
        solana_sdk::pubkey::Pubkey,
        std::str::FromStr,
    };

    pub fn serialize<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(|e| D::Error::custom(format!("{}: {}", s, e)))
    }
}
