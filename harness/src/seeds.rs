//! Named seed table for deterministic test keypairs.
//!
//! Each entry is the 64 raw bytes of an ed25519 keypair (secret followed by
//! public half), the same layout `solana-keygen` writes to keypair files. The
//! table is read from a JSON object such as
//! `{ "usdc": [128, 233, ...], "msrm": [91, 167, ...] }`.

use {
    crate::error::{HarnessError, Result},
    solana_sdk::{
        pubkey::Pubkey,
        signature::{Keypair, Signer},
        signer::keypair::keypair_from_seed,
    },
    std::{collections::BTreeMap, fs, path::Path},
};

pub const SEED_LEN: usize = 64;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedTable {
    seeds: BTreeMap<String, Vec<u8>>,
}

impl SeedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let seeds: BTreeMap<String, Vec<u8>> = serde_json::from_str(json)?;
        let table = Self { seeds };
        // Reject malformed entries at load time rather than at first use.
        for name in table.seeds.keys() {
            table.derive_keypair(name)?;
        }
        Ok(table)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            HarnessError::InvalidConfig(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, name: impl Into<String>, seed: Vec<u8>) {
        self.seeds.insert(name.into(), seed);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.seeds.keys().map(String::as_str)
    }

    /// Derive the keypair for `name`. The same seed always yields the same
    /// keypair, so addresses created from it are stable across runs.
    pub fn derive_keypair(&self, name: &str) -> Result<Keypair> {
        let seed = self
            .seeds
            .get(name)
            .ok_or_else(|| HarnessError::UnknownSeed(name.to_owned()))?;
        if seed.len() != SEED_LEN {
            return Err(HarnessError::InvalidSeed {
                name: name.to_owned(),
                reason: format!("expected {} bytes, found {}", SEED_LEN, seed.len()),
            });
        }
        let keypair = Keypair::try_from(seed.as_slice()).map_err(|e| HarnessError::InvalidSeed {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        // The public half is stored verbatim; make sure it matches the secret.
        let derived = keypair_from_seed(&seed[..32]).map_err(|e| HarnessError::InvalidSeed {
            name: name.to_owned(),
            reason: e.to_string(),
        })?;
        if derived.pubkey() != keypair.pubkey() {
            return Err(HarnessError::InvalidSeed {
                name: name.to_owned(),
                reason: "public key does not match secret key".to_owned(),
            });
        }
        Ok(keypair)
    }

    pub fn address(&self, name: &str) -> Result<Pubkey> {
        self.derive_keypair(name).map(|keypair| keypair.pubkey())
    }
}
