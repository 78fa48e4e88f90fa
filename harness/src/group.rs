//! Group lifecycle: validate the risk curve, initialize the group and wait
//! until it can be read back fully populated.

use {
    crate::{
        config::PollPolicy,
        error::{HarnessError, Result},
        poll::poll_until,
        state::MarginGroup,
        venue::MarginVenue,
    },
    serde::{Deserialize, Serialize},
    solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer},
};

/// Interest rate curve of the quote asset, passed verbatim to group
/// initialization. Rates are annualized fractions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskCurve {
    /// Slots a cache entry stays valid
    pub valid_interval: u64,
    /// Utilization at which the curve kinks, in [0, 1]
    pub optimal_util: f64,
    /// Borrow rate at optimal utilization
    pub optimal_rate: f64,
    /// Borrow rate at full utilization
    pub max_rate: f64,
}

impl Default for RiskCurve {
    fn default() -> Self {
        Self {
            valid_interval: 5,
            optimal_util: 0.7,
            optimal_rate: 0.06,
            max_rate: 1.5,
        }
    }
}

impl RiskCurve {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("optimal_util", self.optimal_util),
            ("optimal_rate", self.optimal_rate),
            ("max_rate", self.max_rate),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(HarnessError::InvalidRiskCurve(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.optimal_util > 1.0 {
            return Err(HarnessError::InvalidRiskCurve(format!(
                "optimal_util must be at most 1, got {}",
                self.optimal_util
            )));
        }
        if self.optimal_rate > self.max_rate {
            return Err(HarnessError::InvalidRiskCurve(format!(
                "optimal_rate {} exceeds max_rate {}",
                self.optimal_rate, self.max_rate
            )));
        }
        if self.valid_interval == 0 {
            return Err(HarnessError::InvalidRiskCurve(
                "valid_interval must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Borrow rate at `utilization`.
    ///
    /// Below the optimal point the rate climbs gently from zero to
    /// `optimal_rate`; above it the rate climbs steeply to `max_rate`.
    pub fn borrow_rate(&self, utilization: f64) -> f64 {
        let utilization = utilization.clamp(0.0, 1.0);
        if utilization < self.optimal_util || self.optimal_util >= 1.0 {
            if self.optimal_util == 0.0 {
                return self.optimal_rate;
            }
            utilization / self.optimal_util * self.optimal_rate
        } else {
            let normalized = (utilization - self.optimal_util) / (1.0 - self.optimal_util);
            normalized * (self.max_rate - self.optimal_rate) + self.optimal_rate
        }
    }
}

/// Inputs of group initialization.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupInitParams {
    pub quote_mint: Pubkey,
    /// Secondary reserve asset (fee-discount token)
    pub msrm_mint: Pubkey,
    pub dex_program_id: Pubkey,
    /// Quote-denominated token account receiving fees
    pub fee_vault: Pubkey,
    pub risk_curve: RiskCurve,
}

pub struct GroupLifecycle<'a, V: MarginVenue + ?Sized> {
    venue: &'a V,
    poll: PollPolicy,
}

impl<'a, V: MarginVenue + ?Sized> GroupLifecycle<'a, V> {
    pub fn new(venue: &'a V, poll: PollPolicy) -> Self {
        Self { venue, poll }
    }

    /// Initialize the group and return it once it is readable and populated.
    pub async fn init_group(&self, params: &GroupInitParams, admin: &Keypair) -> Result<MarginGroup> {
        params.risk_curve.validate()?;
        let key = self.venue.init_group(params, admin).await?;
        log::info!(
            "initialized group {} (quote mint {}, admin {})",
            key,
            params.quote_mint,
            admin.pubkey()
        );
        self.wait_until_observable(&key).await
    }

    /// Poll until `group` is readable and fully populated.
    pub async fn wait_until_observable(&self, group: &Pubkey) -> Result<MarginGroup> {
        let venue = self.venue;
        let key = *group;
        poll_until(&self.poll, key, move || async move {
            Ok(venue
                .fetch_group(&key)
                .await?
                .filter(MarginGroup::is_populated))
        })
        .await
    }

    /// Re-read a group that is known to exist.
    pub async fn reload(&self, group: &Pubkey) -> Result<MarginGroup> {
        self.venue
            .fetch_group(group)
            .await?
            .ok_or_else(|| HarnessError::FailedPrecondition(format!("group {} not found", group)))
    }
}
