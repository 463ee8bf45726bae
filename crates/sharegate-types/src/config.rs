//! Configuration for policy stores and arbitration wallets.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Result, ShareGateError, constants};

/// Initial settings of a freshly onboarded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Start with trading globally locked.
    pub locked: bool,
    /// Start with partial transfers enabled.
    pub partial_transfers: bool,
    /// Admit receivers that hold nothing yet.
    pub new_shareholders_allowed: bool,
    /// End of the initial offering (Regulation-D release boundary).
    pub offering_end: Option<DateTime<Utc>>,
    /// Off-ledger messaging endpoint for holders.
    pub messaging_address: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            locked: false,
            partial_transfers: false,
            new_shareholders_allowed: true,
            offering_end: None,
            messaging_address: String::new(),
        }
    }
}

impl PolicyConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ShareGateError::Configuration(e.to_string()))
    }
}

/// Owner set and confirmation threshold of an arbitration wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrationConfig {
    pub owners: Vec<Address>,
    /// Confirmations required before a transaction executes.
    pub threshold: usize,
}

impl ArbitrationConfig {
    #[must_use]
    pub fn new(owners: Vec<Address>, threshold: usize) -> Self {
        Self { owners, threshold }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| ShareGateError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the owner set and threshold.
    ///
    /// # Errors
    /// [`ShareGateError::InvalidArbitrationSetup`] for an empty, oversized,
    /// null-bearing or duplicated owner set, or a threshold outside
    /// `1..=owners`.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(ShareGateError::InvalidArbitrationSetup { reason });

        if self.owners.is_empty() {
            return invalid("owner set is empty".to_string());
        }
        if self.owners.len() > constants::MAX_ARBITRATION_OWNERS {
            return invalid(format!(
                "{} owners exceeds maximum {}",
                self.owners.len(),
                constants::MAX_ARBITRATION_OWNERS
            ));
        }
        if self.owners.iter().any(Address::is_zero) {
            return invalid("owner set contains the zero address".to_string());
        }
        let unique: HashSet<_> = self.owners.iter().collect();
        if unique.len() != self.owners.len() {
            return invalid("owner set contains duplicates".to_string());
        }
        if self.threshold == 0 || self.threshold > self.owners.len() {
            return invalid(format!(
                "threshold {} outside 1..={}",
                self.threshold,
                self.owners.len()
            ));
        }
        Ok(())
    }
}
