//! Score rewards
//!
//! After a session ends the player may claim tokens proportional to the
//! final score. The claim is submitted through a [`RewardAccumulator`], an
//! external wallet/ledger integration; its outcome never changes the
//! simulation, only the claim status.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{LEDGER_DECIMALS, REWARD_PER_POINT};
use crate::ledger::AccountAddress;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("connect a wallet to claim rewards")]
    WalletDisconnected,
    #[error("reward for score {score} does not fit in a ledger amount")]
    AmountOverflow { score: u32 },
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("ledger unavailable: {0}")]
    Network(String),
}

/// How a score converts into tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Whole tokens per point
    pub per_point: u64,
    /// Fixed-point precision of the token on the ledger
    pub decimals: u32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            per_point: REWARD_PER_POINT,
            decimals: LEDGER_DECIMALS,
        }
    }
}

impl RewardPolicy {
    /// Whole tokens for a score
    pub fn amount(&self, score: u32) -> Result<u64, RewardError> {
        u64::from(score)
            .checked_mul(self.per_point)
            .ok_or(RewardError::AmountOverflow { score })
    }

    /// Ledger base units for a score (`amount × 10^decimals`)
    pub fn base_units(&self, score: u32) -> Result<u64, RewardError> {
        10u64
            .checked_pow(self.decimals)
            .and_then(|scale| self.amount(score).ok()?.checked_mul(scale))
            .ok_or(RewardError::AmountOverflow { score })
    }
}

/// A claim ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardRequest {
    pub recipient: AccountAddress,
    pub score: u64,
    /// Whole tokens
    pub amount: u64,
    /// `amount` scaled to the ledger's precision
    pub base_units: u64,
}

impl RewardRequest {
    pub fn new(recipient: AccountAddress, score: u32, policy: &RewardPolicy) -> Result<Self, RewardError> {
        Ok(Self {
            recipient,
            score: u64::from(score),
            amount: policy.amount(score)?,
            base_units: policy.base_units(score)?,
        })
    }
}

/// Proof that the ledger accepted a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardReceipt {
    /// Transaction digest
    pub digest: String,
}

/// External service turning a final score into a token transfer
pub trait RewardAccumulator {
    fn submit(&self, request: &RewardRequest) -> impl Future<Output = Result<RewardReceipt, RewardError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.amount(0).unwrap(), 0);
        assert_eq!(policy.amount(12).unwrap(), 1200);
        assert_eq!(policy.base_units(12).unwrap(), 120_000_000_000);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let policy = RewardPolicy {
            per_point: u64::MAX / 2,
            decimals: 8,
        };
        assert!(policy.amount(2).is_ok());
        assert_eq!(policy.base_units(2), Err(RewardError::AmountOverflow { score: 2 }));

        let absurd = RewardPolicy {
            per_point: 1,
            decimals: 40,
        };
        assert_eq!(absurd.base_units(1), Err(RewardError::AmountOverflow { score: 1 }));
    }

    #[test]
    fn test_request_carries_both_units() {
        let recipient = AccountAddress::parse("0xbeef").unwrap();
        let request = RewardRequest::new(recipient.clone(), 3, &RewardPolicy::default()).unwrap();
        assert_eq!(request.recipient, recipient);
        assert_eq!(request.score, 3);
        assert_eq!(request.amount, 300);
        assert_eq!(request.base_units, 30_000_000_000);
    }

    #[test]
    fn test_partial_policy_json_uses_defaults() {
        let policy: RewardPolicy = serde_json::from_str(r#"{"per_point": 5}"#).unwrap();
        assert_eq!(policy.per_point, 5);
        assert_eq!(policy.decimals, LEDGER_DECIMALS);
    }
}
