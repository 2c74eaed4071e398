//! Ledger integration contract
//!
//! The wallet, signing and RPC transport live outside this crate. What lives
//! here is the data exchanged with them: account addresses, network and
//! contract configuration, the move-call payloads the bridge executes, and
//! decoding of the values it returns.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reward::RewardRequest;

/// Move module holding the game's entry functions
pub const CONTRACT_MODULE: &str = "suiflap_contract";

/// Number of hex digits in a normalized address
const ADDRESS_HEX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid account address: {input:?}")]
    InvalidAddress { input: String },
    #[error("return value has {len} bytes, expected at least 8")]
    ShortReturnValue { len: usize },
    #[error("ledger query failed: {0}")]
    Query(String),
}

/// A ledger account, normalized to `0x` + 64 lowercase hex digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Parse `0x`-prefixed hex, left-padding short forms (`0x2` → `0x00…02`)
    pub fn parse(input: &str) -> Result<Self, LedgerError> {
        let invalid = || LedgerError::InvalidAddress {
            input: input.to_string(),
        };
        let hex = input
            .trim()
            .strip_prefix("0x")
            .or_else(|| input.trim().strip_prefix("0X"))
            .ok_or_else(invalid)?;
        if hex.is_empty() || hex.len() > ADDRESS_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        Ok(Self(format!(
            "0x{:0>width$}",
            hex.to_ascii_lowercase(),
            width = ADDRESS_HEX_LEN
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x0`, used as a placeholder for undeployed objects
    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    /// `0x1234…cdef` for compact display
    pub fn short(&self) -> String {
        let hex = &self.0[2..];
        format!("0x{}…{}", &hex[..4], &hex[hex.len() - 4..])
    }
}

impl FromStr for AccountAddress {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountAddress> for String {
    fn from(value: AccountAddress) -> Self {
        value.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger network the game talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Devnet,
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    pub fn fullnode_url(&self) -> String {
        format!("https://fullnode.{}.sui.io:443", self.as_str())
    }
}

/// Deployed contract objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub network: Network,
    pub package_id: String,
    pub admin_cap_id: String,
    pub treasury_cap_id: String,
    pub game_vault_id: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            package_id: "0xf40d5d7c9c3a928641cba364f599a7abb4cd3643048893ffc1ceab5bf13d12b1"
                .to_string(),
            admin_cap_id: "0x0".to_string(),
            treasury_cap_id: "0x0".to_string(),
            game_vault_id: "0x0".to_string(),
        }
    }
}

/// One argument of a move call, as the bridge expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MoveArg {
    Object(String),
    Address(String),
    /// Decimal string; JavaScript numbers cannot hold every u64
    U64(String),
}

/// A move call for the bridge to build, sign and execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveCall {
    pub target: String,
    pub arguments: Vec<MoveArg>,
}

impl LedgerConfig {
    /// True once every object id has been filled in
    pub fn is_deployed(&self) -> bool {
        [
            &self.package_id,
            &self.admin_cap_id,
            &self.treasury_cap_id,
            &self.game_vault_id,
        ]
        .iter()
        .all(|id| AccountAddress::parse(id).is_ok_and(|a| !a.is_zero()))
    }

    pub fn target(&self, function: &str) -> String {
        format!("{}::{}::{}", self.package_id, CONTRACT_MODULE, function)
    }

    /// `reward_player(admin_cap, treasury_cap, vault, recipient, score, amount)`
    pub fn reward_call(&self, request: &RewardRequest) -> MoveCall {
        MoveCall {
            target: self.target("reward_player"),
            arguments: vec![
                MoveArg::Object(self.admin_cap_id.clone()),
                MoveArg::Object(self.treasury_cap_id.clone()),
                MoveArg::Object(self.game_vault_id.clone()),
                MoveArg::Address(request.recipient.to_string()),
                MoveArg::U64(request.score.to_string()),
                MoveArg::U64(request.base_units.to_string()),
            ],
        }
    }

    /// `get_score(vault, account)`, read-only
    pub fn score_query_call(&self, account: &AccountAddress) -> MoveCall {
        MoveCall {
            target: self.target("get_score"),
            arguments: vec![
                MoveArg::Object(self.game_vault_id.clone()),
                MoveArg::Address(account.to_string()),
            ],
        }
    }
}

/// Read a little-endian u64 from the head of a move return value
pub fn decode_u64_le(bytes: &[u8]) -> Result<u64, LedgerError> {
    let head: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or(LedgerError::ShortReturnValue { len: bytes.len() })?;
    Ok(u64::from_le_bytes(head))
}

/// On-chain score from an optional return value; no value means no score yet
pub fn decode_score(return_value: Option<&[u8]>) -> Result<u64, LedgerError> {
    return_value.map_or(Ok(0), decode_u64_le)
}

/// Format fixed-point base units, trimming trailing zeros (`150000000`, 8 → `1.5`)
pub fn format_units(base_units: u64, decimals: u32) -> String {
    let Some(scale) = 10u64.checked_pow(decimals) else {
        return base_units.to_string();
    };
    let whole = base_units / scale;
    let frac = base_units % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Read-only balance and score lookups for display
pub trait LedgerQuery {
    /// Token balance in base units
    fn balance(&self, account: &AccountAddress) -> impl Future<Output = Result<u64, LedgerError>>;

    /// Cumulative on-chain score
    fn score(&self, account: &AccountAddress) -> impl Future<Output = Result<u64, LedgerError>>;
}
