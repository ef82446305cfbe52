// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once, at startup. Empty values
//! are treated as unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `MEMED_BACKEND_URL` | Backend REST API base URL | `http://localhost:3001` |
//! | `MEMED_NETWORK` | Target network (`mainnet` or `testnet`) | `testnet` |
//! | `MEMED_RPC_URL` | JSON-RPC endpoint override | Network default |
//! | `MEMED_STAKING_ADDRESS` | Staking contract | Optional |
//! | `MEMED_BATTLE_ADDRESS` | Battle contract | Optional |
//! | `MEMED_STALE_TIME_SECS` | Query staleness window | `60` |
//! | `MEMED_HTTP_TIMEOUT_SECS` | Backend request timeout | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use url::Url;

use crate::chain::{NetworkConfig, LENS_MAINNET, LENS_TESTNET};
use crate::logging::LogFormat;

pub const BACKEND_URL_ENV: &str = "MEMED_BACKEND_URL";
pub const NETWORK_ENV: &str = "MEMED_NETWORK";
pub const RPC_URL_ENV: &str = "MEMED_RPC_URL";
pub const STAKING_ADDRESS_ENV: &str = "MEMED_STAKING_ADDRESS";
pub const BATTLE_ADDRESS_ENV: &str = "MEMED_BATTLE_ADDRESS";
pub const STALE_TIME_ENV: &str = "MEMED_STALE_TIME_SECS";
pub const HTTP_TIMEOUT_ENV: &str = "MEMED_HTTP_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Default staleness window for cached query results.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Default timeout for backend HTTP requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} is not a valid address: {value}")]
    InvalidAddress { name: &'static str, value: String },

    #[error("{name} must be `mainnet` or `testnet`, got `{value}`")]
    InvalidNetwork { name: &'static str, value: String },

    #[error("{name} must be a whole number of seconds, got `{value}`")]
    InvalidDuration { name: &'static str, value: String },

    #[error("{name} must be `json` or `pretty`, got `{value}`")]
    InvalidLogFormat { name: &'static str, value: String },
}

/// Deployed contract addresses. Reads against an unset contract are
/// reported as a missing parameter rather than sent.
#[derive(Debug, Clone, Default)]
pub struct ContractAddresses {
    pub staking: Option<Address>,
    pub battle: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: Url,
    pub network: NetworkConfig,
    pub rpc_url: String,
    pub contracts: ContractAddresses,
    pub stale_time: Duration,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Configuration pointing at `backend_url` with defaults for the rest.
    pub fn new(backend_url: Url) -> Self {
        let network = LENS_TESTNET;
        Self {
            backend_url,
            rpc_url: network.rpc_url.to_string(),
            network,
            contracts: ContractAddresses::default(),
            stale_time: DEFAULT_STALE_TIME,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            log_format: LogFormat::Pretty,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` reads the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);

        let backend_url = parse_url(
            BACKEND_URL_ENV,
            &vars
                .optional(BACKEND_URL_ENV)
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
        )?;

        let network = match vars.optional(NETWORK_ENV) {
            None => LENS_TESTNET,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "mainnet" => LENS_MAINNET,
                "testnet" => LENS_TESTNET,
                _ => {
                    return Err(ConfigError::InvalidNetwork {
                        name: NETWORK_ENV,
                        value,
                    })
                }
            },
        };

        let rpc_url = match vars.optional(RPC_URL_ENV) {
            Some(raw) => parse_url(RPC_URL_ENV, &raw)?.to_string(),
            None => network.rpc_url.to_string(),
        };

        let contracts = ContractAddresses {
            staking: vars.address(STAKING_ADDRESS_ENV)?,
            battle: vars.address(BATTLE_ADDRESS_ENV)?,
        };

        let log_format = match vars.optional(LOG_FORMAT_ENV) {
            None => LogFormat::Pretty,
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidLogFormat {
                    name: LOG_FORMAT_ENV,
                    value,
                })?,
        };

        Ok(Self {
            backend_url,
            network,
            rpc_url,
            contracts,
            stale_time: vars.seconds(STALE_TIME_ENV, DEFAULT_STALE_TIME)?,
            http_timeout: vars.seconds(HTTP_TIMEOUT_ENV, DEFAULT_HTTP_TIMEOUT)?,
            log_format,
        })
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })
}

/// Variable source with empty-is-unset semantics.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn address(&self, name: &'static str) -> Result<Option<Address>, ConfigError> {
        self.optional(name)
            .map(|value| {
                Address::from_str(&value).map_err(|_| ConfigError::InvalidAddress { name, value })
            })
            .transpose()
    }

    fn seconds(&self, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        match self.optional(name) {
            None => Ok(default),
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidDuration { name, value }),
        }
    }
}
