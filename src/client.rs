// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Facade
//!
//! [`MemedClient`] owns one of each shared service (backend client, contract
//! reader, query cache, event bus) and hands out one query adapter per
//! resource. Adapters only build the cache key and the fetcher; caching,
//! single-flight and retry live in [`crate::query`].
//!
//! ## Gating
//!
//! An adapter whose inputs are missing or not well-formed returns a disabled
//! query (no key). Contract reads against a contract whose address is not
//! configured are disabled the same way.
//!
//! ## Resync
//!
//! The client subscribes to every [`AccountEvent`] for its lifetime. Each
//! publish drops the account-scoped cache kinds (balances, stakes, claims) so
//! the next read goes back to the source.

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use crate::api::BackendClient;
use crate::blockchain::{
    parse_address, BattleRecord, ContractReader, RpcContractReader, StakeInfo, Wallet,
};
use crate::cache::QueryKey;
use crate::chain::{ensure_chain_for, ChainPair, ChainSwitch, TransactionKind};
use crate::config::{ClientConfig, ContractAddresses};
use crate::engagement::EngagementStats;
use crate::error::{ClientError, MutationError, CLAIM_FALLBACK_MESSAGE};
use crate::events::{AccountEvent, EventBus, SubscriptionGuard};
use crate::feed::TokenFeed;
use crate::models::{ClaimProof, ClaimRecord, RecordClaimRequest, Token};
use crate::query::{fetcher, Query, QueryClient, QueryOptions};

pub const TOKEN_KIND: &str = "token";
pub const BALANCE_KIND: &str = "balance";
pub const SUPPLY_KIND: &str = "supply";
pub const DECIMALS_KIND: &str = "decimals";
pub const STAKE_KIND: &str = "stake";
pub const BATTLES_KIND: &str = "battles";
pub const CLAIMS_KIND: &str = "claims";
pub const ENGAGEMENT_KIND: &str = "engagement";

/// Cache kinds tied to the connected account.
pub const ACCOUNT_SCOPED_KINDS: [&str; 3] = [BALANCE_KIND, STAKE_KIND, CLAIMS_KIND];

pub struct MemedClient {
    api: BackendClient,
    reader: Arc<dyn ContractReader>,
    queries: QueryClient,
    events: EventBus,
    contracts: ContractAddresses,
    chains: ChainPair,
    _resync: Vec<SubscriptionGuard>,
}

/// Stable cache-key form of an address.
fn key_part(address: &Address) -> String {
    address.to_string().to_lowercase()
}

/// Parse an optional address input, logging why a query stays disabled.
fn gate_address(kind: &'static str, raw: Option<&str>) -> Option<Address> {
    let raw = raw?;
    match parse_address(raw) {
        Ok(address) => Some(address),
        Err(err) => {
            tracing::debug!(kind, error = %err, "query disabled");
            None
        }
    }
}

fn gate_contract(kind: &'static str, contract: Option<Address>) -> Option<Address> {
    if contract.is_none() {
        tracing::debug!(kind, "contract address not configured, query disabled");
    }
    contract
}

fn is_tx_hash(raw: &str) -> bool {
    raw.len() == 66 && raw.starts_with("0x") && raw[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

impl MemedClient {
    /// Connect to the backend and the JSON-RPC endpoint named in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let reader = RpcContractReader::new(&config.rpc_url)?;
        let options = QueryOptions {
            stale_time: config.stale_time,
            ..Default::default()
        };
        Self::new(config, Arc::new(reader), EventBus::new(), options)
    }

    pub fn new(
        config: &ClientConfig,
        reader: Arc<dyn ContractReader>,
        events: EventBus,
        options: QueryOptions,
    ) -> Result<Self, ClientError> {
        let api = BackendClient::new(&config.backend_url, config.http_timeout)?;
        let queries = QueryClient::new(options);
        let resync = subscribe_resync(&events, &queries);

        tracing::info!(
            backend = api.base_url(),
            network = config.network.name,
            chain_id = config.network.chain_id,
            "memed client ready"
        );

        Ok(Self {
            api,
            reader,
            queries,
            events,
            contracts: config.contracts.clone(),
            chains: ChainPair::default(),
            _resync: resync,
        })
    }

    pub fn api(&self) -> &BackendClient {
        &self.api
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // =========================================================================
    // Backend reads
    // =========================================================================

    pub fn token_feed(&self, limit: u32) -> TokenFeed {
        TokenFeed::new(self.api.clone(), self.queries.clone(), limit)
    }

    /// `GET /api/tokens/{address}`
    pub fn token(&self, address: Option<&str>) -> Query<Token> {
        let token = gate_address(TOKEN_KIND, address);
        let key = token.map(|t| QueryKey::new(TOKEN_KIND, [key_part(&t)]));
        let api = self.api.clone();
        self.queries.query(
            key,
            fetcher(move || {
                let api = api.clone();
                async move {
                    let token = token.ok_or(ClientError::MissingParameter("token address"))?;
                    api.get_token(&key_part(&token)).await
                }
            }),
        )
    }

    /// `GET /api/claims/{address}`
    pub fn claims(&self, user: Option<&str>) -> Query<Vec<ClaimProof>> {
        let user = gate_address(CLAIMS_KIND, user);
        let api = self.api.clone();
        self.queries.query(
            user.as_ref().map(claims_key),
            fetcher(move || {
                let api = api.clone();
                async move {
                    let user = user.ok_or(ClientError::MissingParameter("user address"))?;
                    api.get_claims(&key_part(&user)).await
                }
            }),
        )
    }

    /// `GET /api/engagement/aggregated/{handle}`, derived into stats.
    pub fn engagement_stats(&self, handle: Option<&str>) -> Query<EngagementStats> {
        let handle = handle
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        let key = handle
            .as_ref()
            .map(|h| QueryKey::new(ENGAGEMENT_KIND, [h.clone()]));
        let api = self.api.clone();
        self.queries.query(
            key,
            fetcher(move || {
                let api = api.clone();
                let handle = handle.clone();
                async move {
                    let handle = handle.ok_or(ClientError::MissingParameter("lens handle"))?;
                    let counts = api.get_engagement(&handle).await?;
                    Ok(EngagementStats::from(counts))
                }
            }),
        )
    }

    // =========================================================================
    // Contract reads
    // =========================================================================

    /// `IMemeToken(token).balanceOf(account)`
    pub fn token_balance(&self, token: Option<&str>, account: Option<&str>) -> Query<U256> {
        let token = gate_address(BALANCE_KIND, token);
        let account = gate_address(BALANCE_KIND, account);
        let key = token
            .zip(account)
            .map(|(t, a)| QueryKey::new(BALANCE_KIND, [key_part(&t), key_part(&a)]));
        let reader = Arc::clone(&self.reader);
        self.queries.query(
            key,
            fetcher(move || {
                let reader = Arc::clone(&reader);
                async move {
                    let (token, account) = token
                        .zip(account)
                        .ok_or(ClientError::MissingParameter("token and account"))?;
                    reader.balance_of(token, account).await
                }
            }),
        )
    }

    /// `IMemeToken(token).decimals()`
    pub fn token_decimals(&self, token: Option<&str>) -> Query<u8> {
        let token = gate_address(DECIMALS_KIND, token);
        let key = token.map(|t| QueryKey::new(DECIMALS_KIND, [key_part(&t)]));
        let reader = Arc::clone(&self.reader);
        self.queries.query(
            key,
            fetcher(move || {
                let reader = Arc::clone(&reader);
                async move {
                    let token = token.ok_or(ClientError::MissingParameter("token address"))?;
                    reader.decimals(token).await
                }
            }),
        )
    }

    /// `IMemeToken(token).totalSupply()`
    pub fn token_supply(&self, token: Option<&str>) -> Query<U256> {
        let token = gate_address(SUPPLY_KIND, token);
        let key = token.map(|t| QueryKey::new(SUPPLY_KIND, [key_part(&t)]));
        let reader = Arc::clone(&self.reader);
        self.queries.query(
            key,
            fetcher(move || {
                let reader = Arc::clone(&reader);
                async move {
                    let token = token.ok_or(ClientError::MissingParameter("token address"))?;
                    reader.total_supply(token).await
                }
            }),
        )
    }

    /// `IMemedStaking.stakes(token, user)`
    pub fn staking_status(&self, token: Option<&str>, user: Option<&str>) -> Query<StakeInfo> {
        let staking = gate_contract(STAKE_KIND, self.contracts.staking);
        let token = gate_address(STAKE_KIND, token);
        let user = gate_address(STAKE_KIND, user);
        let params = staking.zip(token).zip(user);
        let key =
            params.map(|((_, t), u)| QueryKey::new(STAKE_KIND, [key_part(&t), key_part(&u)]));
        let reader = Arc::clone(&self.reader);
        self.queries.query(
            key,
            fetcher(move || {
                let reader = Arc::clone(&reader);
                async move {
                    let ((staking, token), user) = params
                        .ok_or(ClientError::MissingParameter("staking contract, token and user"))?;
                    reader.stakes(staking, token, user).await
                }
            }),
        )
    }

    /// `IMemedBattle.getUserBattles(token)`
    pub fn user_battles(&self, token: Option<&str>) -> Query<Vec<BattleRecord>> {
        let battle = gate_contract(BATTLES_KIND, self.contracts.battle);
        let token = gate_address(BATTLES_KIND, token);
        let params = battle.zip(token);
        let key = params.map(|(_, t)| QueryKey::new(BATTLES_KIND, [key_part(&t)]));
        let reader = Arc::clone(&self.reader);
        self.queries.query(
            key,
            fetcher(move || {
                let reader = Arc::clone(&reader);
                async move {
                    let (battle, token) =
                        params.ok_or(ClientError::MissingParameter("battle contract and token"))?;
                    reader.user_battles(battle, token).await
                }
            }),
        )
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Record an on-chain claim with the backend.
    ///
    /// One POST per call, never retried or de-duplicated. On success the
    /// user's cached claim list is invalidated.
    pub async fn record_claim(
        &self,
        user_address: &str,
        token_address: &str,
        amount: &str,
        transaction_hash: &str,
    ) -> Result<ClaimRecord, MutationError> {
        let fail = |err: ClientError| MutationError::new(err, CLAIM_FALLBACK_MESSAGE);

        let user = parse_address(user_address).map_err(fail)?;
        let token = parse_address(token_address).map_err(fail)?;
        let amount = amount.trim();
        if amount.is_empty() {
            return Err(fail(ClientError::MissingParameter("amount")));
        }
        if !is_tx_hash(transaction_hash) {
            return Err(fail(ClientError::MissingParameter("transaction hash")));
        }

        let request = RecordClaimRequest {
            user_address: key_part(&user),
            token_address: key_part(&token),
            amount: amount.to_string(),
            transaction_hash: transaction_hash.to_string(),
        };

        match self.api.record_claim(&request).await {
            Ok(record) => {
                self.queries.cache().invalidate(&claims_key(&user));
                tracing::info!(user = %request.user_address, tx_hash = transaction_hash, "claim recorded");
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(user = %request.user_address, error = %err, "claim recording failed");
                Err(fail(err))
            }
        }
    }

    /// Move `wallet` to the chain the next transaction needs.
    pub async fn ensure_chain(
        &self,
        wallet: &dyn Wallet,
        kind: Option<TransactionKind>,
    ) -> Result<ChainSwitch, ClientError> {
        ensure_chain_for(wallet, &self.chains, kind).await
    }
}

fn claims_key(user: &Address) -> QueryKey {
    QueryKey::new(CLAIMS_KIND, [key_part(user)])
}

fn subscribe_resync(events: &EventBus, queries: &QueryClient) -> Vec<SubscriptionGuard> {
    AccountEvent::ALL
        .into_iter()
        .map(|event| {
            let queries = queries.clone();
            let name = event.name();
            events
                .subscribe(
                    name,
                    Arc::new(move || {
                        let dropped: usize = ACCOUNT_SCOPED_KINDS
                            .iter()
                            .map(|kind| queries.cache().invalidate_kind(kind))
                            .sum();
                        tracing::debug!(event = name, dropped, "account-scoped cache cleared");
                    }),
                )
                .into_guard()
        })
        .collect()
}
