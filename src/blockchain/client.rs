// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC contract reader.

use alloy::{
    network::Ethereum,
    primitives::{Address, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, ProviderBuilder, RootProvider,
    },
};
use futures::future::BoxFuture;
use futures::FutureExt;

use super::contracts::{IMemeToken, IMemedBattle, IMemedStaking};
use super::reader::ContractReader;
use super::types::{BattleRecord, StakeInfo};
use crate::error::ClientError;

/// HTTP provider type (with the default fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// [`ContractReader`] backed by an alloy HTTP provider.
pub struct RpcContractReader {
    provider: HttpProvider,
}

impl RpcContractReader {
    pub fn new(rpc_url: &str) -> Result<Self, ClientError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ClientError::Transport(format!("Invalid RPC URL: {e}")))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { provider })
    }
}

/// Classify a failed call. Only a transport failure without a JSON-RPC error
/// response (connection, timeout) may succeed on retry; reverts and decode
/// failures are reported as contract errors.
fn contract_error(call: &str, e: alloy::contract::Error) -> ClientError {
    match &e {
        alloy::contract::Error::TransportError(rpc) if rpc.as_error_resp().is_none() => {
            ClientError::Transport(format!("{call} failed: {e}"))
        }
        _ => ClientError::Contract(format!("{call} failed: {e}")),
    }
}

impl ContractReader for RpcContractReader {
    fn balance_of(
        &self,
        token: Address,
        account: Address,
    ) -> BoxFuture<'_, Result<U256, ClientError>> {
        async move {
            let contract = IMemeToken::new(token, self.provider.clone());
            let balance: U256 = contract
                .balanceOf(account)
                .call()
                .await
                .map_err(|e| contract_error("balanceOf", e))?;
            Ok(balance)
        }
        .boxed()
    }

    fn decimals(&self, token: Address) -> BoxFuture<'_, Result<u8, ClientError>> {
        async move {
            let contract = IMemeToken::new(token, self.provider.clone());
            contract
                .decimals()
                .call()
                .await
                .map_err(|e| contract_error("decimals", e))
        }
        .boxed()
    }

    fn total_supply(&self, token: Address) -> BoxFuture<'_, Result<U256, ClientError>> {
        async move {
            let contract = IMemeToken::new(token, self.provider.clone());
            let supply: U256 = contract
                .totalSupply()
                .call()
                .await
                .map_err(|e| contract_error("totalSupply", e))?;
            Ok(supply)
        }
        .boxed()
    }

    fn stakes(
        &self,
        staking: Address,
        token: Address,
        user: Address,
    ) -> BoxFuture<'_, Result<StakeInfo, ClientError>> {
        async move {
            let contract = IMemedStaking::new(staking, self.provider.clone());
            let result = contract
                .stakes(token, user)
                .call()
                .await
                .map_err(|e| contract_error("stakes", e))?;
            Ok(StakeInfo {
                amount: result.amount,
                reward: result.reward,
            })
        }
        .boxed()
    }

    fn user_battles(
        &self,
        battle: Address,
        token: Address,
    ) -> BoxFuture<'_, Result<Vec<BattleRecord>, ClientError>> {
        async move {
            let contract = IMemedBattle::new(battle, self.provider.clone());
            let battles = contract
                .getUserBattles(token)
                .call()
                .await
                .map_err(|e| contract_error("getUserBattles", e))?;
            Ok(battles.into_iter().map(BattleRecord::from).collect())
        }
        .boxed()
    }
}
