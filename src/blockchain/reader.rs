// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::{Address, U256};
use futures::future::BoxFuture;

use super::types::{BattleRecord, StakeInfo};
use crate::error::ClientError;

/// Read-only view of the platform contracts.
///
/// Implemented over JSON-RPC by [`RpcContractReader`](super::RpcContractReader);
/// tests substitute an in-memory reader.
pub trait ContractReader: Send + Sync {
    /// `IMemeToken(token).balanceOf(account)`
    fn balance_of(&self, token: Address, account: Address)
        -> BoxFuture<'_, Result<U256, ClientError>>;

    /// `IMemeToken(token).decimals()`
    fn decimals(&self, token: Address) -> BoxFuture<'_, Result<u8, ClientError>>;

    /// `IMemeToken(token).totalSupply()`
    fn total_supply(&self, token: Address) -> BoxFuture<'_, Result<U256, ClientError>>;

    /// `IMemedStaking(staking).stakes(token, user)`
    fn stakes(
        &self,
        staking: Address,
        token: Address,
        user: Address,
    ) -> BoxFuture<'_, Result<StakeInfo, ClientError>>;

    /// `IMemedBattle(battle).getUserBattles(token)`
    fn user_battles(
        &self,
        battle: Address,
        token: Address,
    ) -> BoxFuture<'_, Result<Vec<BattleRecord>, ClientError>>;
}
