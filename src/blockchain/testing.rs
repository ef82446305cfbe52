// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory wallet and contract reader for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use futures::future::BoxFuture;
use futures::FutureExt;

use super::reader::ContractReader;
use super::types::{BattleRecord, StakeInfo};
use super::wallet::Wallet;
use crate::error::ClientError;

pub struct FakeWallet {
    chain_id: AtomicU64,
    switch_calls: AtomicUsize,
    switch_error: Option<String>,
}

impl FakeWallet {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id: AtomicU64::new(chain_id),
            switch_calls: AtomicUsize::new(0),
            switch_error: None,
        }
    }

    pub fn failing_switch(mut self, message: &str) -> Self {
        self.switch_error = Some(message.to_string());
        self
    }

    pub fn switch_calls(&self) -> usize {
        self.switch_calls.load(Ordering::SeqCst)
    }
}

impl Wallet for FakeWallet {
    fn chain_id(&self) -> u64 {
        self.chain_id.load(Ordering::SeqCst)
    }

    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), ClientError>> {
        async move {
            self.switch_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.switch_error {
                return Err(ClientError::Wallet(message.clone()));
            }
            self.chain_id.store(chain_id, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }
}

/// Contract reader serving fixed values. Every read counts as one call and
/// honours the configured delay and failure.
#[derive(Default)]
pub struct FakeContractReader {
    pub balances: Mutex<HashMap<(Address, Address), U256>>,
    pub supplies: Mutex<HashMap<Address, U256>>,
    /// Tokens missing here report 18 decimals.
    pub decimals: Mutex<HashMap<Address, u8>>,
    pub stakes: Mutex<HashMap<(Address, Address), StakeInfo>>,
    pub battles: Mutex<HashMap<Address, Vec<BattleRecord>>>,
    pub failure: Mutex<Option<ClientError>>,
    pub delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl FakeContractReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_balance(&self, token: Address, account: Address, value: u64) {
        self.balances
            .lock()
            .unwrap()
            .insert((token, account), U256::from(value));
    }

    pub fn set_supply(&self, token: Address, value: u64) {
        self.supplies.lock().unwrap().insert(token, U256::from(value));
    }

    pub fn fail_with(&self, error: Option<ClientError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn enter(&self) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ContractReader for FakeContractReader {
    fn balance_of(
        &self,
        token: Address,
        account: Address,
    ) -> BoxFuture<'_, Result<U256, ClientError>> {
        async move {
            self.enter().await?;
            Ok(self
                .balances
                .lock()
                .unwrap()
                .get(&(token, account))
                .copied()
                .unwrap_or_default())
        }
        .boxed()
    }

    fn decimals(&self, token: Address) -> BoxFuture<'_, Result<u8, ClientError>> {
        async move {
            self.enter().await?;
            Ok(self
                .decimals
                .lock()
                .unwrap()
                .get(&token)
                .copied()
                .unwrap_or(18))
        }
        .boxed()
    }

    fn total_supply(&self, token: Address) -> BoxFuture<'_, Result<U256, ClientError>> {
        async move {
            self.enter().await?;
            Ok(self
                .supplies
                .lock()
                .unwrap()
                .get(&token)
                .copied()
                .unwrap_or_default())
        }
        .boxed()
    }

    fn stakes(
        &self,
        _staking: Address,
        token: Address,
        user: Address,
    ) -> BoxFuture<'_, Result<StakeInfo, ClientError>> {
        async move {
            self.enter().await?;
            Ok(self
                .stakes
                .lock()
                .unwrap()
                .get(&(token, user))
                .copied()
                .unwrap_or_default())
        }
        .boxed()
    }

    fn user_battles(
        &self,
        _battle: Address,
        token: Address,
    ) -> BoxFuture<'_, Result<Vec<BattleRecord>, ClientError>> {
        async move {
            self.enter().await?;
            Ok(self
                .battles
                .lock()
                .unwrap()
                .get(&token)
                .cloned()
                .unwrap_or_default())
        }
        .boxed()
    }
}
