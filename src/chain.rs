// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network constants and the chain-switch policy.
//!
//! Lens accounts are created on mainnet while token, staking and battle
//! transactions run on testnet, so the wallet is moved between the two
//! depending on what is about to be submitted.

use crate::blockchain::Wallet;
use crate::error::ClientError;

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Lens Chain mainnet.
pub const LENS_MAINNET: NetworkConfig = NetworkConfig {
    name: "Lens Chain",
    chain_id: 232,
    rpc_url: "https://rpc.lens.xyz",
    explorer_url: "https://explorer.lens.xyz",
};

/// Lens Chain testnet.
pub const LENS_TESTNET: NetworkConfig = NetworkConfig {
    name: "Lens Chain Testnet",
    chain_id: 37111,
    rpc_url: "https://rpc.testnet.lens.xyz",
    explorer_url: "https://explorer.testnet.lens.xyz",
};

/// What the wallet is about to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    AccountCreation,
    /// Minting, staking, battles, claims.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainSwitch {
    SwitchTo(u64),
    NoOp,
}

/// The pair of networks the policy moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPair {
    pub mainnet: u64,
    pub testnet: u64,
}

impl Default for ChainPair {
    fn default() -> Self {
        Self {
            mainnet: LENS_MAINNET.chain_id,
            testnet: LENS_TESTNET.chain_id,
        }
    }
}

impl ChainPair {
    /// Decide which chain the wallet must be on before submitting `kind`.
    ///
    /// `None` is treated like [`TransactionKind::Other`]. Off mainnet, only
    /// account creation moves the wallet; on mainnet, everything except
    /// account creation moves it to testnet.
    pub fn decide(&self, current_chain_id: u64, kind: Option<TransactionKind>) -> ChainSwitch {
        let on_mainnet = current_chain_id == self.mainnet;
        match (kind, on_mainnet) {
            (Some(TransactionKind::AccountCreation), false) => ChainSwitch::SwitchTo(self.mainnet),
            (Some(TransactionKind::AccountCreation), true) => ChainSwitch::NoOp,
            (_, true) => ChainSwitch::SwitchTo(self.testnet),
            (_, false) => ChainSwitch::NoOp,
        }
    }
}

/// Apply the policy to `wallet`.
///
/// Errors from the wallet's `switch_chain` are returned as-is, without retry.
pub async fn ensure_chain_for(
    wallet: &dyn Wallet,
    pair: &ChainPair,
    kind: Option<TransactionKind>,
) -> Result<ChainSwitch, ClientError> {
    let current = wallet.chain_id();
    let decision = pair.decide(current, kind);

    if let ChainSwitch::SwitchTo(target) = decision {
        tracing::info!(from = current, to = target, ?kind, "switching wallet chain");
        wallet.switch_chain(target).await?;
    }

    Ok(decision)
}
