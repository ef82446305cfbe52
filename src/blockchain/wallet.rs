// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use futures::future::BoxFuture;

use crate::error::ClientError;

/// The connected wallet session, owned by the wallet-connection layer.
///
/// Failures are reported as [`ClientError::Wallet`].
pub trait Wallet: Send + Sync {
    /// Chain the wallet is currently on.
    fn chain_id(&self) -> u64;

    /// Ask the wallet to move to `chain_id`.
    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), ClientError>>;
}
