// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! On-chain integration.
//!
//! This module provides:
//! - The contract read surface (`balanceOf`, `totalSupply`, `stakes`,
//!   `getUserBattles`) behind the [`ContractReader`] trait
//! - An alloy-backed JSON-RPC implementation of it
//! - The [`Wallet`] capability the chain-switch policy drives

pub mod client;
pub mod contracts;
pub mod reader;
pub mod types;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use client::RpcContractReader;
pub use reader::ContractReader;
pub use types::*;
pub use wallet::Wallet;
