// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract read results and address validation.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::Serialize;

use super::contracts::IMemedBattle;
use crate::error::ClientError;

/// A user's position in the staking contract for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StakeInfo {
    /// Staked amount (token base units)
    pub amount: U256,
    /// Accrued, unclaimed reward (token base units)
    pub reward: U256,
}

impl StakeInfo {
    pub fn is_staked(&self) -> bool {
        !self.amount.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    Pending,
    Active,
    Resolved,
    Unknown(u8),
}

impl From<u8> for BattleStatus {
    fn from(raw: u8) -> Self {
        match raw {
            0 => BattleStatus::Pending,
            1 => BattleStatus::Active,
            2 => BattleStatus::Resolved,
            other => BattleStatus::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleRecord {
    pub battle_id: U256,
    pub meme_a: Address,
    pub meme_b: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub status: BattleStatus,
    /// `None` until the battle is resolved.
    pub winner: Option<Address>,
}

impl From<IMemedBattle::Battle> for BattleRecord {
    fn from(raw: IMemedBattle::Battle) -> Self {
        Self {
            battle_id: raw.battleId,
            meme_a: raw.memeA,
            meme_b: raw.memeB,
            start_time: raw.startTime.saturating_to(),
            end_time: raw.endTime.saturating_to(),
            status: BattleStatus::from(raw.status),
            winner: (!raw.winner.is_zero()).then_some(raw.winner),
        }
    }
}

/// Parse a `0x`-prefixed, 40 hex digit address.
pub fn parse_address(raw: &str) -> Result<Address, ClientError> {
    let trimmed = raw.trim();
    let well_formed = trimmed.len() == 42
        && (trimmed.starts_with("0x") || trimmed.starts_with("0X"))
        && trimmed[2..].bytes().all(|b| b.is_ascii_hexdigit());

    if !well_formed {
        return Err(ClientError::InvalidAddress(raw.to_string()));
    }

    Address::from_str(&trimmed[2..]).map_err(|e| ClientError::InvalidAddress(e.to_string()))
}
