// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Backend Data Models
//!
//! Request and response types for the Memed.fun REST API, one per endpoint.
//! Responses are parsed and validated at the boundary: a payload that does not
//! match its shape, or breaks an invariant, becomes a [`ParseError`] instead of
//! reaching callers.
//!
//! | Endpoint | Response type |
//! |----------|---------------|
//! | `GET /api/tokens?page&limit` | [`TokenPage`] |
//! | `GET /api/tokens/{address}` | [`Token`] |
//! | `GET /api/claims/{address}` | `Vec<`[`ClaimProof`]`>` |
//! | `POST /api/claims/record` | [`ClaimRecord`] |
//! | `GET /api/engagement/aggregated/{handle}` | [`EngagementCounts`] |

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// =============================================================================
// Envelope
// =============================================================================

/// `{ success, data }` wrapper used by the token endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
}

fn malformed(endpoint: &'static str, e: serde_json::Error) -> ParseError {
    ParseError::Malformed {
        endpoint,
        reason: e.to_string(),
    }
}

fn parse_json<T: DeserializeOwned>(endpoint: &'static str, body: &str) -> Result<T, ParseError> {
    serde_json::from_str(body).map_err(|e| malformed(endpoint, e))
}

fn parse_enveloped<T: DeserializeOwned>(
    endpoint: &'static str,
    body: &str,
) -> Result<T, ParseError> {
    let envelope: Envelope<T> = parse_json(endpoint, body)?;
    if !envelope.success {
        return Err(ParseError::Unsuccessful { endpoint });
    }
    envelope.data.ok_or_else(|| ParseError::Malformed {
        endpoint,
        reason: "missing `data`".to_string(),
    })
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Token contract address
    pub address: String,
    pub name: String,
    pub ticker: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Creator wallet address
    #[serde(default)]
    pub creator: Option<String>,
    /// Lens handle of the creator
    #[serde(default)]
    pub lens_username: Option<String>,
    #[serde(default)]
    pub fair_launch_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub total_tokens: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    fn validate(&self, endpoint: &'static str) -> Result<(), ParseError> {
        if self.current_page < 1 {
            return Err(ParseError::Invariant {
                endpoint,
                reason: "currentPage must be at least 1".to_string(),
            });
        }
        if self.has_next_page != (self.current_page < self.total_pages) {
            return Err(ParseError::Invariant {
                endpoint,
                reason: format!(
                    "hasNextPage={} disagrees with page {}/{}",
                    self.has_next_page, self.current_page, self.total_pages
                ),
            });
        }
        Ok(())
    }
}

/// One page of the token list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPage {
    pub tokens: Vec<Token>,
    pub pagination: Pagination,
}

impl TokenPage {
    pub const ENDPOINT: &'static str = "tokens";

    pub fn parse(body: &str) -> Result<Self, ParseError> {
        let page: TokenPage = parse_enveloped(Self::ENDPOINT, body)?;
        page.pagination.validate(Self::ENDPOINT)?;
        Ok(page)
    }
}

impl Token {
    pub const ENDPOINT: &'static str = "token";

    pub fn parse(body: &str) -> Result<Self, ParseError> {
        parse_enveloped(Self::ENDPOINT, body)
    }
}

// =============================================================================
// Claims
// =============================================================================

/// A claimable reward with its merkle proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimProof {
    pub token_address: String,
    /// Amount in token base units, as a decimal string
    pub amount: String,
    #[serde(default)]
    pub proof: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClaimsResponse {
    rewards: Vec<ClaimProof>,
}

impl ClaimProof {
    pub const ENDPOINT: &'static str = "claims";

    pub fn parse_list(body: &str) -> Result<Vec<Self>, ParseError> {
        let response: ClaimsResponse = parse_json(Self::ENDPOINT, body)?;
        Ok(response.rewards)
    }
}

/// Body of `POST /api/claims/record`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordClaimRequest {
    pub user_address: String,
    pub token_address: String,
    pub amount: String,
    pub transaction_hash: String,
}

/// Record echoed back by the backend after a claim is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    pub message: String,
    pub user_address: String,
    pub token_address: String,
    pub amount: String,
    pub transaction_hash: String,
}

impl ClaimRecord {
    pub const ENDPOINT: &'static str = "claims/record";

    pub fn parse(body: &str) -> Result<Self, ParseError> {
        parse_json(Self::ENDPOINT, body)
    }
}

// =============================================================================
// Engagement
// =============================================================================

/// Raw engagement counts aggregated across a creator's posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementCounts {
    pub upvotes: u64,
    pub reposts: u64,
    pub comments: u64,
    pub quotes: u64,
}

impl EngagementCounts {
    pub const ENDPOINT: &'static str = "engagement";

    pub fn parse(body: &str) -> Result<Self, ParseError> {
        parse_json(Self::ENDPOINT, body)
    }
}
