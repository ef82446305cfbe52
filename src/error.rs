// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Errors
//!
//! Every fallible operation in this crate returns [`ClientError`]. The
//! variants follow the four failure classes the front-end distinguishes:
//!
//! | Class | Variants | Handling |
//! |-------|----------|----------|
//! | validation | `InvalidAddress`, `MissingParameter` | query is disabled, never sent |
//! | transport | `Transport`, `Contract`, `Wallet` | stored beside the cache entry; only `Transport` is retried |
//! | application | `Api` | backend envelope message shown first |
//! | unexpected | `Parse`, `Unexpected` | reduced to a fallback message |
//!
//! Errors carry `String` payloads so they are `Clone`; a single in-flight
//! fetch hands the same result to every caller that joined it.

use serde::Deserialize;

/// Fallback shown for read failures with no usable message.
pub const READ_FALLBACK_MESSAGE: &str = "Failed to fetch data";

/// Fallback shown when recording a claim fails with no usable message.
pub const CLAIM_FALLBACK_MESSAGE: &str = "Failed to record claim";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("{0}")]
    Transport(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Unexpected(String),
}

/// Failure of a write operation, carrying the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MutationError {
    pub message: String,
    #[source]
    pub source: ClientError,
}

impl MutationError {
    pub fn new(source: ClientError, fallback: &str) -> Self {
        Self {
            message: source.user_message(fallback),
            source,
        }
    }
}

/// A server payload that did not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed {endpoint} response: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Backend reported failure for {endpoint}")]
    Unsuccessful { endpoint: &'static str },

    #[error("Invalid {endpoint} response: {reason}")]
    Invariant {
        endpoint: &'static str,
        reason: String,
    },
}

/// Error envelope returned by the backend on failure.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

impl ClientError {
    /// Whether an automatic retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Build an application error from a non-2xx response body.
    ///
    /// The envelope's `message` wins over `error`; a body that is not an
    /// envelope yields an empty message so [`user_message`](Self::user_message)
    /// falls through to the transport text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
        let message = envelope
            .message
            .or(envelope.error)
            .map(|m| m.trim().to_string())
            .unwrap_or_default();
        ClientError::Api { status, message }
    }

    /// Normalize into the message shown to the user.
    ///
    /// Priority: backend-provided message, then the transport message, then
    /// `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        let candidate = match self {
            ClientError::Api { status, message } => {
                if message.is_empty() {
                    format!("Request failed with status code {status}")
                } else {
                    message.clone()
                }
            }
            ClientError::Transport(message)
            | ClientError::Contract(message)
            | ClientError::Wallet(message) => message.clone(),
            ClientError::InvalidAddress(_) | ClientError::MissingParameter(_) => self.to_string(),
            ClientError::Parse(_) | ClientError::Unexpected(_) => String::new(),
        };

        if candidate.trim().is_empty() {
            fallback.to_string()
        } else {
            candidate
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
