// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Memed.fun client - data layer for the meme-token launchpad
//!
//! This crate provides the read and write paths a Memed.fun front-end needs:
//! cached, single-flight queries over the backend REST API and the Lens chain
//! contracts, an account event bus, and the wallet chain-switch policy.
//!
//! ## Modules
//!
//! - `api` - Backend REST client (reqwest)
//! - `blockchain` - Contract reads and wallet capability (alloy)
//! - `cache` - LRU query cache
//! - `chain` - Lens network constants and chain-switch policy
//! - `client` - `MemedClient` facade, one query adapter per resource
//! - `config` - Environment configuration
//! - `engagement` - Engagement stats derivation
//! - `error` - Error taxonomy and user-facing messages
//! - `events` - Account event bus
//! - `feed` - Paginated token list
//! - `format` - Display formatting helpers
//! - `logging` - Tracing subscriber setup
//! - `models` - Backend payloads, validated at parse time
//! - `query` - Query handles: gating, staleness, single-flight, retry

pub mod api;
pub mod blockchain;
pub mod cache;
pub mod chain;
pub mod client;
pub mod config;
pub mod engagement;
pub mod error;
pub mod events;
pub mod feed;
pub mod format;
pub mod logging;
pub mod models;
pub mod query;

pub use client::MemedClient;
pub use config::ClientConfig;
pub use error::{ClientError, MutationError};
pub use events::{AccountEvent, EventBus};
