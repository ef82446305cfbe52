// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Memed.fun backend REST client.
//!
//! Every response body is read as text and handed to the matching parser in
//! [`crate::models`]; non-2xx responses become [`ClientError::Api`] carrying
//! the backend's envelope message.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::ClientError;
use crate::models::{
    ClaimProof, ClaimRecord, EngagementCounts, RecordClaimRequest, Token, TokenPage,
};

/// Default page size for the token list.
pub const DEFAULT_PAGE_LIMIT: u32 = 12;

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/tokens?page={page}&limit={limit}`
    pub async fn list_tokens(&self, page: u32, limit: u32) -> Result<TokenPage, ClientError> {
        let path = format!("/api/tokens?page={page}&limit={limit}");
        let body = self.get_text(&path).await?;
        Ok(TokenPage::parse(&body)?)
    }

    /// `GET /api/tokens/{address}`
    pub async fn get_token(&self, address: &str) -> Result<Token, ClientError> {
        let body = self.get_text(&format!("/api/tokens/{address}")).await?;
        Ok(Token::parse(&body)?)
    }

    /// `GET /api/claims/{address}`
    pub async fn get_claims(&self, address: &str) -> Result<Vec<ClaimProof>, ClientError> {
        let body = self.get_text(&format!("/api/claims/{address}")).await?;
        Ok(ClaimProof::parse_list(&body)?)
    }

    /// `GET /api/engagement/aggregated/{handle}`
    pub async fn get_engagement(&self, handle: &str) -> Result<EngagementCounts, ClientError> {
        let encoded: String = url::form_urlencoded::byte_serialize(handle.as_bytes()).collect();
        let body = self
            .get_text(&format!("/api/engagement/aggregated/{encoded}"))
            .await?;
        Ok(EngagementCounts::parse(&body)?)
    }

    /// `POST /api/claims/record`
    ///
    /// Single attempt, never retried: each call records a distinct on-chain
    /// transaction.
    pub async fn record_claim(
        &self,
        request: &RecordClaimRequest,
    ) -> Result<ClaimRecord, ClientError> {
        let path = "/api/claims/record";
        tracing::info!(
            user = %request.user_address,
            token = %request.token_address,
            tx_hash = %request.transaction_hash,
            "recording claim"
        );

        let response = self
            .http
            .post(self.url(path))
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("POST {path} failed: {e}")))?;

        let body = read_body(response, "POST", path).await?;
        Ok(ClaimRecord::parse(&body)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &str) -> Result<String, ClientError> {
        tracing::debug!(path, "backend GET");
        let response = self
            .http
            .get(self.url(path))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("GET {path} failed: {e}")))?;

        read_body(response, "GET", path).await
    }
}

async fn read_body(
    response: reqwest::Response,
    method: &str,
    path: &str,
) -> Result<String, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(format!("{method} {path} body read failed: {e}")))?;

    if !status.is_success() {
        tracing::warn!(method, path, status = status.as_u16(), "backend returned error");
        return Err(ClientError::from_response(status.as_u16(), &body));
    }

    Ok(body)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process fake backend.

    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Default)]
    pub struct FakeBackend {
        pub token_requests: AtomicUsize,
        pub claim_posts: AtomicUsize,
        pub claim_lookups: AtomicUsize,
        /// Body and status returned by `POST /api/claims/record`, if overridden.
        pub record_response: Mutex<Option<(StatusCode, Value)>>,
        pub total_tokens: usize,
        /// When set, `GET /api/tokens` answers 503.
        pub fail_tokens: AtomicBool,
        /// When set, `GET /api/tokens` reports this page whatever was asked.
        pub stuck_page: Mutex<Option<u32>>,
    }

    #[derive(Deserialize)]
    struct PageQuery {
        page: u32,
        limit: u32,
    }

    pub fn token_address(i: usize) -> String {
        format!("0x{i:040x}")
    }

    async fn list_tokens(
        State(backend): State<Arc<FakeBackend>>,
        Query(q): Query<PageQuery>,
    ) -> (StatusCode, Json<Value>) {
        backend.token_requests.fetch_add(1, Ordering::SeqCst);
        if backend.fail_tokens.load(Ordering::SeqCst) {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"success": false, "message": "Token service unavailable"})),
            );
        }

        let page = backend.stuck_page.lock().unwrap().unwrap_or(q.page);
        let limit = q.limit.max(1) as usize;
        let total = backend.total_tokens;
        let total_pages = total.div_ceil(limit);
        let start = (page as usize - 1) * limit;
        let tokens: Vec<Value> = (start..total.min(start + limit))
            .map(|i| json!({"address": token_address(i), "name": format!("Meme {i}"), "ticker": format!("M{i}")}))
            .collect();

        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "tokens": tokens,
                    "pagination": {
                        "currentPage": page,
                        "totalPages": total_pages,
                        "totalTokens": total,
                        "hasNextPage": (page as usize) < total_pages,
                        "hasPreviousPage": page > 1
                    }
                }
            })),
        )
    }

    async fn get_token(Path(address): Path<String>) -> (StatusCode, Json<Value>) {
        if address == token_address(404) {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"success": false, "message": "Token not found"})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({"success": true, "data": {"address": address, "name": "Pepe", "ticker": "PEPE"}})),
        )
    }

    async fn get_claims(
        State(backend): State<Arc<FakeBackend>>,
        Path(address): Path<String>,
    ) -> Json<Value> {
        let n = backend.claim_lookups.fetch_add(1, Ordering::SeqCst);
        let rewards: Vec<Value> = (0..=n)
            .map(|i| json!({"tokenAddress": token_address(i), "amount": "1000", "proof": [address.clone()]}))
            .collect();
        Json(json!({ "rewards": rewards }))
    }

    async fn record_claim(
        State(backend): State<Arc<FakeBackend>>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        backend.claim_posts.fetch_add(1, Ordering::SeqCst);
        if let Some((status, value)) = backend.record_response.lock().unwrap().clone() {
            return (status, Json(value));
        }
        let mut echoed = body;
        echoed["message"] = json!("Claim recorded successfully");
        (StatusCode::CREATED, Json(echoed))
    }

    async fn engagement(Path(handle): Path<String>) -> (StatusCode, Json<Value>) {
        match handle.as_str() {
            "ghost" => (
                StatusCode::OK,
                Json(json!({"upvotes": 0, "reposts": 0, "comments": 0, "quotes": 0})),
            ),
            "broken" => (StatusCode::OK, Json(json!({"upvotes": "many"}))),
            _ => (
                StatusCode::OK,
                Json(json!({"upvotes": 1200, "reposts": 250, "comments": 40, "quotes": 10})),
            ),
        }
    }

    /// Serve a fake backend on an ephemeral port and return its base URL.
    pub async fn spawn(backend: Arc<FakeBackend>) -> url::Url {
        let app = Router::new()
            .route("/api/tokens", get(list_tokens))
            .route("/api/tokens/{address}", get(get_token))
            .route("/api/claims/record", post(record_claim))
            .route("/api/claims/{address}", get(get_claims))
            .route("/api/engagement/aggregated/{handle}", get(engagement))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        url::Url::parse(&format!("http://{addr}")).unwrap()
    }
}
