// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `memed` - query the Memed.fun backend and contracts from the command line.
//!
//! Configuration comes from the environment (see `memed_client::config`);
//! results are printed to stdout as JSON.

use std::process::ExitCode;

use serde::Serialize;
use serde_json::json;

use memed_client::api::DEFAULT_PAGE_LIMIT;
use memed_client::format::format_units;
use memed_client::logging::init_tracing;
use memed_client::query::QueryState;
use memed_client::{ClientConfig, MemedClient};

const USAGE: &str = "usage: memed <command>

commands:
  tokens [pages]             list launched tokens (default 1 page)
  token <address>            token details
  claims <address>           claimable rewards for a wallet
  engagement <handle>        aggregated engagement for a Lens handle
  balance <token> <account>  token balance of an account";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };
    init_tracing(config.log_format);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let client = match MemedClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build client");
            return ExitCode::FAILURE;
        }
    };

    let arg = |i: usize| args.get(i).map(String::as_str);

    match (command.as_str(), arg(1), arg(2)) {
        ("tokens", pages, None) => {
            let pages = match pages.map(str::parse::<u32>).transpose() {
                Ok(pages) => pages.unwrap_or(1).max(1),
                Err(e) => {
                    eprintln!("invalid page count: {e}");
                    return ExitCode::from(2);
                }
            };
            let feed = client.token_feed(DEFAULT_PAGE_LIMIT);
            let mut snapshot = feed.load().await;
            for _ in 1..pages {
                if !feed.fetch_next_page().await {
                    break;
                }
                snapshot = feed.snapshot();
            }
            match snapshot.error.take() {
                Some(error) => fail(&error),
                None => print_json(&snapshot),
            }
        }
        ("token", Some(address), None) => report(client.token(Some(address)).get().await),
        ("claims", Some(address), None) => report(client.claims(Some(address)).get().await),
        ("engagement", Some(handle), None) => {
            report(client.engagement_stats(Some(handle)).get().await)
        }
        ("balance", Some(token), Some(account)) => {
            let decimals = client.token_decimals(Some(token)).get().await;
            let decimals = match (decimals.data, decimals.error) {
                (Some(decimals), _) => decimals,
                (None, Some(error)) => return fail(&error),
                (None, None) => return fail("invalid arguments"),
            };
            let state = client
                .token_balance(Some(token), Some(account))
                .get()
                .await
                .map(|raw| {
                    json!({
                        "raw": raw.to_string(),
                        "decimals": decimals,
                        "formatted": format_units(raw, decimals),
                    })
                });
            report(state)
        }
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

/// Print the query result, or its error. A disabled query means the
/// arguments were rejected.
fn report<T: Serialize>(state: QueryState<T>) -> ExitCode {
    match (state.data, state.error) {
        (Some(data), _) => print_json(&data),
        (None, Some(error)) => fail(&error),
        (None, None) => fail("invalid arguments"),
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e.to_string()),
    }
}

fn fail(message: &str) -> ExitCode {
    eprintln!("error: {message}");
    ExitCode::FAILURE
}
