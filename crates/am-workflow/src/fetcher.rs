//! Bounded, cursor-chained inventory fetch.
//!
//! Page k+1 can only be requested with the cursor returned by page k, so the
//! requests are strictly sequential. The fetch stops at 5 pages (500 items);
//! anything beyond the cap is reported through `total` so the caller can warn
//! that only the first 500 are available.

use crate::error::FetchError;
use am_api_types::{Address, Asset, ChainId};
use am_chain_client::{InventorySource, LinkResolver, MetadataVerifier};
use tracing::debug;

pub const PAGE_SIZE: usize = 100;
pub const MAX_PAGES: usize = 5;
pub const FETCH_CAP: usize = PAGE_SIZE * MAX_PAGES;

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub items: Vec<Asset>,
    pub total: u64,
}

impl FetchOutcome {
    pub fn truncated(&self) -> bool {
        self.total > self.items.len() as u64
    }
}

/// Fetch the full (capped) inventory for an account and run each surviving
/// asset through metadata enrichment. Fail-fast: any page error aborts the
/// whole fetch with no partial result.
pub async fn fetch_all(
    source: &dyn InventorySource,
    metadata: &dyn MetadataVerifier,
    links: &dyn LinkResolver,
    account: &Address,
    chain: &ChainId,
) -> Result<FetchOutcome, FetchError> {
    let first = source.fetch_page(account, chain, None).await?;
    let total = first.total;
    let mut items = first.items;
    let mut cursor = first.next_cursor;
    let mut pages_fetched = 1;

    while pages_fetched < MAX_PAGES && (items.len() as u64) < total {
        let Some(current) = cursor else { break };
        let page = source.fetch_page(account, chain, Some(&current)).await?;
        cursor = page.next_cursor;
        items.extend(page.items);
        pages_fetched += 1;
    }

    let mut items = dedup_by_identity(items);
    items.truncate(FETCH_CAP);
    let items = enrich(items, metadata, links).await;

    Ok(FetchOutcome { items, total })
}

/// Identity-based dedup, first occurrence wins. The indexer promises distinct
/// entries per page; this guards the selection set against a broken promise.
fn dedup_by_identity(items: Vec<Asset>) -> Vec<Asset> {
    let mut kept: Vec<Asset> = Vec::with_capacity(items.len());
    for asset in items {
        if kept.iter().all(|entry| entry.identity != asset.identity) {
            kept.push(asset);
        }
    }
    kept
}

async fn enrich(
    items: Vec<Asset>,
    metadata: &dyn MetadataVerifier,
    links: &dyn LinkResolver,
) -> Vec<Asset> {
    let mut enriched = Vec::with_capacity(items.len());
    for asset in items {
        let mut asset = metadata.verify(asset).await;
        if asset.resolved_image_uri.is_none() {
            match metadata_json(&asset) {
                Some(parsed) => {
                    if let Some(image) = parsed.get("image").and_then(|v| v.as_str()) {
                        asset.resolved_image_uri = Some(links.resolve(image));
                    }
                    if asset.display_name.is_none() {
                        asset.display_name = parsed
                            .get("name")
                            .and_then(|v| v.as_str())
                            .map(str::to_owned);
                    }
                }
                None => debug!(
                    "no metadata on {}/{:?}",
                    asset.identity.contract_address.0, asset.identity.token_id
                ),
            }
        }
        enriched.push(asset);
    }
    enriched
}

/// The indexer delivers metadata as an embedded JSON string; some sources
/// inline the object instead. Anything else counts as missing.
fn metadata_json(asset: &Asset) -> Option<serde_json::Value> {
    match asset.raw_balance.get("metadata")? {
        serde_json::Value::String(text) => serde_json::from_str(text).ok(),
        parsed @ serde_json::Value::Object(_) => Some(parsed.clone()),
        _ => None,
    }
}
