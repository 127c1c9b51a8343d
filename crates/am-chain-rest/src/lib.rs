use anyhow::{Context, Result};
use async_trait::async_trait;
use am_api_types::{Address, Asset, AssetIdentity, ChainId};
use am_chain_client::{
    AssetPage, ChainRegistry, ContractReader, InventorySource, LinkResolver, MetadataVerifier,
};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// REST adapter for an NFT inventory indexer.
///
/// Reads `INVENTORY_API_URL` from environment at construction time
/// (default: `http://localhost:4000`).
pub struct RestInventorySource {
    endpoint: String,
    http: reqwest::Client,
}

impl Default for RestInventorySource {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RestInventorySource {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("INVENTORY_API_URL").ok())
            .unwrap_or_else(|| "http://localhost:4000".to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

// ── Indexer REST API types ──

#[derive(Debug, Deserialize)]
struct NftPageResponse {
    #[serde(default)]
    result: Vec<serde_json::Value>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct IndexerErrorResponse {
    error: String,
}

fn asset_from_record(record: serde_json::Value) -> Option<Asset> {
    let contract_address = record.get("token_address").and_then(|v| v.as_str())?;
    let token_id = record
        .get("token_id")
        .and_then(|v| v.as_str())
        .map(str::to_owned);
    let contract_type = record
        .get("contract_type")
        .and_then(|v| v.as_str())
        .unwrap_or("UNKNOWN")
        .to_owned();
    let display_name = record
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::to_owned);

    Some(Asset {
        identity: AssetIdentity {
            contract_address: Address(contract_address.to_owned()),
            token_id,
        },
        raw_balance: record,
        resolved_image_uri: None,
        display_name,
        contract_type,
    })
}

#[async_trait]
impl InventorySource for RestInventorySource {
    async fn fetch_page(
        &self,
        account: &Address,
        chain: &ChainId,
        cursor: Option<&str>,
    ) -> Result<AssetPage> {
        let mut url = format!(
            "{}/{}/nft?chain={}&limit={}",
            self.endpoint, account.0, chain.0, DEFAULT_PAGE_LIMIT
        );
        if let Some(cursor) = cursor {
            url.push_str("&cursor=");
            url.push_str(cursor);
        }

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("inventory fetch_page transport")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<IndexerErrorResponse>(&text) {
                anyhow::bail!("inventory fetch_page HTTP {status}: {}", err.error);
            }
            anyhow::bail!("inventory fetch_page HTTP {status}: {text}");
        }

        let body: NftPageResponse = response
            .json()
            .await
            .context("inventory fetch_page parse")?;

        let mut items = Vec::with_capacity(body.result.len());
        for record in body.result {
            match asset_from_record(record) {
                Some(asset) => items.push(asset),
                None => warn!("dropping inventory record without token_address"),
            }
        }

        Ok(AssetPage {
            items,
            next_cursor: body.cursor.filter(|c| !c.is_empty()),
            total: body.total,
        })
    }
}

/// Read-only `owner()` lookup against the indexer's contract endpoint. The
/// mover contract address per chain comes from the registry.
pub struct RestContractReader {
    endpoint: String,
    registry: ChainRegistry,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    owner: String,
}

impl RestContractReader {
    pub fn new(endpoint: Option<String>, registry: ChainRegistry) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("INVENTORY_API_URL").ok())
            .unwrap_or_else(|| "http://localhost:4000".to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            registry,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ContractReader for RestContractReader {
    async fn read_owner(&self, chain: &ChainId) -> Result<Address> {
        let contract = self
            .registry
            .contract_address(chain)
            .with_context(|| format!("no mover contract registered for chain {}", chain.0))?;

        let url = format!(
            "{}/contract/{}/owner?chain={}",
            self.endpoint, contract.0, chain.0
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("contract read_owner transport")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("contract read_owner HTTP {status}: {text}");
        }

        let body: OwnerResponse = response.json().await.context("contract read_owner parse")?;
        Ok(Address(body.owner))
    }
}

pub const DEFAULT_IPFS_GATEWAY: &str = "https://gateway.ipfs.io/ipfs/";

/// Rewrites `ipfs://` and bare-hash links to an HTTP gateway; other schemes
/// pass through unchanged.
///
/// Reads `IPFS_GATEWAY_URL` from environment at construction time.
pub struct IpfsGateway {
    gateway: String,
}

impl Default for IpfsGateway {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IpfsGateway {
    pub fn new(gateway: Option<String>) -> Self {
        let gateway = gateway
            .or_else(|| std::env::var("IPFS_GATEWAY_URL").ok())
            .unwrap_or_else(|| DEFAULT_IPFS_GATEWAY.to_string());
        let gateway = if gateway.ends_with('/') {
            gateway
        } else {
            format!("{gateway}/")
        };
        Self { gateway }
    }
}

fn looks_like_content_hash(uri: &str) -> bool {
    uri.starts_with("Qm") || uri.starts_with("bafy")
}

impl LinkResolver for IpfsGateway {
    fn resolve(&self, uri: &str) -> String {
        if let Some(rest) = uri.strip_prefix("ipfs://") {
            let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
            format!("{}{}", self.gateway, rest)
        } else if looks_like_content_hash(uri) {
            format!("{}{}", self.gateway, uri)
        } else {
            uri.to_owned()
        }
    }
}

/// Fills display fields the page mapper left blank from the raw indexer
/// record. Idempotent; an asset with nothing to add passes through as-is.
#[derive(Default)]
pub struct JsonMetadataVerifier;

#[async_trait]
impl MetadataVerifier for JsonMetadataVerifier {
    async fn verify(&self, mut asset: Asset) -> Asset {
        if asset.display_name.is_none() {
            asset.display_name = asset
                .raw_balance
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_owned);
        }
        if asset.contract_type.is_empty() {
            asset.contract_type = asset
                .raw_balance
                .get("contract_type")
                .and_then(|v| v.as_str())
                .unwrap_or("UNKNOWN")
                .to_owned();
        }
        asset
    }
}
