use anyhow::Result;
use async_trait::async_trait;
use am_api_types::{Address, Asset, ChainId, NotificationKind};
use std::collections::HashMap;

/// One page of NFT inventory. `next_cursor` chains to the following page;
/// `total` is the full inventory size reported by the indexer.
#[derive(Debug, Clone)]
pub struct AssetPage {
    pub items: Vec<Asset>,
    pub next_cursor: Option<String>,
    pub total: u64,
}

#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_page(
        &self,
        account: &Address,
        chain: &ChainId,
        cursor: Option<&str>,
    ) -> Result<AssetPage>;
}

#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn read_owner(&self, chain: &ChainId) -> Result<Address>;
}

/// Requests a wallet-side chain switch. The wallet may reject; callers treat
/// a rejection as non-fatal.
#[async_trait]
pub trait WalletBridge: Send + Sync {
    async fn request_chain_switch(&self, chain: &ChainId) -> Result<()>;
}

/// Rewrites content-addressed links into fetchable URIs.
pub trait LinkResolver: Send + Sync {
    fn resolve(&self, uri: &str) -> String;
}

/// Best-effort metadata enrichment. Must be idempotent and must tolerate
/// missing or malformed metadata without failing.
#[async_trait]
pub trait MetadataVerifier: Send + Sync {
    async fn verify(&self, asset: Asset) -> Asset;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, title: &str, message: &str);
}

#[derive(Debug, Clone)]
pub struct ChainInfo {
    pub chain_id: ChainId,
    pub name: String,
    pub contract_address: Address,
}

/// Catalogue of chains the mover contract is deployed on. A chain missing
/// from the registry fails the supported-chain gate.
#[derive(Default, Clone)]
pub struct ChainRegistry {
    chains: HashMap<String, ChainInfo>,
}

impl ChainRegistry {
    pub fn register(&mut self, info: ChainInfo) {
        self.chains.insert(info.chain_id.0.clone(), info);
    }

    pub fn is_supported(&self, chain: &ChainId) -> bool {
        self.chains.contains_key(&chain.0)
    }

    pub fn contract_address(&self, chain: &ChainId) -> Option<Address> {
        self.chains.get(&chain.0).map(|info| info.contract_address.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainInfo> {
        self.chains.values()
    }
}
