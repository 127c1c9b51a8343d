use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainId(pub String);

/// Structural identity of an on-chain asset. NFTs carry a token id; fungible
/// token entries compare on contract address alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetIdentity {
    pub contract_address: Address,
    pub token_id: Option<String>,
}

impl AssetIdentity {
    pub fn nft(contract_address: Address, token_id: String) -> Self {
        Self {
            contract_address,
            token_id: Some(token_id),
        }
    }

    pub fn fungible(contract_address: Address) -> Self {
        Self {
            contract_address,
            token_id: None,
        }
    }
}

/// A fetched inventory item. `raw_balance` is the upstream indexer record,
/// kept opaque; image and name are derived from metadata and may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    pub identity: AssetIdentity,
    #[serde(default)]
    pub raw_balance: serde_json::Value,
    #[serde(default)]
    pub resolved_image_uri: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub contract_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferBundle {
    pub tokens: Vec<Asset>,
    pub nfts: Vec<Asset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupRecord {
    pub account: Address,
    pub chain_id: ChainId,
    pub bundle: TransferBundle,
    pub is_backup: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Start,
    Tokens,
    Nfts,
    Bundle,
    Transfer,
    Done,
    Admin,
}

/// Read-only wallet context threaded into the workflow. Never ambient state;
/// the caller recomputes and pushes it on every wallet-side change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletContext {
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub is_authenticated: bool,
    pub is_supported_chain: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

// ── mover-service API types ──

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCreateRequest {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub authenticated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateResponse {
    pub session_id: String,
    pub step: WorkflowStep,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextUpdateRequest {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub authenticated: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum WorkflowEventRequest {
    Start,
    FinishSelection {
        #[serde(default)]
        next: Option<WorkflowStep>,
    },
    Reset,
    OpenAdmin,
    CloseAdmin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum SelectionRequest {
    ToggleToken { asset: Asset },
    ToggleNft { asset: Asset },
    SelectAllNfts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateResponse {
    pub session_id: String,
    pub step: WorkflowStep,
    pub is_admin: bool,
    pub is_actionable: bool,
    pub inventory_loading: bool,
    pub inventory_total: u64,
    pub inventory_len: usize,
    pub selected_nfts: usize,
    pub staged_tokens: usize,
    pub staged_nfts: usize,
    pub bundle_staged: bool,
    /// "Select All" while anything is unselected, "Deselect All" once the
    /// whole inventory is picked.
    pub select_all_label: String,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryResponse {
    pub items: Vec<Asset>,
    pub total: u64,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedChainInfo {
    pub chain_id: String,
    pub name: String,
    pub contract_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedChainsResponse {
    pub chains: Vec<SupportedChainInfo>,
}
