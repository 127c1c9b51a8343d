mod sessions;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use am_api_types::{
    Address, BackupRecord, ChainId, ContextUpdateRequest, InventoryResponse,
    SelectionRequest, SessionCreateRequest, SessionCreateResponse, SessionStateResponse,
    SupportedChainInfo, SupportedChainsResponse, WorkflowEventRequest, WorkflowStep,
};
use am_chain_client::{
    ChainInfo, ChainRegistry, ContractReader, InventorySource, LinkResolver, MetadataVerifier,
};
use am_chain_rest::{IpfsGateway, JsonMetadataVerifier, RestContractReader, RestInventorySource};
use am_storage::InMemoryBackupStore;
use am_workflow::{
    AdminAccessPolicy, BulkAction, MoverCore, Services, WorkflowError, WorkflowEvent,
};
use serde::Serialize;
use sessions::{BufferedNotifier, RelayWalletBridge, SessionHandle, Sessions};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct HealthResponse {
    service: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Clone)]
struct AppState {
    registry: ChainRegistry,
    sessions: Arc<Sessions>,
    inventory: Arc<dyn InventorySource>,
    contracts: Arc<dyn ContractReader>,
    backups: Arc<InMemoryBackupStore>,
    links: Arc<dyn LinkResolver>,
    metadata: Arc<dyn MetadataVerifier>,
    admin_policy: AdminAccessPolicy,
}

impl AppState {
    fn new(registry: ChainRegistry) -> Self {
        Self {
            inventory: Arc::new(RestInventorySource::default()),
            contracts: Arc::new(RestContractReader::new(None, registry.clone())),
            backups: Arc::new(InMemoryBackupStore::default()),
            links: Arc::new(IpfsGateway::default()),
            metadata: Arc::new(JsonMetadataVerifier),
            sessions: Arc::new(Sessions::default()),
            admin_policy: AdminAccessPolicy::BypassSessionGates,
            registry,
        }
    }
}

/// Chains the mover contract is deployed on.
fn default_registry() -> ChainRegistry {
    let mut registry = ChainRegistry::default();
    let deployments = [
        ("0x1", "Ethereum", "0x8f5b2b7608e3e3a3dc0426c3396420fbf1849454"),
        ("0xaa36a7", "Sepolia", "0x02e0c4657a1a76533dd2fcecb0f122d1c1c898fa"),
        ("0x89", "Polygon", "0x88e491f34a16a1b32a85a0566cc02b2e6e25c5f4"),
        ("0x13881", "Mumbai", "0x5a0b54d5dc17e0aadc383d2db43b0a0d3e029c4c"),
    ];
    for (chain_id, name, contract) in deployments {
        registry.register(ChainInfo {
            chain_id: ChainId(chain_id.to_owned()),
            name: name.to_owned(),
            contract_address: Address(contract.to_owned()),
        });
    }
    registry
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/chains", get(chains))
        .route("/session", post(create_session))
        .route("/session/{id}", get(get_session))
        .route("/session/{id}/context", post(update_context))
        .route("/session/{id}/event", post(post_event))
        .route("/session/{id}/selection", post(post_selection))
        .route("/session/{id}/inventory/load", post(load_inventory))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let state = AppState::new(default_registry());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    info!("mover-service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "mover-service",
        status: "ok",
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "mover-service",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn chains(State(state): State<AppState>) -> Json<SupportedChainsResponse> {
    let mut chains: Vec<SupportedChainInfo> = state
        .registry
        .iter()
        .map(|info| SupportedChainInfo {
            chain_id: info.chain_id.0.clone(),
            name: info.name.clone(),
            contract_address: info.contract_address.0.clone(),
        })
        .collect();
    chains.sort_by(|a, b| a.chain_id.cmp(&b.chain_id));
    Json(SupportedChainsResponse { chains })
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<SessionCreateRequest>,
) -> ApiResult<SessionCreateResponse> {
    let notifier = Arc::new(BufferedNotifier::default());
    let services = Services {
        inventory: state.inventory.clone(),
        contracts: state.contracts.clone(),
        wallet: Arc::new(RelayWalletBridge {
            notifier: notifier.clone(),
        }),
        backups: state.backups.clone(),
        links: state.links.clone(),
        metadata: state.metadata.clone(),
        notifier: notifier.clone(),
    };

    let mut core = MoverCore::new(services.clone(), state.registry.clone(), state.admin_policy);
    if request.account.is_some() || request.chain_id.is_some() || request.authenticated {
        core.update_context(
            request.account.map(Address),
            request.chain_id.map(ChainId),
            Some(request.authenticated),
        )
        .await;
    }

    let step = core.step();
    let id = state
        .sessions
        .insert(SessionHandle {
            core: Mutex::new(core),
            services,
            notifier,
        })
        .await;

    Ok(Json(SessionCreateResponse {
        session_id: id.to_string(),
        step,
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionStateResponse> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| not_found("unknown session"))?;

    let core = handle.core.lock().await;
    Ok(Json(state_view(&id, &core, &handle.notifier)))
}

async fn update_context(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ContextUpdateRequest>,
) -> ApiResult<SessionStateResponse> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| not_found("unknown session"))?;

    let mut core = handle.core.lock().await;
    core.update_context(
        request.account.map(Address),
        request.chain_id.map(ChainId),
        request.authenticated,
    )
    .await;

    Ok(Json(state_view(&id, &core, &handle.notifier)))
}

async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<WorkflowEventRequest>,
) -> ApiResult<SessionStateResponse> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| not_found("unknown session"))?;

    let mut core = handle.core.lock().await;
    let step = core
        .handle_event(to_workflow_event(request))
        .await
        .map_err(workflow_error)?;

    // persist the staged bundle so an interrupted session can resume
    if step == WorkflowStep::Transfer {
        if let (Some(bundle), Some(account), Some(chain_id)) = (
            core.transfer_bundle().cloned(),
            core.context().account.clone(),
            core.context().chain_id.clone(),
        ) {
            state
                .backups
                .stage(BackupRecord {
                    account,
                    chain_id,
                    bundle,
                    is_backup: true,
                })
                .await;
        }
    }

    Ok(Json(state_view(&id, &core, &handle.notifier)))
}

async fn post_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<SessionStateResponse> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| not_found("unknown session"))?;

    let mut core = handle.core.lock().await;
    match request {
        SelectionRequest::ToggleToken { asset } => core.toggle_token(asset),
        SelectionRequest::ToggleNft { asset } => core.toggle_nft(asset),
        SelectionRequest::SelectAllNfts => core.select_all_nfts().map(|_| ()),
    }
    .map_err(workflow_error)?;

    Ok(Json(state_view(&id, &core, &handle.notifier)))
}

async fn load_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<InventoryResponse> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| not_found("unknown session"))?;

    // fetch without holding the session so other requests stay responsive;
    // a stale ticket is discarded on apply
    let ticket = {
        let mut core = handle.core.lock().await;
        core.begin_inventory_load().map_err(workflow_error)?
    };
    let result = handle.services.fetch_inventory(&ticket).await;

    let mut core = handle.core.lock().await;
    core.apply_inventory_result(&ticket, result)
        .map_err(workflow_error)?;

    let inventory = core.inventory();
    Ok(Json(InventoryResponse {
        items: inventory.items.clone(),
        total: inventory.total,
        truncated: inventory.total > inventory.items.len() as u64,
    }))
}

fn to_workflow_event(request: WorkflowEventRequest) -> WorkflowEvent {
    match request {
        WorkflowEventRequest::Start => WorkflowEvent::Started,
        WorkflowEventRequest::FinishSelection { next } => WorkflowEvent::SelectionFinished { next },
        WorkflowEventRequest::Reset => WorkflowEvent::Reset,
        WorkflowEventRequest::OpenAdmin => WorkflowEvent::AdminOpened,
        WorkflowEventRequest::CloseAdmin => WorkflowEvent::AdminClosed,
    }
}

fn state_view(id: &Uuid, core: &MoverCore, notifier: &BufferedNotifier) -> SessionStateResponse {
    SessionStateResponse {
        session_id: id.to_string(),
        step: core.step(),
        is_admin: core.is_admin(),
        is_actionable: core.is_actionable(),
        inventory_loading: core.inventory().loading,
        inventory_total: core.inventory().total,
        inventory_len: core.inventory().items.len(),
        selected_nfts: core.nft_picks().len(),
        staged_tokens: core.staged_tokens().len(),
        staged_nfts: core.staged_nfts().len(),
        bundle_staged: core.transfer_bundle().is_some(),
        select_all_label: match core.nft_bulk_action() {
            BulkAction::SelectAll => "Select All".to_owned(),
            BulkAction::DeselectAll => "Deselect All".to_owned(),
        },
        notifications: notifier.drain(),
    }
}

fn workflow_error(err: WorkflowError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        WorkflowError::NotActionable | WorkflowError::NotAdmin => forbidden(&err.to_string()),
        WorkflowError::Fetch(_) => internal_error(err),
        _ => bad_request(&err.to_string()),
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

fn forbidden(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

fn not_found(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
}

fn internal_error(err: impl std::fmt::Display) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(default_registry()))
    }

    async fn request_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&value)?)
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    #[tokio::test]
    async fn health_reports_ok() -> anyhow::Result<()> {
        let app = app();
        let (status, body) = request_json(&app, "GET", "/health", None).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn chains_lists_the_deployments() -> anyhow::Result<()> {
        let app = app();
        let (status, body) = request_json(&app, "GET", "/chains", None).await?;
        assert_eq!(status, StatusCode::OK);
        let chains = body["chains"].as_array().expect("chains array");
        assert!(chains.iter().any(|c| c["chain_id"] == "0x1"));
        Ok(())
    }

    #[tokio::test]
    async fn session_flow_advances_steps_over_http() -> anyhow::Result<()> {
        let app = app();

        let (status, created) = request_json(
            &app,
            "POST",
            "/session",
            Some(json!({
                "account": "0xabc123",
                "chain_id": "0x1",
                "authenticated": true
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["step"], "start");
        let id = created["session_id"].as_str().expect("session id").to_owned();

        let (status, state) = request_json(
            &app,
            "POST",
            &format!("/session/{id}/event"),
            Some(json!({ "event": "start" })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["step"], "tokens");

        let (status, state) = request_json(
            &app,
            "POST",
            &format!("/session/{id}/selection"),
            Some(json!({
                "op": "toggle_token",
                "asset": {
                    "identity": { "contract_address": "0xfeed", "token_id": null },
                    "contract_type": "ERC20"
                }
            })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["staged_tokens"], 1);

        let (status, state) = request_json(
            &app,
            "POST",
            &format!("/session/{id}/event"),
            Some(json!({ "event": "finish_selection" })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["step"], "nfts");

        Ok(())
    }

    #[tokio::test]
    async fn unauthenticated_session_cannot_start() -> anyhow::Result<()> {
        let app = app();

        let (_, created) = request_json(
            &app,
            "POST",
            "/session",
            Some(json!({ "chain_id": "0x1" })),
        )
        .await?;
        let id = created["session_id"].as_str().expect("session id").to_owned();

        let (status, body) = request_json(
            &app,
            "POST",
            &format!("/session/{id}/event"),
            Some(json!({ "event": "start" })),
        )
        .await?;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().expect("error body").contains("not actionable"));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_session_is_404() -> anyhow::Result<()> {
        let app = app();
        let (status, _) = request_json(
            &app,
            "GET",
            &format!("/session/{}", Uuid::new_v4()),
            None,
        )
        .await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
