//! Workflow controller.
//!
//! `MoverCore` owns the current step and the staged selections, enforces the
//! authentication/supported-chain gate in front of every step event, and runs
//! the context-change side effects: admin re-resolution, backup recovery, and
//! inventory invalidation.

use crate::admin;
use crate::error::{FetchError, WorkflowError};
use crate::fetcher::{self, FetchOutcome};
use crate::machine::{WorkflowEvent, WorkflowState};
use crate::recovery;
use crate::selection::{BulkAction, SelectionSet};
use am_api_types::{
    Address, Asset, ChainId, NotificationKind, TransferBundle, WalletContext, WorkflowStep,
};
use am_chain_client::{
    ChainRegistry, ContractReader, InventorySource, LinkResolver, MetadataVerifier, Notifier,
    WalletBridge,
};
use am_storage::BackupStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether admin pane events honor the session gates. The observed source
/// flow lets the contract owner open the pane before authentication and
/// chain checks pass; `RequireSessionGates` closes that hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccessPolicy {
    BypassSessionGates,
    RequireSessionGates,
}

/// The external collaborators the workflow consumes as black boxes.
#[derive(Clone)]
pub struct Services {
    pub inventory: Arc<dyn InventorySource>,
    pub contracts: Arc<dyn ContractReader>,
    pub wallet: Arc<dyn WalletBridge>,
    pub backups: Arc<dyn BackupStore>,
    pub links: Arc<dyn LinkResolver>,
    pub metadata: Arc<dyn MetadataVerifier>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    /// Run the bounded fetch a ticket describes. Callers that do not want to
    /// hold the session exclusively during the fetch run this separately and
    /// hand the result back via `apply_inventory_result`.
    pub async fn fetch_inventory(
        &self,
        ticket: &InventoryFetchTicket,
    ) -> Result<FetchOutcome, FetchError> {
        fetcher::fetch_all(
            self.inventory.as_ref(),
            self.metadata.as_ref(),
            self.links.as_ref(),
            &ticket.account,
            &ticket.chain,
        )
        .await
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub loading: bool,
    pub items: Vec<Asset>,
    pub total: u64,
}

/// Snapshot taken when a fetch starts. The generation pins the result to the
/// session state that requested it; a chain change or step exit invalidates
/// the ticket and the completed fetch is discarded instead of written.
#[derive(Debug, Clone)]
pub struct InventoryFetchTicket {
    account: Address,
    chain: ChainId,
    generation: u64,
}

pub struct MoverCore {
    services: Services,
    registry: ChainRegistry,
    admin_policy: AdminAccessPolicy,
    context: WalletContext,
    state: WorkflowState,
    tokens: SelectionSet,
    nfts: SelectionSet,
    nft_picks: SelectionSet,
    transfer_bundle: Option<TransferBundle>,
    inventory: Inventory,
    fetch_generation: u64,
    is_admin: bool,
    backup_recovered: bool,
}

impl MoverCore {
    pub fn new(services: Services, registry: ChainRegistry, admin_policy: AdminAccessPolicy) -> Self {
        Self {
            services,
            registry,
            admin_policy,
            context: WalletContext::default(),
            state: WorkflowState::default(),
            tokens: SelectionSet::new(),
            nfts: SelectionSet::new(),
            nft_picks: SelectionSet::new(),
            transfer_bundle: None,
            inventory: Inventory::default(),
            fetch_generation: 0,
            is_admin: false,
            backup_recovered: false,
        }
    }

    // ── Views ──

    pub fn step(&self) -> WorkflowStep {
        self.state.step()
    }

    pub fn context(&self) -> &WalletContext {
        &self.context
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_actionable(&self) -> bool {
        self.context.is_authenticated && self.context.is_supported_chain
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn nft_picks(&self) -> &SelectionSet {
        &self.nft_picks
    }

    pub fn staged_tokens(&self) -> &SelectionSet {
        &self.tokens
    }

    pub fn staged_nfts(&self) -> &SelectionSet {
        &self.nfts
    }

    pub fn transfer_bundle(&self) -> Option<&TransferBundle> {
        self.transfer_bundle.as_ref()
    }

    /// Which way the select-all button currently toggles.
    pub fn nft_bulk_action(&self) -> BulkAction {
        self.nft_picks.bulk_action(self.inventory.items.len())
    }

    // ── Context changes ──

    /// Patch the wallet context. `None` fields are unchanged. Runs the
    /// change-driven side effects: admin re-resolution on account or chain
    /// change, a forced restart on chain change, and the backup check once
    /// authentication, account, and chain are all available.
    pub async fn update_context(
        &mut self,
        account: Option<Address>,
        chain_id: Option<ChainId>,
        authenticated: Option<bool>,
    ) -> WorkflowStep {
        let account_changed =
            matches!(&account, Some(next) if Some(next) != self.context.account.as_ref());
        let chain_changed =
            matches!(&chain_id, Some(next) if Some(next) != self.context.chain_id.as_ref());
        let auth_changed =
            matches!(authenticated, Some(next) if next != self.context.is_authenticated);

        if let Some(account) = account {
            self.context.account = Some(account);
        }
        if let Some(chain) = chain_id {
            self.context.chain_id = Some(chain);
        }
        if let Some(authenticated) = authenticated {
            self.context.is_authenticated = authenticated;
        }
        self.context.is_supported_chain = self
            .context
            .chain_id
            .as_ref()
            .is_some_and(|chain| self.registry.is_supported(chain));

        if chain_changed {
            // selections are bound to the previous chain's contracts
            self.state.apply(&WorkflowEvent::ChainChanged);
            self.clear_staged();
            self.reset_inventory();
        }

        if account_changed || chain_changed {
            self.fetch_generation += 1;
            self.refresh_admin().await;
        }

        if (account_changed || chain_changed || auth_changed) && self.context_ready() {
            self.check_backup_on_start().await;
        }

        self.state.step()
    }

    fn context_ready(&self) -> bool {
        self.context.is_authenticated
            && self.context.account.is_some()
            && self.context.chain_id.is_some()
    }

    /// Admin status is recomputed on every account/chain change, never cached
    /// across chains.
    async fn refresh_admin(&mut self) {
        self.is_admin = match (&self.context.account, &self.context.chain_id) {
            (Some(account), Some(chain)) if self.registry.is_supported(chain) => {
                admin::resolve_admin(self.services.contracts.as_ref(), chain, account).await
            }
            _ => false,
        };

        if !self.is_admin && self.state.step() == WorkflowStep::Admin {
            self.state.apply(&WorkflowEvent::AdminClosed);
        }
    }

    async fn check_backup_on_start(&mut self) {
        let Some(account) = self.context.account.clone() else {
            return;
        };
        let Some(record) =
            recovery::find_resumable_bundle(self.services.backups.as_ref(), &account).await
        else {
            return;
        };

        self.transfer_bundle = Some(record.bundle.clone());
        self.state.apply(&WorkflowEvent::BackupFound);

        if !self.backup_recovered {
            self.backup_recovered = true;
            self.services.notifier.notify(
                NotificationKind::Info,
                "Bundle Recovered",
                "We found an unsent bundle from your previous session",
            );
        }

        if let Err(err) = self
            .services
            .wallet
            .request_chain_switch(&record.chain_id)
            .await
        {
            warn!("chain switch request rejected: {err:#}");
            self.services.notifier.notify(
                NotificationKind::Warning,
                "Chain Switch Needed",
                &format!(
                    "Switch your wallet to chain {} to send the recovered bundle",
                    record.chain_id.0
                ),
            );
        }
    }

    // ── Step events ──

    pub async fn handle_event(&mut self, event: WorkflowEvent) -> Result<WorkflowStep, WorkflowError> {
        self.check_gate(&event)?;

        let from = self.state.step();
        let Some(to) = self.state.apply(&event) else {
            return Err(WorkflowError::InvalidTransition { step: from });
        };

        match (from, to) {
            (_, WorkflowStep::Start) if event == WorkflowEvent::Reset => {
                self.clear_staged();
                self.reset_inventory();
            }
            (WorkflowStep::Nfts, WorkflowStep::Bundle) => {
                self.nfts = self.nft_picks.clone();
            }
            (WorkflowStep::Bundle, WorkflowStep::Transfer) => {
                self.transfer_bundle = Some(TransferBundle {
                    tokens: self.tokens.items().to_vec(),
                    nfts: self.nfts.items().to_vec(),
                });
            }
            (WorkflowStep::Transfer, WorkflowStep::Done) => {
                // the staged record is spent once the transfer completes
                if let Some(account) = self.context.account.clone() {
                    if let Err(err) = self.services.backups.clear(&account).await {
                        warn!("failed to clear backup record for {}: {err:#}", account.0);
                    }
                }
            }
            _ => {}
        }

        if to == WorkflowStep::Nfts {
            // picks resume from the staged set on (re)entry
            self.nft_picks = self.nfts.clone();
        }
        if from == WorkflowStep::Nfts && to != WorkflowStep::Nfts {
            self.fetch_generation += 1;
        }

        debug!("workflow step {from:?} -> {to:?}");
        Ok(to)
    }

    fn check_gate(&self, event: &WorkflowEvent) -> Result<(), WorkflowError> {
        match event {
            WorkflowEvent::AdminOpened | WorkflowEvent::AdminClosed => {
                if !self.is_admin {
                    return Err(WorkflowError::NotAdmin);
                }
                if self.admin_policy == AdminAccessPolicy::RequireSessionGates
                    && !self.is_actionable()
                {
                    return Err(WorkflowError::NotActionable);
                }
                Ok(())
            }
            _ if self.is_actionable() => Ok(()),
            _ => Err(WorkflowError::NotActionable),
        }
    }

    // ── Selection ──

    pub fn toggle_token(&mut self, asset: Asset) -> Result<(), WorkflowError> {
        self.require_actionable_step(WorkflowStep::Tokens)?;
        self.tokens.toggle(asset);
        Ok(())
    }

    pub fn toggle_nft(&mut self, asset: Asset) -> Result<(), WorkflowError> {
        self.require_actionable_step(WorkflowStep::Nfts)?;
        if self.inventory.loading {
            return Err(WorkflowError::InventoryLoading);
        }
        self.nft_picks.toggle(asset);
        Ok(())
    }

    pub fn select_all_nfts(&mut self) -> Result<BulkAction, WorkflowError> {
        self.require_actionable_step(WorkflowStep::Nfts)?;
        if self.inventory.loading {
            return Err(WorkflowError::InventoryLoading);
        }
        Ok(self.nft_picks.select_all(&self.inventory.items))
    }

    fn require_actionable_step(&self, step: WorkflowStep) -> Result<(), WorkflowError> {
        if !self.is_actionable() {
            return Err(WorkflowError::NotActionable);
        }
        if self.state.step() != step {
            return Err(WorkflowError::InvalidTransition {
                step: self.state.step(),
            });
        }
        Ok(())
    }

    // ── Inventory ──

    /// Mark the inventory loading and hand back a ticket describing the
    /// fetch. Selection events are rejected until the result is applied.
    pub fn begin_inventory_load(&mut self) -> Result<InventoryFetchTicket, WorkflowError> {
        self.require_actionable_step(WorkflowStep::Nfts)?;
        let account = self.context.account.clone().ok_or(WorkflowError::NoAccount)?;
        let chain = self.context.chain_id.clone().ok_or(WorkflowError::NoChain)?;

        self.inventory = Inventory {
            loading: true,
            items: Vec::new(),
            total: 0,
        };

        Ok(InventoryFetchTicket {
            account,
            chain,
            generation: self.fetch_generation,
        })
    }

    /// Write a completed fetch back. Stale tickets are discarded silently;
    /// a fetch failure clears the loading flag and surfaces the error with
    /// no partial result.
    pub fn apply_inventory_result(
        &mut self,
        ticket: &InventoryFetchTicket,
        result: Result<FetchOutcome, FetchError>,
    ) -> Result<(), WorkflowError> {
        if ticket.generation != self.fetch_generation {
            debug!("discarding stale inventory fetch for {}", ticket.account.0);
            return Ok(());
        }

        self.inventory.loading = false;
        match result {
            Ok(outcome) => {
                if outcome.truncated() {
                    self.services.notifier.notify(
                        NotificationKind::Warning,
                        "Inventory Truncated",
                        &format!(
                            "Sorry, we can only move the {} NFTs shown here, you will have to carry out another transfer",
                            fetcher::FETCH_CAP
                        ),
                    );
                }
                self.inventory.items = outcome.items;
                self.inventory.total = outcome.total;
                Ok(())
            }
            Err(err) => Err(WorkflowError::Fetch(err)),
        }
    }

    /// Fetch and apply in one call, holding the session for the duration.
    pub async fn load_inventory(&mut self) -> Result<(), WorkflowError> {
        let ticket = self.begin_inventory_load()?;
        let services = self.services.clone();
        let result = services.fetch_inventory(&ticket).await;
        self.apply_inventory_result(&ticket, result)
    }

    fn clear_staged(&mut self) {
        self.tokens.clear();
        self.nfts.clear();
        self.nft_picks.clear();
        self.transfer_bundle = None;
    }

    fn reset_inventory(&mut self) {
        self.inventory = Inventory::default();
        self.fetch_generation += 1;
    }
}
