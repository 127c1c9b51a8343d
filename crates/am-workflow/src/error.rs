use am_api_types::WorkflowStep;
use thiserror::Error;

/// A page request failed. The whole inventory fetch aborts with no partial
/// result; retrying is the caller's decision.
#[derive(Debug, Error)]
#[error("inventory page request failed: {source}")]
pub struct FetchError {
    #[from]
    source: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("session is not actionable: authentication and a supported chain are required")]
    NotActionable,
    #[error("admin mode requires the contract owner account")]
    NotAdmin,
    #[error("event is not valid at step {step:?}")]
    InvalidTransition { step: WorkflowStep },
    #[error("selection is unavailable while the inventory is loading")]
    InventoryLoading,
    #[error("no account is connected")]
    NoAccount,
    #[error("no chain is selected")]
    NoChain,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
