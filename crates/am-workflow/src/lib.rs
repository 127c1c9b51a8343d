//! Batch asset-transfer workflow core: the step state machine, the bounded
//! cursor-chained inventory fetcher, and the structural-identity selection
//! set. External capabilities (indexer, contract reads, wallet bridge,
//! backup store, notifications) enter through the `am-chain-client` and
//! `am-storage` traits.

mod admin;
mod controller;
mod error;
mod fetcher;
mod machine;
mod recovery;
mod selection;

pub use controller::{
    AdminAccessPolicy, Inventory, InventoryFetchTicket, MoverCore, Services,
};
pub use error::{FetchError, WorkflowError};
pub use fetcher::{FETCH_CAP, FetchOutcome, MAX_PAGES, PAGE_SIZE, fetch_all};
pub use machine::{WorkflowEvent, WorkflowState, transition};
pub use selection::{BulkAction, SelectionSet};
