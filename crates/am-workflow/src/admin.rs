//! Contract-owner resolution for the admin override.

use am_api_types::{Address, ChainId};
use am_chain_client::ContractReader;
use tracing::warn;

/// One `owner()` read. Resolution failure is logged and treated as
/// non-admin; there is no retry.
pub(crate) async fn resolve_admin(
    reader: &dyn ContractReader,
    chain: &ChainId,
    account: &Address,
) -> bool {
    match reader.read_owner(chain).await {
        Ok(owner) => owner.0.eq_ignore_ascii_case(&account.0),
        Err(err) => {
            warn!("owner resolution failed on chain {}: {err:#}", chain.0);
            false
        }
    }
}
