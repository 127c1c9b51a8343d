//! Session-start backup lookup.

use am_api_types::{Address, BackupRecord};
use am_storage::BackupStore;
use tracing::warn;

/// Query the backup store for a resumable bundle. Lookup errors and records
/// without the backup flag both resolve to "nothing to resume".
pub(crate) async fn find_resumable_bundle(
    store: &dyn BackupStore,
    account: &Address,
) -> Option<BackupRecord> {
    match store.find_backup_bundle(account).await {
        Ok(Some(record)) if record.is_backup => Some(record),
        Ok(_) => None,
        Err(err) => {
            warn!("backup lookup failed for {}: {err:#}", account.0);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_api_types::{ChainId, TransferBundle};
    use am_storage::InMemoryBackupStore;

    #[tokio::test]
    async fn only_flagged_records_are_resumable() {
        let store = InMemoryBackupStore::default();
        let account = Address("0xaaa".to_owned());

        assert!(find_resumable_bundle(&store, &account).await.is_none());

        store
            .stage(BackupRecord {
                account: account.clone(),
                chain_id: ChainId("0x1".to_owned()),
                bundle: TransferBundle::default(),
                is_backup: false,
            })
            .await;
        assert!(find_resumable_bundle(&store, &account).await.is_none());

        store
            .stage(BackupRecord {
                account: account.clone(),
                chain_id: ChainId("0x1".to_owned()),
                bundle: TransferBundle::default(),
                is_backup: true,
            })
            .await;
        assert!(find_resumable_bundle(&store, &account).await.is_some());
    }
}
