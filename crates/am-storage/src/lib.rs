use anyhow::Result;
use async_trait::async_trait;
use am_api_types::{Address, BackupRecord};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persisted staged-but-unsent bundles. `find_backup_bundle` is read once at
/// session start; `clear` invalidates the record once a transfer finishes or
/// is abandoned.
#[async_trait]
pub trait BackupStore: Send + Sync {
    async fn find_backup_bundle(&self, account: &Address) -> Result<Option<BackupRecord>>;
    async fn clear(&self, account: &Address) -> Result<()>;
}

#[derive(Default)]
pub struct NoopBackupStore;

#[async_trait]
impl BackupStore for NoopBackupStore {
    async fn find_backup_bundle(&self, _account: &Address) -> Result<Option<BackupRecord>> {
        Ok(None)
    }

    async fn clear(&self, _account: &Address) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBackupStore {
    records: RwLock<HashMap<String, BackupRecord>>,
}

impl InMemoryBackupStore {
    pub async fn stage(&self, record: BackupRecord) {
        let mut guard = self.records.write().await;
        guard.insert(record.account.0.clone(), record);
    }
}

#[async_trait]
impl BackupStore for InMemoryBackupStore {
    async fn find_backup_bundle(&self, account: &Address) -> Result<Option<BackupRecord>> {
        let guard = self.records.read().await;
        Ok(guard.get(&account.0).cloned())
    }

    async fn clear(&self, account: &Address) -> Result<()> {
        let mut guard = self.records.write().await;
        guard.remove(&account.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_api_types::{ChainId, TransferBundle};

    fn record(account: &str) -> BackupRecord {
        BackupRecord {
            account: Address(account.to_owned()),
            chain_id: ChainId("0x1".to_owned()),
            bundle: TransferBundle::default(),
            is_backup: true,
        }
    }

    #[tokio::test]
    async fn stage_find_clear_roundtrip() -> anyhow::Result<()> {
        let store = InMemoryBackupStore::default();
        let account = Address("0xaaa".to_owned());

        assert!(store.find_backup_bundle(&account).await?.is_none());

        store.stage(record("0xaaa")).await;
        let found = store
            .find_backup_bundle(&account)
            .await?
            .expect("staged record should be found");
        assert!(found.is_backup);
        assert_eq!(found.chain_id, ChainId("0x1".to_owned()));

        store.clear(&account).await?;
        assert!(store.find_backup_bundle(&account).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn noop_store_never_finds() -> anyhow::Result<()> {
        let store = NoopBackupStore;
        let account = Address("0xbbb".to_owned());
        assert!(store.find_backup_bundle(&account).await?.is_none());
        store.clear(&account).await?;
        Ok(())
    }
}
