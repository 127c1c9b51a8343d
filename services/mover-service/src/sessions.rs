use anyhow::Result;
use async_trait::async_trait;
use am_api_types::{ChainId, Notification, NotificationKind};
use am_chain_client::{Notifier, WalletBridge};
use am_workflow::{MoverCore, Services};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Collects a session's toast notifications until the next state read.
#[derive(Default)]
pub(crate) struct BufferedNotifier {
    queue: std::sync::Mutex<Vec<Notification>>,
}

impl BufferedNotifier {
    pub(crate) fn drain(&self) -> Vec<Notification> {
        self.queue
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, kind: NotificationKind, title: &str, message: &str) {
        if let Ok(mut guard) = self.queue.lock() {
            guard.push(Notification {
                kind,
                title: title.to_owned(),
                message: message.to_owned(),
            });
        }
    }
}

/// The wallet lives on the client; the facade relays switch requests to it
/// through the session's notification stream.
pub(crate) struct RelayWalletBridge {
    pub(crate) notifier: Arc<BufferedNotifier>,
}

#[async_trait]
impl WalletBridge for RelayWalletBridge {
    async fn request_chain_switch(&self, chain: &ChainId) -> Result<()> {
        self.notifier.notify(
            NotificationKind::Info,
            "Chain Switch Requested",
            &format!("Please switch your wallet to chain {}", chain.0),
        );
        Ok(())
    }
}

pub(crate) struct SessionHandle {
    pub(crate) core: Mutex<MoverCore>,
    pub(crate) services: Services,
    pub(crate) notifier: Arc<BufferedNotifier>,
}

#[derive(Default)]
pub(crate) struct Sessions {
    inner: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl Sessions {
    pub(crate) async fn insert(&self, handle: SessionHandle) -> Uuid {
        let id = Uuid::new_v4();
        let mut guard = self.inner.write().await;
        guard.insert(id, Arc::new(handle));
        id
    }

    pub(crate) async fn get(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        let guard = self.inner.read().await;
        guard.get(id).cloned()
    }
}
