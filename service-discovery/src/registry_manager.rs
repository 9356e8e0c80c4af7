use std::thread;
use tokio::sync::{mpsc, oneshot, watch};
use shared::types::ServiceEntry;
use crate::error::DiscoveryError;
use crate::registry::{hash, Registry};

type Result<T> = std::result::Result<T, DiscoveryError>;

/// Commands sent to the registry thread
pub enum RegistryCommand {
    Upsert(ServiceEntry, oneshot::Sender<bool>),
    Remove(String, oneshot::Sender<Option<ServiceEntry>>),
    Get(String, oneshot::Sender<Option<ServiceEntry>>),
    Ids(oneshot::Sender<Vec<String>>),
    All(oneshot::Sender<Vec<ServiceEntry>>),
    Clear(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the registry thread. Cheap to clone and safe to share across
/// tasks; every command is applied in arrival order.
#[derive(Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<RegistryCommand>,
    hash_rx: watch::Receiver<String>,
}

impl RegistryHandle {
    /// Spawn a registry thread owning `registry`
    pub fn spawn(mut registry: Registry) -> Self {
        let (tx, mut rx) = mpsc::channel::<RegistryCommand>(256);
        let (hash_tx, hash_rx) = watch::channel(hash::compute_hash(&registry.entries()));

        let recompute_hash = |registry: &Registry, hash_tx: &watch::Sender<String>| {
            let _ = hash_tx.send(hash::compute_hash(&registry.entries()));
        };

        thread::spawn(move || {
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    RegistryCommand::Upsert(entry, reply) => {
                        let changed = registry.upsert(entry);
                        if changed {
                            recompute_hash(&registry, &hash_tx);
                        }
                        let _ = reply.send(changed);
                    }
                    RegistryCommand::Remove(id, reply) => {
                        let removed = registry.remove(&id);
                        if removed.is_some() {
                            recompute_hash(&registry, &hash_tx);
                        }
                        let _ = reply.send(removed);
                    }
                    RegistryCommand::Get(id, reply) => {
                        let _ = reply.send(registry.get(&id).cloned());
                    }
                    RegistryCommand::Ids(reply) => {
                        let _ = reply.send(registry.ids());
                    }
                    RegistryCommand::All(reply) => {
                        let _ = reply.send(registry.entries());
                    }
                    RegistryCommand::Clear(reply) => {
                        if !registry.is_empty() {
                            registry.clear();
                            recompute_hash(&registry, &hash_tx);
                        }
                        let _ = reply.send(());
                    }
                    RegistryCommand::Shutdown => {
                        tracing::info!("Registry thread shutting down");
                        break;
                    }
                }
            }
        });

        Self { tx, hash_rx }
    }

    /// Insert or replace an entry. Returns true if data changed.
    pub async fn upsert(&self, entry: ServiceEntry) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Upsert(entry, reply)).await?;
        Ok(rx.await?)
    }

    /// Remove an entry, returning it if it existed
    pub async fn remove(&self, id: String) -> Result<Option<ServiceEntry>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Remove(id, reply)).await?;
        Ok(rx.await?)
    }

    /// Look up a single entry by id
    pub async fn get(&self, id: String) -> Result<Option<ServiceEntry>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Get(id, reply)).await?;
        Ok(rx.await?)
    }

    /// All registered ids
    pub async fn ids(&self) -> Result<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Ids(reply)).await?;
        Ok(rx.await?)
    }

    /// All registered entries
    pub async fn all(&self) -> Result<Vec<ServiceEntry>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::All(reply)).await?;
        Ok(rx.await?)
    }

    /// Drop every entry
    pub async fn clear(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(RegistryCommand::Clear(reply)).await?;
        Ok(rx.await?)
    }

    /// Receiver that observes the content hash after each mutation
    pub fn hash_watch(&self) -> watch::Receiver<String> {
        self.hash_rx.clone()
    }

    /// Shutdown the registry thread
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(RegistryCommand::Shutdown).await?;
        Ok(())
    }
}
