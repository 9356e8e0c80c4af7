use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use shared::types::{DiscoveredService, ServiceEntry};
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::mdns::browser::{self, BrowserEvent};
use crate::mdns::engine::{qualify_type, Announcement, MdnsEngine, MdnsSdEngine};
use crate::registry::Registry;
use crate::registry_manager::RegistryHandle;
use crate::service::Service;
use crate::txt;

type Result<T> = std::result::Result<T, DiscoveryError>;

/// Registers services with an mDNS engine and remembers what was announced.
pub struct Discovery {
    config: DiscoveryConfig,
    engine: Arc<dyn MdnsEngine>,
    registry: RegistryHandle,
    /// Serializes register/unregister so the engine and registry agree
    registration: Mutex<()>,
}

impl Discovery {
    /// Create a façade for `service_type` backed by an mdns-sd daemon on all
    /// interfaces.
    pub fn new(service_type: impl Into<String>) -> Result<Self> {
        Self::from_config(DiscoveryConfig::new(service_type))
    }

    pub fn from_config(config: DiscoveryConfig) -> Result<Self> {
        let engine = match config.interface.as_deref() {
            Some(interface) => MdnsSdEngine::with_interface(interface)?,
            None => MdnsSdEngine::new()?,
        };
        Ok(Self::with_engine(config, Arc::new(engine)))
    }

    /// Create a façade over an existing engine
    pub fn with_engine(config: DiscoveryConfig, engine: Arc<dyn MdnsEngine>) -> Self {
        Self {
            config,
            engine,
            registry: RegistryHandle::spawn(Registry::new()),
            registration: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Announce `service` and store its entry under `service.id()`.
    ///
    /// The configuration is encoded once, here; later changes to the
    /// service's config do not affect the stored entry. Registering an id
    /// again replaces the entry; its earlier announcement is withdrawn only
    /// once the new one is live. Two ids may not share an instance name.
    pub async fn register(&self, service: &dyn Service) -> Result<ServiceEntry> {
        let id = service.id().to_string();
        if service.port() == 0 {
            return Err(DiscoveryError::InvalidPort(id));
        }

        let announcement = Announcement {
            instance_name: service.instance_name(),
            service_type: service.service_type().to_string(),
            domain: self.config.domain.clone(),
            hostname: service.hostname().to_string(),
            port: service.port(),
            txt: txt::encode_config(&service.config()),
        };

        let _guard = self.registration.lock().await;

        let wanted = announcement.fullname();
        let mut previous = None;
        for existing in self.registry.all().await? {
            if existing.id == id {
                previous = Some(existing);
            } else if existing.instance_name == wanted {
                return Err(DiscoveryError::NameConflict {
                    fullname: wanted,
                    owner: existing.id,
                });
            }
        }

        let fullname = self.engine.register(&announcement)?;

        if let Some(previous) = previous.filter(|p| p.instance_name != fullname) {
            if let Err(e) = self.engine.unregister(&previous.instance_name) {
                tracing::warn!("Failed to withdraw previous announcement for {}: {}", id, e);
            }
        }

        let entry = ServiceEntry {
            id,
            service_type: announcement.service_type,
            instance_name: fullname,
            hostname: announcement.hostname,
            port: announcement.port,
            txt: announcement.txt,
            registered_at: chrono::Utc::now(),
        };
        self.registry.upsert(entry.clone()).await?;

        tracing::info!(
            id = %entry.id,
            instance = %entry.instance_name,
            port = entry.port,
            "Service registered"
        );

        Ok(entry)
    }

    /// Ids of every registered service, in no particular order
    pub async fn services(&self) -> Result<Vec<String>> {
        self.registry.ids().await
    }

    /// Entry for `id`, or `None` if it was never registered
    pub async fn service_by_id(&self, id: &str) -> Result<Option<ServiceEntry>> {
        self.registry.get(id.to_string()).await
    }

    pub async fn entries(&self) -> Result<Vec<ServiceEntry>> {
        self.registry.all().await
    }

    /// Remove `id` from the registry and stop announcing it
    pub async fn unregister(&self, id: &str) -> Result<Option<ServiceEntry>> {
        let _guard = self.registration.lock().await;

        let Some(entry) = self.registry.get(id.to_string()).await? else {
            return Ok(None);
        };
        self.engine.unregister(&entry.instance_name)?;
        self.registry.remove(id.to_string()).await?;

        tracing::info!(id = %entry.id, instance = %entry.instance_name, "Service unregistered");
        Ok(Some(entry))
    }

    /// Browse the network for instances of the configured service type.
    pub fn browse(&self, cancel: CancellationToken) -> Result<mpsc::Receiver<BrowserEvent>> {
        let ty_domain = qualify_type(&self.config.service_type, &self.config.domain);
        browser::start_browser(self.engine.clone(), ty_domain, cancel)
    }

    /// Browse for `timeout` and return the instances still present at the end.
    pub async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredService>> {
        let cancel = CancellationToken::new();
        let mut rx = self.browse(cancel.clone())?;
        let deadline = tokio::time::Instant::now() + timeout;
        let mut found: HashMap<String, DiscoveredService> = HashMap::new();

        while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
            match event {
                BrowserEvent::Resolved(service) => {
                    found.insert(service.instance_name.clone(), service);
                }
                BrowserEvent::Removed(instance_name) => {
                    found.remove(&instance_name);
                }
            }
        }
        cancel.cancel();

        tracing::info!(count = found.len(), "Discovery completed");
        Ok(found.into_values().collect())
    }

    /// Receiver that changes whenever the registry contents change
    pub fn hash_watch(&self) -> watch::Receiver<String> {
        self.registry.hash_watch()
    }

    /// Withdraw every announcement and stop the registry and the engine.
    pub async fn shutdown(&self) -> Result<()> {
        let _guard = self.registration.lock().await;

        for entry in self.registry.all().await? {
            if let Err(e) = self.engine.unregister(&entry.instance_name) {
                tracing::error!("Failed to unregister {}: {}", entry.instance_name, e);
            }
        }
        self.registry.clear().await?;
        self.registry.shutdown().await?;
        self.engine.shutdown()?;

        tracing::info!("Discovery shut down");
        Ok(())
    }
}
