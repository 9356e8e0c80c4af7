//! Register local services over mDNS and keep a registry of what was announced.
//!
//! The [`Discovery`] façade encodes a service's configuration into TXT
//! records, hands the announcement to an [`MdnsEngine`], and records a
//! [`ServiceEntry`] keyed by the service id. Advertisements stay alive until
//! the caller withdraws them with [`Discovery::unregister`] or
//! [`Discovery::shutdown`].
//!
//! ```no_run
//! # async fn example(service: &dyn service_discovery::Service) -> Result<(), service_discovery::DiscoveryError> {
//! use service_discovery::Discovery;
//!
//! let discovery = Discovery::new("_myService._tcp")?;
//! discovery.register(service).await?;
//!
//! for id in discovery.services().await? {
//!     println!("{id}");
//! }
//! discovery.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod mdns;
pub mod registry;
pub mod registry_manager;
pub mod service;
pub mod txt;

pub use config::DiscoveryConfig;
pub use discovery::Discovery;
pub use error::{DiscoveryError, StartError};
pub use mdns::browser::BrowserEvent;
pub use mdns::engine::{Announcement, MdnsEngine, MdnsSdEngine};
pub use registry_manager::RegistryHandle;
pub use service::Service;
pub use shared::types::{DiscoveredService, ServiceEntry};
