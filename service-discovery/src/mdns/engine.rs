use mdns_sd::{IfKind, ServiceDaemon, ServiceEvent, ServiceInfo};
use shared::protocol::HOSTNAME_SUFFIX;
use crate::error::DiscoveryError;
use crate::txt;

/// Everything the mDNS engine needs to announce one service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub instance_name: String,
    /// e.g. "_myService._tcp"
    pub service_type: String,
    /// e.g. "local."
    pub domain: String,
    pub hostname: String,
    pub port: u16,
    pub txt: Vec<String>,
}

impl Announcement {
    /// Service type qualified with its domain, e.g. "_myService._tcp.local."
    pub fn ty_domain(&self) -> String {
        qualify_type(&self.service_type, &self.domain)
    }

    /// Hostname in the form mDNS expects, e.g. "host1.local."
    pub fn host_name(&self) -> String {
        if self.hostname.ends_with('.') {
            self.hostname.clone()
        } else {
            format!("{}{}", self.hostname, HOSTNAME_SUFFIX)
        }
    }

    /// Full instance name the engine registers, e.g. "host1._myService._tcp.local."
    pub fn fullname(&self) -> String {
        format!("{}.{}", self.instance_name, self.ty_domain())
    }
}

/// First DNS label of a hostname, usable as an instance name.
/// "nas.local." and "nas" both give "nas".
pub fn instance_label(hostname: &str) -> &str {
    let trimmed = hostname.trim_end_matches('.');
    trimmed.split('.').next().unwrap_or(trimmed)
}

/// Join a service type and domain, tolerating a trailing dot on the type.
pub fn qualify_type(service_type: &str, domain: &str) -> String {
    format!("{}.{}", service_type.trim_end_matches('.'), domain)
}

/// The external mDNS daemon the façade delegates to.
pub trait MdnsEngine: Send + Sync {
    /// Announce a service. Returns the full instance name used to withdraw it.
    fn register(&self, announcement: &Announcement) -> Result<String, DiscoveryError>;

    fn unregister(&self, fullname: &str) -> Result<(), DiscoveryError>;

    /// Start browsing a fully qualified service type.
    fn browse(&self, ty_domain: &str) -> Result<flume::Receiver<ServiceEvent>, DiscoveryError>;

    fn stop_browse(&self, ty_domain: &str) -> Result<(), DiscoveryError>;

    fn shutdown(&self) -> Result<(), DiscoveryError>;
}

/// `MdnsEngine` backed by the mdns-sd daemon thread.
pub struct MdnsSdEngine {
    daemon: ServiceDaemon,
}

impl MdnsSdEngine {
    /// Start a daemon on all interfaces
    pub fn new() -> Result<Self, DiscoveryError> {
        let daemon = ServiceDaemon::new()?;
        Ok(Self { daemon })
    }

    /// Start a daemon bound to a single interface
    pub fn with_interface(interface: &str) -> Result<Self, DiscoveryError> {
        let daemon = ServiceDaemon::new()?;
        daemon.disable_interface(IfKind::All)?;
        daemon.enable_interface(interface)?;
        tracing::info!("mDNS daemon restricted to interface {}", interface);
        Ok(Self { daemon })
    }
}

impl MdnsEngine for MdnsSdEngine {
    fn register(&self, announcement: &Announcement) -> Result<String, DiscoveryError> {
        let service_info = ServiceInfo::new(
            &announcement.ty_domain(),
            &announcement.instance_name,
            &announcement.host_name(),
            "",
            announcement.port,
            txt::to_properties(&announcement.txt),
        )
        .map_err(|e| DiscoveryError::ServiceInfo(e.to_string()))?
        .enable_addr_auto();

        let fullname = service_info.get_fullname().to_string();
        self.daemon.register(service_info)?;

        tracing::info!(
            "Registered {} as {} on port {}",
            announcement.ty_domain(),
            fullname,
            announcement.port
        );

        Ok(fullname)
    }

    fn unregister(&self, fullname: &str) -> Result<(), DiscoveryError> {
        self.daemon.unregister(fullname)?;
        tracing::info!("Unregistered {}", fullname);
        Ok(())
    }

    fn browse(&self, ty_domain: &str) -> Result<flume::Receiver<ServiceEvent>, DiscoveryError> {
        Ok(self.daemon.browse(ty_domain)?)
    }

    fn stop_browse(&self, ty_domain: &str) -> Result<(), DiscoveryError> {
        self.daemon.stop_browse(ty_domain)?;
        Ok(())
    }

    fn shutdown(&self) -> Result<(), DiscoveryError> {
        self.daemon.shutdown()?;
        Ok(())
    }
}
