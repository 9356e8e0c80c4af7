use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use service_discovery::mdns::engine::instance_label;
use service_discovery::{Service, StartError};
use crate::config::ServiceConfig;

/// A service described in the agent config. Starting it holds a TCP
/// listener open on its port and accepts connections until cancelled, so
/// peers that discover it can check it is reachable.
///
/// Several services usually share the machine's hostname, so the instance
/// name defaults to "<host label>-<id>" to keep announcements distinct.
#[derive(Debug, Clone)]
pub struct StaticService {
    id: String,
    hostname: String,
    instance_name: String,
    bind: IpAddr,
    port: u16,
    service_type: String,
    config: Value,
}

impl StaticService {
    pub fn from_config(config: &ServiceConfig, default_type: &str) -> Result<Self> {
        let hostname = match &config.hostname {
            Some(hostname) => hostname.clone(),
            None => hostname::get()
                .context("Failed to get system hostname")?
                .to_string_lossy()
                .to_string(),
        };

        let instance_name = config
            .instance_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", instance_label(&hostname), config.id));

        Ok(Self {
            id: config.id.clone(),
            hostname,
            instance_name,
            bind: config.bind.unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED)),
            port: config.port,
            service_type: config
                .service_type
                .clone()
                .unwrap_or_else(|| default_type.to_string()),
            config: config.config.clone(),
        })
    }
}

#[async_trait]
impl Service for StaticService {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn instance_name(&self) -> String {
        self.instance_name.clone()
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn service_type(&self) -> &str {
        &self.service_type
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn config(&self) -> Value {
        self.config.clone()
    }

    async fn start(&self, cancel: CancellationToken) -> Result<(), StartError> {
        let addr = SocketAddr::new(self.bind, self.port);
        let listener = tokio::select! {
            bound = TcpListener::bind(addr) => bound?,
            _ = cancel.cancelled() => return Err(StartError::Cancelled),
        };

        tracing::info!(id = %self.id, %addr, "Service listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((_stream, peer)) => tracing::debug!(id = %self.id, %peer, "Accepted connection"),
                    Err(e) => tracing::warn!(id = %self.id, "Accept failed: {}", e),
                },
                _ = cancel.cancelled() => {
                    tracing::info!(id = %self.id, "Service stopping");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn service_config(hostname: Option<&str>, service_type: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            id: "svc1".to_string(),
            hostname: hostname.map(str::to_string),
            instance_name: None,
            bind: Some(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port: 8080,
            service_type: service_type.map(str::to_string),
            config: serde_json::json!({"v": "1"}),
        }
    }

    #[test]
    fn test_from_config_defaults_type() {
        let service = StaticService::from_config(&service_config(Some("host1"), None), "_myService._tcp").unwrap();
        assert_eq!(service.hostname(), "host1");
        assert_eq!(service.service_type(), "_myService._tcp");
        assert_eq!(service.config()["v"], "1");
    }

    #[test]
    fn test_from_config_type_override() {
        let service =
            StaticService::from_config(&service_config(Some("host1"), Some("_other._tcp")), "_myService._tcp").unwrap();
        assert_eq!(service.service_type(), "_other._tcp");
    }

    #[test]
    fn test_instance_name_is_unique_per_id() {
        let mut config = service_config(Some("nas.local."), None);
        let first = StaticService::from_config(&config, "_myService._tcp").unwrap();
        config.id = "svc2".to_string();
        let second = StaticService::from_config(&config, "_myService._tcp").unwrap();

        assert_eq!(first.instance_name(), "nas-svc1");
        assert_eq!(second.instance_name(), "nas-svc2");
    }

    #[test]
    fn test_instance_name_override() {
        let mut config = service_config(Some("host1"), None);
        config.instance_name = Some("printer".to_string());
        let service = StaticService::from_config(&config, "_myService._tcp").unwrap();
        assert_eq!(service.instance_name(), "printer");
    }

    #[test]
    fn test_system_hostname_services_do_not_collide() {
        let mut config = service_config(None, None);
        let first = StaticService::from_config(&config, "_myService._tcp").unwrap();
        config.id = "svc2".to_string();
        let second = StaticService::from_config(&config, "_myService._tcp").unwrap();

        assert_eq!(first.hostname(), second.hostname());
        assert_ne!(first.instance_name(), second.instance_name());
    }

    #[tokio::test]
    async fn test_start_returns_when_cancelled() {
        let mut config = service_config(Some("host1"), None);
        config.port = 0;
        let service = StaticService::from_config(&config, "_myService._tcp").unwrap();

        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { service.start(cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_start_fails_when_port_taken() {
        let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let mut config = service_config(Some("host1"), None);
        config.port = taken.local_addr().unwrap().port();
        let service = StaticService::from_config(&config, "_myService._tcp").unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), service.start(CancellationToken::new()))
            .await
            .unwrap();
        assert!(matches!(result, Err(StartError::Bind(_))));
    }
}
