use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use serde::Deserialize;
use serde_json::Value;
use anyhow::{bail, Context, Result};
use service_discovery::DiscoveryConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseConfig {
    /// Log instances of the discovery service type seen on the network
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// One local service to start and announce
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub id: String,
    /// Defaults to the system hostname
    #[serde(default)]
    pub hostname: Option<String>,
    /// Defaults to "<host label>-<id>"
    #[serde(default)]
    pub instance_name: Option<String>,
    /// Address the service listens on, defaults to `::`
    #[serde(default)]
    pub bind: Option<IpAddr>,
    pub port: u16,
    /// Defaults to `discovery.service_type`
    #[serde(default)]
    pub service_type: Option<String>,
    /// Announced as TXT records when it is a table of strings
    #[serde(default)]
    pub config: Value,
}

/// Ids that would be shadowed by fixed API routes under `/v1/services/`
const RESERVED_IDS: &[&str] = &["hash"];

fn default_listen() -> String {
    "[::]:8053".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for service in &self.services {
            if RESERVED_IDS.contains(&service.id.as_str()) {
                bail!("Service id {:?} is reserved", service.id);
            }
            if !seen.insert(service.id.as_str()) {
                bail!("Duplicate service id {:?}", service.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = Config::parse(
            r#"
            [discovery]
            service_type = "_myService._tcp"
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.domain, "local.");
        assert!(!config.browse.enabled);
        assert_eq!(config.api.listen, "[::]:8053");
        assert!(config.services.is_empty());
    }

    #[test]
    fn test_services_with_config_table() {
        let config = Config::parse(
            r#"
            [discovery]
            service_type = "_myService._tcp"
            interface = "eth0"

            [browse]
            enabled = true

            [[services]]
            id = "svc1"
            hostname = "host1"
            port = 8080

            [services.config]
            v = "1"
            env = "prod"

            [[services]]
            id = "svc2"
            port = 8081
            service_type = "_other._tcp"
            instance_name = "printer"
            bind = "127.0.0.1"
            "#,
        )
        .unwrap();

        assert_eq!(config.discovery.interface.as_deref(), Some("eth0"));
        assert!(config.browse.enabled);
        assert_eq!(config.services.len(), 2);

        let svc1 = &config.services[0];
        assert_eq!(svc1.hostname.as_deref(), Some("host1"));
        assert_eq!(svc1.config["env"], "prod");

        let svc2 = &config.services[1];
        assert!(svc2.hostname.is_none());
        assert_eq!(svc2.service_type.as_deref(), Some("_other._tcp"));
        assert!(svc2.config.is_null());
        assert_eq!(svc2.instance_name.as_deref(), Some("printer"));
        assert_eq!(svc2.bind, Some("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_browse_key_under_discovery_is_rejected() {
        let result = Config::parse(
            r#"
            [discovery]
            service_type = "_myService._tcp"
            browse = true
            "#,
        );
        assert!(result.is_err(), "Misplaced browse flag must not be silently ignored");
    }

    #[test]
    fn test_reserved_service_id_is_rejected() {
        let result = Config::parse(
            r#"
            [discovery]
            service_type = "_myService._tcp"

            [[services]]
            id = "hash"
            port = 8080
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_service_id_is_rejected() {
        let result = Config::parse(
            r#"
            [discovery]
            service_type = "_myService._tcp"

            [[services]]
            id = "svc1"
            port = 8080

            [[services]]
            id = "svc1"
            port = 8081
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_discovery_section_fails() {
        assert!(Config::parse("[api]\nlisten = \"127.0.0.1:9000\"\n").is_err());
    }
}
