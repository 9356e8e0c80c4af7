/// Domain every registration is announced under
pub const DEFAULT_DOMAIN: &str = "local.";

/// Suffix appended to bare hostnames before they are handed to the mDNS engine
pub const HOSTNAME_SUFFIX: &str = ".local.";

/// Separator between key and value inside a TXT record string
pub const TXT_SEPARATOR: char = '=';

/// API path prefix
pub const API_PREFIX: &str = "/v1";
