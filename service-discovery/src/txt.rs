//! Conversion between service configuration values and TXT record strings.
//!
//! Keys and values are joined with `=` verbatim. Nothing is escaped, so a
//! key or value that itself contains `=` produces an ambiguous record.

use std::collections::HashMap;
use serde_json::Value;
use shared::protocol::TXT_SEPARATOR;

/// Encode a configuration value into "key=value" records.
///
/// Only an object whose every value is a string counts as a mapping. Any
/// other shape yields no records rather than an error, so a malformed config
/// never blocks registration. Object keys iterate in sorted order.
pub fn encode_config(config: &Value) -> Vec<String> {
    let Value::Object(map) = config else {
        return Vec::new();
    };

    if !map.values().all(Value::is_string) {
        tracing::debug!("Config is not a string mapping, announcing without TXT records");
        return Vec::new();
    }

    map.iter()
        .filter_map(|(key, val)| val.as_str().map(|val| format!("{key}{TXT_SEPARATOR}{val}")))
        .collect()
}

/// Split each record on its first `=`. A record without one decodes to an
/// empty value.
pub fn decode_txt(records: &[String]) -> Vec<(String, String)> {
    records
        .iter()
        .map(|record| match record.split_once(TXT_SEPARATOR) {
            Some((key, val)) => (key.to_string(), val.to_string()),
            None => (record.clone(), String::new()),
        })
        .collect()
}

/// Property map in the form the mDNS daemon expects.
pub fn to_properties(records: &[String]) -> HashMap<String, String> {
    decode_txt(records).into_iter().collect()
}
