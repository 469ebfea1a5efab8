//! Configuration schema types
//!
//! Field names are the wire contract shared with the routing service and must
//! be preserved exactly as they appear in the JSON file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verbosity of the routing service's own log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    #[default]
    Error,
    Warning,
    Info,
    Debug,
    All,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown log level: {0} (expected Error, Warning, Info, Debug or All)")]
pub struct ParseLogLevelError(String);

impl std::str::FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warning" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "all" => Ok(LogLevel::All),
            _ => Err(ParseLogLevelError(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::All => "All",
        };
        f.write_str(name)
    }
}

/// Transport protocol a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A set of applications routed to one SOCKS5 upstream.
///
/// Rules have no stable id; while being edited a rule is identified by its
/// position in [`AppConfig::proxies`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRule {
    /// Process image names matched against outgoing connections.
    #[serde(default)]
    pub app_names: Vec<String>,

    /// Upstream proxy as `host:port`. Not validated here; the service rejects
    /// endpoints it cannot reach.
    #[serde(rename = "socks5ProxyEndpoint", default)]
    pub endpoint: String,

    /// Empty means the upstream is unauthenticated; empty credentials are
    /// omitted from the file rather than written as `""`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Ordered with TCP before UDP by convention. May be empty.
    #[serde(default)]
    pub supported_protocols: Vec<Protocol>,
}

impl ProxyRule {
    /// A freshly added rule: everything empty, TCP preselected.
    pub fn new() -> Self {
        Self {
            app_names: Vec::new(),
            endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            supported_protocols: vec![Protocol::Tcp],
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }
}

impl Default for ProxyRule {
    fn default() -> Self {
        Self::new()
    }
}

/// The whole persisted configuration of the routing service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Insertion order is meaningful: a rule's index is its identity while
    /// editing, and the service applies rules in order.
    #[serde(default)]
    pub proxies: Vec<ProxyRule>,

    /// Application names globally excluded from all proxying.
    #[serde(default)]
    pub excludes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_error_level_and_empty() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, LogLevel::Error);
        assert!(config.proxies.is_empty());
        assert!(config.excludes.is_empty());
    }

    #[test]
    fn new_rule_preselects_tcp_only() {
        let rule = ProxyRule::new();
        assert_eq!(rule.supported_protocols, vec![Protocol::Tcp]);
        assert!(rule.app_names.is_empty());
        assert!(rule.endpoint.is_empty());
        assert!(!rule.has_credentials());
    }

    #[test]
    fn rule_serializes_with_wire_field_names() {
        let rule = ProxyRule {
            app_names: vec!["firefox".into(), "chrome".into()],
            endpoint: "proxy.example.com:1080".into(),
            username: "user".into(),
            password: "secret".into(),
            supported_protocols: vec![Protocol::Tcp, Protocol::Udp],
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "appNames": ["firefox", "chrome"],
                "socks5ProxyEndpoint": "proxy.example.com:1080",
                "username": "user",
                "password": "secret",
                "supportedProtocols": ["TCP", "UDP"]
            })
        );
    }

    #[test]
    fn empty_credentials_are_omitted() {
        let value = serde_json::to_value(ProxyRule::new()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("username"));
        assert!(!obj.contains_key("password"));
    }

    #[test]
    fn parses_config_with_absent_optional_fields() {
        let json = r#"{
            "proxies": [
                { "appNames": ["curl"], "socks5ProxyEndpoint": "127.0.0.1:1080" }
            ]
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.proxies.len(), 1);
        let rule = &config.proxies[0];
        assert_eq!(rule.endpoint, "127.0.0.1:1080");
        assert!(rule.username.is_empty());
        assert!(rule.supported_protocols.is_empty());
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("ALL".parse::<LogLevel>().unwrap(), LogLevel::All);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn log_level_round_trips_through_display() {
        for level in [
            LogLevel::Error,
            LogLevel::Warning,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::All,
        ] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }
}
