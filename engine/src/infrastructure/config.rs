//! Agent configuration loaded from the environment
//!
//! Every value has a validated default; the core only ever sees the loaded
//! struct, never the environment itself.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment-driven agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// gRPC listen port (`SERVICE_PORT`).
    pub service_port: u16,
    /// REST listen port (`REST_PORT`).
    pub rest_port: u16,
    /// Bind host for both listeners (`NODE_HOST`).
    pub node_host: String,
    /// Supervised core executable (`CORE_EXECUTABLE_PATH`).
    pub core_executable_path: PathBuf,
    /// Asset directory handed to the core via its environment
    /// (`CORE_ASSETS_PATH`).
    pub core_assets_path: PathBuf,
    /// Where the backend config is persisted before each launch
    /// (`CORE_CONFIG_PATH`).
    pub core_config_path: PathBuf,
    /// TLS material (`SSL_CERT_FILE` / `SSL_KEY_FILE`); TLS is enabled only
    /// when both are set.
    pub ssl_cert_file: Option<PathBuf>,
    pub ssl_key_file: Option<PathBuf>,
    /// Access key required in request metadata when set (`API_KEY`).
    pub api_key: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            service_port: 50051,
            rest_port: 8080,
            node_host: "0.0.0.0".to_string(),
            core_executable_path: PathBuf::from("/usr/local/bin/proxy-core"),
            core_assets_path: PathBuf::from("/usr/local/share/proxy-core"),
            core_config_path: PathBuf::from("/var/lib/proxy-node/core_config.json"),
            ssl_cert_file: None,
            ssl_key_file: None,
            api_key: None,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_port: env_parse("SERVICE_PORT", defaults.service_port),
            rest_port: env_parse("REST_PORT", defaults.rest_port),
            node_host: env_or("NODE_HOST", &defaults.node_host),
            core_executable_path: env_path(
                "CORE_EXECUTABLE_PATH",
                &defaults.core_executable_path,
            ),
            core_assets_path: env_path("CORE_ASSETS_PATH", &defaults.core_assets_path),
            core_config_path: env_path("CORE_CONFIG_PATH", &defaults.core_config_path),
            ssl_cert_file: env_opt("SSL_CERT_FILE").map(PathBuf::from),
            ssl_key_file: env_opt("SSL_KEY_FILE").map(PathBuf::from),
            api_key: env_opt("API_KEY"),
        }
    }

    /// TLS is enabled only when both halves of the pair are configured.
    pub fn ssl_enabled(&self) -> bool {
        self.ssl_cert_file.is_some() && self.ssl_key_file.is_some()
    }

    pub fn grpc_addr(&self) -> String {
        format!("{}:{}", self.node_host, self.service_port)
    }

    pub fn rest_addr(&self) -> String {
        format!("{}:{}", self.node_host, self.rest_port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: &PathBuf) -> PathBuf {
    env_opt(key).map(PathBuf::from).unwrap_or_else(|| default.clone())
}
