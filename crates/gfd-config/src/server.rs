//! HTTP listener configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

fn default_host() -> String {
    "0.0.0.0".into()
}

const fn default_port() -> u16 {
    8080
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["*".into()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. `"*"` allows any origin.
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: default_cors_allowed_origins(),
        }
    }
}

impl ServerConfig {
    /// Parse `host:port` into a socket address.
    ///
    /// Returns `None` when `host` is not an IP literal.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().ok()
    }

    /// Whether any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allowed_origins.iter().any(|o| o == "*")
    }
}
