//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default page size for track and user listings.
const fn default_page_size() -> u32 {
    10
}

const fn default_audit_page_size() -> u32 {
    20
}

const fn default_max_page_size() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Page size used when a list request omits `size`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Page size for audit log listings.
    #[serde(default = "default_audit_page_size")]
    pub audit_page_size: u32,

    /// Upper bound on any requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            audit_page_size: default_audit_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}
