use glance_core::{AccountAuth, AccountCredentials};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,
    pub backend: BackendConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Credentials in the shape the fetch endpoint expects.
    pub fn credentials(&self) -> Vec<AccountCredentials> {
        self.accounts.iter().map(AccountConfig::credentials).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: Url,
    pub request_timeout_secs: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl AccountConfig {
    pub fn credentials(&self) -> AccountCredentials {
        AccountCredentials {
            host: self.host.clone(),
            port: self.port,
            secure: self.secure,
            auth: AccountAuth {
                user: self.user.clone(),
                pass: self.password.clone(),
            },
        }
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Push channel behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    pub enabled: bool,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    /// `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
    pub resync_on_reconnect: bool,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconnect_initial_ms: 1_000,
            reconnect_max_ms: 5_000,
            max_reconnect_attempts: None,
            resync_on_reconnect: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub preview_length: usize,
    pub color: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            preview_length: 80,
            color: true,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:3000/").expect("static url is valid"),
            request_timeout_secs: 60,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            backend: BackendConfig::default(),
            accounts: Vec::new(),
            live: LiveConfig::default(),
            ui: UiConfig::default(),
        }
    }
}
