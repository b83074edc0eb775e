use crate::{AccountConfig, AppConfig, ConfigError};
use url::Url;

const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
const DEFAULT_IMAP_PORT: u16 = 993;

/// Overlay `GLANCE_*` variables onto `config`.
///
/// `GLANCE_BACKEND_URL` replaces the backend base url. Accounts are read as
/// `GLANCE_EMAIL1_USER`, `GLANCE_EMAIL2_USER`, ... until the first missing
/// index; each may carry `_PASS`, `_HOST`, `_PORT` and `_SECURE`. When any
/// numbered account is present the configured account list is replaced.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("GLANCE_BACKEND_URL") {
        config.backend.base_url = Url::parse(raw.trim())?;
        tracing::debug!(url = %config.backend.base_url, "backend url taken from environment");
    }

    let mut accounts = Vec::new();
    for index in 1.. {
        let prefix = format!("GLANCE_EMAIL{index}");
        let Some(user) = lookup(&format!("{prefix}_USER")) else {
            break;
        };

        let port = match lookup(&format!("{prefix}_PORT")) {
            Some(raw) => parse_value(&format!("{prefix}_PORT"), &raw)?,
            None => DEFAULT_IMAP_PORT,
        };
        let secure = match lookup(&format!("{prefix}_SECURE")) {
            Some(raw) => parse_flag(&format!("{prefix}_SECURE"), &raw)?,
            None => true,
        };

        accounts.push(AccountConfig {
            host: lookup(&format!("{prefix}_HOST")).unwrap_or_else(|| DEFAULT_IMAP_HOST.to_string()),
            port,
            secure,
            user,
            password: lookup(&format!("{prefix}_PASS")).unwrap_or_default(),
        });
    }

    if !accounts.is_empty() {
        tracing::debug!(count = accounts.len(), "accounts taken from environment");
        config.accounts = accounts;
    }

    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_numbered_accounts_until_gap() {
        let mut config = AppConfig::default();
        apply_env(
            &mut config,
            lookup(&[
                ("GLANCE_BACKEND_URL", "https://aggregator.example.com"),
                ("GLANCE_EMAIL1_USER", "first@gmail.com"),
                ("GLANCE_EMAIL1_PASS", "app-password"),
                ("GLANCE_EMAIL2_USER", "second@example.com"),
                ("GLANCE_EMAIL2_HOST", "imap.example.com"),
                ("GLANCE_EMAIL2_PORT", "143"),
                ("GLANCE_EMAIL2_SECURE", "false"),
                ("GLANCE_EMAIL4_USER", "skipped@example.com"),
            ]),
        )
        .expect("env applied");

        assert_eq!(config.backend.base_url.as_str(), "https://aggregator.example.com/");
        assert_eq!(config.accounts.len(), 2);
        assert_eq!(config.accounts[0].host, "imap.gmail.com");
        assert_eq!(config.accounts[0].port, 993);
        assert!(config.accounts[0].secure);
        assert_eq!(config.accounts[0].password, "app-password");
        assert_eq!(config.accounts[1].port, 143);
        assert!(!config.accounts[1].secure);
    }

    #[test]
    fn keeps_configured_accounts_without_env() {
        let mut config = AppConfig::default();
        config.accounts.push(AccountConfig {
            host: "imap.example.com".to_string(),
            port: 993,
            secure: true,
            user: "file@example.com".to_string(),
            password: String::new(),
        });
        apply_env(&mut config, lookup(&[])).expect("env applied");
        assert_eq!(config.accounts.len(), 1);
    }

    #[test]
    fn rejects_bad_port() {
        let mut config = AppConfig::default();
        let err = apply_env(
            &mut config,
            lookup(&[("GLANCE_EMAIL1_USER", "a@b.c"), ("GLANCE_EMAIL1_PORT", "imap")]),
        )
        .expect_err("invalid port");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
