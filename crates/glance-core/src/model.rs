use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Namespace for identities derived from id-less emails.
const DERIVED_KEY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_93d4_4b07_a5e2_0c7d_91f3_58b6);

/// One email as delivered by the aggregation backend.
///
/// Decoding never rejects a record over a single field: missing, `null` or
/// oddly typed values become absent and the view layer supplies fallbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subject: Option<String>,
    /// Full HTML body.
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Plain-text excerpt.
    #[serde(default, deserialize_with = "lenient_text")]
    pub preview: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_photo: Option<String>,
}

/// Strings, numbers and booleans read as text; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// Integer ids, also when sent as numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

impl Email {
    /// Parse `date` as RFC 3339, falling back to RFC 2822 mail dates.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.date.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .map(|parsed| parsed.with_timezone(&Utc))
            .ok()
    }

    pub fn key(&self) -> EmailKey {
        match self.id {
            Some(id) => EmailKey::Id(id),
            None => {
                let name = format!(
                    "{}\u{1f}{}\u{1f}{}",
                    self.from.as_deref().unwrap_or_default(),
                    self.subject.as_deref().unwrap_or_default(),
                    self.date
                );
                EmailKey::Derived(Uuid::new_v5(&DERIVED_KEY_NAMESPACE, name.as_bytes()))
            }
        }
    }

    pub fn category(&self) -> Category {
        Category::parse(self.category.as_deref())
    }
}

/// Stable identity used for selection and highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmailKey {
    Id(i64),
    /// Content hash of sender, subject and date for records without an id.
    Derived(Uuid),
}

/// Sort newest first. The sort is stable: equal dates keep backend order and
/// emails with unparseable dates trail every dated one.
pub fn sort_by_date_desc(emails: &mut [Email]) {
    emails.sort_by_cached_key(|email| std::cmp::Reverse(email.timestamp()));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Work,
    Personal,
    Promotional,
    Social,
    Updates,
    Other(String),
    Uncategorized,
}

impl Category {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::Uncategorized;
        };
        match raw.to_lowercase().as_str() {
            "work" => Self::Work,
            "personal" => Self::Personal,
            "promotional" => Self::Promotional,
            "social" => Self::Social,
            "updates" => Self::Updates,
            _ => Self::Other(raw.to_string()),
        }
    }
}

/// IMAP-style credentials for one mailbox, forwarded verbatim to the backend.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountCredentials {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub auth: AccountAuth,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountAuth {
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("auth", &self.auth)
            .finish()
    }
}

impl std::fmt::Debug for AccountAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountAuth")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /api/emails/fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub accounts: Vec<AccountCredentials>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub emails: Vec<Email>,
}
