use crate::FeedError;
use async_trait::async_trait;
use glance_core::{sort_by_date_desc, AccountCredentials, Email, FetchRequest, FetchResponse};
use std::time::Duration;
use url::Url;

const FETCH_PATH: &str = "api/emails/fetch";

/// Source of email snapshots.
#[async_trait]
pub trait FeedBackend: Send + Sync + 'static {
    async fn fetch_emails(&self, accounts: &[AccountCredentials]) -> Result<Vec<Email>, FeedError>;
}

/// Aggregation backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedBackend {
    http: reqwest::Client,
    fetch_url: Url,
}

impl HttpFeedBackend {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            fetch_url: join_base(base_url, FETCH_PATH)?,
        })
    }

    pub fn fetch_url(&self) -> &Url {
        &self.fetch_url
    }
}

#[async_trait]
impl FeedBackend for HttpFeedBackend {
    async fn fetch_emails(&self, accounts: &[AccountCredentials]) -> Result<Vec<Email>, FeedError> {
        let body = FetchRequest {
            accounts: accounts.to_vec(),
        };

        let response = self.http.post(self.fetch_url.clone()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        let decoded: FetchResponse = serde_json::from_slice(&bytes)?;
        tracing::debug!(count = decoded.emails.len(), "fetched email snapshot");
        Ok(decoded.emails)
    }
}

/// Request a snapshot for `accounts` and order it newest first.
pub async fn load_snapshot<B>(backend: &B, accounts: &[AccountCredentials]) -> Result<Vec<Email>, FeedError>
where
    B: FeedBackend + ?Sized,
{
    let mut emails = backend.fetch_emails(accounts).await?;
    sort_by_date_desc(&mut emails);
    Ok(emails)
}

/// Resolve `path` below `base`, treating `base` as a directory.
pub(crate) fn join_base(base: &Url, path: &str) -> Result<Url, FeedError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path)?)
}
