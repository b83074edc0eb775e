use crate::FeedError;
use glance_core::{sort_by_date_desc, Email, EmailKey};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LiveStatus {
    /// Never subscribed.
    #[default]
    Offline,
    Connecting,
    Live,
    Paused {
        reason: String,
        retry_in: Duration,
    },
    Closed {
        reason: Option<String>,
    },
}

/// The email list and its sync status. Only the synchronizer mutates it.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    emails: Vec<Email>,
    phase: SyncPhase,
    live: LiveStatus,
    error: Option<String>,
    /// Pushes seen while a snapshot is in flight, oldest first.
    pending: Vec<Email>,
    revision: u64,
    /// Number of the most recent snapshot request.
    generation: u64,
}

impl FeedState {
    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn live(&self) -> &LiveStatus {
        &self.live
    }

    /// Message of the last failed snapshot, cleared by the next successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Incremented on every change to the email list.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a snapshot request and return its generation. Pushes are
    /// remembered from the first overlapping request until the latest lands.
    pub fn begin_load(&mut self) -> u64 {
        if self.phase != SyncPhase::Loading {
            self.pending.clear();
        }
        self.phase = SyncPhase::Loading;
        self.generation += 1;
        self.generation
    }

    /// Replace the list with a snapshot, or record why it failed.
    ///
    /// On success the snapshot is ordered newest first and any email pushed
    /// during the load that the snapshot lacks stays on top, latest first.
    /// On failure the current list is left as it is. Results of superseded
    /// requests change nothing; returns whether `result` was applied.
    pub fn finish_load(&mut self, generation: u64, result: Result<Vec<Email>, FeedError>) -> bool {
        if generation != self.generation || self.phase != SyncPhase::Loading {
            return false;
        }
        let pending = std::mem::take(&mut self.pending);
        match result {
            Ok(mut snapshot) => {
                sort_by_date_desc(&mut snapshot);
                let known: HashSet<EmailKey> = snapshot.iter().map(Email::key).collect();

                let mut emails: Vec<Email> = pending
                    .into_iter()
                    .rev()
                    .filter(|email| !known.contains(&email.key()))
                    .collect();
                emails.extend(snapshot);

                self.emails = emails;
                self.phase = SyncPhase::Ready;
                self.error = None;
                self.revision += 1;
            }
            Err(err) => {
                self.phase = SyncPhase::Failed;
                self.error = Some(err.to_string());
            }
        }
        true
    }

    /// Put a pushed email at the front, whatever its date.
    pub fn apply_push(&mut self, email: Email) {
        if self.phase == SyncPhase::Loading {
            self.pending.push(email.clone());
        }
        self.emails.insert(0, email);
        self.revision += 1;
    }

    pub fn set_live(&mut self, live: LiveStatus) {
        self.live = live;
    }
}
