//! In-memory backend and push channel for unit tests.

use crate::{FeedBackend, FeedError, PushChannel, PushEvent, PushStream};
use async_trait::async_trait;
use glance_core::{AccountCredentials, Email};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

pub(crate) fn email(id: i64, date: &str) -> Email {
    Email {
        id: Some(id),
        subject: Some(format!("Subject {id}")),
        date: date.to_string(),
        ..Email::default()
    }
}

type Reply = Result<Vec<Email>, FeedError>;

#[derive(Default)]
pub(crate) struct FakeBackend {
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond_with(&self, reply: Reply) {
        let _ = self.respond_later().send(reply);
    }

    /// Queue a reply that the test completes later.
    pub(crate) fn respond_later(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().expect("replies lock").push_back(rx);
        tx
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedBackend for FakeBackend {
    async fn fetch_emails(&self, _accounts: &[AccountCredentials]) -> Result<Vec<Email>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().expect("replies lock").pop_front();
        match reply {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(FeedError::Protocol("reply dropped".to_string()))),
            None => Err(FeedError::Protocol("no scripted reply".to_string())),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeChannel {
    pending: Mutex<VecDeque<mpsc::UnboundedReceiver<Email>>>,
    attempts: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl FakeChannel {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue one successful connection; dropping the feed closes it from the server side.
    pub(crate) fn accept(&self) -> FakeFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pending.lock().expect("pending lock").push_back(rx);
        FakeFeed { tx }
    }

    pub(crate) fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn closed_streams(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushChannel for FakeChannel {
    async fn connect(&self) -> Result<Box<dyn PushStream>, FeedError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let rx = self.pending.lock().expect("pending lock").pop_front();
        match rx {
            Some(rx) => Ok(Box::new(FakeStream {
                rx,
                closed: self.closed.clone(),
            })),
            None => Err(FeedError::Protocol("connection refused".to_string())),
        }
    }
}

pub(crate) struct FakeFeed {
    tx: mpsc::UnboundedSender<Email>,
}

impl FakeFeed {
    pub(crate) fn push(&self, email: Email) {
        let _ = self.tx.send(email);
    }
}

struct FakeStream {
    rx: mpsc::UnboundedReceiver<Email>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl PushStream for FakeStream {
    async fn next_event(&mut self) -> Result<Option<PushEvent>, FeedError> {
        Ok(self.rx.recv().await.map(PushEvent::NewEmail))
    }

    async fn close(&mut self) -> Result<(), FeedError> {
        self.rx.close();
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
