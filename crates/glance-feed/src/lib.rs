//! Feed synchronization: the email snapshot, the live push channel, and the
//! single state container both of them write into.

mod backend;
mod error;
pub mod protocol;
mod push;
mod state;
mod subscription;
mod synchronizer;

#[cfg(test)]
mod testing;

pub use backend::{load_snapshot, FeedBackend, HttpFeedBackend};
pub use error::FeedError;
pub use push::{PushChannel, PushEvent, PushStream, SocketIoChannel, NEW_EMAIL_EVENT};
pub use state::{FeedState, LiveStatus, SyncPhase};
pub use subscription::{subscribe, FeedEvent, ReconnectPolicy, Subscription};
pub use synchronizer::FeedSynchronizer;
