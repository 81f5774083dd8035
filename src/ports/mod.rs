//! Contracts with external collaborators.
//!
//! The detector talks to three collaborators:
//! - a [`Directory`] supplying devices and their zones,
//! - a [`LocationFeed`] delivering fixes,
//! - a [`NotificationSink`] receiving zone-exit alerts.
//!
//! Each contract ships with a small in-process implementation.

pub mod directory;
pub mod feed;
pub mod sink;

pub use directory::{Directory, InMemoryDirectory};
pub use feed::{CadenceFilter, CadencePolicy, FeedSubscription, FixSender, LocationFeed, ManualFeed};
pub use sink::{ChannelSink, LogSink, MessageKind, Notification, NotificationSink, ALERT_TITLE};
