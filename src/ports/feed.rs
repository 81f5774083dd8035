//! Location feed adapters.
//!
//! A feed pushes fixes into the detector's queue through a [`FixSender`] and
//! hands back a [`FeedSubscription`]; dropping or unsubscribing it stops the
//! feed. The reporting cadence is the adapter's business, see
//! [`CadenceFilter`].

use crate::core::{distance_meters, LocationFix};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sending half of the detector's fix queue.
#[derive(Clone, Debug)]
pub struct FixSender {
    tx: mpsc::UnboundedSender<LocationFix>,
}

impl FixSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<LocationFix>) -> Self {
        Self { tx }
    }

    /// Queue a fix. Returns `false` once the receiving side has shut down.
    pub fn send(&self, fix: LocationFix) -> bool {
        self.tx.send(fix).is_ok()
    }

    /// True once the receiving side has shut down
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Handle that stops a feed when unsubscribed or dropped.
pub struct FeedSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl FeedSubscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the feed now
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for FeedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Source of location fixes
pub trait LocationFeed: Send + Sync {
    /// Start delivering fixes to `sender` until the subscription is dropped.
    fn subscribe(&self, sender: FixSender) -> FeedSubscription;
}

/// Minimum spacing between reported fixes.
///
/// The reference policy reports every 10 s or every 50 m of movement,
/// whichever comes first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CadencePolicy {
    pub min_interval: Duration,
    pub min_distance_meters: f64,
}

impl Default for CadencePolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(10),
            min_distance_meters: 50.0,
        }
    }
}

/// Drops fixes that arrive sooner and closer than the policy allows.
#[derive(Clone, Debug)]
pub struct CadenceFilter {
    policy: CadencePolicy,
    last: Option<LocationFix>,
}

impl CadenceFilter {
    pub fn new(policy: CadencePolicy) -> Self {
        Self { policy, last: None }
    }

    /// True if `fix` should be forwarded. Fixes without a position are
    /// always forwarded so the detector can account for them.
    pub fn admit(&mut self, fix: &LocationFix) -> bool {
        let Some(coordinate) = fix.coordinate else {
            return true;
        };
        let Some(last) = self.last.as_ref() else {
            self.last = Some(*fix);
            return true;
        };

        let elapsed = fix
            .timestamp
            .signed_duration_since(last.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let moved = last
            .coordinate
            .map(|previous| distance_meters(&previous, &coordinate))
            .unwrap_or(f64::INFINITY);

        if elapsed >= self.policy.min_interval || moved >= self.policy.min_distance_meters {
            self.last = Some(*fix);
            true
        } else {
            false
        }
    }
}

#[derive(Default)]
struct ManualFeedInner {
    sender: Option<FixSender>,
    cadence: Option<CadenceFilter>,
}

/// Feed driven by the host calling [`ManualFeed::push`].
///
/// Suits platform callbacks (the host forwards each position update) and
/// tests. Only one subscriber is active at a time; a new subscription
/// replaces the previous one.
#[derive(Clone, Default)]
pub struct ManualFeed {
    inner: Arc<Mutex<ManualFeedInner>>,
}

impl ManualFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed that applies `policy` before forwarding.
    pub fn with_cadence(policy: CadencePolicy) -> Self {
        let feed = Self::new();
        if let Ok(mut inner) = feed.inner.lock() {
            inner.cadence = Some(CadenceFilter::new(policy));
        }
        feed
    }

    /// Forward a fix to the current subscriber.
    ///
    /// Returns `false` if there is no subscriber, the fix was filtered by
    /// the cadence policy, or the subscriber has shut down.
    pub fn push(&self, fix: LocationFix) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            warn!("location feed lock poisoned, dropping fix");
            return false;
        };
        if let Some(cadence) = inner.cadence.as_mut() {
            if !cadence.admit(&fix) {
                debug!("fix filtered by cadence policy");
                return false;
            }
        }
        match inner.sender.as_ref() {
            Some(sender) => sender.send(fix),
            None => false,
        }
    }

    /// True while a live subscriber is attached
    pub fn has_subscriber(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.sender.as_ref().is_some_and(|s| !s.is_closed()))
            .unwrap_or(false)
    }
}

impl LocationFeed for ManualFeed {
    fn subscribe(&self, sender: FixSender) -> FeedSubscription {
        if let Ok(mut inner) = self.inner.lock() {
            inner.sender = Some(sender.clone());
        }

        let inner = Arc::clone(&self.inner);
        FeedSubscription::new(move || {
            if let Ok(mut inner) = inner.lock() {
                // Leave a newer subscription in place.
                if inner
                    .sender
                    .as_ref()
                    .is_some_and(|current| current.tx.same_channel(&sender.tx))
                {
                    inner.sender = None;
                }
            }
        })
    }
}
