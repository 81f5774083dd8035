//! Notification sinks for zone-exit alerts.
//!
//! The detector dispatches every alert on a separate task and never awaits
//! it; a sink's failures are logged and counted, nothing more.

use crate::core::Device;
use crate::error::SinkError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Title used for every zone-exit alert
pub const ALERT_TITLE: &str = "Safe Zone Alert";

/// Kind of message handed to a sink
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    ZoneExited,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZoneExited => "zone_exited",
        }
    }
}

/// A fully formed alert ready for delivery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub device: Device,
    pub kind: MessageKind,
    pub title: String,
    pub text: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    /// Alert for `device` leaving its safe zones.
    ///
    /// ```rust
    /// use zonewatch::core::Device;
    /// use zonewatch::ports::Notification;
    /// use chrono::Utc;
    ///
    /// let notice = Notification::zone_exited(&Device::new("d", "o", "Backpack"), Utc::now());
    /// assert_eq!(notice.text, "Backpack has exited the safe zone!");
    /// ```
    pub fn zone_exited(device: &Device, raised_at: DateTime<Utc>) -> Self {
        Self {
            device: device.clone(),
            kind: MessageKind::ZoneExited,
            title: ALERT_TITLE.to_string(),
            text: format!("{} has exited the safe zone!", device.display_name),
            raised_at,
        }
    }
}

/// Destination for zone-exit alerts
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, device: &Device, kind: MessageKind, text: &str)
        -> Result<(), SinkError>;
}

/// Sink that only writes alerts to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(
        &self,
        device: &Device,
        kind: MessageKind,
        text: &str,
    ) -> Result<(), SinkError> {
        let Some(address) = device.notification_address.as_deref() else {
            warn!(device_id = %device.id, "no push token for device");
            return Err(SinkError::MissingAddress(device.id.clone()));
        };
        info!(
            device_id = %device.id,
            kind = kind.as_str(),
            address,
            "{ALERT_TITLE}: {text}"
        );
        Ok(())
    }
}

/// Sink that forwards every alert into a channel.
///
/// Useful for bridging to a delivery task owned by the host.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    /// Create a sink and the receiver its alerts arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationSink for ChannelSink {
    async fn notify(
        &self,
        device: &Device,
        kind: MessageKind,
        text: &str,
    ) -> Result<(), SinkError> {
        let notification = Notification {
            device: device.clone(),
            kind,
            title: ALERT_TITLE.to_string(),
            text: text.to_string(),
            raised_at: Utc::now(),
        };
        self.tx
            .send(notification)
            .map_err(|_| SinkError::Delivery("notification channel closed".to_string()))
    }
}
