//! Runs a [`Detector`] against a live [`LocationFeed`].
//!
//! The monitor owns the detector on a single task and drains one queue of
//! fixes, so fixes are processed one at a time in arrival order. Alerts are
//! dispatched on their own tasks and never hold up the queue.

use crate::core::LocationFix;
use crate::detector::{Detector, Diagnostics};
use crate::error::MonitorError;
use crate::ports::{FeedSubscription, FixSender, LocationFeed};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct Monitor;

impl Monitor {
    /// Subscribe `detector` to `feed` and start processing fixes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(detector: Detector, feed: &dyn LocationFeed) -> Result<MonitorHandle, MonitorError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let diagnostics = detector.diagnostics();

        let subscription = feed.subscribe(FixSender::new(tx));
        let task = runtime.spawn(run(detector, rx, shutdown_rx));

        Ok(MonitorHandle {
            shutdown: Some(shutdown_tx),
            subscription: Some(subscription),
            task,
            diagnostics,
        })
    }
}

/// Handle to a running monitor.
///
/// Dropping the handle unsubscribes from the feed, after which the monitor
/// finishes the queued fixes and stops.
pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    subscription: Option<FeedSubscription>,
    task: JoinHandle<Detector>,
    diagnostics: Arc<Diagnostics>,
}

impl MonitorHandle {
    /// Counters shared with the running detector
    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    /// False once the task has stopped, e.g. after the feed hung up.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Unsubscribe from the feed, process fixes already queued and hand the
    /// detector back.
    pub async fn shutdown(mut self) -> Result<Detector, MonitorError> {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already have stopped on its own.
            let _ = shutdown.send(());
        }
        (&mut self.task)
            .await
            .map_err(|e| MonitorError::TaskFailed(e.to_string()))
    }
}

async fn run(
    mut detector: Detector,
    mut fixes: mpsc::UnboundedReceiver<LocationFix>,
    mut shutdown: oneshot::Receiver<()>,
) -> Detector {
    info!("monitor started");
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("monitor shutdown requested");
                fixes.close();
                while let Ok(fix) = fixes.try_recv() {
                    detector.process_fix(fix);
                }
                break;
            },

            fix = fixes.recv() => match fix {
                Some(fix) => {
                    detector.process_fix(fix);
                }
                None => {
                    debug!("location feed closed");
                    break;
                }
            },
        }
    }
    info!("monitor stopped");
    detector
}
