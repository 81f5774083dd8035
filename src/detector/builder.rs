//! Builder for constructing detectors.

use super::{Detector, Diagnostics};
use crate::debounce::DebounceConfig;
use crate::error::BuildError;
use crate::ports::{Directory, NotificationSink};
use std::sync::Arc;

/// Builder for [`Detector`] with a fluent API.
#[derive(Default)]
pub struct DetectorBuilder {
    config: DebounceConfig,
    directory: Option<Arc<dyn Directory>>,
    sink: Option<Arc<dyn NotificationSink>>,
    diagnostics: Option<Arc<Diagnostics>>,
}

impl DetectorBuilder {
    /// Create a new builder with the default debounce configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: DebounceConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the device and zone directory (required).
    pub fn directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the notification sink (required).
    pub fn sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share counters with another component instead of starting fresh.
    pub fn diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Build the detector.
    /// Returns an error if a collaborator is missing or the config is invalid.
    pub fn build(self) -> Result<Detector, BuildError> {
        let directory = self.directory.ok_or(BuildError::MissingDirectory)?;
        let sink = self.sink.ok_or(BuildError::MissingSink)?;
        self.config.validate()?;

        Ok(Detector::assemble(
            self.config,
            directory,
            sink,
            self.diagnostics.unwrap_or_default(),
        ))
    }
}
