//! Application state and interaction logic for the TUI.

use std::time::Instant;

use anyhow::Result;
use tokio::sync::watch;

use crate::data::{Metric, Snapshot};
use crate::pipeline::{IngestStats, PipelineHandle, PipelineState};
use crate::ui::Theme;

/// Main application state.
///
/// The app is a consumer of the pipeline: it polls the snapshot channel on
/// each UI refresh and renders whatever the latest tick produced. Pausing
/// freezes the display only; ingestion keeps running underneath.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub paused: bool,
    /// Metric panel currently highlighted.
    pub selected: Metric,
    pub theme: Theme,
    /// Snapshot currently on screen.
    pub snapshot: Option<Snapshot>,
    /// Temporary feedback shown in the status bar.
    pub status_message: Option<(String, Instant)>,

    handle: PipelineHandle,
    snapshots: watch::Receiver<Option<Snapshot>>,
}

impl App {
    /// Create the app over a running pipeline.
    pub fn new(handle: PipelineHandle) -> Self {
        let snapshots = handle.subscribe();
        Self {
            running: true,
            show_help: false,
            paused: false,
            selected: Metric::Pm25,
            theme: Theme::auto_detect(),
            snapshot: None,
            status_message: None,
            handle,
            snapshots,
        }
    }

    /// Poll the snapshot channel for a newer tick.
    ///
    /// Returns true if the display was updated. While paused the channel is
    /// left untouched so the next unpause shows the latest state.
    pub fn refresh(&mut self) -> bool {
        if self.paused {
            return false;
        }
        if self.snapshots.has_changed().unwrap_or(false) {
            if let Some(snapshot) = self.snapshots.borrow_and_update().clone() {
                self.snapshot = Some(snapshot);
                return true;
            }
        }
        false
    }

    /// Materialize a snapshot immediately, bypassing the tick cadence.
    pub fn force_refresh(&mut self) {
        self.snapshot = Some(self.handle.snapshot_now());
    }

    /// Current pipeline state.
    pub fn pipeline_state(&self) -> PipelineState {
        self.handle.state()
    }

    /// Fault that stopped streaming, if one occurred.
    pub fn fault(&self) -> Option<String> {
        self.handle.fault()
    }

    /// Ingestion counters for the header.
    pub fn stats(&self) -> &IngestStats {
        self.handle.stats()
    }

    /// Description of the byte source for the status bar.
    pub fn source_description(&self) -> &str {
        self.handle.description()
    }

    /// Highlight the next metric panel.
    pub fn select_next(&mut self) {
        let idx = (self.selected.index() + 1) % Metric::COUNT;
        self.selected = Metric::ALL[idx];
    }

    /// Highlight the previous metric panel.
    pub fn select_prev(&mut self) {
        let idx = (self.selected.index() + Metric::COUNT - 1) % Metric::COUNT;
        self.selected = Metric::ALL[idx];
    }

    /// Highlight a specific metric panel.
    pub fn select(&mut self, metric: Metric) {
        self.selected = metric;
    }

    /// Freeze or unfreeze the display. Unpausing pulls the current state
    /// immediately rather than waiting for the next tick.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if !self.paused {
            self.force_refresh();
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < std::time::Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Give up the app and recover the pipeline handle for shutdown.
    pub fn into_handle(self) -> PipelineHandle {
        self.handle
    }

    /// Export the snapshot currently on screen to a JSON file.
    pub fn export_snapshot(&self, path: &std::path::Path) -> Result<()> {
        use std::io::Write;

        let Some(ref snapshot) = self.snapshot else {
            anyhow::bail!("No data to export");
        };

        let mut metrics = serde_json::Map::new();
        for metric in Metric::ALL {
            let value = match snapshot.metric(metric) {
                Some(series) => serde_json::json!({
                    "unit": metric.unit(),
                    "samples": series.len(),
                    "latest": series.latest(),
                    "min": series.finite_range().map(|(min, _)| min),
                    "max": series.finite_range().map(|(_, max)| max),
                    "values": series.values.clone(),
                }),
                None => serde_json::json!({
                    "unit": metric.unit(),
                    "samples": 0,
                }),
            };
            metrics.insert(metric.key().to_string(), value);
        }

        let export = serde_json::json!({
            "source": self.source_description(),
            "state": self.pipeline_state().label(),
            "lines_accepted": self.stats().lines_accepted(),
            "lines_skipped": self.stats().lines_skipped(),
            "metrics": metrics,
        });

        let json = serde_json::to_string_pretty(&export)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}
