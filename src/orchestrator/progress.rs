//! Transfer spinner and phase timings.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::transport::TransferStats;

/// Spinner for one file transfer, advanced by the transport's progress sink.
///
/// Hidden when the run is silent; the final summary line is printed by the
/// caller either way.
pub(crate) struct TransferSpinner {
    bar: ProgressBar,
    filename: String,
}

impl TransferSpinner {
    pub(crate) fn start(visible: bool, filename: &str) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template(" {spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.set_message(format!("Downloading {filename}"));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            bar,
            filename: filename.to_string(),
        }
    }

    pub(crate) fn update(&self, stats: TransferStats) {
        self.bar.set_message(format!(
            "Downloading {}: {} MB at average speed of {} KB/s",
            self.filename,
            stats.mebibytes(),
            stats.kib_per_sec()
        ));
        self.bar.tick();
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Wall-clock duration of each run phase, in the order they ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    phases: Vec<(&'static str, Duration)>,
}

impl PhaseTimings {
    /// Records `name` as having run since `started`.
    pub fn record(&mut self, name: &'static str, started: Instant) {
        self.phases.push((name, started.elapsed()));
    }

    /// `(phase, duration)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.phases.iter().copied()
    }

    /// Phase names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|(name, _)| *name).collect()
    }

    /// Sum of all phases.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.phases.iter().map(|(_, duration)| *duration).sum()
    }

    /// Report lines for `debug=yes`.
    #[must_use]
    pub fn report(&self) -> Vec<String> {
        let mut lines = vec!["Phase timings:".to_string()];
        lines.extend(
            self.phases
                .iter()
                .map(|(name, duration)| format!(" {name}: {} ms", duration.as_millis())),
        );
        lines.push(format!(" total: {} ms", self.total().as_millis()));
        lines
    }
}
