//! Terminal progress display for downloads.
//!
//! The orchestrator publishes [`DownloadProgress`] snapshots; this module
//! offers a ready-made consumer for CLI hosts that renders those snapshots
//! as an `indicatif` byte progress bar. Purely optional - graphical hosts
//! render the snapshots their own way.
//!
//! # Examples
//!
//! ```rust
//! use updatekit::download::DownloadProgress;
//! use updatekit::utils::progress::DownloadBar;
//!
//! let bar = DownloadBar::new();
//! bar.observe(DownloadProgress { bytes_written: 512, total_bytes: 2048 });
//! bar.observe(DownloadProgress { bytes_written: 2048, total_bytes: 2048 });
//! bar.finish();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};

use crate::download::DownloadProgress;

/// Byte-oriented progress bar rendering [`DownloadProgress`] snapshots.
///
/// Starts as a spinner while the total size is unknown (`total_bytes == 0`)
/// and switches to a bounded bar once the first snapshot with a known total
/// arrives. Snapshots are latest-wins; skipped intermediate values are fine.
pub struct DownloadBar {
    bar: IndicatifBar,
}

impl DownloadBar {
    /// Create a bar with the download style.
    pub fn new() -> Self {
        let bar = IndicatifBar::no_length();
        bar.set_style(download_style());
        Self { bar }
    }

    /// Render a progress snapshot.
    pub fn observe(&self, progress: DownloadProgress) {
        if progress.total_bytes > 0 {
            self.bar.set_length(progress.total_bytes);
        }
        self.bar.set_position(progress.bytes_written);
    }

    /// Complete the bar, leaving the final state visible.
    pub fn finish(&self) {
        self.bar.finish();
    }

    /// Complete and remove the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for DownloadBar {
    fn default() -> Self {
        Self::new()
    }
}

fn download_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap()
        .progress_chars("━╸━")
}
