//! Per-round progress display for accumulation

use crate::accumulate::RoundReport;
use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static ROUND_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{prefix}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Creates one progress bar per accumulation round
///
/// Bars are shared with worker threads, which tick them as images complete.
#[derive(Clone, Copy, Debug)]
pub struct RoundProgress {
    enabled: bool,
}

impl Default for RoundProgress {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RoundProgress {
    /// Create a progress display, drawing nothing when `enabled` is false
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Progress display that never draws
    pub const fn hidden() -> Self {
        Self::new(false)
    }

    /// Whether bars are drawn
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start the bar for a round of `images` files
    pub fn start_round(&self, round: usize, images: usize) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(images as u64);
        bar.set_style(ROUND_STYLE.clone());
        bar.set_prefix(format!("Round {round}"));
        bar
    }

    /// Close a round's bar with its summed and failed counts
    pub fn finish_round(&self, bar: &ProgressBar, report: &RoundReport) {
        if self.enabled {
            bar.finish_with_message(format!(
                "{} summed, {} failed",
                report.summed, report.failed
            ));
        } else {
            bar.finish_and_clear();
        }
    }
}
