use crate::wipe_engine::ProgressObserver;
use indicatif::{ProgressBar, ProgressStyle};

/// Bar resolution: one step per tenth of a percent
pub(crate) const BAR_STEPS: u64 = 1000;

const BAR_TEMPLATE: &str =
    "{msg:>10} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% (eta {eta})";

/// Terminal rendering of wipe progress.
///
/// One bar covers the whole run; the message shows the pass in progress.
pub struct TerminalProgress {
    bar: ProgressBar,
    current_pass: Option<u32>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(BAR_STEPS))
    }

    /// Progress that renders nothing (JSON output, tests)
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_length(BAR_STEPS);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self {
            bar,
            current_pass: None,
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }

    /// Leave the bar where it stopped, e.g. after an error
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&mut self, pass_index: u32, pass_count: u32, percent: f64) {
        if self.current_pass != Some(pass_index) {
            self.current_pass = Some(pass_index);
            self.bar
                .set_message(format!("Pass {}/{}", pass_index + 1, pass_count));
        }

        let pct = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        self.bar
            .set_position((pct / 100.0 * BAR_STEPS as f64).round() as u64);
    }
}

/// Convert a byte count or rate to a readable string
pub fn human_bytes(bytes: f64) -> String {
    let units = ["B", "KB", "MB", "GB", "TB"];
    if bytes <= 0.0 {
        return "0B".to_string();
    }
    let mut val = bytes;
    let mut i = 0usize;
    while val >= 1024.0 && i + 1 < units.len() {
        val /= 1024.0;
        i += 1;
    }
    format!("{:.2}{}", val, units[i])
}
