//! Progress reporting using indicatif.
//!
//! [`Progress`] turns the engine's [`DedupEvent`] stream into a terminal
//! progress bar. It lives on the thread that drains the event channel, so it
//! needs no locking.
//!
//! # Accessible Mode
//!
//! When accessible mode is enabled (`NO_COLOR`), the bar uses ASCII
//! characters and no colors.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::events::DedupEvent;

/// Terminal progress bar driven by engine events.
pub struct Progress {
    bar: Option<ProgressBar>,
    hidden: bool,
    accessible: bool,
}

impl Progress {
    /// Create a progress reporter.
    ///
    /// With `hidden` set, events are accepted and nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorclean::progress::Progress;
    ///
    /// let progress = Progress::new(true, false);
    /// assert!(!progress.is_visible());
    /// ```
    #[must_use]
    pub fn new(hidden: bool, accessible: bool) -> Self {
        Self {
            bar: None,
            hidden,
            accessible,
        }
    }

    /// Whether anything will be drawn.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    /// Check if accessible mode is enabled.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    fn style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
        }
    }

    fn bar(&mut self, total: u64) -> &ProgressBar {
        let style = self.style();
        let hidden = self.hidden;
        self.bar.get_or_insert_with(|| {
            let bar = if hidden {
                ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden())
            } else {
                ProgressBar::new(total)
            };
            bar.set_style(style);
            bar
        })
    }

    /// Update the bar from one engine event. Log records are ignored.
    pub fn handle(&mut self, event: &DedupEvent) {
        match event {
            DedupEvent::Progress { processed, total } => {
                let bar = self.bar(*total);
                bar.set_length(*total);
                bar.set_position(*processed);
            }
            DedupEvent::Status { file_name } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(truncate_name(file_name, 30));
                }
            }
            DedupEvent::Log(_) => {}
        }
    }

    /// Current position, if a bar was started.
    #[must_use]
    pub fn position(&self) -> Option<u64> {
        self.bar.as_ref().map(ProgressBar::position)
    }

    /// Finish the bar with a closing message.
    pub fn finish(&mut self, cancelled: bool) {
        if let Some(bar) = self.bar.take() {
            if cancelled {
                bar.abandon_with_message("Cancelled");
            } else {
                bar.finish_with_message("Done");
            }
        }
    }
}

/// Shorten a file name for the bar message, keeping its tail.
fn truncate_name(name: &str, max_chars: usize) -> String {
    let count = name.chars().count();
    if count <= max_chars {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max_chars - 3)).collect();
    format!("...{tail}")
}
