//! Human-readable summary.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use super::RunReport;
use crate::dedup::RunState;

const HEADING: Style = Style::new().bold();
const GOOD: Style = Style::new().green().bold();
const WARN: Style = Style::new().yellow().bold();
const DIM: Style = Style::new().dim();

/// Text rendering of a [`RunReport`].
pub struct TextOutput<'a> {
    report: &'a RunReport,
    colored: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a text view of a report.
    #[must_use]
    pub fn new(report: &'a RunReport, colored: bool) -> Self {
        Self { report, colored }
    }

    fn styled(&self, text: impl std::fmt::Display, style: Style) -> String {
        if self.colored {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Render the summary as lines of text.
    #[must_use]
    pub fn render(&self) -> String {
        let summary = &self.report.summary;
        let counters = &summary.counters;

        let headline = match summary.state {
            RunState::Completed => self.styled("Cleanup complete", GOOD),
            RunState::Cancelled => self.styled("Cleanup cancelled", WARN),
        };
        let skipped = if counters.skipped > 0 {
            self.styled(counters.skipped, WARN)
        } else {
            counters.skipped.to_string()
        };

        let mut lines = vec![
            headline,
            format!(
                "  {} {} ({})",
                self.styled("Duplicates moved:", HEADING),
                counters.duplicates_removed,
                ByteSize::b(counters.bytes_relocated)
            ),
            format!("  {} {}", self.styled("Skipped:", HEADING), skipped),
            format!(
                "  {} {}/{}",
                self.styled("Files processed:", HEADING),
                counters.processed,
                counters.total
            ),
            format!(
                "  {} {}",
                self.styled("Algorithm:", HEADING),
                summary.algorithm
            ),
            format!(
                "  {} {}",
                self.styled("Backup:", HEADING),
                summary.backup_dir.display()
            ),
        ];
        if let Some(log_file) = &self.report.log_file {
            lines.push(format!(
                "  {} {}",
                self.styled("Log:", HEADING),
                log_file.display()
            ));
        }
        lines.push(self.styled(
            format!("  Finished in {:.2?}", self.report.duration),
            DIM,
        ));

        lines.join("\n")
    }

    /// Write the rendered summary followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self.render())
    }
}
