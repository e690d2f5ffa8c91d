//! Failure report rendering.
//!
//! A failed check is shown as a small diff: where the check and the
//! failing hop are in the fixture, then the expected value (`-`, green)
//! and the actual one (`+`, red), then the reason.

use std::fmt::Write as _;
use std::path::Path;

use clap::builder::styling::{AnsiColor, Color, Style};
use hopcheck_application::{CheckFailure, HopFailure};
use hopcheck_domain::{AssertionMismatch, FixtureSyntaxError, MismatchSubject};

const EXPECTED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
const ACTUAL: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
const LOCATION: Style = Style::new().bold();

/// Renders run results for the error stream.
#[derive(Debug, Clone, Copy)]
pub struct Report {
    color: bool,
}

impl Report {
    pub const fn new(color: bool) -> Self {
        Self { color }
    }

    /// Renders a failed check.
    pub fn failure(&self, fixture: &Path, failure: &CheckFailure) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.paint(LOCATION, &fixture.display().to_string()));
        let _ = writeln!(out, "<@ {}: {}", failure.check_line, failure.request);
        let _ = writeln!(
            out,
            ">@ {} (hop {}: {}):",
            failure.expectation_line,
            failure.expectation_index + 1,
            failure.hop_uri
        );

        match &failure.reason {
            HopFailure::Mismatch(mismatch) => {
                for line in self.diff(mismatch) {
                    let _ = writeln!(out, "\t{line}");
                }
                let _ = writeln!(out, "\t{mismatch}");
            }
            other => {
                let _ = writeln!(out, "\t{other}");
            }
        }
        out
    }

    /// Renders a fixture that could not be parsed.
    pub fn syntax_error(&self, fixture: &Path, error: &FixtureSyntaxError) -> String {
        format!(
            "{}: {error}\n",
            self.paint(LOCATION, &fixture.display().to_string())
        )
    }

    fn diff(&self, mismatch: &AssertionMismatch) -> Vec<String> {
        let (expected, actual) = match &mismatch.subject {
            MismatchSubject::Status => (mismatch.expected.clone(), mismatch.actual.clone()),
            MismatchSubject::Header(name) => (
                format!("{name}: {}", mismatch.expected),
                mismatch.actual.as_ref().map(|value| format!("{name}: {value}")),
            ),
            MismatchSubject::Body => (mismatch.expected.clone(), None),
        };

        let mut lines = vec![self.paint(EXPECTED, &format!("-{expected}"))];
        if let Some(actual) = actual {
            lines.push(self.paint(ACTUAL, &format!("+{actual}")));
        }
        lines
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.color {
            format!("{style}{text}{style:#}")
        } else {
            text.to_string()
        }
    }
}
