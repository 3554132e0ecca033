//! Terminal Report Rendering
//!
//! Renders a [`ValidationResult`] and its chain trace for the terminal.
//! Rendering is split into a pure `render_*` layer returning plain
//! strings (testable) and a thin styled printing layer on top.

use console::style;

use crate::provider::{AttemptOutcome, ChainReport};
use crate::types::{ValidationResult, ValidationStatus};

/// Plain-text body of the report, without ANSI styling
pub fn render_result(result: &ValidationResult, detected_text: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("Detected Text: {}\n", detected_text));
    out.push_str(&format!("Summary: {}\n", result.summary));
    out.push('\n');
    out.push_str(&result.analysis_text);
    if !result.analysis_text.ends_with('\n') {
        out.push('\n');
    }

    if let Some(hits) = &result.search_results {
        if !hits.is_empty() {
            out.push_str("\nSearch results:\n");
            for hit in hits {
                out.push_str(&format!("- {} | {}\n", hit.title, hit.url));
            }
        }
    }

    if let Some(reference) = &result.reference_text {
        out.push_str(&format!("\nReference: {}\n", reference));
    }

    out
}

/// One line per attempted provider, for `--verbose` style traces
pub fn render_attempts(report: &ChainReport) -> String {
    let mut out = String::new();
    for attempt in &report.attempts {
        match &attempt.outcome {
            AttemptOutcome::Verdict(status) => out.push_str(&format!(
                "{}: {} ({}ms)\n",
                attempt.provider, status, attempt.duration_ms
            )),
            AttemptOutcome::Failed(error) => out.push_str(&format!(
                "{}: failed, {} ({}ms)\n",
                attempt.provider, error, attempt.duration_ms
            )),
        }
    }
    out
}

/// Print the styled verdict card and report body
pub fn print_report(result: &ValidationResult, detected_text: &str) {
    let badge = match result.status {
        ValidationStatus::Pass => style(" PASS ").white().on_green().bold(),
        ValidationStatus::Fail => style(" FAIL ").white().on_red().bold(),
        ValidationStatus::Warning => style(" WARNING ").black().on_yellow().bold(),
    };
    println!("\n{} {}", badge, style(&result.summary).bold());
    println!("{}", "─".repeat(60));
    print!("{}", render_result(result, detected_text));
}
