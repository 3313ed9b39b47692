use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::evaluator::{EvaluationResult, ScoreSource};

/// Characters of the report exposed through the `explanation` output.
pub const EXPLANATION_CHARS: usize = 500;

/// Destination for `key=value` pipeline outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    /// Append to a CI-provided output file (e.g. `$GITHUB_OUTPUT`).
    File(PathBuf),
    Stdout,
}

/// Persists the report file and publishes the score outputs.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    report_path: PathBuf,
    sink: OutputSink,
}

impl ReportWriter {
    pub fn new(report_path: impl Into<PathBuf>, sink: OutputSink) -> Self {
        Self {
            report_path: report_path.into(),
            sink,
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    /// Write the report file, then the `score` and `explanation` outputs.
    pub fn write(&self, result: &EvaluationResult) -> Result<()> {
        fs::write(&self.report_path, &result.markdown_report).with_context(|| {
            format!("failed to write report to {}", self.report_path.display())
        })?;
        info!(path = %self.report_path.display(), "report written");

        let outputs = render_outputs(result);
        match &self.sink {
            OutputSink::File(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open output file {}", path.display()))?;
                file.write_all(outputs.as_bytes())
                    .with_context(|| format!("failed to write outputs to {}", path.display()))?;
            }
            OutputSink::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(outputs.as_bytes())
                    .and_then(|_| stdout.flush())
                    .context("failed to write outputs to stdout")?;
            }
        }
        Ok(())
    }
}

/// `score=` and `explanation=` lines, newline terminated.
pub fn render_outputs(result: &EvaluationResult) -> String {
    format!(
        "score={}\nexplanation={}\n",
        result.score,
        explanation(&result.markdown_report)
    )
}

/// First [`EXPLANATION_CHARS`] characters of the report on a single line.
///
/// Line breaks (`\n`, `\r\n` or a lone `\r`) become the two characters `\n`.
pub fn explanation(report: &str) -> String {
    report
        .chars()
        .take(EXPLANATION_CHARS)
        .collect::<String>()
        .replace("\r\n", "\n")
        .replace(['\r', '\n'], "\\n")
}

/// Format styles for the end-of-run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Render a short run summary for the terminal.
pub fn render_summary(
    result: &EvaluationResult,
    report_path: &Path,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Human => render_human(result, report_path),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&JsonSummary {
            score: result.score,
            max_score: result.max_score,
            score_source: result.score_source,
            report_path,
        })?),
    }
}

fn render_human(result: &EvaluationResult, report_path: &Path) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Score: {}/{}", result.score, result.max_score)?;
    if result.score_source == ScoreSource::Default {
        writeln!(out, "  (no score found in the model reply; defaulted to 0)")?;
    }
    writeln!(out, "Report: {}", report_path.display())?;
    Ok(out)
}

#[derive(Debug, Serialize)]
struct JsonSummary<'a> {
    score: u32,
    max_score: u32,
    score_source: ScoreSource,
    report_path: &'a Path,
}
