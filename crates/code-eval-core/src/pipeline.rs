use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::collector::{CollectorConfig, FileCollector};
use crate::evaluator::{EvaluationResult, Evaluator, MissingScorePolicy};
use crate::llm::LlmClient;
use crate::report::{OutputSink, ReportWriter};
use crate::rubric::file_loader;

/// Parameters for one evaluation run, built once at process start.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory to scan; the report is written here.
    pub root: PathBuf,
    pub rubric_path: Option<PathBuf>,
    pub collector: CollectorConfig,
    pub output_sink: OutputSink,
    pub missing_score_policy: MissingScorePolicy,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            rubric_path: None,
            collector: CollectorConfig::default(),
            output_sink: OutputSink::Stdout,
            missing_score_policy: MissingScorePolicy::default(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(&self.collector.report_file_name)
    }
}

/// Load the rubric, collect files, evaluate them and write the outputs.
///
/// Nothing is written unless evaluation succeeds.
#[instrument(skip_all, fields(root = %config.root.display()))]
pub async fn run(config: &RunConfig, client: &dyn LlmClient) -> Result<EvaluationResult> {
    let rubric = file_loader::load_or_default(config.rubric_path.as_deref());
    let files = FileCollector::new(&config.root, &config.collector)?
        .collect()
        .context("failed to collect repository files")?;

    let result = Evaluator::with_policy(client, config.missing_score_policy)
        .evaluate(&files, &rubric)
        .await?;

    ReportWriter::new(config.report_path(), config.output_sink.clone()).write(&result)?;
    info!(score = result.score, max_score = result.max_score, "run finished");
    Ok(result)
}
