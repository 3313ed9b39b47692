pub mod collector;
pub mod evaluator;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod rubric;

pub use collector::{CollectorConfig, FileCollector, FileRecord};
pub use evaluator::{
    EvaluateError, EvaluationResult, Evaluator, MissingScorePolicy, ScoreSource,
};
pub use llm::{build_client, LlmClient, LlmSettings, NoopLlmClient, OpenAiClient, ProviderKind};
pub use pipeline::{run, RunConfig};
pub use report::{render_summary, OutputFormat, OutputSink, ReportWriter};
pub use rubric::{Category, Rubric, RubricValidationError};
