mod app_config;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use code_eval_core::{
    build_client, render_summary, run, CollectorConfig, LlmSettings, MissingScorePolicy,
    OutputFormat, OutputSink, RunConfig,
};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app_config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "code-eval",
    author,
    version,
    about = "Score a repository's structure against a rubric using an LLM"
)]
struct Cli {
    /// Repository root to evaluate; `Result.md` is written here
    #[arg(long, value_name = "DIR", env = "GITHUB_WORKSPACE", default_value = ".")]
    root: PathBuf,

    /// YAML rubric overriding the built-in one
    #[arg(long, value_name = "FILE", env = "RUBRIC_FILE")]
    rubric: Option<PathBuf>,

    /// API key for the LLM provider
    #[arg(long = "api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// LLM provider (`openai` or `noop`)
    #[arg(long)]
    provider: Option<String>,

    #[arg(long)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long)]
    endpoint: Option<String>,

    /// Config file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// File receiving `score` and `explanation` outputs; stdout when unset
    #[arg(long = "github-output", value_name = "FILE", env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,

    /// Additional glob patterns to exclude (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Fail instead of reporting 0 when the reply carries no score
    #[arg(long)]
    fail_on_missing_score: bool,

    /// Summary format printed after the run
    #[arg(long, value_enum, default_value_t = SummaryFormat::Human)]
    format: SummaryFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SummaryFormat {
    Human,
    Json,
}

impl Cli {
    /// Merge flags over file/env configuration into the run parameters.
    fn resolve(self, app: AppConfig) -> (RunConfig, LlmSettings) {
        let mut llm = app.llm;
        if let Some(provider) = self.provider {
            llm.provider = provider;
        }
        if let Some(api_key) = self.api_key {
            llm.api_key = api_key;
        }
        if self.model.is_some() {
            llm.model = self.model;
        }
        if self.endpoint.is_some() {
            llm.endpoint = self.endpoint;
        }

        let mut extra_excludes = app.exclude;
        extra_excludes.extend(self.exclude);

        let output_sink = match self.github_output {
            Some(path) if !path.as_os_str().is_empty() => OutputSink::File(path),
            _ => OutputSink::Stdout,
        };
        let missing_score_policy = if self.fail_on_missing_score || app.fail_on_missing_score {
            MissingScorePolicy::Fail
        } else {
            MissingScorePolicy::ReportZero
        };

        let run_config = RunConfig {
            root: self.root,
            rubric_path: self.rubric.or(app.rubric),
            collector: CollectorConfig {
                extra_excludes,
                ..CollectorConfig::default()
            },
            output_sink,
            missing_score_policy,
        };
        (run_config, llm)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let started = Instant::now();
    let cli = Cli::parse();
    let format = match cli.format {
        SummaryFormat::Human => OutputFormat::Human,
        SummaryFormat::Json => OutputFormat::Json,
    };

    let app = app_config::load(cli.config.as_deref())?;
    let (run_config, settings) = cli.resolve(app);
    let client = build_client(&settings)?;
    let result = run(&run_config, client.as_ref()).await?;

    let summary = render_summary(&result, &run_config.report_path(), format)?;
    if matches!(format, OutputFormat::Human) {
        println!("{}", "Evaluation complete".green().bold());
    }
    print!("{summary}");

    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);
    info!(elapsed = %humantime::format_duration(elapsed), "done");
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
