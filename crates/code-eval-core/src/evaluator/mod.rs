use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::collector::FileRecord;
use crate::llm::LlmClient;
use crate::rubric::Rubric;

pub mod extract;
pub mod prompt;

pub use extract::{MissingScorePolicy, ScoreExtractor, ScoreOutcome, ScoreSource};

/// Report text and score produced by one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub markdown_report: String,
    /// Awarded score; expected but not guaranteed to be `<= max_score`.
    pub score: u32,
    pub max_score: u32,
    pub score_source: ScoreSource,
}

/// Failures turning a model reply into an [`EvaluationResult`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvaluateError {
    #[error("could not extract the markdown report from the model reply (expected a `{}` heading)", extract::REPORT_HEADING)]
    MissingReport,
    #[error("could not extract a score from the model reply")]
    MissingScore,
}

/// Builds the prompt, queries the model once and parses its reply.
pub struct Evaluator<'a> {
    client: &'a dyn LlmClient,
    extractor: ScoreExtractor,
}

impl<'a> Evaluator<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self::with_policy(client, MissingScorePolicy::default())
    }

    pub fn with_policy(client: &'a dyn LlmClient, policy: MissingScorePolicy) -> Self {
        Self {
            client,
            extractor: ScoreExtractor::new(policy),
        }
    }

    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn evaluate(&self, files: &[FileRecord], rubric: &Rubric) -> AnyResult<EvaluationResult> {
        let prompt = prompt::build_prompt(files, rubric);
        let reply = self
            .client
            .complete(prompt::SYSTEM_PROMPT, &prompt.text)
            .await
            .context("evaluation request failed")?;
        let result = parse_reply(&reply, prompt.max_possible_score, &self.extractor)?;
        info!(
            score = result.score,
            max_score = result.max_score,
            source = ?result.score_source,
            "evaluation complete"
        );
        Ok(result)
    }
}

/// Turn a raw model reply into an [`EvaluationResult`].
pub fn parse_reply(
    reply: &str,
    max_possible_score: u32,
    extractor: &ScoreExtractor,
) -> Result<EvaluationResult, EvaluateError> {
    let markdown_report = extract::extract_report(reply)?;
    let outcome = extractor.extract(reply, &markdown_report, max_possible_score)?;
    Ok(EvaluationResult {
        markdown_report,
        score: outcome.score,
        max_score: outcome.max_score,
        score_source: outcome.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::Category;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedClient {
        reply: anyhow::Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, system: &str, prompt: &str) -> anyhow::Result<String> {
            assert_eq!(system, prompt::SYSTEM_PROMPT);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(err) => Err(anyhow::anyhow!("{err}")),
            }
        }
    }

    fn rubric(maxes: &[u32]) -> Rubric {
        Rubric::new(
            maxes
                .iter()
                .enumerate()
                .map(|(idx, max)| Category::new(format!("cat{idx}"), *max, "desc", vec![]).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn json_score_is_returned_verbatim() {
        let client = CannedClient::replying(
            "# Code Structure Evaluation Report\n\n**Total Score:** 3/4\n\nPART 2:\n{\"score\": 17, \"maxScore\": 25}",
        );
        let result = Evaluator::new(&client)
            .evaluate(&[], &rubric(&[10, 15]))
            .await
            .unwrap();
        assert_eq!(result.markdown_report, "# Code Structure Evaluation Report\n\n**Total Score:** 3/4");
        assert_eq!((result.score, result.max_score), (17, 25));
        assert_eq!(result.score_source, ScoreSource::Json);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_score_falls_back_to_rubric_maximum() {
        let client = CannedClient::replying("# Code Structure Evaluation Report\n\nNothing to score.");
        let result = Evaluator::new(&client)
            .evaluate(&[], &rubric(&[4, 5, 6]))
            .await
            .unwrap();
        assert_eq!((result.score, result.max_score), (0, 15));
        assert!(client.prompts.lock().unwrap()[0].contains("\"maxScore\": 15"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_heading_fails_evaluation() {
        let client = CannedClient::replying("I cannot evaluate this repository.");
        let err = Evaluator::new(&client)
            .evaluate(&[], &Rubric::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EvaluateError>(),
            Some(&EvaluateError::MissingReport)
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn client_errors_are_wrapped() {
        let client = CannedClient {
            reply: Err(anyhow::anyhow!("OpenAI API error (500 Internal Server Error): boom")),
            prompts: Mutex::new(Vec::new()),
        };
        let err = Evaluator::new(&client)
            .evaluate(&[], &Rubric::default())
            .await
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("evaluation request failed"));
        assert!(message.contains("500"));
        assert!(message.contains("boom"));
    }
}
