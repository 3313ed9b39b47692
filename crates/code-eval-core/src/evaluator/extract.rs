use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::EvaluateError;

/// Heading every generated report starts with.
pub const REPORT_HEADING: &str = "# Code Structure Evaluation Report";

static REPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?sm)^(# Code Structure Evaluation Report.*?)(?:\n\s*\n\s*PART 2:|\z)")
        .expect("report pattern is valid")
});
static SCORE_JSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\s*"score"\s*:\s*\d+\s*,\s*"maxScore"\s*:\s*\d+\s*\}"#)
        .expect("score JSON pattern is valid")
});
static TOTAL_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*Total Score:\*\*\s*(\d+)\s*/\s*(\d+)").expect("total score pattern is valid")
});

/// Extract the markdown report block from a model reply.
///
/// The block runs from [`REPORT_HEADING`] at the start of a line to a
/// blank-line-delimited `PART 2:` marker, or to the end of the reply when no
/// marker follows.
pub fn extract_report(reply: &str) -> Result<String, EvaluateError> {
    let captures = REPORT_RE
        .captures(reply)
        .ok_or(EvaluateError::MissingReport)?;
    Ok(captures[1].trim_end().to_string())
}

/// Which strategy produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Json,
    TotalScoreLine,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub score: u32,
    pub max_score: u32,
    pub source: ScoreSource,
}

/// What to do when no strategy finds a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingScorePolicy {
    /// Succeed with a score of 0 out of the rubric maximum.
    #[default]
    ReportZero,
    /// Treat the missing score as a fatal evaluation error.
    Fail,
}

/// One way of reading a score out of a model reply.
pub trait ScoreStrategy: Send + Sync {
    fn source(&self) -> ScoreSource;

    /// Return `(score, max_score)` if this strategy recognises one.
    fn extract(&self, reply: &str, report: &str) -> Option<(u32, u32)>;
}

/// The last `{"score": N, "maxScore": M}` object anywhere in the reply.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonScoreStrategy;

impl ScoreStrategy for JsonScoreStrategy {
    fn source(&self) -> ScoreSource {
        ScoreSource::Json
    }

    fn extract(&self, reply: &str, _report: &str) -> Option<(u32, u32)> {
        let fragment = SCORE_JSON_RE.find_iter(reply).last()?;
        match serde_json::from_str::<ScorePayload>(fragment.as_str()) {
            Ok(payload) => Some((payload.score, payload.max_score)),
            Err(err) => {
                debug!(error = %err, fragment = fragment.as_str(), "score JSON did not parse");
                None
            }
        }
    }
}

/// A `**Total Score:** N/M` line inside the markdown report.
#[derive(Debug, Default, Clone, Copy)]
pub struct TotalScoreLineStrategy;

impl ScoreStrategy for TotalScoreLineStrategy {
    fn source(&self) -> ScoreSource {
        ScoreSource::TotalScoreLine
    }

    fn extract(&self, _reply: &str, report: &str) -> Option<(u32, u32)> {
        let captures = TOTAL_SCORE_RE.captures(report)?;
        let score = captures[1].parse().ok()?;
        let max_score = captures[2].parse().ok()?;
        Some((score, max_score))
    }
}

#[derive(Deserialize)]
struct ScorePayload {
    score: u32,
    #[serde(rename = "maxScore")]
    max_score: u32,
}

/// Ordered chain of score strategies followed by the missing-score policy.
pub struct ScoreExtractor {
    strategies: Vec<Box<dyn ScoreStrategy>>,
    policy: MissingScorePolicy,
}

impl Default for ScoreExtractor {
    fn default() -> Self {
        Self::new(MissingScorePolicy::default())
    }
}

impl ScoreExtractor {
    pub fn new(policy: MissingScorePolicy) -> Self {
        Self {
            strategies: vec![
                Box::new(JsonScoreStrategy),
                Box::new(TotalScoreLineStrategy),
            ],
            policy,
        }
    }

    pub fn extract(
        &self,
        reply: &str,
        report: &str,
        max_possible_score: u32,
    ) -> Result<ScoreOutcome, EvaluateError> {
        for strategy in &self.strategies {
            if let Some((score, max_score)) = strategy.extract(reply, report) {
                debug!(source = ?strategy.source(), score, max_score, "score extracted");
                return Ok(ScoreOutcome {
                    score,
                    max_score,
                    source: strategy.source(),
                });
            }
        }
        match self.policy {
            MissingScorePolicy::ReportZero => {
                warn!(
                    max_possible_score,
                    "no score found in model reply; reporting 0"
                );
                Ok(ScoreOutcome {
                    score: 0,
                    max_score: max_possible_score,
                    source: ScoreSource::Default,
                })
            }
            MissingScorePolicy::Fail => Err(EvaluateError::MissingScore),
        }
    }
}
