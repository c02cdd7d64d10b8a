//! MAI scorer: mission alignment, impact and risk sub-scores.
//!
//! Each dimension is asked of the scoring model first. Any failure
//! (transport, unparseable answer, out-of-range value) falls back to a
//! deterministic heuristic for that dimension only. Scoring never fails.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{Manifesto, ResponseConfig};
use crate::error::ScoringError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::history::{DecisionHistory, DecisionRecord, ScoreProvenance, ScoreSource};
use crate::pipeline::keywords::MISSION;
use crate::pipeline::types::{Issue, MAX_SUB_SCORE, MaiScore, Urgency, clamp_sub_score};

/// Points per mission keyword hit in the fallback.
const MISSION_POINTS_PER_HIT: usize = 3;

/// Fallback risk sub-score (medium-low risk).
const FALLBACK_RISK: u8 = 8;

/// Content is truncated to this many chars in prompts.
const PROMPT_CONTENT_CHARS: usize = 2000;

/// The three scored dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mission,
    Impact,
    Risk,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mission => "mission",
            Self::Impact => "impact",
            Self::Risk => "risk",
        }
    }
}

/// Computes MAI scores and records every decision.
pub struct Scorer {
    llm: Option<Arc<dyn LlmProvider>>,
    manifesto: Manifesto,
    history: Arc<DecisionHistory>,
    max_tokens: u32,
    temperature: f32,
}

impl Scorer {
    /// Create a scorer. With `llm = None` every sub-score uses the heuristic.
    pub fn new(
        manifesto: Manifesto,
        llm: Option<Arc<dyn LlmProvider>>,
        history: Arc<DecisionHistory>,
        config: &ResponseConfig,
    ) -> Self {
        Self {
            llm,
            manifesto,
            history,
            max_tokens: config.scoring_max_tokens,
            temperature: config.scoring_temperature,
        }
    }

    pub fn history(&self) -> &Arc<DecisionHistory> {
        &self.history
    }

    /// Score an issue on all three dimensions and append the decision to the
    /// history.
    pub async fn score(&self, issue: &Issue) -> MaiScore {
        let (mission, mission_source) = self.score_dimension(Dimension::Mission, issue).await;
        let (impact, impact_source) = self.score_dimension(Dimension::Impact, issue).await;
        let (risk, risk_source) = self.score_dimension(Dimension::Risk, issue).await;

        let score = MaiScore::new(mission.into(), impact.into(), risk.into());
        let provenance = ScoreProvenance {
            mission: mission_source,
            impact: impact_source,
            risk: risk_source,
        };

        self.history
            .record(DecisionRecord {
                issue_id: issue.id,
                recorded_at: Utc::now(),
                score,
                provenance,
            })
            .await;

        info!(
            issue_id = %issue.id,
            total = score.total(),
            mission = score.mission_alignment(),
            impact = score.impact_growth(),
            risk = score.risk_evaluation(),
            fallbacks = provenance.fallback_count(),
            recommendation = %score.recommendation(),
            "Issue scored"
        );

        score
    }

    async fn score_dimension(&self, dimension: Dimension, issue: &Issue) -> (u8, ScoreSource) {
        let Some(llm) = &self.llm else {
            return (fallback_score(dimension, issue), ScoreSource::Fallback);
        };

        match self.ask_model(llm.as_ref(), dimension, issue).await {
            Ok(value) => {
                debug!(
                    issue_id = %issue.id,
                    dimension = dimension.label(),
                    value,
                    "Sub-score from model"
                );
                (value, ScoreSource::Model)
            }
            Err(e) => {
                let value = fallback_score(dimension, issue);
                warn!(
                    issue_id = %issue.id,
                    dimension = dimension.label(),
                    error = %e,
                    fallback = value,
                    "Scoring model unavailable for dimension, using heuristic"
                );
                (value, ScoreSource::Fallback)
            }
        }
    }

    async fn ask_model(
        &self,
        llm: &dyn LlmProvider,
        dimension: Dimension,
        issue: &Issue,
    ) -> Result<u8, ScoringError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_scoring_system_prompt()),
            ChatMessage::user(build_dimension_prompt(dimension, issue, &self.manifesto)),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = llm.complete(request).await?;
        parse_sub_score(&response.content)
    }
}

// ── Heuristics ──────────────────────────────────────────────────────

/// Deterministic local score for one dimension.
pub fn fallback_score(dimension: Dimension, issue: &Issue) -> u8 {
    match dimension {
        Dimension::Mission => {
            let hits = MISSION.hits(&issue.searchable_text());
            clamp_sub_score((hits * MISSION_POINTS_PER_HIT) as i64)
        }
        Dimension::Impact => match issue.urgency {
            Urgency::Low => 5,
            Urgency::Medium => 10,
            Urgency::High => 15,
        },
        Dimension::Risk => FALLBACK_RISK,
    }
}

// ── Response parsing ────────────────────────────────────────────────

/// Parse the model's answer: the first whitespace-separated token must be an
/// integer in `0..=15`.
pub fn parse_sub_score(raw: &str) -> Result<u8, ScoringError> {
    let token = raw.split_whitespace().next().ok_or_else(|| ScoringError::Unparseable {
        raw: raw.to_string(),
    })?;

    let value: i64 = token.parse().map_err(|_| ScoringError::Unparseable {
        raw: raw.to_string(),
    })?;

    if !(0..=i64::from(MAX_SUB_SCORE)).contains(&value) {
        return Err(ScoringError::OutOfRange { value });
    }
    Ok(clamp_sub_score(value))
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_scoring_system_prompt() -> String {
    "You score issues for a mission-driven organization's rapid response team.\n\
     Respond with ONLY one integer from 0 to 15. No words, no punctuation."
        .to_string()
}

fn build_dimension_prompt(dimension: Dimension, issue: &Issue, manifesto: &Manifesto) -> String {
    let content: String = issue.content.chars().take(PROMPT_CONTENT_CHARS).collect();
    let mut prompt = format!("Issue: {}\nContent: {}\n\n", issue.title, content);

    match dimension {
        Dimension::Mission => {
            prompt.push_str(&format!(
                "Core principles: {}\nStrategic priorities: {}\n\n",
                manifesto.core_principles.join(", "),
                manifesto.strategic_priorities.join(", "),
            ));
            prompt.push_str(
                "Score mission alignment from 0 to 15:\n\
                 - 0-5: tangentially related\n\
                 - 6-10: clearly relevant\n\
                 - 11-15: directly impacts the core mission",
            );
        }
        Dimension::Impact => {
            prompt.push_str(
                "Score impact potential from 0 to 15. Consider community growth, \
                 reach, and whether engagement can be sustained.",
            );
        }
        Dimension::Risk => {
            prompt.push_str(
                "Score risk from 0 to 15 where a HIGHER score means LOWER risk. \
                 Consider stakeholder perception and reputational exposure.",
            );
        }
    }

    prompt
}
