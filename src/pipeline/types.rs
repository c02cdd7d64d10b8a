//! Shared types for the rapid response pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

// ── Urgency & status ────────────────────────────────────────────────

/// How urgent the ingestion side judged an issue to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = PipelineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(PipelineError::InvalidUrgency(s.to_string())),
        }
    }
}

/// Lifecycle of an issue inside the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Detected,
    Scored,
    Routed,
}

// ── Issue ───────────────────────────────────────────────────────────

/// A detected item that may need a rapid response.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Where the issue was seen (blog, journal, feed name).
    pub source: String,
    pub urgency: Urgency,
    pub detected_at: DateTime<Utc>,
    pub status: IssueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mai_score: Option<MaiScore>,
}

impl Issue {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        urgency: Urgency,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            source: source.into(),
            urgency,
            detected_at: Utc::now(),
            status: IssueStatus::Detected,
            mai_score: None,
        }
    }

    /// Title and body joined into one haystack for keyword checks.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }

    /// Attach a computed score.
    pub fn attach_score(&mut self, score: MaiScore) {
        self.mai_score = Some(score);
        self.status = IssueStatus::Scored;
    }

    pub fn mark_routed(&mut self) {
        self.status = IssueStatus::Routed;
    }
}

/// Issue as delivered by an ingestion collaborator, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
}

impl IssueRecord {
    pub fn new(title: &str, content: &str, source: &str, urgency: &str) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            source: Some(source.into()),
            urgency: Some(urgency.into()),
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, PipelineError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(PipelineError::InvalidIssue { field })
}

impl TryFrom<IssueRecord> for Issue {
    type Error = PipelineError;

    fn try_from(record: IssueRecord) -> Result<Self, Self::Error> {
        let title = required(record.title, "title")?;
        let content = required(record.content, "content")?;
        let source = required(record.source, "source")?;
        let urgency = match record.urgency.filter(|u| !u.trim().is_empty()) {
            Some(label) => label.parse()?,
            None => Urgency::Medium,
        };
        Ok(Issue::new(title, content, source, urgency))
    }
}

// ── MAI score ───────────────────────────────────────────────────────

/// Highest value a single sub-score may take.
pub const MAX_SUB_SCORE: u8 = 15;

/// Mission / Impact / Risk score.
///
/// Sub-scores are clamped to `0..=15` on construction, so `total` is always
/// their sum and lies in `0..=45`. A higher risk sub-score means lower risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MaiScore {
    mission_alignment: u8,
    impact_growth: u8,
    risk_evaluation: u8,
    total: u8,
}

impl MaiScore {
    pub fn new(mission_alignment: i64, impact_growth: i64, risk_evaluation: i64) -> Self {
        let mission_alignment = clamp_sub_score(mission_alignment);
        let impact_growth = clamp_sub_score(impact_growth);
        let risk_evaluation = clamp_sub_score(risk_evaluation);
        Self {
            mission_alignment,
            impact_growth,
            risk_evaluation,
            total: mission_alignment + impact_growth + risk_evaluation,
        }
    }

    pub fn mission_alignment(&self) -> u8 {
        self.mission_alignment
    }

    pub fn impact_growth(&self) -> u8 {
        self.impact_growth
    }

    pub fn risk_evaluation(&self) -> u8 {
        self.risk_evaluation
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::from_total(self.total)
    }
}

/// Clamp any raw value into the sub-score range.
pub fn clamp_sub_score(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_SUB_SCORE)) as u8
}

/// Response tier derived from a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    DocumentationOnly,
    EnhancedMonitoring,
    Tier2HumanReview,
}

impl Recommendation {
    pub fn from_total(total: u8) -> Self {
        match total {
            30.. => Self::Tier2HumanReview,
            15..=29 => Self::EnhancedMonitoring,
            _ => Self::DocumentationOnly,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DocumentationOnly => "documentation only",
            Self::EnhancedMonitoring => "enhanced monitoring",
            Self::Tier2HumanReview => "tier-2 human review",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Scheduled content ───────────────────────────────────────────────

/// Priority of a planned communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentPriority {
    Low,
    Medium,
    High,
}

/// A communication already on the calendar (newsletter, fundraising email).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub id: Uuid,
    /// e.g. "fundraising_email".
    pub kind: String,
    pub title: String,
    pub scheduled_time: DateTime<Utc>,
    pub priority: ContentPriority,
}

impl ScheduledItem {
    pub fn new(
        kind: impl Into<String>,
        title: impl Into<String>,
        scheduled_time: DateTime<Utc>,
        priority: ContentPriority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            title: title.into(),
            scheduled_time,
            priority,
        }
    }
}
