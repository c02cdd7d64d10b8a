//! Channel conflict detection and the Lightning Protocol.
//!
//! A new issue conflicts with planned content scheduled within the conflict
//! window of "now" (either direction). Severity and the resulting decision
//! are pure functions of the inputs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{RESOLUTION_TIMEOUT, ResponseConfig};
use crate::pipeline::source::ScheduleSource;
use crate::pipeline::types::{ContentPriority, Issue, ScheduledItem, Urgency};

/// Severity points for high-priority scheduled content.
const HIGH_PRIORITY_POINTS: u8 = 2;
/// Severity points for a high-urgency issue.
const HIGH_URGENCY_POINTS: u8 = 3;
/// Severity score at which a conflict becomes critical.
const CRITICAL_THRESHOLD: u8 = 4;

/// How bad a collision is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Moderate,
    Critical,
}

impl Severity {
    pub fn from_score(score: u8) -> Self {
        if score >= CRITICAL_THRESHOLD {
            Self::Critical
        } else {
            Self::Moderate
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Moderate => "MODERATE",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Accumulated severity score for an issue colliding with scheduled content.
pub fn severity_score(priority: ContentPriority, urgency: Urgency) -> u8 {
    let mut score = 0;
    if priority == ContentPriority::High {
        score += HIGH_PRIORITY_POINTS;
    }
    if urgency == Urgency::High {
        score += HIGH_URGENCY_POINTS;
    }
    score
}

/// An issue colliding with a scheduled communication.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub issue_urgency: Urgency,
    pub scheduled: ScheduledItem,
    pub severity_score: u8,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
}

/// What to do about a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionAction {
    /// Publish the response now, segmenting the audience and staggering sends.
    SegmentAndStagger,
    /// Push the scheduled content back.
    DelaySecondary,
}

impl ResolutionAction {
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Self::SegmentAndStagger,
            Severity::Moderate => Self::DelaySecondary,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SegmentAndStagger => "segment and stagger audience",
            Self::DelaySecondary => "delay secondary content",
        }
    }

    pub fn rationale(&self) -> &'static str {
        match self {
            Self::SegmentAndStagger => {
                "High-priority issue requires immediate response with audience segmentation."
            }
            Self::DelaySecondary => "Delay scheduled content to avoid message collision.",
        }
    }
}

/// Outcome of the Lightning Protocol for one conflict.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub conflict_id: Uuid,
    pub issue_id: Uuid,
    pub severity: Severity,
    pub action: ResolutionAction,
    pub rationale: &'static str,
    pub resolved_at: DateTime<Utc>,
    /// Budget for any human escalation that follows this decision.
    pub timeout_budget: Duration,
    /// Detection time plus the budget.
    pub escalation_deadline: DateTime<Utc>,
}

/// Detects schedule collisions and decides how to resolve them.
pub struct ConflictResolver {
    schedule: Arc<dyn ScheduleSource>,
    window: chrono::Duration,
    timeout_budget: Duration,
}

impl ConflictResolver {
    pub fn new(schedule: Arc<dyn ScheduleSource>, config: &ResponseConfig) -> Self {
        Self {
            schedule,
            window: config.conflict_window,
            timeout_budget: RESOLUTION_TIMEOUT,
        }
    }

    /// Most severe conflict for `issue` as of now, if any.
    pub fn detect_conflict(&self, issue: &Issue) -> Option<Conflict> {
        self.detect_conflict_at(issue, Utc::now())
    }

    /// Most severe conflict for `issue` as of `now`. Ties go to the item
    /// closest in time.
    pub fn detect_conflict_at(&self, issue: &Issue, now: DateTime<Utc>) -> Option<Conflict> {
        self.detect_conflicts_at(issue, now).into_iter().next()
    }

    /// All conflicts for `issue` as of `now`, most severe first.
    pub fn detect_conflicts_at(&self, issue: &Issue, now: DateTime<Utc>) -> Vec<Conflict> {
        let mut hits: Vec<(chrono::Duration, Conflict)> = self
            .schedule
            .upcoming()
            .into_iter()
            .filter_map(|item| {
                let distance = (item.scheduled_time - now).abs();
                if distance >= self.window {
                    return None;
                }
                let score = severity_score(item.priority, issue.urgency);
                Some((
                    distance,
                    Conflict {
                        id: Uuid::new_v4(),
                        issue_id: issue.id,
                        issue_urgency: issue.urgency,
                        scheduled: item,
                        severity_score: score,
                        severity: Severity::from_score(score),
                        detected_at: now,
                    },
                ))
            })
            .collect();

        hits.sort_by(|(da, a), (db, b)| b.severity_score.cmp(&a.severity_score).then(da.cmp(db)));

        for (distance, conflict) in &hits {
            debug!(
                issue_id = %issue.id,
                scheduled = %conflict.scheduled.title,
                minutes_apart = distance.num_minutes(),
                severity = conflict.severity.label(),
                "Channel conflict detected"
            );
        }

        hits.into_iter().map(|(_, c)| c).collect()
    }

    /// Apply the Lightning Protocol. The action depends on severity alone.
    pub fn resolve(&self, conflict: &Conflict) -> Resolution {
        let action = ResolutionAction::for_severity(conflict.severity);
        let budget = chrono::Duration::from_std(self.timeout_budget)
            .unwrap_or_else(|_| chrono::Duration::seconds(900));

        info!(
            conflict_id = %conflict.id,
            issue_id = %conflict.issue_id,
            severity = conflict.severity.label(),
            action = action.label(),
            "Lightning protocol decision"
        );

        Resolution {
            conflict_id: conflict.id,
            issue_id: conflict.issue_id,
            severity: conflict.severity,
            action,
            rationale: action.rationale(),
            resolved_at: Utc::now(),
            timeout_budget: self.timeout_budget,
            escalation_deadline: conflict.detected_at + budget,
        }
    }
}
