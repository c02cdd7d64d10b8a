//! Decision routing: priority level and response-time estimate.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::pipeline::types::{Issue, MaiScore, Recommendation, Urgency};

/// Operational priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PriorityLevel {
    #[serde(rename = "P0-CRITICAL")]
    P0Critical,
    #[serde(rename = "P1-HIGH")]
    P1High,
    #[serde(rename = "P2-MEDIUM")]
    P2Medium,
    #[serde(rename = "P3-LOW")]
    P3Low,
}

impl PriorityLevel {
    /// First matching rule wins.
    pub fn determine(total: u8, urgency: Urgency) -> Self {
        let high = urgency == Urgency::High;
        if total >= 35 && high {
            Self::P0Critical
        } else if total >= 25 || high {
            Self::P1High
        } else if total >= 15 {
            Self::P2Medium
        } else {
            Self::P3Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::P0Critical => "P0-CRITICAL",
            Self::P1High => "P1-HIGH",
            Self::P2Medium => "P2-MEDIUM",
            Self::P3Low => "P3-LOW",
        }
    }
}

impl std::fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Expected turnaround window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseWindow {
    #[serde(rename = "2-4 hours")]
    TwoToFourHours,
    #[serde(rename = "4-8 hours")]
    FourToEightHours,
    #[serde(rename = "8-24 hours")]
    EightToTwentyFourHours,
    #[serde(rename = "24-48 hours")]
    OneToTwoDays,
}

impl ResponseWindow {
    pub fn estimate(recommendation: Recommendation, urgency: Urgency) -> Self {
        match recommendation {
            Recommendation::Tier2HumanReview if urgency == Urgency::High => Self::TwoToFourHours,
            Recommendation::Tier2HumanReview => Self::FourToEightHours,
            Recommendation::EnhancedMonitoring => Self::EightToTwentyFourHours,
            Recommendation::DocumentationOnly => Self::OneToTwoDays,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TwoToFourHours => "2-4 hours",
            Self::FourToEightHours => "4-8 hours",
            Self::EightToTwentyFourHours => "8-24 hours",
            Self::OneToTwoDays => "24-48 hours",
        }
    }
}

impl std::fmt::Display for ResponseWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an issue goes and how fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub issue_id: Uuid,
    pub mai_score: u8,
    pub recommendation: Recommendation,
    pub priority: PriorityLevel,
    pub estimated_response_time: ResponseWindow,
}

/// Stateless router.
#[derive(Debug, Clone, Default)]
pub struct Router;

impl Router {
    pub fn new() -> Self {
        Self
    }

    /// Pure function of the score and the issue's urgency.
    pub fn route(&self, issue: &Issue, score: &MaiScore) -> RoutingDecision {
        let recommendation = score.recommendation();
        let decision = RoutingDecision {
            issue_id: issue.id,
            mai_score: score.total(),
            recommendation,
            priority: PriorityLevel::determine(score.total(), issue.urgency),
            estimated_response_time: ResponseWindow::estimate(recommendation, issue.urgency),
        };

        info!(
            issue_id = %issue.id,
            total = decision.mai_score,
            routing = %decision.recommendation,
            priority = %decision.priority,
            eta = %decision.estimated_response_time,
            "Issue routed"
        );

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_examples() {
        assert_eq!(PriorityLevel::determine(36, Urgency::High).label(), "P0-CRITICAL");
        assert_eq!(PriorityLevel::determine(26, Urgency::Low).label(), "P1-HIGH");
        assert_eq!(PriorityLevel::determine(20, Urgency::Low).label(), "P2-MEDIUM");
        assert_eq!(PriorityLevel::determine(5, Urgency::Low).label(), "P3-LOW");
    }

    #[test]
    fn priority_rule_order() {
        // high urgency alone lifts to P1 even with a tiny total
        assert_eq!(PriorityLevel::determine(3, Urgency::High), PriorityLevel::P1High);
        // 35+ without high urgency stays P1
        assert_eq!(PriorityLevel::determine(45, Urgency::Medium), PriorityLevel::P1High);
        assert_eq!(PriorityLevel::determine(35, Urgency::High), PriorityLevel::P0Critical);
        assert_eq!(PriorityLevel::determine(34, Urgency::High), PriorityLevel::P1High);
        assert_eq!(PriorityLevel::determine(24, Urgency::Medium), PriorityLevel::P2Medium);
        assert_eq!(PriorityLevel::determine(14, Urgency::Medium), PriorityLevel::P3Low);
    }

    #[test]
    fn response_windows() {
        use Recommendation::*;
        assert_eq!(ResponseWindow::estimate(Tier2HumanReview, Urgency::High).label(), "2-4 hours");
        assert_eq!(ResponseWindow::estimate(Tier2HumanReview, Urgency::Medium).label(), "4-8 hours");
        assert_eq!(ResponseWindow::estimate(EnhancedMonitoring, Urgency::High).label(), "8-24 hours");
        assert_eq!(ResponseWindow::estimate(DocumentationOnly, Urgency::High).label(), "24-48 hours");
    }

    #[test]
    fn route_combines_tier_priority_and_window() {
        let issue = Issue::new("t", "c", "s", Urgency::High);
        let score = MaiScore::new(12, 15, 10);
        let decision = Router::new().route(&issue, &score);

        assert_eq!(decision.mai_score, 37);
        assert_eq!(decision.recommendation, Recommendation::Tier2HumanReview);
        assert_eq!(decision.priority, PriorityLevel::P0Critical);
        assert_eq!(decision.estimated_response_time, ResponseWindow::TwoToFourHours);
    }

    #[test]
    fn route_is_idempotent() {
        let router = Router::new();
        let issue = Issue::new("t", "c", "s", Urgency::Medium);
        let score = MaiScore::new(6, 10, 8);
        assert_eq!(router.route(&issue, &score), router.route(&issue, &score));
    }

    #[test]
    fn decision_serializes_labels() {
        let issue = Issue::new("t", "c", "s", Urgency::Low);
        let decision = Router::new().route(&issue, &MaiScore::new(0, 5, 8));
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["priority"], "P3-LOW");
        assert_eq!(json["estimated_response_time"], "24-48 hours");
        assert_eq!(json["recommendation"], "documentation_only");
    }
}
