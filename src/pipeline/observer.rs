//! Pipeline observers: narration and metrics hooks kept out of the logic.

use tracing::info;

use crate::pipeline::conflict::Resolution;
use crate::pipeline::orchestrator::CycleReport;
use crate::pipeline::router::RoutingDecision;
use crate::pipeline::types::{Issue, MaiScore};

/// Receives pipeline events. Every hook defaults to a no-op.
pub trait PipelineObserver: Send + Sync {
    fn on_issue_scored(&self, _issue: &Issue, _score: &MaiScore) {}

    fn on_conflict_resolved(&self, _issue: &Issue, _resolution: &Resolution) {}

    fn on_issue_routed(&self, _issue: &Issue, _decision: &RoutingDecision) {}

    fn on_cycle_complete(&self, _report: &CycleReport) {}
}

/// Narrates the cycle through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_issue_scored(&self, issue: &Issue, score: &MaiScore) {
        info!(
            title = %issue.title,
            source = %issue.source,
            total = score.total(),
            recommendation = %score.recommendation(),
            "Analyzed issue"
        );
    }

    fn on_conflict_resolved(&self, issue: &Issue, resolution: &Resolution) {
        info!(
            title = %issue.title,
            severity = resolution.severity.label(),
            action = resolution.action.label(),
            rationale = resolution.rationale,
            "Lightning protocol resolved channel conflict"
        );
    }

    fn on_issue_routed(&self, issue: &Issue, decision: &RoutingDecision) {
        info!(
            title = %issue.title,
            priority = %decision.priority,
            eta = %decision.estimated_response_time,
            "Routing decision"
        );
    }

    fn on_cycle_complete(&self, report: &CycleReport) {
        info!(
            detected = report.issues_detected,
            processed = report.issues_processed.len(),
            conflicts = report.conflicts_resolved.len(),
            elapsed_ms = report.total_cycle_time.as_millis() as u64,
            "Cycle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::router::Router;
    use crate::pipeline::types::Urgency;

    #[test]
    fn default_hooks_are_no_ops() {
        struct Silent;
        impl PipelineObserver for Silent {}

        let issue = Issue::new("t", "c", "s", Urgency::Low);
        let score = MaiScore::new(1, 5, 8);
        let decision = Router::new().route(&issue, &score);
        Silent.on_issue_scored(&issue, &score);
        Silent.on_issue_routed(&issue, &decision);
        TracingObserver.on_issue_scored(&issue, &score);
        TracingObserver.on_issue_routed(&issue, &decision);
    }
}
