//! Orchestrator: runs score → conflict check → route for each issue.
//!
//! Issues are handled one at a time in arrival order. Nothing in a cycle
//! can fail: the scorer degrades to heuristics on its own, and a missing
//! conflict is just `None`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ResponseConfig;
use crate::error::PipelineError;
use crate::pipeline::conflict::{ConflictResolver, Resolution};
use crate::pipeline::observer::PipelineObserver;
use crate::pipeline::router::{Router, RoutingDecision};
use crate::pipeline::scorer::Scorer;
use crate::pipeline::source::IssueSource;
use crate::pipeline::types::{Issue, MaiScore};

/// Result of running one issue through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedIssue {
    pub issue: Issue,
    pub score: MaiScore,
    pub routing: RoutingDecision,
    /// Set when the issue collided with scheduled content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_id: Option<Uuid>,
}

/// Everything one cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub issues_detected: usize,
    pub issues_processed: Vec<ProcessedIssue>,
    pub conflicts_resolved: Vec<Resolution>,
    pub total_cycle_time: Duration,
}

/// Running totals across cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemMetrics {
    pub cycles: u64,
    pub issues_processed: u64,
    pub conflicts_resolved: u64,
}

#[derive(Debug, Default)]
struct MetricCounters {
    cycles: AtomicU64,
    issues_processed: AtomicU64,
    conflicts_resolved: AtomicU64,
}

/// Sequences the scorer, conflict resolver and router.
pub struct Orchestrator {
    scorer: Scorer,
    conflicts: ConflictResolver,
    router: Router,
    observers: Vec<Arc<dyn PipelineObserver>>,
    max_batch_size: usize,
    metrics: MetricCounters,
}

impl Orchestrator {
    pub fn new(scorer: Scorer, conflicts: ConflictResolver, config: &ResponseConfig) -> Self {
        Self {
            scorer,
            conflicts,
            router: Router::new(),
            observers: Vec::new(),
            max_batch_size: config.max_batch_size,
            metrics: MetricCounters::default(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn metrics(&self) -> SystemMetrics {
        SystemMetrics {
            cycles: self.metrics.cycles.load(Ordering::Relaxed),
            issues_processed: self.metrics.issues_processed.load(Ordering::Relaxed),
            conflicts_resolved: self.metrics.conflicts_resolved.load(Ordering::Relaxed),
        }
    }

    /// Pull one batch from `source` and process it.
    ///
    /// Only the fetch can fail; processing itself never does.
    pub async fn run_cycle(&self, source: &dyn IssueSource) -> Result<CycleReport, PipelineError> {
        info!(source = source.name(), "Starting rapid response cycle");
        let issues = source.next_batch().await?;
        Ok(self.process_cycle(issues).await)
    }

    /// Process up to `max_batch_size` issues in order and report.
    pub async fn process_cycle(&self, issues: Vec<Issue>) -> CycleReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let issues_detected = issues.len();

        if issues_detected > self.max_batch_size {
            debug!(
                detected = issues_detected,
                limit = self.max_batch_size,
                "Batch exceeds limit, extra issues left unprocessed"
            );
        }

        let mut issues_processed = Vec::with_capacity(issues_detected.min(self.max_batch_size));
        let mut conflicts_resolved = Vec::new();

        for issue in issues.into_iter().take(self.max_batch_size) {
            let (processed, resolution) = self.process_issue(issue).await;
            issues_processed.push(processed);
            conflicts_resolved.extend(resolution);
        }

        let report = CycleReport {
            started_at,
            issues_detected,
            issues_processed,
            conflicts_resolved,
            total_cycle_time: clock.elapsed(),
        };

        self.metrics.cycles.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .issues_processed
            .fetch_add(report.issues_processed.len() as u64, Ordering::Relaxed);
        self.metrics
            .conflicts_resolved
            .fetch_add(report.conflicts_resolved.len() as u64, Ordering::Relaxed);

        for observer in &self.observers {
            observer.on_cycle_complete(&report);
        }
        report
    }

    /// Run a single issue through score → conflict → route.
    pub async fn process_issue(&self, mut issue: Issue) -> (ProcessedIssue, Option<Resolution>) {
        let score = self.scorer.score(&issue).await;
        issue.attach_score(score);
        for observer in &self.observers {
            observer.on_issue_scored(&issue, &score);
        }

        let resolution = self.conflicts.detect_conflict(&issue).map(|conflict| {
            let resolution = self.conflicts.resolve(&conflict);
            for observer in &self.observers {
                observer.on_conflict_resolved(&issue, &resolution);
            }
            resolution
        });

        let routing = self.router.route(&issue, &score);
        issue.mark_routed();
        for observer in &self.observers {
            observer.on_issue_routed(&issue, &routing);
        }

        let processed = ProcessedIssue {
            conflict_id: resolution.as_ref().map(|r| r.conflict_id),
            issue,
            score,
            routing,
        };
        (processed, resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::config::Manifesto;
    use crate::pipeline::history::DecisionHistory;
    use crate::pipeline::router::PriorityLevel;
    use crate::pipeline::source::{StaticIssueSource, StaticSchedule};
    use crate::pipeline::types::{IssueStatus, Urgency};

    fn orchestrator(schedule: StaticSchedule) -> Orchestrator {
        let config = ResponseConfig::default();
        let scorer = Scorer::new(Manifesto::sample(), None, DecisionHistory::new(32), &config);
        let conflicts = ConflictResolver::new(Arc::new(schedule), &config);
        Orchestrator::new(scorer, conflicts, &config)
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl PipelineObserver for RecordingObserver {
        fn on_issue_scored(&self, issue: &Issue, _score: &MaiScore) {
            self.events.lock().unwrap().push(format!("scored:{}", issue.title));
        }
        fn on_conflict_resolved(&self, issue: &Issue, _resolution: &Resolution) {
            self.events.lock().unwrap().push(format!("conflict:{}", issue.title));
        }
        fn on_issue_routed(&self, issue: &Issue, _decision: &RoutingDecision) {
            self.events.lock().unwrap().push(format!("routed:{}", issue.title));
        }
        fn on_cycle_complete(&self, _report: &CycleReport) {
            self.events.lock().unwrap().push("done".into());
        }
    }

    #[tokio::test]
    async fn batch_is_capped_and_counted() {
        let orchestrator = orchestrator(StaticSchedule::default());
        let issues = (0..5)
            .map(|i| Issue::new(format!("issue {i}"), "body", "feed", Urgency::Low))
            .collect();

        let report = orchestrator.process_cycle(issues).await;
        assert_eq!(report.issues_detected, 5);
        assert_eq!(report.issues_processed.len(), 3);
        assert!(report.conflicts_resolved.is_empty());
        assert_eq!(report.issues_processed[0].issue.title, "issue 0");
        assert_eq!(report.issues_processed[2].issue.title, "issue 2");
    }

    #[tokio::test]
    async fn processed_issues_are_scored_and_routed() {
        let orchestrator = orchestrator(StaticSchedule::default());
        let issue = Issue::new(
            "Privacy and security failure",
            "Users exposed",
            "feed",
            Urgency::High,
        );

        let report = orchestrator.process_cycle(vec![issue]).await;
        let processed = &report.issues_processed[0];
        assert_eq!(processed.issue.status, IssueStatus::Routed);
        assert_eq!(processed.issue.mai_score, Some(processed.score));
        assert_eq!(processed.score.total(), 29);
        assert_eq!(processed.routing.priority, PriorityLevel::P1High);
        assert!(processed.conflict_id.is_none());
    }

    #[tokio::test]
    async fn conflicts_are_resolved_and_linked() {
        let orchestrator = orchestrator(StaticSchedule::year_end_campaign(Utc::now()));
        let issues = vec![
            Issue::new("a", "b", "c", Urgency::High),
            Issue::new("d", "e", "f", Urgency::Low),
        ];

        let report = orchestrator.process_cycle(issues).await;
        assert_eq!(report.conflicts_resolved.len(), 2);
        assert_eq!(
            report.issues_processed[0].conflict_id,
            Some(report.conflicts_resolved[0].conflict_id)
        );
        assert_eq!(
            report.conflicts_resolved[0].action.label(),
            "segment and stagger audience"
        );
        assert_eq!(
            report.conflicts_resolved[1].action.label(),
            "delay secondary content"
        );
    }

    #[tokio::test]
    async fn observers_see_events_in_pipeline_order() {
        let observer = Arc::new(RecordingObserver::default());
        let orchestrator = orchestrator(StaticSchedule::year_end_campaign(Utc::now()))
            .with_observer(observer.clone());

        orchestrator
            .process_cycle(vec![Issue::new("x", "y", "z", Urgency::Medium)])
            .await;

        let events = observer.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["scored:x", "conflict:x", "routed:x", "done"]
        );
    }

    #[tokio::test]
    async fn metrics_accumulate_across_cycles() {
        let orchestrator = orchestrator(StaticSchedule::year_end_campaign(Utc::now()));
        orchestrator
            .process_cycle(vec![Issue::new("a", "b", "c", Urgency::Low)])
            .await;
        orchestrator
            .process_cycle(vec![
                Issue::new("d", "e", "f", Urgency::Low),
                Issue::new("g", "h", "i", Urgency::Low),
            ])
            .await;

        let metrics = orchestrator.metrics();
        assert_eq!(metrics.cycles, 2);
        assert_eq!(metrics.issues_processed, 3);
        assert_eq!(metrics.conflicts_resolved, 3);
        assert_eq!(orchestrator.scorer().history().len().await, 3);
    }

    #[tokio::test]
    async fn run_cycle_pulls_from_source() {
        let orchestrator = orchestrator(StaticSchedule::default());
        let source = StaticIssueSource::sample();

        let report = orchestrator.run_cycle(&source).await.unwrap();
        assert_eq!(report.issues_detected, 3);
        assert_eq!(report.issues_processed.len(), 3);

        let report = orchestrator.run_cycle(&source).await.unwrap();
        assert_eq!(report.issues_detected, 0);
    }

    #[tokio::test]
    async fn empty_cycle_still_reports() {
        let orchestrator = orchestrator(StaticSchedule::default());
        let report = orchestrator.process_cycle(Vec::new()).await;
        assert_eq!(report.issues_detected, 0);
        assert!(report.issues_processed.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["issues_detected"], 0);
    }
}
