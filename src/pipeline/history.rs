//! Decision history: bounded, append-only log of scoring decisions.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::types::MaiScore;

/// Where a sub-score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Model,
    Fallback,
}

/// Provenance of each sub-score in one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreProvenance {
    pub mission: ScoreSource,
    pub impact: ScoreSource,
    pub risk: ScoreSource,
}

impl ScoreProvenance {
    pub fn all(source: ScoreSource) -> Self {
        Self {
            mission: source,
            impact: source,
            risk: source,
        }
    }

    /// Number of sub-scores that fell back to the heuristic.
    pub fn fallback_count(&self) -> usize {
        [self.mission, self.impact, self.risk]
            .iter()
            .filter(|s| **s == ScoreSource::Fallback)
            .count()
    }
}

/// One scoring decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub issue_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub score: MaiScore,
    pub provenance: ScoreProvenance,
}

/// Aggregate view over the retained history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySummary {
    pub count: usize,
    pub average_total: f64,
    /// Share of all sub-scores that came from the heuristic (0.0-1.0).
    pub fallback_rate: f64,
}

/// Bounded decision log shared between the scorer and whoever inspects it.
///
/// Once `capacity` records are held, each new record evicts the oldest.
pub struct DecisionHistory {
    records: RwLock<VecDeque<DecisionRecord>>,
    capacity: usize,
}

impl DecisionHistory {
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            records: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn record(&self, record: DecisionRecord) {
        let mut records = self.records.write().await;
        if records.len() == self.capacity {
            if let Some(evicted) = records.pop_front() {
                debug!(issue_id = %evicted.issue_id, "Evicting oldest decision record");
            }
        }
        records.push_back(record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All retained records, oldest first.
    pub async fn snapshot(&self) -> Vec<DecisionRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    /// The newest `n` records, oldest first.
    pub async fn recent(&self, n: usize) -> Vec<DecisionRecord> {
        let records = self.records.read().await;
        let skip = records.len().saturating_sub(n);
        records.iter().skip(skip).cloned().collect()
    }

    pub async fn summary(&self) -> HistorySummary {
        let records = self.records.read().await;
        let count = records.len();
        if count == 0 {
            return HistorySummary {
                count: 0,
                average_total: 0.0,
                fallback_rate: 0.0,
            };
        }

        let total: u64 = records.iter().map(|r| u64::from(r.score.total())).sum();
        let fallbacks: usize = records.iter().map(|r| r.provenance.fallback_count()).sum();

        HistorySummary {
            count,
            average_total: total as f64 / count as f64,
            fallback_rate: fallbacks as f64 / (count * 3) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(total_parts: (i64, i64, i64), source: ScoreSource) -> DecisionRecord {
        DecisionRecord {
            issue_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            score: MaiScore::new(total_parts.0, total_parts.1, total_parts.2),
            provenance: ScoreProvenance::all(source),
        }
    }

    #[tokio::test]
    async fn records_are_appended_in_order() {
        let history = DecisionHistory::new(10);
        let first = record((1, 1, 1), ScoreSource::Model);
        let second = record((2, 2, 2), ScoreSource::Model);
        let first_id = first.issue_id;

        history.record(first).await;
        history.record(second).await;

        let snapshot = history.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].issue_id, first_id);
    }

    #[tokio::test]
    async fn oldest_record_evicted_at_capacity() {
        let history = DecisionHistory::new(2);
        let first = record((1, 1, 1), ScoreSource::Model);
        let first_id = first.issue_id;
        history.record(first).await;
        history.record(record((2, 2, 2), ScoreSource::Model)).await;
        history.record(record((3, 3, 3), ScoreSource::Model)).await;

        let snapshot = history.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|r| r.issue_id != first_id));
        assert_eq!(snapshot[1].score.total(), 9);
    }

    #[tokio::test]
    async fn recent_returns_tail() {
        let history = DecisionHistory::new(10);
        for i in 0..5 {
            history.record(record((i, 0, 0), ScoreSource::Model)).await;
        }
        let recent = history.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].score.total(), 3);
        assert_eq!(recent[1].score.total(), 4);
        assert_eq!(history.recent(50).await.len(), 5);
    }

    #[tokio::test]
    async fn summary_of_empty_history() {
        let history = DecisionHistory::new(4);
        assert!(history.is_empty().await);
        let summary = history.summary().await;
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average_total, 0.0);
    }

    #[tokio::test]
    async fn summary_averages_and_counts_fallbacks() {
        let history = DecisionHistory::new(4);
        history.record(record((10, 10, 10), ScoreSource::Model)).await;
        history.record(record((0, 0, 0), ScoreSource::Fallback)).await;

        let summary = history.summary().await;
        assert_eq!(summary.count, 2);
        assert!((summary.average_total - 15.0).abs() < f64::EPSILON);
        assert!((summary.fallback_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(DecisionHistory::new(0).capacity(), 1);
    }
}
