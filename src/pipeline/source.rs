//! Injected data sources: incoming issues and the content calendar.
//!
//! Sources are pure I/O. Filtering for relevance happens here because the
//! monitor, not the decision core, decides what counts as "detected".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::pipeline::keywords::{KeywordSet, WATCH};
use crate::pipeline::types::{ContentPriority, Issue, IssueRecord, ScheduledItem, Urgency};

// ── Issue sources ───────────────────────────────────────────────────

/// Supplies issues to the orchestrator, one batch per cycle.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Pull the next batch of detected issues. An empty batch means nothing new.
    async fn next_batch(&self) -> Result<Vec<Issue>, PipelineError>;
}

/// Decides whether a raw record is worth handing to the core.
#[derive(Debug, Clone)]
pub struct WatchList {
    phrases: Option<KeywordSet>,
}

impl WatchList {
    /// The default monitored phrases.
    pub fn standard() -> Self {
        Self { phrases: None }
    }

    pub fn with_phrases<S: AsRef<str>>(phrases: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            phrases: Some(KeywordSet::new(phrases)?),
        })
    }

    /// Relevant when a monitored phrase appears, or urgency is medium or high.
    pub fn is_relevant(&self, issue: &Issue) -> bool {
        let text = issue.searchable_text();
        let phrase_hit = match &self.phrases {
            Some(set) => set.any(&text),
            None => WATCH.any(&text),
        };
        phrase_hit || matches!(issue.urgency, Urgency::Medium | Urgency::High)
    }
}

impl Default for WatchList {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fixed set of records, drained on the first pull.
pub struct StaticIssueSource {
    name: String,
    records: Mutex<Vec<IssueRecord>>,
    watch: WatchList,
}

impl StaticIssueSource {
    pub fn new(name: impl Into<String>, records: Vec<IssueRecord>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(records),
            watch: WatchList::standard(),
        }
    }

    pub fn with_watch_list(mut self, watch: WatchList) -> Self {
        self.watch = watch;
        self
    }

    /// Load records from a JSON array.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, PipelineError> {
        let name = name.into();
        let records: Vec<IssueRecord> =
            serde_json::from_str(json).map_err(|e| PipelineError::SourceFetch {
                source_name: name.clone(),
                reason: format!("invalid issue records: {e}"),
            })?;
        Ok(Self::new(name, records))
    }

    /// The built-in simulated monitoring results.
    pub fn sample() -> Self {
        Self::new(
            "simulated-monitor",
            vec![
                IssueRecord::new(
                    "Major social media platform changes privacy policy without user notice",
                    "Platform updated terms to allow broader data sharing with third parties, \
                     affecting 2 billion users globally.",
                    "Privacy Watch Blog",
                    "high",
                ),
                IssueRecord::new(
                    "New AI model shows concerning bias in hiring recommendations",
                    "Research reveals AI hiring tool consistently recommends male candidates \
                     over equally qualified female candidates.",
                    "AI Ethics Journal",
                    "medium",
                ),
                IssueRecord::new(
                    "Government proposes new internet regulation framework",
                    "Proposed legislation would require platforms to implement content \
                     filtering, raising free expression concerns.",
                    "Tech Policy News",
                    "medium",
                ),
            ],
        )
    }
}

#[async_trait]
impl IssueSource for StaticIssueSource {
    fn name(&self) -> &str {
        &self.name
    }

    /// Validates every record first: one malformed record fails the batch.
    async fn next_batch(&self) -> Result<Vec<Issue>, PipelineError> {
        let records: Vec<IssueRecord> = std::mem::take(&mut *self.records.lock().await);

        let mut issues = Vec::with_capacity(records.len());
        for record in records {
            issues.push(Issue::try_from(record)?);
        }

        let total = issues.len();
        let relevant: Vec<Issue> = issues
            .into_iter()
            .filter(|issue| {
                let keep = self.watch.is_relevant(issue);
                if !keep {
                    debug!(title = %issue.title, "Record not relevant, skipping");
                }
                keep
            })
            .collect();

        info!(source = %self.name, total, relevant = relevant.len(), "Issues detected");
        if total > 0 && relevant.is_empty() {
            warn!(source = %self.name, "Every record was filtered out");
        }
        Ok(relevant)
    }
}

// ── Schedule sources ────────────────────────────────────────────────

/// Supplies the planned communications that new issues may collide with.
pub trait ScheduleSource: Send + Sync {
    fn upcoming(&self) -> Vec<ScheduledItem>;
}

/// Fixed calendar.
#[derive(Debug, Clone, Default)]
pub struct StaticSchedule {
    items: Vec<ScheduledItem>,
}

impl StaticSchedule {
    pub fn new(items: Vec<ScheduledItem>) -> Self {
        Self { items }
    }

    /// A single high-priority fundraising email two hours after `now`.
    pub fn year_end_campaign(now: DateTime<Utc>) -> Self {
        Self::new(vec![ScheduledItem::new(
            "fundraising_email",
            "Year-end Giving Campaign",
            now + chrono::Duration::hours(2),
            ContentPriority::High,
        )])
    }
}

impl ScheduleSource for StaticSchedule {
    fn upcoming(&self) -> Vec<ScheduledItem> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_source_yields_three_issues_once() {
        let source = StaticIssueSource::sample();
        let first = source.next_batch().await.unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].urgency, Urgency::High);

        let second = source.next_batch().await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn low_urgency_without_watch_phrase_is_dropped() {
        let source = StaticIssueSource::new(
            "test",
            vec![
                IssueRecord::new("Bake sale", "Cookies on Friday", "Newsletter", "low"),
                IssueRecord::new("Open Source grant", "Funding news", "Newsletter", "low"),
            ],
        );
        let batch = source.next_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].title, "Open Source grant");
    }

    #[tokio::test]
    async fn custom_watch_list() {
        let source = StaticIssueSource::new(
            "test",
            vec![IssueRecord::new("Bake sale", "Cookies", "Newsletter", "low")],
        )
        .with_watch_list(WatchList::with_phrases(&["cookies"]).unwrap());
        assert_eq!(source.next_batch().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_record_fails_fast() {
        let source = StaticIssueSource::new(
            "test",
            vec![IssueRecord {
                title: Some("No body".into()),
                content: None,
                source: Some("x".into()),
                urgency: Some("high".into()),
            }],
        );
        let err = source.next_batch().await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidIssue { field: "content" }));
    }

    #[tokio::test]
    async fn json_records_load() {
        let json = r#"[{"title": "Data leak", "content": "Records exposed", "source": "Feed", "urgency": "high"}]"#;
        let source = StaticIssueSource::from_json("file", json).unwrap();
        let batch = source.next_batch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(source.name(), "file");
    }

    #[test]
    fn invalid_json_is_source_error() {
        assert!(matches!(
            StaticIssueSource::from_json("file", "{"),
            Err(PipelineError::SourceFetch { .. })
        ));
    }

    #[test]
    fn year_end_campaign_is_two_hours_out() {
        let now = Utc::now();
        let items = StaticSchedule::year_end_campaign(now).upcoming();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].scheduled_time, now + chrono::Duration::hours(2));
        assert_eq!(items[0].priority, ContentPriority::High);
    }
}
