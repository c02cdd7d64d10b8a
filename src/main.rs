use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use rapid_response::config::{Manifesto, ResponseConfig};
use rapid_response::llm::{LlmConfig, create_provider};
use rapid_response::pipeline::conflict::ConflictResolver;
use rapid_response::pipeline::history::DecisionHistory;
use rapid_response::pipeline::observer::TracingObserver;
use rapid_response::pipeline::orchestrator::Orchestrator;
use rapid_response::pipeline::scorer::Scorer;
use rapid_response::pipeline::source::{IssueSource, StaticIssueSource, StaticSchedule};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ResponseConfig::from_env();

    eprintln!("🚀 Rapid Response v{}", env!("CARGO_PKG_VERSION"));

    // ── Manifesto ────────────────────────────────────────────────────
    let manifesto = match std::env::var("RAPID_RESPONSE_MANIFESTO") {
        Ok(path) => Manifesto::load(std::path::Path::new(&path))
            .with_context(|| format!("loading manifesto from {path}"))?,
        Err(_) => Manifesto::sample(),
    };
    eprintln!("   Principles: {}", manifesto.core_principles.len());

    // ── Scoring model ────────────────────────────────────────────────
    let llm = match LlmConfig::from_env() {
        Some(llm_config) => {
            eprintln!("   Model: {}", llm_config.model);
            Some(create_provider(&llm_config).context("creating LLM provider")?)
        }
        None => {
            eprintln!("   Model: none (heuristic scoring only)");
            None
        }
    };

    // ── Sources ──────────────────────────────────────────────────────
    let source = match std::env::var("RAPID_RESPONSE_ISSUES") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading issues from {path}"))?;
            StaticIssueSource::from_json(path, &raw)?
        }
        Err(_) => StaticIssueSource::sample(),
    };
    eprintln!("   Source: {}\n", source.name());

    let schedule = Arc::new(StaticSchedule::year_end_campaign(Utc::now()));

    // ── Pipeline ─────────────────────────────────────────────────────
    let history = DecisionHistory::new(config.history_capacity);
    let scorer = Scorer::new(manifesto, llm, Arc::clone(&history), &config);
    let conflicts = ConflictResolver::new(schedule, &config);
    let orchestrator =
        Orchestrator::new(scorer, conflicts, &config).with_observer(Arc::new(TracingObserver));

    let report = orchestrator.run_cycle(&source).await?;

    let summary = history.summary().await;
    eprintln!(
        "\n🏁 Cycle complete in {:.1}s: {} processed, {} conflicts, avg score {:.1}/45",
        report.total_cycle_time.as_secs_f64(),
        report.issues_processed.len(),
        report.conflicts_resolved.len(),
        summary.average_total,
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
