//! Configuration types.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hard budget for a human-in-the-loop escalation after a conflict decision.
pub const RESOLUTION_TIMEOUT: Duration = Duration::from_secs(900);

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct ResponseConfig {
    /// Scheduled items closer than this to "now" conflict with new issues.
    pub conflict_window: chrono::Duration,
    /// Maximum issues processed per cycle.
    pub max_batch_size: usize,
    /// Decision history capacity (oldest records are evicted past this).
    pub history_capacity: usize,
    /// Token cap for each sub-score request.
    pub scoring_max_tokens: u32,
    /// Sampling temperature for scoring requests.
    pub scoring_temperature: f32,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            conflict_window: chrono::Duration::hours(6),
            max_batch_size: 3,
            history_capacity: 1024,
            scoring_max_tokens: 16,
            scoring_temperature: 0.0,
        }
    }
}

impl ResponseConfig {
    /// Read overrides from the environment, keeping defaults for anything
    /// unset, unparseable or zero.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let conflict_window = positive(&lookup, "RAPID_RESPONSE_CONFLICT_WINDOW_HOURS")
            .map(chrono::Duration::hours)
            .unwrap_or(defaults.conflict_window);

        let max_batch_size =
            positive(&lookup, "RAPID_RESPONSE_MAX_BATCH").unwrap_or(defaults.max_batch_size);

        let history_capacity = positive(&lookup, "RAPID_RESPONSE_HISTORY_CAPACITY")
            .unwrap_or(defaults.history_capacity);

        let scoring_max_tokens = positive(&lookup, "RAPID_RESPONSE_SCORING_MAX_TOKENS")
            .unwrap_or(defaults.scoring_max_tokens);

        Self {
            conflict_window,
            max_batch_size,
            history_capacity,
            scoring_max_tokens,
            ..defaults
        }
    }
}

fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = lookup(key)?.trim().parse::<T>().ok()?;
    if value > T::default() {
        Some(value)
    } else {
        tracing::warn!(key, "ignoring non-positive setting, using default");
        None
    }
}

/// The organization's stated mission, embedded in mission-alignment prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifesto {
    pub core_principles: Vec<String>,
    pub strategic_priorities: Vec<String>,
}

impl Manifesto {
    /// Load a manifesto from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let manifesto: Self = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        if manifesto.core_principles.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "core_principles".into(),
                message: "at least one principle is required".into(),
            });
        }
        Ok(manifesto)
    }

    /// Built-in digital-rights manifesto used by the demo binary.
    pub fn sample() -> Self {
        Self {
            core_principles: vec![
                "Digital privacy and security".into(),
                "Open and accessible technology".into(),
                "User empowerment and education".into(),
                "Inclusive digital rights".into(),
            ],
            strategic_priorities: vec![
                "Privacy protection".into(),
                "Platform accountability".into(),
                "Digital literacy".into(),
                "Ethical AI development".into(),
            ],
        }
    }
}
