//! Rapid response decision pipeline.
//!
//! Every detected issue flows through:
//! 1. `Scorer::score()`: MAI score (model first, heuristic fallback per dimension)
//! 2. `ConflictResolver::detect_conflict()`: collision with scheduled content
//! 3. `ConflictResolver::resolve()`: Lightning Protocol, only when a conflict exists
//! 4. `Router::route()`: priority level and response-time estimate
//!
//! `Orchestrator` runs the steps in that order and returns a `CycleReport`.
//! Narration is attached through `PipelineObserver`, never inline.

pub mod conflict;
pub mod history;
pub mod keywords;
pub mod observer;
pub mod orchestrator;
pub mod router;
pub mod scorer;
pub mod source;
pub mod types;
