//! Rapid Response: mission-aligned issue scoring and routing.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
