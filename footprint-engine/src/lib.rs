//! Footprint Engine
//!
//! Aggregates heterogeneous findings about one subject into scored evidence:
//! - **Normalizer**: Validates raw findings and fills documented defaults
//! - **Merger**: Collapses duplicates that describe the same fact
//! - **Scoring**: Bounded risk and privacy scores with explainable factors
//! - **Recommendations**: Ordered, deduplicated advice
//! - **Ranker**: Presentation order by confidence and recency
//!
//! ## Configuration
//!
//! Every weight, cap and threshold lives in [`EngineConfig`], loadable from
//! TOML. See [`FootprintEngine`] for the composed pipeline.

pub mod config;
pub mod error;
pub mod merger;
pub mod normalizer;
pub mod pipeline;
pub mod ranker;
pub mod recommend;
pub mod scoring;

pub use config::*;
pub use error::*;
pub use merger::*;
pub use normalizer::*;
pub use pipeline::*;
pub use ranker::*;
pub use recommend::recommend;
pub use scoring::{score, score_at};

pub use footprint_core::RawFinding;
