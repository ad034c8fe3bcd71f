//! Footprint Runtime
//!
//! Async orchestration around the scoring engine:
//! - [`Investigation`]: sources plus engine for one subject at a time
//! - [`run_batch`]: many independent subjects, bounded concurrency

pub mod batch;
pub mod investigation;

pub use batch::*;
pub use investigation::*;
