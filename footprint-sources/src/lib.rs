//! Footprint Sources
//!
//! Where findings come from:
//! - [`FindingSource`]: async lookup interface for upstream services
//! - [`StaticSource`] and [`JsonFileSource`]: replay captured findings
//! - [`collect_findings`]: bounded, timeout-guarded fan-out over sources

pub mod collector;
pub mod fixture;
pub mod source;

pub use collector::*;
pub use fixture::*;
pub use source::*;
