//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlStage`: the stage state machine the coordinator steps through
//! - `CrawlReport`: units of work skipped after a recoverable failure, plus run counters

mod crawl_stage;
mod report;

pub use crawl_stage::CrawlStage;
pub use report::{CrawlReport, SkippedUnit, UnitKind};
