//! Graph data model
//!
//! These are the records a crawl accumulates: the stargazers of the target
//! repository, the users and repositories they lead to, and per-repository
//! contribution counters.

mod graph;
mod repo;
mod user;

pub use graph::CrawlGraph;
pub use repo::{Contribution, Repo};
pub use user::{Stargazer, User};
