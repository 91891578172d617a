pub mod analysis;
pub mod chart;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod table;

pub use error::{Result, ScraperError};
pub use pipeline::{Pipeline, RunOutcome, RunSummary};
