//! Zip-code reconciliation and demand classification for childcare
//! facility data.
//!
//! Four source tables (facilities, population by age band, average income,
//! employment rate) are keyed by inconsistently formatted zip codes. The
//! pipeline canonicalizes those keys and derives three output tables: cleaned
//! facilities, child-population estimates, and a High/Normal demand label per
//! zip code.

pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod report;

pub use error::{PipelineError, Result};
