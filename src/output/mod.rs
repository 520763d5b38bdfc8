//! Operator-facing output
//!
//! This module handles:
//! - Queue and store statistics for the `stats` command
//! - Page inspection reports for the `inspect` command

pub mod inspect;
pub mod stats;

pub use inspect::{inspect_page, print_inspection, Inspection};
pub use stats::{load_statistics, print_statistics, render_statistics, CrawlStatistics};
