//! dxclass: diagnostic classification for the AIBL cohort
//!
//! A library for deriving diagnosis labels and features from the AIBL
//! table, fitting leakage-free preprocessing, and cross-validating and
//! evaluating classifiers.

pub mod cli;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod utils;
