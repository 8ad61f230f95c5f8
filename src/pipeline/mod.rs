//! Pipeline module - every stage from the raw table to scored models

pub mod cv;
pub mod encode;
pub mod error;
pub mod features;
pub mod impute;
pub mod label;
pub mod loader;
pub mod metrics;
pub mod prepare;
pub mod preprocess;
pub mod scale;
pub mod scope;
pub mod split;
pub mod stats;
pub mod target;

pub use cv::*;
pub use encode::*;
pub use error::*;
pub use features::*;
pub use impute::*;
pub use label::*;
pub use loader::*;
pub use metrics::*;
pub use prepare::*;
pub use preprocess::*;
pub use scale::*;
pub use scope::*;
pub use split::*;
pub use stats::*;
pub use target::*;
