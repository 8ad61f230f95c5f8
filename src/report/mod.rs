//! Report module - console tables and run outputs

pub mod evaluation;
pub mod export;
pub mod summary;

pub use evaluation::*;
pub use export::*;
pub use summary::*;
