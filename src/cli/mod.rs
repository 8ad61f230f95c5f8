//! CLI module - argument parsing and the command runners

mod args;
pub mod compare;
pub mod evaluate;
pub mod explore;
mod steps;

pub use args::*;
