//! Infrastructure layer - concrete implementations of domain ports

pub mod generation;
pub mod output;
pub mod shell;
pub mod spec;

pub use shell::*;
