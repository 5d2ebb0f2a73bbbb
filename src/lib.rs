//! sdk-codegen library
//!
//! Resolves versioned API descriptions, builds a language-neutral model and
//! renders SDK sources for every registered language.
#![deny(unsafe_code)]

pub mod core;
pub mod generation;
pub mod infrastructure;
pub mod model;
