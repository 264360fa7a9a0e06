//! CLI command implementations.

pub mod common;
pub mod inspect;
pub mod run;
pub mod sample;
pub mod template;
pub mod version;
