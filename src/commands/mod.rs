//! Typed argument structs for every external command the pipeline issues.
//!
//! Each struct maps Rust fields to the exact argument vector of one program.

pub mod fetch;
pub mod network;
pub mod packages;
