// ABOUTME: Library root for rollplan - deployment plan composition and result decoding.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod content;
pub mod diagnostics;
pub mod error;
pub mod execution;
pub mod listener;
pub mod output;
pub mod plan;
pub mod protocol;
pub mod result;
pub mod types;
