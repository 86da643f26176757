//! Integration tests for fuzz-repro
//!
//! These tests drive the orchestrator end to end against scripted channels
//! and on-disk artifact stores.

#[path = "../common/mod.rs"]
pub mod common;

pub mod reproduce_flow;
pub mod store_flow;
