//! Shared test utilities for fuzz-repro
//!
//! - Build directory fixtures (`fuzzers.json`, `.device_addr`)
//! - Artifact directory fixtures laid out as `<root>/<package>/<fuzzer>/`

#![allow(dead_code)]

pub mod fixtures;
