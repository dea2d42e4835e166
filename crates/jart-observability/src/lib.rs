// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # jart-observability
//!
//! Logging setup shared by the JART crates: a `tracing-subscriber` registry
//! with an `EnvFilter` built from the configured level and per-crate debug
//! flags, writing text or JSON to stderr.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Workspace crates that emit events, by `tracing` target
pub const KNOWN_CRATES: &[&str] = &["jart", "jart-device", "jart-config"];
