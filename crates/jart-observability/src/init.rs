// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Logging initialization
//!
//! One global subscriber per process: a `Registry` with a single `fmt` layer
//! (text or JSON on stderr) behind an `EnvFilter`.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

/// Filter from the configured level and the per-crate debug flags
pub fn build_filter(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(&config.level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Install the global subscriber
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig, debug_flags: &CrateDebugFlags) -> Result<()> {
    let filter = build_filter(config, debug_flags)?;

    let layer = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.with_target)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.with_target)
            .json()
            .with_filter(filter)
            .boxed(),
    };

    Registry::default()
        .with(layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    tracing::debug!(
        target: "jart",
        level = %config.level,
        debug_crates = ?debug_flags.enabled_crates,
        "logging initialized"
    );
    Ok(())
}

/// Initialize logging from defaults plus `JART_DEBUG` and `--debug-*` arguments
pub fn init_logging_default() -> Result<()> {
    init_logging(&LoggingConfig::default(), &crate::cli::parse_debug_flags())
}
