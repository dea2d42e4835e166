// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Configuration type definitions
//!
//! Each struct maps to a section of `jart_configuration.toml`. Every section
//! is optional; missing keys take their defaults.

use jart_device::{JartV1bConfig, JartV1bStaticConfig};
use jart_observability::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JartConfig {
    /// Seed of the simulation RNG
    pub seed: u64,
    pub model: ModelKind,
    pub crossbar: CrossbarConfig,
    /// Full model settings (`[device]`)
    pub device: JartV1bConfig,
    /// Static model settings (`[static_device]`)
    pub static_device: JartV1bStaticConfig,
    pub logging: LoggingConfig,
}

impl Default for JartConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            model: ModelKind::Full,
            crossbar: CrossbarConfig::default(),
            device: JartV1bConfig::default(),
            static_device: JartV1bStaticConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which device model to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Full,
    Static,
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "full" => Ok(ModelKind::Full),
            "static" => Ok(ModelKind::Static),
            other => Err(format!("unknown model '{}' (expected 'full' or 'static')", other)),
        }
    }
}

/// Crossbar dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrossbarConfig {
    /// Rows (output size)
    pub d_size: usize,
    /// Columns (input size)
    pub x_size: usize,
}

impl Default for CrossbarConfig {
    fn default() -> Self {
        Self {
            d_size: 64,
            x_size: 64,
        }
    }
}
