// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # JART - VCM Memristive Synapse Device Model
//!
//! Physically based behavioral model of a valence-change memory cell (JART v1b),
//! used as the per-synapse update kernel of an analog in-memory-compute
//! crossbar. The device core computes currents, the voltage divider and
//! self-heating, ion hopping under pulsed voltages, device variability, and the
//! mapping between the disc concentration and a visible synaptic weight.
//!
//! ## Feature Flags
//!
//! - **`config`** (default): TOML configuration and the [`Crossbar`] driver
//! - **`observability`** (default): `tracing-subscriber` setup and debug flags
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jart::prelude::*;
//! use ndarray::Array2;
//!
//! let config = jart::config::load_config(None, None)?;
//! let mut crossbar = Crossbar::from_config(&config)?;
//!
//! let coincidences = Array2::<i32>::ones(crossbar.shape());
//! let report = crossbar.dense_update(coincidences.view())?;
//! println!("{} pulses, clamp ratio {}", report.pulses, report.clamp_ratio());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  jart-physics                                           │
//! │  (IV branches, voltage divider, hopping, integrator)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  jart-device                                            │
//! │  (population, variability, full and static models)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  jart-config, jart-observability                        │
//! │  (TOML + overrides, logging)                            │
//! └─────────────────────────────────────────────────────────┘
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export device core
pub use jart_device as device;
pub use jart_physics as physics;

// Re-export infrastructure
#[cfg(feature = "config")]
pub use jart_config as config;

#[cfg(feature = "observability")]
pub use jart_observability as observability;

#[cfg(feature = "config")]
mod crossbar;

#[cfg(feature = "config")]
pub use crossbar::{build_device, Crossbar, JartError};

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::device::{
        DeviceError, JartV1bConfig, JartV1bDevice, JartV1bStaticConfig, JartV1bStaticDevice,
        PulsedDevice, UpdateReport,
    };
    pub use crate::physics::{DeviceParameters, Polarity, ReadoutWindow};

    #[cfg(feature = "config")]
    pub use crate::config::{JartConfig, ModelKind};

    #[cfg(feature = "config")]
    pub use crate::crossbar::{Crossbar, JartError};

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, CrateDebugFlags, LoggingConfig};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let params = DeviceParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(crate::VERSION, crate::device::VERSION);
    }
}
