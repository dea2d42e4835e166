// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # JART v1b Device Models
//!
//! Crossbar-level facades over the `jart-physics` kernel:
//! - Population with device-to-device variability
//! - Pulsed sparse and dense updates
//! - Decay, drift, diffusion, clip and reset with state resynchronization
//! - Granularity calibration for the static model
//!
//! ## Architecture
//! - Per-synapse state in a dense `ndarray::Array2`
//! - Whole-matrix passes parallelized with rayon through `ndarray::Zip`
//! - Order-independent random streams (one per synapse and operation)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod calibration;
pub mod error;
pub mod full;
pub mod population;
pub mod static_device;
mod trace;
pub mod traits;
pub mod variability;
pub mod weight_law;
pub mod weight_ops;

// Re-export key types
pub use calibration::{calibrate_granularity, GranularityEstimate};
pub use error::{DeviceError, Result};
pub use full::{JartV1bConfig, JartV1bDevice};
pub use population::{
    check_shape, flat_index_mask, populate_synapses, validate_population, wrapped_columns,
    SynapseState,
};
pub use static_device::{JartV1bStaticConfig, JartV1bStaticDevice};
pub use traits::{PulsedDevice, UpdateReport};
pub use variability::{
    perturb_instance, sample_instance, stream_rng, synapse_rng, NoiseSpec, VariabilityParameters,
};
pub use weight_law::{DriftParameters, DriftState, WeightLaw, WeightLawParameters};
pub use weight_ops::WeightOp;
