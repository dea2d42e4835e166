// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # JART v1b Cell Physics
//!
//! Stateless physics of a valence-change memory cell:
//! - **Current**: closed-form IV relations of the SET and RESET branches
//! - **Circuit**: voltage division over line, series layer, disc, plug and Schottky contact
//! - **Kinetics**: self-heating, field-driven barrier lowering and ion hopping rate
//! - **Integrator**: forward Euler over one programming pulse with hard clamping
//! - **Mapping**: disc concentration ↔ externally visible synaptic weight
//!
//! Every function is pure and O(1) per call; per-synapse state lives with the
//! caller (see `jart-device`).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod circuit;
pub mod current;
pub mod error;
pub mod integrator;
pub mod kinetics;
pub mod mapping;
pub mod params;

pub use circuit::{divide_voltage, local_temperature, VoltageDivision};
pub use current::{
    cell_current, current_negative, current_positive, ndisc_from_current, saturation_current,
};
pub use error::{PhysicsError, Result};
pub use integrator::{
    euler_step, integrate_pulse, KernelVariant, Polarity, PulseOutcome, SubStepClamp,
};
pub use kinetics::{
    activation_energies, evaluate_rate, hopping_rate, saturation_factor, ActivationEnergies,
    FieldConvention, RateTerms,
};
pub use mapping::{
    resync_state, state_to_weight, state_to_weight_in, weight_to_state, weight_to_state_in,
    ReadoutWindow,
};
pub use params::{
    CircuitParameters, DeviceParameters, Geometry, InstanceParameters, KineticParameters,
    NegativeBranchFit, PhysicalConstants, PositiveBranchFit, PulseParameters, StateBounds,
};
