// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synapse Population
//!
//! Dense `d_size × x_size` array of per-synapse state, keyed by (row, column).
//! Sampling is independent per synapse (see [`crate::variability`]), so the
//! population is identical for a given epoch however it is traversed.

use jart_physics::{state_to_weight_in, DeviceParameters, InstanceParameters};
use ndarray::{Array2, ArrayViewMut2, Zip};
use rand::rngs::StdRng;

use crate::error::{DeviceError, Result};
use crate::variability::{sample_instance, synapse_rng, VariabilityParameters};
use crate::weight_law::{DriftState, WeightLaw, WeightLawParameters};

/// Everything one device remembers between calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapseState {
    /// Disc concentration (m⁻³)
    pub ndisc: f64,
    pub instance: InstanceParameters,
    pub law: WeightLaw,
    pub drift: DriftState,
    /// Noise-free weight derived from `ndisc`
    pub persistent: f32,
}

/// Draw a population of `shape` for the given epoch
///
/// `initial_ndisc` picks the starting concentration from the synapse's drawn
/// weight law and instance parameters; the persistent weight is read through
/// the instance's own weight range.
pub fn populate_synapses<F>(
    shape: (usize, usize),
    params: &DeviceParameters,
    variability: &VariabilityParameters,
    laws: &WeightLawParameters,
    epoch: u64,
    initial_ndisc: F,
) -> Array2<SynapseState>
where
    F: Fn(&WeightLaw, &InstanceParameters) -> f64,
{
    Array2::from_shape_fn(shape, |(row, col)| {
        let mut rng = synapse_rng(epoch, row, col);
        let instance = sample_instance(params, variability, &mut rng);
        let law = WeightLaw::sample(laws, &mut rng);
        let ndisc = initial_ndisc(&law, &instance);
        let persistent = state_to_weight_in(ndisc, params, &instance.readout(params));
        SynapseState {
            ndisc,
            instance,
            law,
            drift: DriftState::default(),
            persistent: persistent as f32,
        }
    })
}

/// Validate the parameters a population is sampled from
pub fn validate_population(
    params: &DeviceParameters,
    variability: &VariabilityParameters,
) -> Result<()> {
    let dt = params.pulse.base_time_step;
    if !(dt > 0.0) {
        return Err(DeviceError::InvalidTimeStep(dt));
    }
    params.validate()?;
    let invalid = variability.invalid_fields();
    if !invalid.is_empty() {
        return Err(DeviceError::InvalidVariability(invalid.join(", ")));
    }
    Ok(())
}

/// Verify a weight buffer matches the population shape
pub fn check_shape(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DeviceError::ShapeMismatch { expected, actual })
    }
}

/// Visit every synapse in parallel with its own random stream for `epoch`
pub fn for_each_synapse<F>(
    states: &mut Array2<SynapseState>,
    weights: ArrayViewMut2<'_, f32>,
    epoch: u64,
    visit: F,
) where
    F: Fn((usize, usize), &mut SynapseState, &mut f32, &mut StdRng) + Sync + Send,
{
    Zip::indexed(states)
        .and(weights)
        .par_for_each(|(row, col), state, weight| {
            let mut rng = synapse_rng(epoch, row, col);
            visit((row, col), state, weight, &mut rng);
        });
}

/// Column mask of `n_cols` columns starting at `start_col`, wrapping at `x_size`
pub fn wrapped_columns(x_size: usize, start_col: usize, n_cols: usize) -> Vec<bool> {
    let mut mask = vec![false; x_size];
    if x_size == 0 {
        return mask;
    }
    for offset in 0..n_cols.min(x_size) {
        mask[(start_col + offset) % x_size] = true;
    }
    mask
}

/// Synapse mask from x-major flat indices (`row = k / x_size`, `col = k % x_size`)
pub fn flat_index_mask(shape: (usize, usize), indices: &[usize]) -> Result<Array2<bool>> {
    let (d_size, x_size) = shape;
    let len = d_size * x_size;
    let mut mask = Array2::from_elem(shape, false);
    for &index in indices {
        if index >= len {
            return Err(DeviceError::FlatIndexOutOfRange { index, len });
        }
        mask[[index / x_size, index % x_size]] = true;
    }
    Ok(mask)
}
