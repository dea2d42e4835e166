// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # JART v1b Device (full model)
//!
//! ## Pulsed update
//!
//! ```text
//! per pulse:
//!     Ndisc ← integrate(Ndisc, V_SET if sign < 0 else V_RESET)
//!     w_persistent ← map_instance(Ndisc)
//!     w ← w_persistent + σ_write·dw_min·N(0,1)        (σ_write > 0)
//!     instance ← instance + cycle-to-cycle noise
//! ```
//!
//! ## Non-pulsed operations
//!
//! Decay, drift, diffusion, clip and reset act on the persistent weight when
//! write noise is enabled (and on the visible weight otherwise). Only synapses
//! the operation changed get fresh write noise; after a clip the visible weight
//! is also held to the clip range. Every synapse then resynchronizes
//! `Ndisc = map⁻¹(w_persistent)`, clamped to the hard bounds.

use jart_physics::{
    integrate_pulse, resync_state, state_to_weight_in, DeviceParameters, KernelVariant, Polarity,
};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};
use rand::rngs::StdRng;
use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use xxhash_rust::xxh64::xxh64;

use crate::calibration::calibrate_granularity;
use crate::error::{DeviceError, Result};
use crate::population::{
    check_shape, flat_index_mask, for_each_synapse, populate_synapses, validate_population,
    wrapped_columns, SynapseState,
};
use crate::trace::{report_update, should_trace};
use crate::traits::{PulsedDevice, UpdateReport};
use crate::variability::{gaussian, perturb_instance, stream_rng, synapse_rng, VariabilityParameters};
use crate::weight_law::WeightLawParameters;
use crate::weight_ops::WeightOp;

const MODEL_NAME: &str = "JART v1b";

/// Configuration of the full model
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JartV1bConfig {
    pub parameters: DeviceParameters,
    pub variability: VariabilityParameters,
    pub laws: WeightLawParameters,
    /// Standard deviation of the write noise on the visible weight, in units of `dw_min`
    ///
    /// Any positive value makes the device keep a separate persistent weight.
    pub write_noise_std: f64,
    /// Smallest single-pulse weight step; calibrated at population when unset
    pub dw_min: Option<f64>,
    /// Clamped sub-step fraction above which an update is reported as a warning
    pub clamp_warn_ratio: f64,
}

impl Default for JartV1bConfig {
    fn default() -> Self {
        Self {
            parameters: DeviceParameters::default(),
            variability: VariabilityParameters::default(),
            laws: WeightLawParameters::default(),
            write_noise_std: 0.0,
            dw_min: None,
            clamp_warn_ratio: 0.5,
        }
    }
}

impl JartV1bConfig {
    pub fn validate(&self) -> Result<()> {
        validate_population(&self.parameters, &self.variability)
    }

    /// Whether a persistent weight is tracked separately from the visible one
    pub fn uses_persistent_weight(&self) -> bool {
        self.write_noise_std > 0.0
    }

    /// Write noise standard deviation in weight units; zero before calibration
    pub fn scaled_write_noise(&self) -> f64 {
        self.write_noise_std * self.dw_min.unwrap_or(0.0)
    }
}

/// Full JART v1b crossbar with decay, drift, diffusion and write noise
pub struct JartV1bDevice {
    d_size: usize,
    x_size: usize,
    config: JartV1bConfig,
    states: Option<Array2<SynapseState>>,
    /// Seed and counter for operations that take no RNG but may need write noise
    internal_seed: u64,
    internal_counter: u64,
}

impl JartV1bDevice {
    pub fn new(d_size: usize, x_size: usize, config: JartV1bConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            d_size,
            x_size,
            config,
            states: None,
            internal_seed: 0,
            internal_counter: 0,
        })
    }

    pub fn config(&self) -> &JartV1bConfig {
        &self.config
    }

    /// Calibrated granularity; `None` until population when not configured
    pub fn dw_min(&self) -> Option<f64> {
        self.config.dw_min
    }

    fn next_internal_epoch(&mut self) -> u64 {
        self.internal_counter = self.internal_counter.wrapping_add(1);
        xxh64(&self.internal_counter.to_le_bytes(), self.internal_seed)
    }

    fn ensure_ready(&self, weights_shape: (usize, usize)) -> Result<()> {
        if self.states.is_none() {
            return Err(DeviceError::NotPopulated);
        }
        check_shape(self.shape(), weights_shape)
    }

    /// Apply `op` to every synapse, re-noise changed ones and resynchronize Ndisc
    fn transform_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        epoch: u64,
        op: WeightOp<'_>,
    ) -> Result<()> {
        self.ensure_ready(weights.dim())?;
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let params = &self.config.parameters;
        let noisy = self.config.uses_persistent_weight();
        let write_noise = self.config.scaled_write_noise();
        let visible_range = op.visible_range();

        for_each_synapse(states, weights, epoch, |coordinate, state, weight, rng| {
            let source = if noisy { state.persistent } else { *weight };
            let updated = op.apply(coordinate, state, source, &params.readout, rng);
            state.persistent = updated;
            if !noisy {
                *weight = updated;
            } else if updated != source {
                *weight = updated + (write_noise * gaussian(rng)) as f32;
            }
            if let Some((low, high)) = visible_range {
                *weight = (*weight).max(low).min(high);
            }
            let window = state.instance.readout(params);
            state.ndisc = resync_state(updated as f64, params, &window);
        });

        debug!(target: "jart-device", model = MODEL_NAME, op = op.name(), "weights resynchronized");
        Ok(())
    }
}

/// SET on negative sign, RESET on positive
#[inline]
fn pulse_polarity(sign: i32) -> Option<Polarity> {
    match sign.signum() {
        -1 => Some(Polarity::Set),
        1 => Some(Polarity::Reset),
        _ => None,
    }
}

fn pulse_synapse(
    (row, col): (usize, usize),
    state: &mut SynapseState,
    weight: &mut f32,
    polarity: Polarity,
    count: u32,
    config: &JartV1bConfig,
    rng: &mut StdRng,
) -> UpdateReport {
    let params = &config.parameters;
    let window = state.instance.readout(params);
    let write_noise = config.scaled_write_noise();
    let mut report = UpdateReport::default();
    for _ in 0..count {
        let outcome = integrate_pulse(
            &mut state.ndisc,
            polarity,
            params,
            &state.instance,
            KernelVariant::FULL,
        );
        report.record(outcome);

        state.persistent = state_to_weight_in(state.ndisc, params, &window) as f32;
        *weight = if config.uses_persistent_weight() {
            state.persistent + (write_noise * gaussian(rng)) as f32
        } else {
            state.persistent
        };
        perturb_instance(&mut state.instance, &config.variability, rng);

        if should_trace(row, col) {
            trace!(
                target: "jart-device",
                row,
                col,
                ?polarity,
                ndisc = state.ndisc,
                weight = *weight,
                clamped_sub_steps = outcome.clamped_sub_steps,
                "pulse applied"
            );
        }
    }
    report
}

impl PulsedDevice for JartV1bDevice {
    fn model_name(&self) -> &'static str {
        MODEL_NAME
    }

    fn shape(&self) -> (usize, usize) {
        (self.d_size, self.x_size)
    }

    fn states(&self) -> Option<&Array2<SynapseState>> {
        self.states.as_ref()
    }

    fn populate(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        if self.states.is_some() {
            return Err(DeviceError::AlreadyPopulated);
        }
        if self.config.dw_min.is_none() {
            let estimate = calibrate_granularity(&self.config.parameters, KernelVariant::FULL);
            info!(
                target: "jart-device",
                model = MODEL_NAME,
                dw_min = estimate.dw_min(),
                "granularity calibrated"
            );
            self.config.dw_min = Some(estimate.dw_min());
        }
        let epoch = rng.next_u64();
        self.internal_seed = rng.next_u64();
        self.internal_counter = 0;

        let params = &self.config.parameters;
        let initial = params.bounds.clamp(params.geometry.ndisc_init);
        let states = populate_synapses(
            (self.d_size, self.x_size),
            params,
            &self.config.variability,
            &self.config.laws,
            epoch,
            |_, _| initial,
        );
        self.states = Some(states);

        info!(
            target: "jart-device",
            model = MODEL_NAME,
            d_size = self.d_size,
            x_size = self.x_size,
            sub_steps_per_pulse = self.config.parameters.pulse.sub_steps(),
            "population sampled"
        );
        Ok(())
    }

    fn sparse_update(
        &mut self,
        mut weights: ArrayViewMut2<'_, f32>,
        row: usize,
        columns: &[(usize, i8)],
        d_sign: i8,
        rng: &mut dyn RngCore,
    ) -> Result<UpdateReport> {
        self.ensure_ready(weights.dim())?;
        let shape = self.shape();
        for &(col, _) in columns {
            if row >= shape.0 || col >= shape.1 {
                return Err(DeviceError::IndexOutOfRange { row, col, shape });
            }
        }
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let config = &self.config;
        let epoch = rng.next_u64();

        let mut report = UpdateReport::default();
        for (k, &(col, sign)) in columns.iter().enumerate() {
            let Some(polarity) = pulse_polarity(d_sign as i32 * sign as i32) else {
                continue;
            };
            // Columns may repeat within one call; the position keeps their streams apart
            let mut rng = stream_rng(epoch, &[row as u64, col as u64, k as u64]);
            report += pulse_synapse(
                (row, col),
                &mut states[[row, col]],
                &mut weights[[row, col]],
                polarity,
                1,
                config,
                &mut rng,
            );
        }

        report_update(MODEL_NAME, &report, config.clamp_warn_ratio);
        Ok(report)
    }

    fn dense_update(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        coincidences: ArrayView2<'_, i32>,
        rng: &mut dyn RngCore,
    ) -> Result<UpdateReport> {
        self.ensure_ready(weights.dim())?;
        check_shape(self.shape(), coincidences.dim())?;
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let config = &self.config;
        let epoch = rng.next_u64();

        let report: UpdateReport = Zip::indexed(states)
            .and(weights)
            .and(coincidences)
            .par_map_collect(|coordinate, state, weight, &count| match pulse_polarity(count) {
                Some(polarity) => {
                    let mut rng = synapse_rng(epoch, coordinate.0, coordinate.1);
                    pulse_synapse(
                        coordinate,
                        state,
                        weight,
                        polarity,
                        count.unsigned_abs(),
                        config,
                        &mut rng,
                    )
                }
                None => UpdateReport::default(),
            })
            .into_par_iter()
            .sum();

        report_update(MODEL_NAME, &report, config.clamp_warn_ratio);
        Ok(report)
    }

    fn decay_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        alpha: Option<f32>,
        bias_no_decay: bool,
    ) -> Result<()> {
        self.ensure_ready(weights.dim())?;
        if self.config.laws.lifetime <= 0.0 {
            return Ok(());
        }
        let op = WeightOp::Decay {
            alpha: alpha.unwrap_or(1.0),
            exempt_col: if bias_no_decay && self.x_size > 0 {
                Some(self.x_size - 1)
            } else {
                None
            },
        };
        let epoch = self.next_internal_epoch();
        self.transform_weights(weights, epoch, op)
    }

    fn drift_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        time_since_last_call: f64,
    ) -> Result<()> {
        self.ensure_ready(weights.dim())?;
        if !self.config.laws.drift.is_enabled() {
            return Ok(());
        }
        let op = WeightOp::Drift {
            dt: time_since_last_call,
            params: self.config.laws.drift,
        };
        let epoch = self.next_internal_epoch();
        self.transform_weights(weights, epoch, op)
    }

    fn diffuse_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let epoch = rng.next_u64();
        self.transform_weights(weights, epoch, WeightOp::Diffuse)
    }

    fn clip_weights(&mut self, weights: ArrayViewMut2<'_, f32>, clip: Option<f32>) -> Result<()> {
        let op = WeightOp::clip(&self.config.parameters.readout, clip);
        let epoch = self.next_internal_epoch();
        self.transform_weights(weights, epoch, op)
    }

    fn reset_columns(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        start_col: usize,
        n_cols: usize,
        reset_prob: f64,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let columns = wrapped_columns(self.x_size, start_col, n_cols);
        let op = WeightOp::ResetColumns {
            columns: &columns,
            probability: reset_prob,
            reset_std: self.config.laws.reset_std,
        };
        let epoch = rng.next_u64();
        self.transform_weights(weights, epoch, op)
    }

    fn reset_at_indices(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        indices: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        let mask = flat_index_mask(self.shape(), indices)?;
        let op = WeightOp::ResetSynapses {
            mask: &mask,
            reset_std: self.config.laws.reset_std,
        };
        let epoch = rng.next_u64();
        self.transform_weights(weights, epoch, op)
    }

    fn granularity(&self) -> Option<f64> {
        self.config.dw_min
    }

    fn set_sign(&self) -> i8 {
        -1
    }

    fn on_set_weights(&mut self, weights: ArrayViewMut2<'_, f32>) -> Result<bool> {
        self.ensure_ready(weights.dim())?;
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let params = &self.config.parameters;

        let changed = Zip::from(states)
            .and(weights)
            .par_map_collect(|state, weight| {
                let window = state.instance.readout(params);
                *weight = window.clamp_weight(*weight as f64) as f32;
                let before = (state.ndisc.to_bits(), state.persistent.to_bits());
                state.persistent = *weight;
                state.ndisc = resync_state(*weight as f64, params, &window);
                before != (state.ndisc.to_bits(), state.persistent.to_bits())
            })
            .iter()
            .any(|&changed| changed);

        debug!(target: "jart-device", model = MODEL_NAME, changed, "weights set externally");
        Ok(changed)
    }
}
