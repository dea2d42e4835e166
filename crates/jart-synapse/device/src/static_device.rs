// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # JART v1b Device (static model)
//!
//! Reduced model without decay or drift. A persistent Ndisc shadow carries the
//! physical state; pulses integrate the shadow and the weight is read back from
//! it. Clip, reset and diffusion act on the weight and resynchronize the shadow
//! only when `track_persistent` is set.
//!
//! Polarity is the reverse of the full model: positive sign SETs.

use jart_physics::{
    integrate_pulse, resync_state, state_to_weight_in, DeviceParameters, KernelVariant,
    Polarity, ReadoutWindow,
};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};
use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::calibration::calibrate_granularity;
use crate::error::{DeviceError, Result};
use crate::population::{
    check_shape, flat_index_mask, for_each_synapse, populate_synapses, validate_population,
    wrapped_columns, SynapseState,
};
use crate::trace::{report_update, should_trace};
use crate::traits::{PulsedDevice, UpdateReport};
use crate::variability::VariabilityParameters;
use crate::weight_law::WeightLawParameters;
use crate::weight_ops::WeightOp;

const MODEL_NAME: &str = "JART v1b static";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JartV1bStaticConfig {
    pub parameters: DeviceParameters,
    /// Device-to-device spread only; cycle-to-cycle spreads are ignored
    pub variability: VariabilityParameters,
    pub laws: WeightLawParameters,
    /// Resynchronize the Ndisc shadow after non-pulsed weight changes
    pub track_persistent: bool,
    /// Smallest single-pulse weight step; calibrated at population when unset
    pub dw_min: Option<f64>,
    pub clamp_warn_ratio: f64,
}

impl Default for JartV1bStaticConfig {
    fn default() -> Self {
        Self {
            parameters: DeviceParameters::default(),
            variability: VariabilityParameters::default(),
            laws: WeightLawParameters::default(),
            track_persistent: true,
            dw_min: None,
            clamp_warn_ratio: 0.5,
        }
    }
}

impl JartV1bStaticConfig {
    pub fn validate(&self) -> Result<()> {
        validate_population(&self.parameters, &self.variability)
    }

    /// Replace the readout window by a conductance window read at the configured read voltage
    pub fn with_conductance_window(mut self, conductance_min: f64, conductance_max: f64) -> Self {
        let window = &self.parameters.readout;
        self.parameters.readout = ReadoutWindow::from_conductance(
            conductance_min,
            conductance_max,
            self.parameters.pulse.read_voltage,
            window.w_min,
            window.w_max,
        );
        self
    }
}

pub struct JartV1bStaticDevice {
    d_size: usize,
    x_size: usize,
    config: JartV1bStaticConfig,
    states: Option<Array2<SynapseState>>,
}

impl JartV1bStaticDevice {
    pub fn new(d_size: usize, x_size: usize, config: JartV1bStaticConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            d_size,
            x_size,
            config,
            states: None,
        })
    }

    pub fn config(&self) -> &JartV1bStaticConfig {
        &self.config
    }

    /// Calibrated granularity; `None` until population when not configured
    pub fn dw_min(&self) -> Option<f64> {
        self.config.dw_min
    }

    fn ensure_ready(&self, weights_shape: (usize, usize)) -> Result<()> {
        if self.states.is_none() {
            return Err(DeviceError::NotPopulated);
        }
        check_shape(self.shape(), weights_shape)
    }

    fn transform_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        epoch: u64,
        op: WeightOp<'_>,
    ) -> Result<()> {
        self.ensure_ready(weights.dim())?;
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let params = &self.config.parameters;
        let track = self.config.track_persistent;

        for_each_synapse(states, weights, epoch, |coordinate, state, weight, rng| {
            *weight = op.apply(coordinate, state, *weight, &params.readout, rng);
            if track {
                state.persistent = *weight;
                let window = state.instance.readout(params);
                state.ndisc = resync_state(*weight as f64, params, &window);
            }
        });

        debug!(
            target: "jart-device",
            model = MODEL_NAME,
            op = op.name(),
            resynchronized = track,
            "weights transformed"
        );
        Ok(())
    }
}

/// SET on positive sign, RESET on negative
#[inline]
fn pulse_polarity(sign: i32) -> Option<Polarity> {
    match sign.signum() {
        1 => Some(Polarity::Set),
        -1 => Some(Polarity::Reset),
        _ => None,
    }
}

fn pulse_synapse(
    (row, col): (usize, usize),
    state: &mut SynapseState,
    weight: &mut f32,
    polarity: Polarity,
    count: u32,
    params: &DeviceParameters,
) -> UpdateReport {
    let mut report = UpdateReport::default();
    for _ in 0..count {
        report.record(integrate_pulse(
            &mut state.ndisc,
            polarity,
            params,
            &state.instance,
            KernelVariant::STATIC,
        ));
    }
    if count > 0 {
        let window = state.instance.readout(params);
        state.persistent = state_to_weight_in(state.ndisc, params, &window) as f32;
        *weight = state.persistent;
        if should_trace(row, col) {
            trace!(
                target: "jart-device",
                row,
                col,
                ?polarity,
                count,
                ndisc = state.ndisc,
                weight = *weight,
                "pulses applied"
            );
        }
    }
    report
}

impl PulsedDevice for JartV1bStaticDevice {
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
        let params = &self.config.parameters;
        if self.config.dw_min.is_none() {
            let estimate = calibrate_granularity(params, KernelVariant::STATIC);
            info!(
                target: "jart-device",
                model = MODEL_NAME,
                dw_min = estimate.dw_min(),
                "granularity calibrated"
            );
            self.config.dw_min = Some(estimate.dw_min());
        }

        let epoch = rng.next_u64();
        let params = &self.config.parameters;
        let states = populate_synapses(
            (self.d_size, self.x_size),
            params,
            &self.config.variability,
            &self.config.laws,
            epoch,
            |law, instance| {
                resync_state(law.reset_bias as f64, params, &instance.readout(params))
            },
        );
        self.states = Some(states);

        info!(
            target: "jart-device",
            model = MODEL_NAME,
            d_size = self.d_size,
            x_size = self.x_size,
            track_persistent = self.config.track_persistent,
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
        _rng: &mut dyn RngCore,
    ) -> Result<UpdateReport> {
        self.ensure_ready(weights.dim())?;
        let shape = self.shape();
        for &(col, _) in columns {
            if row >= shape.0 || col >= shape.1 {
                return Err(DeviceError::IndexOutOfRange { row, col, shape });
            }
        }
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let params = &self.config.parameters;

        let mut report = UpdateReport::default();
        for &(col, sign) in columns {
            if let Some(polarity) = pulse_polarity(d_sign as i32 * sign as i32) {
                report += pulse_synapse(
                    (row, col),
                    &mut states[[row, col]],
                    &mut weights[[row, col]],
                    polarity,
                    1,
                    params,
                );
            }
        }

        report_update(MODEL_NAME, &report, self.config.clamp_warn_ratio);
        Ok(report)
    }

    fn dense_update(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        coincidences: ArrayView2<'_, i32>,
        _rng: &mut dyn RngCore,
    ) -> Result<UpdateReport> {
        self.ensure_ready(weights.dim())?;
        check_shape(self.shape(), coincidences.dim())?;
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let params = &self.config.parameters;

        let report: UpdateReport = Zip::indexed(states)
            .and(weights)
            .and(coincidences)
            .par_map_collect(|coordinate, state, weight, &count| match pulse_polarity(count) {
                Some(polarity) => {
                    pulse_synapse(coordinate, state, weight, polarity, count.unsigned_abs(), params)
                }
                None => UpdateReport::default(),
            })
            .into_par_iter()
            .sum();

        report_update(MODEL_NAME, &report, self.config.clamp_warn_ratio);
        Ok(report)
    }

    fn decay_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        _alpha: Option<f32>,
        _bias_no_decay: bool,
    ) -> Result<()> {
        self.ensure_ready(weights.dim())
    }

    fn drift_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        _time_since_last_call: f64,
    ) -> Result<()> {
        self.ensure_ready(weights.dim())
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
        self.transform_weights(weights, 0, op)
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
        1
    }

    fn on_set_weights(&mut self, weights: ArrayViewMut2<'_, f32>) -> Result<bool> {
        self.ensure_ready(weights.dim())?;
        let states = self.states.as_mut().ok_or(DeviceError::NotPopulated)?;
        let params = &self.config.parameters;
        let track = self.config.track_persistent;

        let changed = Zip::from(states)
            .and(weights)
            .par_map_collect(|state, weight| {
                let window = state.instance.readout(params);
                *weight = window.clamp_weight(*weight as f64) as f32;
                if !track {
                    return false;
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn populated(d_size: usize, x_size: usize, config: JartV1bStaticConfig) -> JartV1bStaticDevice {
        let mut device = JartV1bStaticDevice::new(d_size, x_size, config).unwrap();
        device.populate(&mut StdRng::seed_from_u64(42)).unwrap();
        device
    }

    #[test]
    fn test_populate_calibrates_granularity() {
        let mut device = JartV1bStaticDevice::new(1, 1, JartV1bStaticConfig::default()).unwrap();
        assert_eq!(device.dw_min(), None);
        device.populate(&mut StdRng::seed_from_u64(0)).unwrap();
        let dw_min = device.dw_min().unwrap();
        assert!(dw_min > 0.0 && dw_min < 2.0);
    }

    #[test]
    fn test_configured_granularity_is_kept() {
        let config = JartV1bStaticConfig {
            dw_min: Some(0.01),
            ..JartV1bStaticConfig::default()
        };
        let device = populated(1, 1, config);
        assert_eq!(device.dw_min(), Some(0.01));
    }

    #[test]
    fn test_shadow_starts_at_reset_bias() {
        let config = JartV1bStaticConfig {
            laws: WeightLawParameters {
                reset: 0.25,
                ..WeightLawParameters::default()
            },
            ..JartV1bStaticConfig::default()
        };
        let device = populated(2, 2, config);
        let params = &device.config().parameters;
        let expected = resync_state(0.25, params, &params.readout);
        for state in device.states().unwrap() {
            assert_eq!(state.ndisc, expected);
            assert!((state.persistent - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_positive_sign_sets() {
        let mut device = populated(1, 2, JartV1bStaticConfig::default());
        let mut weights = Array2::<f32>::zeros((1, 2));
        let coincidences = ndarray::arr2(&[[1, -1]]);
        device
            .dense_update(weights.view_mut(), coincidences.view(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(weights[[0, 0]] > 0.0);
        assert!(weights[[0, 1]] < 0.0);
    }

    #[test]
    fn test_decay_and_drift_are_noops() {
        let mut device = populated(2, 2, JartV1bStaticConfig::default());
        let mut weights = Array2::<f32>::from_elem((2, 2), 0.5);
        let before = device.states().unwrap().clone();
        device.decay_weights(weights.view_mut(), Some(1.0), false).unwrap();
        device.drift_weights(weights.view_mut(), 10.0).unwrap();
        assert!(weights.iter().all(|&w| w == 0.5));
        assert_eq!(device.states().unwrap(), &before);

        let mut wrong = Array2::<f32>::zeros((1, 2));
        assert!(device.decay_weights(wrong.view_mut(), None, false).is_err());
    }

    #[test]
    fn test_untracked_clip_leaves_shadow() {
        let config = JartV1bStaticConfig {
            track_persistent: false,
            ..JartV1bStaticConfig::default()
        };
        let mut device = populated(2, 2, config);
        let before = device.states().unwrap().clone();
        let mut weights = Array2::<f32>::from_elem((2, 2), 0.9);
        device.clip_weights(weights.view_mut(), Some(0.5)).unwrap();
        assert!(weights.iter().all(|&w| w == 0.5));
        assert_eq!(device.states().unwrap(), &before);
        assert!(!device.on_set_weights(weights.view_mut()).unwrap());
    }

    #[test]
    fn test_step_update_quantizes_by_granularity() {
        let config = JartV1bStaticConfig {
            dw_min: Some(0.01),
            ..JartV1bStaticConfig::default()
        };
        let mut device = populated(1, 3, config);
        let mut weights = Array2::<f32>::zeros((1, 3));
        device.on_set_weights(weights.view_mut()).unwrap();

        let deltas = ndarray::arr2(&[[0.03f32, 0.004, -0.02]]);
        let report = device
            .step_update(weights.view_mut(), deltas.view(), &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(report.pulses, 5);
        assert!(weights[[0, 0]] > 0.0);
        assert_eq!(weights[[0, 1]], 0.0);
        assert!(weights[[0, 2]] < 0.0);
    }

    #[test]
    fn test_step_update_needs_granularity() {
        let mut device = JartV1bStaticDevice::new(1, 1, JartV1bStaticConfig::default()).unwrap();
        let mut weights = Array2::<f32>::zeros((1, 1));
        let deltas = Array2::<f32>::from_elem((1, 1), 0.1);
        let mut rng = StdRng::seed_from_u64(0);
        let result = device.step_update(weights.view_mut(), deltas.view(), &mut rng);
        assert_eq!(result, Err(DeviceError::NotPopulated));
    }

    #[test]
    fn test_conductance_window() {
        let config = JartV1bStaticConfig::default().with_conductance_window(1e-7, 4e-4);
        let readout = config.parameters.readout;
        assert!((readout.current_min - 2e-8).abs() < 1e-20);
        assert!((readout.current_max - 8e-5).abs() < 1e-16);
        assert!(JartV1bStaticDevice::new(1, 1, config).is_ok());
    }
}
