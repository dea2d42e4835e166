// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Pulsed Device Interface
//!
//! Common surface of the device models. The weight matrix is owned by the
//! caller and passed in as a mutable view on every call; the device owns only
//! its per-synapse physical state.
//!
//! ## Adding a New Device Model
//!
//! 1. Create `src/your_device.rs`
//! 2. Implement `PulsedDevice`
//! 3. Add tests
//! 4. Export in `lib.rs`

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use jart_physics::PulseOutcome;
use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use rand::RngCore;

use crate::error::{DeviceError, Result};
use crate::population::{check_shape, SynapseState};

/// Pulse and clamp counts of one update call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub pulses: u64,
    pub sub_steps: u64,
    pub clamped_sub_steps: u64,
}

impl UpdateReport {
    pub fn record(&mut self, outcome: PulseOutcome) {
        self.pulses += 1;
        self.sub_steps += outcome.sub_steps;
        self.clamped_sub_steps += outcome.clamped_sub_steps;
    }

    /// Fraction of sub-steps that hit a clamp
    pub fn clamp_ratio(&self) -> f64 {
        if self.sub_steps == 0 {
            0.0
        } else {
            self.clamped_sub_steps as f64 / self.sub_steps as f64
        }
    }
}

impl Add for UpdateReport {
    type Output = UpdateReport;

    fn add(self, other: UpdateReport) -> UpdateReport {
        UpdateReport {
            pulses: self.pulses + other.pulses,
            sub_steps: self.sub_steps + other.sub_steps,
            clamped_sub_steps: self.clamped_sub_steps + other.clamped_sub_steps,
        }
    }
}

impl AddAssign for UpdateReport {
    fn add_assign(&mut self, other: UpdateReport) {
        *self = *self + other;
    }
}

impl Sum for UpdateReport {
    fn sum<I: Iterator<Item = UpdateReport>>(iter: I) -> UpdateReport {
        iter.fold(UpdateReport::default(), Add::add)
    }
}

impl<'a> Sum<&'a UpdateReport> for UpdateReport {
    fn sum<I: Iterator<Item = &'a UpdateReport>>(iter: I) -> UpdateReport {
        iter.copied().sum()
    }
}

/// A crossbar of pulse-programmed synapses
pub trait PulsedDevice {
    /// Human-readable model name
    fn model_name(&self) -> &'static str;

    /// Population shape `(d_size, x_size)`
    fn shape(&self) -> (usize, usize);

    /// Per-synapse state; `None` before population
    fn states(&self) -> Option<&Array2<SynapseState>>;

    fn is_populated(&self) -> bool {
        self.states().is_some()
    }

    /// Single-pulse weight step `dw_min`; `None` before population unless configured
    fn granularity(&self) -> Option<f64>;

    /// Pulse sign that grows the disc and raises the weight
    fn set_sign(&self) -> i8;

    /// Draw instance parameters and initial state; allowed exactly once
    fn populate(&mut self, rng: &mut dyn RngCore) -> Result<()>;

    /// One pulse per listed column of `row`; pulse sign is `d_sign · column_sign`
    fn sparse_update(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        row: usize,
        columns: &[(usize, i8)],
        d_sign: i8,
        rng: &mut dyn RngCore,
    ) -> Result<UpdateReport>;

    /// `|c|` pulses of sign `sign(c)` for every coincidence count `c`
    fn dense_update(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        coincidences: ArrayView2<'_, i32>,
        rng: &mut dyn RngCore,
    ) -> Result<UpdateReport>;

    /// Program desired weight changes as `round(Δw / dw_min)` pulses per synapse
    ///
    /// Changes smaller than half a step produce no pulse.
    fn step_update(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        deltas: ArrayView2<'_, f32>,
        rng: &mut dyn RngCore,
    ) -> Result<UpdateReport> {
        check_shape(self.shape(), deltas.dim())?;
        let dw_min = self.granularity().ok_or(DeviceError::NotPopulated)?;
        let set_sign = self.set_sign() as f64;
        // Saturating cast; NaN becomes zero pulses
        let coincidences = deltas.mapv(|delta| ((delta as f64 / dw_min).round() * set_sign) as i32);
        self.dense_update(weights, coincidences.view(), rng)
    }

    /// Decay toward the reset bias; `bias_no_decay` exempts the last column
    fn decay_weights(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        alpha: Option<f32>,
        bias_no_decay: bool,
    ) -> Result<()>;

    /// Power-law drift over `time_since_last_call` seconds
    fn drift_weights(&mut self, weights: ArrayViewMut2<'_, f32>, time_since_last_call: f64)
        -> Result<()>;

    fn diffuse_weights(&mut self, weights: ArrayViewMut2<'_, f32>, rng: &mut dyn RngCore)
        -> Result<()>;

    /// `None` clips to the weight bounds; `Some(c)` additionally to `[-c, c]`
    fn clip_weights(&mut self, weights: ArrayViewMut2<'_, f32>, clip: Option<f32>) -> Result<()>;

    /// Reset `n_cols` columns from `start_col` (wrapping), each synapse with probability `reset_prob`
    fn reset_columns(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        start_col: usize,
        n_cols: usize,
        reset_prob: f64,
        rng: &mut dyn RngCore,
    ) -> Result<()>;

    /// Reset the synapses at x-major flat `indices`
    fn reset_at_indices(
        &mut self,
        weights: ArrayViewMut2<'_, f32>,
        indices: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<()>;

    /// Notify that the caller overwrote `weights`; returns whether internal state changed
    fn on_set_weights(&mut self, weights: ArrayViewMut2<'_, f32>) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accumulates() {
        let mut report = UpdateReport::default();
        report.record(PulseOutcome {
            sub_steps: 10,
            clamped_sub_steps: 0,
        });
        report.record(PulseOutcome {
            sub_steps: 10,
            clamped_sub_steps: 5,
        });
        assert_eq!(report.pulses, 2);
        assert_eq!(report.clamp_ratio(), 0.25);

        let reports = [report, report];
        let total: UpdateReport = reports.iter().sum();
        assert_eq!(total.sub_steps, 40);
        assert_eq!(UpdateReport::default().clamp_ratio(), 0.0);
    }
}
