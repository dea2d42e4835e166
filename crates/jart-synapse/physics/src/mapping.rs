// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Weight ↔ State Mapping
//!
//! ```text
//! forward:  Ndisc ──I_read(V_read)──▶ I ──affine──▶ w
//! inverse:  w ──affine──▶ I ──positive-branch inverse──▶ Ndisc
//!
//! w = (I - I_min)/(I_max - I_min)·(w_max - w_min) + w_min
//! ```
//!
//! The forward map always reads on the positive branch, which is the only
//! invertible one, so the inverse is exact up to rounding. Devices share the
//! current window but may spread in their weight range (`*_in` variants take
//! the per-device window). Resynchronization goes through [`resync_state`],
//! which keeps the result inside the hard bounds even for weights outside the
//! invertible range.

use serde::{Deserialize, Serialize};

use crate::current::{current_positive, ndisc_from_current, saturation_current};
use crate::error::{PhysicsError, Result};
use crate::params::DeviceParameters;

/// Read-current window and the weight range it maps onto
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadoutWindow {
    /// Read current mapped to `w_min` (A)
    pub current_min: f64,
    /// Read current mapped to `w_max` (A)
    pub current_max: f64,
    pub w_min: f64,
    pub w_max: f64,
}

impl Default for ReadoutWindow {
    fn default() -> Self {
        // Read currents of the default cell at its hard Ndisc bounds
        Self {
            current_min: 2.145_198e-8,
            current_max: 8.616_643e-5,
            w_min: -1.0,
            w_max: 1.0,
        }
    }
}

impl ReadoutWindow {
    /// Window spanning the read currents at the hard Ndisc bounds
    pub fn spanning_bounds(params: &DeviceParameters, w_min: f64, w_max: f64) -> Self {
        let v = params.pulse.read_voltage;
        Self {
            current_min: current_positive(params.bounds.ndisc_min, v, params),
            current_max: current_positive(params.bounds.ndisc_max, v, params),
            w_min,
            w_max,
        }
    }

    /// Window given as a conductance range read at `read_voltage`
    pub fn from_conductance(
        conductance_min: f64,
        conductance_max: f64,
        read_voltage: f64,
        w_min: f64,
        w_max: f64,
    ) -> Self {
        Self {
            current_min: conductance_min * read_voltage,
            current_max: conductance_max * read_voltage,
            w_min,
            w_max,
        }
    }

    /// The same current window mapped onto another weight range
    #[inline]
    pub fn with_weight_range(&self, w_min: f64, w_max: f64) -> Self {
        Self {
            w_min,
            w_max,
            ..*self
        }
    }

    #[inline]
    pub fn current_to_weight(&self, current: f64) -> f64 {
        (current - self.current_min) / (self.current_max - self.current_min)
            * (self.w_max - self.w_min)
            + self.w_min
    }

    #[inline]
    pub fn weight_to_current(&self, weight: f64) -> f64 {
        (weight - self.w_min) / (self.w_max - self.w_min) * (self.current_max - self.current_min)
            + self.current_min
    }

    /// Clamp a weight into `[w_min, w_max]`
    #[inline]
    pub fn clamp_weight(&self, weight: f64) -> f64 {
        weight.max(self.w_min).min(self.w_max)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.current_min > 0.0 && self.current_max > self.current_min) {
            return Err(PhysicsError::InvalidParameter {
                name: "readout.current_max",
                reason: format!(
                    "window must satisfy 0 < current_min < current_max, got [{}, {}]",
                    self.current_min, self.current_max
                ),
            });
        }
        if self.w_max <= self.w_min {
            return Err(PhysicsError::InvalidParameter {
                name: "readout.w_max",
                reason: format!("must exceed w_min ({} <= {})", self.w_max, self.w_min),
            });
        }
        Ok(())
    }
}

/// Externally visible weight of a disc concentration
#[inline]
pub fn state_to_weight(ndisc: f64, params: &DeviceParameters) -> f64 {
    state_to_weight_in(ndisc, params, &params.readout)
}

/// Disc concentration that reads as `weight`; 0 when the weight maps to a non-positive current
#[inline]
pub fn weight_to_state(weight: f64, params: &DeviceParameters) -> f64 {
    weight_to_state_in(weight, params, &params.readout)
}

#[inline]
pub fn state_to_weight_in(ndisc: f64, params: &DeviceParameters, window: &ReadoutWindow) -> f64 {
    window.current_to_weight(current_positive(ndisc, params.pulse.read_voltage, params))
}

#[inline]
pub fn weight_to_state_in(weight: f64, params: &DeviceParameters, window: &ReadoutWindow) -> f64 {
    ndisc_from_current(
        window.weight_to_current(weight),
        params.pulse.read_voltage,
        params,
    )
}

/// State resynchronized from an externally changed weight, within the hard bounds
///
/// Weights reading at or above the saturation current resolve to the upper
/// bound; non-positive currents and NaN resolve to the lower one.
#[inline]
pub fn resync_state(weight: f64, params: &DeviceParameters, window: &ReadoutWindow) -> f64 {
    let v_read = params.pulse.read_voltage;
    let current = window.weight_to_current(weight);
    if current >= saturation_current(v_read, params) {
        return params.bounds.ndisc_max;
    }
    // f64::max discards NaN, so the clamp also absorbs it
    params.bounds.clamp(ndisc_from_current(current, v_read, params))
}
