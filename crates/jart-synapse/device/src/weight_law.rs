// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Per-synapse weight laws applied outside of programming pulses: decay toward
//! the reset bias, diffusion, reset, and power-law drift.
//!
//! These operate on weights; the device models resynchronize Ndisc afterwards.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::variability::gaussian;

/// Power-law conductance drift `w(t) = w0·(t/t0)^(-ν)`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriftParameters {
    /// Mean drift exponent; drift is disabled when not positive
    pub nu: f64,
    /// Device-to-device spread of the exponent
    pub nu_dtod: f64,
    /// Reference time after programming (s)
    pub t0: f64,
    /// Weight change that counts as re-programming and restarts the clock
    pub reset_tol: f64,
}

impl Default for DriftParameters {
    fn default() -> Self {
        Self {
            nu: 0.0,
            nu_dtod: 0.0,
            t0: 1.0,
            reset_tol: 1e-7,
        }
    }
}

impl DriftParameters {
    pub fn is_enabled(&self) -> bool {
        self.nu > 0.0
    }
}

/// Population-level laws; each synapse draws its own [`WeightLaw`] from these
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightLawParameters {
    /// Weight lifetime in decay calls; 0 disables decay
    pub lifetime: f64,
    /// Relative device-to-device spread of the lifetime
    pub lifetime_dtod: f64,
    /// Diffusion standard deviation per call (weight units)
    pub diffusion: f64,
    /// Relative device-to-device spread of the diffusion rate
    pub diffusion_dtod: f64,
    /// Weight that decay and reset pull toward
    pub reset: f64,
    /// Device-to-device spread of the reset bias (weight units)
    pub reset_dtod: f64,
    /// Jitter of each individual reset (weight units)
    pub reset_std: f64,
    pub drift: DriftParameters,
}

impl Default for WeightLawParameters {
    fn default() -> Self {
        Self {
            lifetime: 0.0,
            lifetime_dtod: 0.0,
            diffusion: 0.0,
            diffusion_dtod: 0.0,
            reset: 0.0,
            reset_dtod: 0.0,
            reset_std: 0.0,
            drift: DriftParameters::default(),
        }
    }
}

/// Weight-law constants of one synapse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightLaw {
    /// Multiplicative retention per decay call at `alpha = 1`
    pub decay_scale: f32,
    pub diffusion_rate: f32,
    pub reset_bias: f32,
    pub drift_nu: f32,
}

impl WeightLaw {
    /// Draw one synapse's constants
    pub fn sample(params: &WeightLawParameters, rng: &mut StdRng) -> Self {
        let decay_scale = if params.lifetime > 0.0 {
            let lifetime = params.lifetime * (1.0 + params.lifetime_dtod * gaussian(rng));
            if lifetime > 1.0 {
                1.0 - 1.0 / lifetime
            } else {
                0.0
            }
        } else {
            1.0
        };
        let diffusion_rate =
            (params.diffusion * (1.0 + params.diffusion_dtod * gaussian(rng))).max(0.0);
        let reset_bias = params.reset + params.reset_dtod * gaussian(rng);
        let drift_nu = if params.drift.is_enabled() {
            (params.drift.nu + params.drift.nu_dtod * gaussian(rng)).max(0.0)
        } else {
            0.0
        };

        Self {
            decay_scale: decay_scale as f32,
            diffusion_rate: diffusion_rate as f32,
            reset_bias: reset_bias as f32,
            drift_nu: drift_nu as f32,
        }
    }

    /// Decay toward the reset bias: `w ← (w - b)·(1 - α(1 - scale)) + b`
    #[inline]
    pub fn decay(&self, weight: f32, alpha: f32) -> f32 {
        let scale = 1.0 - alpha * (1.0 - self.decay_scale);
        (weight - self.reset_bias) * scale + self.reset_bias
    }

    #[inline]
    pub fn diffuse(&self, weight: f32, rng: &mut StdRng) -> f32 {
        weight + self.diffusion_rate * gaussian(rng) as f32
    }

    /// Reset target with per-reset jitter
    #[inline]
    pub fn reset_value(&self, reset_std: f64, rng: &mut StdRng) -> f32 {
        if reset_std > 0.0 {
            self.reset_bias + (reset_std * gaussian(rng)) as f32
        } else {
            self.reset_bias
        }
    }
}

/// Bernoulli trial for a reset with probability `probability`
#[inline]
pub fn reset_selected(probability: f64, rng: &mut StdRng) -> bool {
    probability >= 1.0 || rng.gen::<f64>() < probability
}

/// Drift clock of one synapse
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriftState {
    /// Weight right after the last programming event
    pub programmed: f32,
    /// Time since the last programming event (s)
    pub elapsed: f64,
    /// Weight as left by the previous drift call
    pub last: f32,
}

impl DriftState {
    /// Advance the clock by `dt` and return the drifted weight
    pub fn advance(&mut self, weight: f32, nu: f32, dt: f64, params: &DriftParameters) -> f32 {
        if ((weight - self.last) as f64).abs() > params.reset_tol {
            self.programmed = weight;
            self.elapsed = 0.0;
        }
        self.elapsed += dt;
        let drifted = if nu > 0.0 && self.elapsed > params.t0 {
            self.programmed * (self.elapsed / params.t0).powf(-(nu as f64)) as f32
        } else {
            weight
        };
        self.last = drifted;
        drifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variability::synapse_rng;

    #[test]
    fn test_defaults_disable_every_law() {
        let law = WeightLaw::sample(&WeightLawParameters::default(), &mut synapse_rng(1, 0, 0));
        assert_eq!(law.decay_scale, 1.0);
        assert_eq!(law.diffusion_rate, 0.0);
        assert_eq!(law.reset_bias, 0.0);
        assert_eq!(law.decay(0.7, 1.0), 0.7);
    }

    #[test]
    fn test_decay_moves_toward_reset_bias() {
        let params = WeightLawParameters {
            lifetime: 10.0,
            reset: 0.2,
            ..WeightLawParameters::default()
        };
        let law = WeightLaw::sample(&params, &mut synapse_rng(1, 0, 0));
        assert!((law.decay_scale - 0.9).abs() < 1e-6);
        let decayed = law.decay(1.0, 1.0);
        assert!((decayed - (0.8 * 0.9 + 0.2)).abs() < 1e-6);
        let half = law.decay(1.0, 0.5);
        assert!(half > decayed && half < 1.0);
    }

    #[test]
    fn test_reset_probability_extremes() {
        let mut rng = synapse_rng(2, 0, 0);
        assert!((0..100).all(|_| reset_selected(1.0, &mut rng)));
        assert!((0..100).all(|_| !reset_selected(0.0, &mut rng)));
    }

    #[test]
    fn test_drift_follows_power_law() {
        let params = DriftParameters {
            nu: 0.1,
            t0: 1.0,
            ..DriftParameters::default()
        };
        let mut state = DriftState::default();
        let mut weight = 0.8;
        weight = state.advance(weight, 0.1, 1.0, &params);
        assert_eq!(weight, 0.8);
        weight = state.advance(weight, 0.1, 9.0, &params);
        let expected = 0.8 * 10f64.powf(-0.1) as f32;
        assert!((weight - expected).abs() < 1e-6);
    }

    #[test]
    fn test_drift_restarts_after_reprogramming() {
        let params = DriftParameters {
            nu: 0.1,
            ..DriftParameters::default()
        };
        let mut state = DriftState::default();
        let drifted = state.advance(0.8, 0.1, 5.0, &params);
        assert!(drifted < 0.8);
        // An external write is detected and the clock restarts
        let reprogrammed = state.advance(-0.5, 0.1, 0.5, &params);
        assert_eq!(reprogrammed, -0.5);
        assert_eq!(state.programmed, -0.5);
        assert_eq!(state.elapsed, 0.5);
    }
}
