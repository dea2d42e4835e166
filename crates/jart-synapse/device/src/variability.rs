// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Variability Sampler
//!
//! Three independent noise sources act on a synapse:
//! - **Device-to-device**: instance parameters drawn once at population,
//!   `x = mean + σ_dtod·N(0,1)`
//! - **Cycle-to-cycle**: after every pulse, each instance parameter receives an
//!   additive `(σ_ctoc + slope·|x|)·N(0,1)` on its current value (a random
//!   walk, not a re-draw from the prior)
//!
//! The weight range a device reads into (`w_min`, `w_max`) only has a
//! device-to-device spread.
//! - **Write noise**: perturbs the apparent weight only
//!
//! ## Random streams
//!
//! Every operation draws a single epoch from the caller's RNG. Each synapse
//! then gets its own `StdRng` seeded with `xxh64(epoch ‖ row ‖ col)`, so the
//! result never depends on iteration order or on how rayon splits the matrix.

use jart_physics::{DeviceParameters, InstanceParameters};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Seed separating stream hashes from other xxh64 uses
const STREAM_SEED: u64 = 0x4a41_5254_7631_62;

/// Spread of one instance quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NoiseSpec {
    /// Device-to-device standard deviation (absolute units of the quantity)
    pub dtod: f64,
    /// Cycle-to-cycle standard deviation per pulse (absolute units)
    pub ctoc: f64,
    /// Cycle-to-cycle spread proportional to the current magnitude
    pub slope: f64,
    /// Lower limit for sampled and perturbed values
    pub lower: Option<f64>,
    /// Upper limit for sampled and perturbed values
    pub upper: Option<f64>,
}

impl NoiseSpec {
    #[inline]
    fn limit(&self, value: f64) -> f64 {
        let value = match self.lower {
            Some(lower) => value.max(lower),
            None => value,
        };
        match self.upper {
            Some(upper) => value.min(upper),
            None => value,
        }
    }

    #[inline]
    fn draw(&self, mean: f64, rng: &mut StdRng) -> f64 {
        if self.dtod > 0.0 {
            self.limit(mean + self.dtod * gaussian(rng))
        } else {
            self.limit(mean)
        }
    }

    #[inline]
    fn has_cycle_noise(&self) -> bool {
        self.ctoc > 0.0 || self.slope > 0.0
    }

    #[inline]
    fn perturb(&self, value: f64, rng: &mut StdRng) -> f64 {
        let std = self.ctoc + self.slope * value.abs();
        self.limit(value + std * gaussian(rng))
    }
}

/// Device-to-device and cycle-to-cycle spreads of the instance parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct VariabilityParameters {
    pub ndisc_max: NoiseSpec,
    pub ndisc_min: NoiseSpec,
    pub disc_length: NoiseSpec,
    /// Spread of the disc radius; the area follows as `π·rdet²`
    pub disc_radius: NoiseSpec,
    /// Device-to-device spread of the weight read at the top of the current window
    pub w_max: NoiseSpec,
    /// Device-to-device spread of the weight read at the bottom of the current window
    pub w_min: NoiseSpec,
}

impl VariabilityParameters {
    /// Whether any cycle-to-cycle spread is configured
    pub fn has_cycle_noise(&self) -> bool {
        self.ndisc_max.has_cycle_noise()
            || self.ndisc_min.has_cycle_noise()
            || self.disc_length.has_cycle_noise()
            || self.disc_radius.has_cycle_noise()
    }

    fn specs(&self) -> [(&'static str, &NoiseSpec); 6] {
        [
            ("ndisc_max", &self.ndisc_max),
            ("ndisc_min", &self.ndisc_min),
            ("disc_length", &self.disc_length),
            ("disc_radius", &self.disc_radius),
            ("w_max", &self.w_max),
            ("w_min", &self.w_min),
        ]
    }

    /// Names of quantities with a negative spread, inverted limits, or a
    /// cycle-to-cycle spread on a weight bound
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        self.specs()
            .into_iter()
            .filter(|(name, spec)| {
                let inverted = matches!((spec.lower, spec.upper), (Some(l), Some(u)) if l > u);
                let weight_walk = matches!(*name, "w_max" | "w_min") && spec.has_cycle_noise();
                spec.dtod < 0.0 || spec.ctoc < 0.0 || spec.slope < 0.0 || inverted || weight_walk
            })
            .map(|(name, _)| name)
            .collect()
    }
}

/// Standard normal draw
#[inline]
pub fn gaussian(rng: &mut StdRng) -> f64 {
    rng.sample(StandardNormal)
}

/// Private random stream for an operation epoch and a coordinate tuple
pub fn stream_rng(epoch: u64, coordinates: &[u64]) -> StdRng {
    let mut bytes = Vec::with_capacity(8 * (coordinates.len() + 1));
    bytes.extend_from_slice(&epoch.to_le_bytes());
    for coordinate in coordinates {
        bytes.extend_from_slice(&coordinate.to_le_bytes());
    }
    StdRng::seed_from_u64(xxh64(&bytes, STREAM_SEED))
}

/// Private random stream of the synapse at `(row, col)` for an operation epoch
#[inline]
pub fn synapse_rng(epoch: u64, row: usize, col: usize) -> StdRng {
    stream_rng(epoch, &[row as u64, col as u64])
}

/// Draw the instance parameters of one device around the global means
pub fn sample_instance(
    params: &DeviceParameters,
    variability: &VariabilityParameters,
    rng: &mut StdRng,
) -> InstanceParameters {
    let geometry = &params.geometry;
    let mut instance = InstanceParameters {
        ndisc_max: variability.ndisc_max.draw(geometry.ndisc_max, rng),
        ndisc_min: variability.ndisc_min.draw(geometry.ndisc_min, rng),
        disc_length: variability.disc_length.draw(geometry.disc_length, rng),
        area: 0.0,
        w_min: params.readout.w_min,
        w_max: params.readout.w_max,
    };
    instance.set_disc_radius(variability.disc_radius.draw(geometry.disc_radius, rng));

    let w_max = variability.w_max.draw(params.readout.w_max, rng);
    let w_min = variability.w_min.draw(params.readout.w_min, rng);
    // An inverted range has no monotone readout; keep the global one
    if w_max > w_min {
        instance.w_min = w_min;
        instance.w_max = w_max;
    }
    instance
}

/// Apply one pulse worth of cycle-to-cycle noise in place
pub fn perturb_instance(
    instance: &mut InstanceParameters,
    variability: &VariabilityParameters,
    rng: &mut StdRng,
) {
    if variability.ndisc_max.has_cycle_noise() {
        instance.ndisc_max = variability.ndisc_max.perturb(instance.ndisc_max, rng);
    }
    if variability.ndisc_min.has_cycle_noise() {
        instance.ndisc_min = variability.ndisc_min.perturb(instance.ndisc_min, rng);
    }
    if variability.disc_length.has_cycle_noise() {
        instance.disc_length = variability.disc_length.perturb(instance.disc_length, rng);
    }
    if variability.disc_radius.has_cycle_noise() {
        let radius = variability.disc_radius.perturb(instance.disc_radius(), rng);
        instance.set_disc_radius(radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_are_reproducible_and_distinct() {
        let a: Vec<u64> = (0..4).map(|_| synapse_rng(7, 1, 2).gen()).collect();
        let b: Vec<u64> = (0..4).map(|_| synapse_rng(7, 1, 2).gen()).collect();
        assert_eq!(a, b);

        let mut first = synapse_rng(7, 1, 2);
        let mut swapped = synapse_rng(7, 2, 1);
        let mut next_epoch = synapse_rng(8, 1, 2);
        let reference: u64 = first.gen();
        assert_ne!(reference, swapped.gen::<u64>());
        assert_ne!(reference, next_epoch.gen::<u64>());
    }

    #[test]
    fn test_zero_spread_returns_means() {
        let params = DeviceParameters::default();
        let mut rng = synapse_rng(1, 0, 0);
        let instance = sample_instance(&params, &VariabilityParameters::default(), &mut rng);
        let nominal = InstanceParameters::nominal(&params);
        assert_eq!(instance.ndisc_max, nominal.ndisc_max);
        assert_eq!(instance.ndisc_min, nominal.ndisc_min);
        assert_eq!(instance.disc_length, nominal.disc_length);
        assert!((instance.area - nominal.area).abs() <= nominal.area * 1e-15);
    }

    #[test]
    fn test_limits_hold_under_large_spread() {
        let params = DeviceParameters::default();
        let variability = VariabilityParameters {
            disc_length: NoiseSpec {
                dtod: 1e-9,
                ctoc: 1e-9,
                lower: Some(0.2e-9),
                upper: Some(0.6e-9),
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        for col in 0..200 {
            let mut rng = synapse_rng(3, 0, col);
            let mut instance = sample_instance(&params, &variability, &mut rng);
            assert!(instance.disc_length >= 0.2e-9 && instance.disc_length <= 0.6e-9);
            perturb_instance(&mut instance, &variability, &mut rng);
            assert!(instance.disc_length >= 0.2e-9 && instance.disc_length <= 0.6e-9);
        }
    }

    #[test]
    fn test_cycle_noise_leaves_unconfigured_quantities() {
        let params = DeviceParameters::default();
        let variability = VariabilityParameters {
            disc_radius: NoiseSpec {
                ctoc: 1e-9,
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        assert!(variability.has_cycle_noise());
        let mut instance = InstanceParameters::nominal(&params);
        let before = instance;
        perturb_instance(&mut instance, &variability, &mut synapse_rng(5, 0, 0));
        assert_eq!(instance.ndisc_max, before.ndisc_max);
        assert_eq!(instance.disc_length, before.disc_length);
        assert_ne!(instance.area, before.area);
    }

    #[test]
    fn test_invalid_fields() {
        let variability = VariabilityParameters {
            ndisc_min: NoiseSpec {
                dtod: -1.0,
                ..NoiseSpec::default()
            },
            disc_radius: NoiseSpec {
                lower: Some(2.0),
                upper: Some(1.0),
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        assert_eq!(variability.invalid_fields(), vec!["ndisc_min", "disc_radius"]);

        let weight_walk = VariabilityParameters {
            disc_length: NoiseSpec {
                slope: -0.1,
                ..NoiseSpec::default()
            },
            w_max: NoiseSpec {
                ctoc: 0.01,
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        assert_eq!(weight_walk.invalid_fields(), vec!["disc_length", "w_max"]);
    }

    fn sample_std(samples: &[f64]) -> f64 {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt()
    }

    fn perturbed_lengths(variability: &VariabilityParameters) -> Vec<f64> {
        let params = DeviceParameters::default();
        (0..500)
            .map(|col| {
                let mut instance = InstanceParameters::nominal(&params);
                perturb_instance(&mut instance, variability, &mut synapse_rng(9, 0, col));
                instance.disc_length
            })
            .collect()
    }

    #[test]
    fn test_slope_widens_cycle_spread() {
        let length = DeviceParameters::default().geometry.disc_length;
        let flat = VariabilityParameters {
            disc_length: NoiseSpec {
                ctoc: 0.01 * length,
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        let sloped = VariabilityParameters {
            disc_length: NoiseSpec {
                slope: 0.05,
                ..flat.disc_length
            },
            ..flat
        };
        assert!(sloped.has_cycle_noise());

        let flat_std = sample_std(&perturbed_lengths(&flat));
        let sloped_std = sample_std(&perturbed_lengths(&sloped));
        // Expected ratio is 6; sampling error on 500 draws is a few percent
        assert!(sloped_std > 4.0 * flat_std, "{} vs {}", sloped_std, flat_std);

        let slope_only = VariabilityParameters {
            disc_length: NoiseSpec {
                slope: 0.05,
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        assert!(slope_only.has_cycle_noise());
        assert!(sample_std(&perturbed_lengths(&slope_only)) > 0.0);
    }

    #[test]
    fn test_weight_bounds_spread_between_devices() {
        let params = DeviceParameters::default();
        let variability = VariabilityParameters {
            w_max: NoiseSpec {
                dtod: 0.1,
                ..NoiseSpec::default()
            },
            w_min: NoiseSpec {
                dtod: 0.1,
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        let instances: Vec<InstanceParameters> = (0..500)
            .map(|col| sample_instance(&params, &variability, &mut synapse_rng(4, 0, col)))
            .collect();

        let maxima: Vec<f64> = instances.iter().map(|i| i.w_max).collect();
        let minima: Vec<f64> = instances.iter().map(|i| i.w_min).collect();
        assert!((sample_std(&maxima) - 0.1).abs() < 0.02);
        assert!((sample_std(&minima) - 0.1).abs() < 0.02);
        assert!(instances.iter().all(|i| i.w_max > i.w_min));
        // Physical parameters are untouched by the weight-range draw
        let nominal = InstanceParameters::nominal(&params);
        assert!(instances.iter().all(|i| i.ndisc_max == nominal.ndisc_max));

        let mut rng = synapse_rng(4, 0, 0);
        let fixed = sample_instance(&params, &VariabilityParameters::default(), &mut rng);
        assert_eq!((fixed.w_min, fixed.w_max), (params.readout.w_min, params.readout.w_max));
    }

    #[test]
    fn test_inverted_weight_draw_keeps_global_range() {
        let params = DeviceParameters::default();
        let variability = VariabilityParameters {
            w_max: NoiseSpec {
                dtod: 5.0,
                ..NoiseSpec::default()
            },
            w_min: NoiseSpec {
                dtod: 5.0,
                ..NoiseSpec::default()
            },
            ..VariabilityParameters::default()
        };
        let mut inverted = 0;
        for col in 0..200 {
            let instance = sample_instance(&params, &variability, &mut synapse_rng(6, 0, col));
            assert!(instance.w_max > instance.w_min);
            if instance.w_max == params.readout.w_max {
                inverted += 1;
            }
        }
        assert!(inverted > 0);
    }
}
