// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ion Hopping Kinetics
//!
//! Rate of change of the disc concentration under an applied voltage. The
//! evaluation order is fixed:
//!
//! ```text
//! current I(V, Ndisc)
//!   → voltage division (series, disc, plug, Schottky)
//!     → local temperature T and driving field E
//!       → barrier lowering γ = z·a·E / (ΔWa·π)
//!         ΔWf = ΔWa(√(1-γ²) - γπ/2 + γ·asin γ)
//!         ΔWr = ΔWa(√(1-γ²) + γπ/2 + γ·asin γ)
//!       → dN/dt = -(c_v0·a·ν0·F1·(exp(-ΔWf/kT) - exp(-ΔWr/kT))) / ldet
//! ```
//!
//! with `kT = kB·T/e` in eV and `c_v0 = (Nplug + Ndisc)/2`.
//!
//! ## Field convention
//!
//! The driving field is either the disc field `V_disc/ldet` or the mean cell
//! field `(V_schottky + V_plug + V_disc)/lcell`. The full and the static device
//! models assign these to opposite branches; both assignments are kept.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::circuit::{divide_voltage, local_temperature, VoltageDivision};
use crate::current::cell_current;
use crate::params::{DeviceParameters, InstanceParameters};

/// Which branch drives ion motion with the disc field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum FieldConvention {
    /// Disc field for `V < 0`, cell field otherwise (full model)
    DiscFieldOnNegative,
    /// Disc field for `V > 0`, cell field otherwise (static model)
    DiscFieldOnPositive,
}

impl FieldConvention {
    #[inline]
    fn uses_disc_field(self, voltage: f64) -> bool {
        match self {
            FieldConvention::DiscFieldOnNegative => voltage < 0.0,
            FieldConvention::DiscFieldOnPositive => voltage > 0.0,
        }
    }
}

/// Forward and reverse activation energies (eV)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationEnergies {
    pub forward: f64,
    pub reverse: f64,
}

/// Every intermediate of one rate evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateTerms {
    pub current: f64,
    pub division: VoltageDivision,
    pub temperature: f64,
    pub field: f64,
    pub saturation: f64,
    pub barrier: ActivationEnergies,
    pub rate: f64,
}

/// Approach-to-bound cutoff F1
///
/// Vanishes exactly at the instance limit the applied polarity drives toward.
#[inline]
pub fn saturation_factor(ndisc: f64, voltage: f64, instance: &InstanceParameters) -> f64 {
    if voltage > 0.0 {
        1.0 - (instance.ndisc_min / ndisc).powi(10)
    } else {
        1.0 - (ndisc / instance.ndisc_max).powi(10)
    }
}

/// Barrier lowering of the hopping activation energy by the driving field
///
/// `γ` is held in `[-1, 1]` so that an extreme field saturates the lowering
/// instead of leaving the domain of the square root and arcsine.
#[inline]
pub fn activation_energies(field: f64, params: &DeviceParameters) -> ActivationEnergies {
    let barrier = params.kinetics.activation_energy;
    let gamma = (params.constants.vacancy_valence * params.kinetics.hop_distance * field
        / (barrier * PI))
        .max(-1.0)
        .min(1.0);
    let root = (1.0 - gamma * gamma).sqrt();
    let lowering = gamma * PI / 2.0;
    let arc = gamma * gamma.asin();
    ActivationEnergies {
        forward: barrier * (root - lowering + arc),
        reverse: barrier * (root + lowering + arc),
    }
}

/// Evaluate the full rate chain, keeping every intermediate
pub fn evaluate_rate(
    ndisc: f64,
    voltage: f64,
    params: &DeviceParameters,
    instance: &InstanceParameters,
    convention: FieldConvention,
) -> RateTerms {
    let current = cell_current(ndisc, voltage, params);
    let division = divide_voltage(voltage, current, ndisc, params, instance);
    let temperature = local_temperature(voltage, current, &division, params);

    let field = if convention.uses_disc_field(voltage) {
        division.disc / instance.disc_length
    } else {
        division.oxide() / params.geometry.cell_length
    };
    let barrier = activation_energies(field, params);
    let saturation = saturation_factor(ndisc, voltage, instance);

    let kinetics = &params.kinetics;
    let thermal_energy =
        params.constants.boltzmann * temperature / params.constants.elementary_charge;
    let mean_concentration = (kinetics.plug_concentration + ndisc) / 2.0;
    let rate = -(mean_concentration
        * kinetics.hop_distance
        * kinetics.attempt_frequency
        * saturation
        * ((-barrier.forward / thermal_energy).exp() - (-barrier.reverse / thermal_energy).exp()))
        / instance.disc_length;

    RateTerms {
        current,
        division,
        temperature,
        field,
        saturation,
        barrier,
        rate,
    }
}

/// dNdisc/dt (m⁻³/s)
#[inline]
pub fn hopping_rate(
    ndisc: f64,
    voltage: f64,
    params: &DeviceParameters,
    instance: &InstanceParameters,
    convention: FieldConvention,
) -> f64 {
    evaluate_rate(ndisc, voltage, params, instance, convention).rate
}
