// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Cell Current
//!
//! Closed-form IV relations of the two branches. Both are explicit in the
//! applied voltage and the disc concentration; neither iterates.
//!
//! ```text
//! V < 0 (SET):
//!     I = -(((α1+α0)/(1+exp(-(V+α2)/α3))) - α0)
//!         - (β1(1-exp(-V)) - β0·V)
//!           / (1 + ((c2·exp(-V/c3) + c1·V - c0)/(Ndisc/1e26))^(d2·exp(-V/d3) + d1·V - d0))
//!             ^(f0 + (f1-f0)/(1+(-V/f2)^f3))
//!
//! V ≥ 0 (RESET, read):
//!     I = -g0(exp(-g1·V) - 1) / (1 + (h0 + h1·V + h2·exp(-h3·V))·(Ndisc/Ndiscmin)^(-j0))^(1/k0)
//! ```
//!
//! The positive branch is parameterized by the **global** mean `Ndiscmin`, not
//! the per-device value, so the read current of a state does not depend on the
//! device it lives in.

use crate::params::DeviceParameters;

/// Concentration normalization of the negative-branch fit (m⁻³)
const NEGATIVE_BRANCH_SCALE: f64 = 1e26;

/// Current on the negative branch
#[inline]
pub fn current_negative(ndisc: f64, voltage: f64, params: &DeviceParameters) -> f64 {
    let fit = &params.negative_branch;
    let sigmoid = ((fit.alpha1 + fit.alpha0) / (1.0 + (-(voltage + fit.alpha2) / fit.alpha3).exp()))
        - fit.alpha0;
    let numerator = fit.beta1 * (1.0 - (-voltage).exp()) - fit.beta0 * voltage;
    let ratio = (fit.c2 * (-voltage / fit.c3).exp() + fit.c1 * voltage - fit.c0)
        / (ndisc / NEGATIVE_BRANCH_SCALE);
    let exponent = fit.d2 * (-voltage / fit.d3).exp() + fit.d1 * voltage - fit.d0;
    let outer = fit.f0 + (fit.f1 - fit.f0) / (1.0 + (-voltage / fit.f2).powf(fit.f3));
    -sigmoid - numerator / (1.0 + ratio.powf(exponent)).powf(outer)
}

/// Current on the positive branch
#[inline]
pub fn current_positive(ndisc: f64, voltage: f64, params: &DeviceParameters) -> f64 {
    let fit = &params.positive_branch;
    let barrier = barrier_factor(voltage, params);
    let relative = (ndisc / params.geometry.ndisc_min).powf(-fit.j0);
    saturation_current(voltage, params) / (1.0 + barrier * relative).powf(1.0 / fit.k0)
}

/// Positive-branch limit `g0·(1 - exp(-g1·V))`, approached as Ndisc grows without bound
#[inline]
pub fn saturation_current(voltage: f64, params: &DeviceParameters) -> f64 {
    let fit = &params.positive_branch;
    -fit.g0 * ((-fit.g1 * voltage).exp() - 1.0)
}

/// Branch-selected cell current
#[inline]
pub fn cell_current(ndisc: f64, voltage: f64, params: &DeviceParameters) -> f64 {
    if voltage < 0.0 {
        current_negative(ndisc, voltage, params)
    } else {
        current_positive(ndisc, voltage, params)
    }
}

/// Invert the positive branch at `voltage`: the concentration that conducts `current`
///
/// Returns 0 for non-positive current, which lies outside the branch's range.
/// Currents at or above [`saturation_current`] have no preimage either; the
/// result is then infinite, negative or NaN.
pub fn ndisc_from_current(current: f64, voltage: f64, params: &DeviceParameters) -> f64 {
    if current <= 0.0 {
        return 0.0;
    }
    let fit = &params.positive_branch;
    let saturation = saturation_current(voltage, params);
    let relative = ((saturation / current).powf(fit.k0) - 1.0) / barrier_factor(voltage, params);
    relative.powf(-1.0 / fit.j0) * params.geometry.ndisc_min
}

#[inline]
fn barrier_factor(voltage: f64, params: &DeviceParameters) -> f64 {
    let fit = &params.positive_branch;
    fit.h0 + fit.h1 * voltage + fit.h2 * (-fit.h3 * voltage).exp()
}
