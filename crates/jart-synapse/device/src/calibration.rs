// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Granularity calibration: the smallest weight step one pulse can produce.
//!
//! One SET pulse from the lower hard bound and one RESET pulse from the upper
//! hard bound, both on a nominal device. The smaller of the two weight moves
//! is the granularity.

use jart_physics::{
    integrate_pulse, state_to_weight, DeviceParameters, InstanceParameters, KernelVariant,
    Polarity,
};

/// Single-pulse weight steps at both ends of the range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GranularityEstimate {
    /// Weight gained by one SET pulse from the lower bound
    pub set_step: f64,
    /// Weight lost by one RESET pulse from the upper bound
    pub reset_step: f64,
}

impl GranularityEstimate {
    /// `dw_min = min(set_step, reset_step)`
    pub fn dw_min(&self) -> f64 {
        self.set_step.min(self.reset_step)
    }
}

pub fn calibrate_granularity(
    params: &DeviceParameters,
    variant: KernelVariant,
) -> GranularityEstimate {
    let nominal = InstanceParameters::nominal(params);
    let window = &params.readout;

    let mut ndisc = params.bounds.ndisc_min;
    integrate_pulse(&mut ndisc, Polarity::Set, params, &nominal, variant);
    let w_set = state_to_weight(ndisc, params);

    let mut ndisc = params.bounds.ndisc_max;
    integrate_pulse(&mut ndisc, Polarity::Reset, params, &nominal, variant);
    let w_reset = state_to_weight(ndisc, params);

    let estimate = GranularityEstimate {
        set_step: w_set - window.w_min,
        reset_step: window.w_max - w_reset,
    };
    tracing::debug!(
        target: "jart-device",
        set_step = estimate.set_step,
        reset_step = estimate.reset_step,
        "granularity calibrated"
    );
    estimate
}
