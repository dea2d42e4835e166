// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Pulse Integrator
//!
//! Explicit forward Euler over one rectangular pulse:
//!
//! ```text
//! for k in 0..floor(pulse_length / base_time_step):
//!     Ndisc += dNdisc/dt(Ndisc, V) · base_time_step
//!     Ndisc  = clamp(Ndisc, sub-step range)
//! Ndisc = clamp(Ndisc, hard bounds)
//! ```
//!
//! The rate is re-evaluated from scratch at every sub-step. Nothing here draws
//! random numbers, so a pulse is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::kinetics::{hopping_rate, FieldConvention};
use crate::params::{DeviceParameters, InstanceParameters};

/// Pulse polarity: SET is a negative applied voltage and grows Ndisc,
/// RESET a positive one and shrinks it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Polarity {
    /// Negative voltage; grows the disc (higher conductance)
    Set,
    /// Positive voltage; dissolves the disc (lower conductance)
    Reset,
}

impl Polarity {
    /// Programming voltage of this polarity
    #[inline]
    pub fn voltage(self, params: &DeviceParameters) -> f64 {
        match self {
            Polarity::Set => params.pulse.set_voltage,
            Polarity::Reset => params.pulse.reset_voltage,
        }
    }
}

/// Range each Euler sub-step is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SubStepClamp {
    /// The device's own `[Ndiscmin, Ndiscmax]`
    InstanceRange,
    /// The global hard bounds
    HardBounds,
}

/// Physics configuration distinguishing the device models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct KernelVariant {
    pub field: FieldConvention,
    pub sub_step_clamp: SubStepClamp,
}

impl KernelVariant {
    /// Full model: disc field on SET, instance-range sub-step clamp
    pub const FULL: KernelVariant = KernelVariant {
        field: FieldConvention::DiscFieldOnNegative,
        sub_step_clamp: SubStepClamp::InstanceRange,
    };

    /// Static model: disc field on RESET, hard-bound sub-step clamp
    pub const STATIC: KernelVariant = KernelVariant {
        field: FieldConvention::DiscFieldOnPositive,
        sub_step_clamp: SubStepClamp::HardBounds,
    };
}

/// Result of integrating one pulse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseOutcome {
    pub sub_steps: u64,
    /// Sub-steps whose Euler update had to be clamped
    pub clamped_sub_steps: u64,
}

/// One Euler sub-step; returns whether the clamp changed the value
#[inline]
pub fn euler_step(
    ndisc: &mut f64,
    voltage: f64,
    params: &DeviceParameters,
    instance: &InstanceParameters,
    variant: KernelVariant,
) -> bool {
    let dt = params.pulse.base_time_step;
    let advanced = *ndisc + hopping_rate(*ndisc, voltage, params, instance, variant.field) * dt;
    let (low, high) = match variant.sub_step_clamp {
        SubStepClamp::InstanceRange => (instance.ndisc_min, instance.ndisc_max),
        SubStepClamp::HardBounds => (params.bounds.ndisc_min, params.bounds.ndisc_max),
    };
    let clamped = advanced.max(low).min(high);
    *ndisc = clamped;
    clamped != advanced
}

/// Integrate one pulse of `polarity` in place
pub fn integrate_pulse(
    ndisc: &mut f64,
    polarity: Polarity,
    params: &DeviceParameters,
    instance: &InstanceParameters,
    variant: KernelVariant,
) -> PulseOutcome {
    let voltage = polarity.voltage(params);
    let sub_steps = params.pulse.sub_steps();
    let mut clamped_sub_steps = 0;
    for _ in 0..sub_steps {
        if euler_step(ndisc, voltage, params, instance, variant) {
            clamped_sub_steps += 1;
        }
    }
    *ndisc = params.bounds.clamp(*ndisc);
    PulseOutcome {
        sub_steps,
        clamped_sub_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_pulse_params() -> DeviceParameters {
        let mut params = DeviceParameters::default();
        params.pulse.pulse_length = 1e-8;
        params.pulse.base_time_step = 1e-9;
        params
    }

    #[test]
    fn test_set_at_upper_bound_is_fixed_point() {
        let params = DeviceParameters::default();
        let instance = InstanceParameters::nominal(&params);
        for variant in [KernelVariant::FULL, KernelVariant::STATIC] {
            let mut ndisc = params.bounds.ndisc_max;
            integrate_pulse(&mut ndisc, Polarity::Set, &params, &instance, variant);
            assert_eq!(ndisc, params.bounds.ndisc_max);
        }
    }

    #[test]
    fn test_reset_at_lower_bound_is_fixed_point() {
        let params = DeviceParameters::default();
        let instance = InstanceParameters::nominal(&params);
        for variant in [KernelVariant::FULL, KernelVariant::STATIC] {
            let mut ndisc = params.bounds.ndisc_min;
            integrate_pulse(&mut ndisc, Polarity::Reset, &params, &instance, variant);
            assert_eq!(ndisc, params.bounds.ndisc_min);
        }
    }

    #[test]
    fn test_ten_sub_steps_equal_ten_single_steps() {
        let params = short_pulse_params();
        let instance = InstanceParameters::nominal(&params);
        assert_eq!(params.pulse.sub_steps(), 10);

        for polarity in [Polarity::Set, Polarity::Reset] {
            let start = 1e26;
            let mut whole = start;
            let outcome = integrate_pulse(&mut whole, polarity, &params, &instance, KernelVariant::FULL);
            assert_eq!(outcome.sub_steps, 10);

            let mut stepped = start;
            let voltage = polarity.voltage(&params);
            for _ in 0..10 {
                euler_step(&mut stepped, voltage, &params, &instance, KernelVariant::FULL);
            }
            stepped = params.bounds.clamp(stepped);

            assert_eq!(whole.to_bits(), stepped.to_bits());
        }
    }

    #[test]
    fn test_one_long_pulse_equals_short_pulses() {
        let params = short_pulse_params();
        let mut single_step = params.clone();
        single_step.pulse.pulse_length = single_step.pulse.base_time_step;
        let instance = InstanceParameters::nominal(&params);

        let mut whole = 5e25;
        integrate_pulse(&mut whole, Polarity::Set, &params, &instance, KernelVariant::FULL);

        let mut split = 5e25;
        for _ in 0..10 {
            integrate_pulse(&mut split, Polarity::Set, &single_step, &instance, KernelVariant::FULL);
        }
        assert_eq!(whole.to_bits(), split.to_bits());
    }

    #[test]
    fn test_repeated_pulses_are_monotonic() {
        let params = DeviceParameters::default();
        let instance = InstanceParameters::nominal(&params);

        let mut ndisc = params.bounds.ndisc_min;
        let mut previous = ndisc;
        for _ in 0..30 {
            integrate_pulse(&mut ndisc, Polarity::Set, &params, &instance, KernelVariant::FULL);
            assert!(ndisc >= previous);
            previous = ndisc;
        }
        assert!(ndisc > params.bounds.ndisc_min);

        let mut ndisc = params.bounds.ndisc_max;
        let mut previous = ndisc;
        for _ in 0..30 {
            integrate_pulse(&mut ndisc, Polarity::Reset, &params, &instance, KernelVariant::FULL);
            assert!(ndisc <= previous);
            previous = ndisc;
        }
        assert!(ndisc < params.bounds.ndisc_max);
    }

    #[test]
    fn test_state_stays_within_bounds() {
        let mut params = DeviceParameters::default();
        // A stiff cell overshoots within one sub-step and must be caught by the clamps
        params.kinetics.attempt_frequency *= 1e4;
        let instance = InstanceParameters::nominal(&params);
        let mut ndisc = 1e26;
        let mut clamped = 0;
        for polarity in [Polarity::Set, Polarity::Reset, Polarity::Set] {
            for variant in [KernelVariant::FULL, KernelVariant::STATIC] {
                let outcome = integrate_pulse(&mut ndisc, polarity, &params, &instance, variant);
                clamped += outcome.clamped_sub_steps;
                assert!(ndisc >= params.bounds.ndisc_min && ndisc <= params.bounds.ndisc_max);
            }
        }
        assert!(clamped > 0);
    }

    #[test]
    fn test_instance_range_clamp_uses_device_limits() {
        let params = DeviceParameters::default();
        let mut instance = InstanceParameters::nominal(&params);
        instance.ndisc_max = 1e26;
        let mut ndisc = 9e25;
        for _ in 0..10 {
            integrate_pulse(&mut ndisc, Polarity::Set, &params, &instance, KernelVariant::FULL);
        }
        assert!(ndisc <= 1e26);
    }
}
