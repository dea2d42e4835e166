// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Voltage division and self-heating for a known cell current.

use crate::params::{DeviceParameters, InstanceParameters};

/// Split of the applied voltage over the series elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageDivision {
    /// Line plus TiOx series layer
    pub series: f64,
    /// Across the disc
    pub disc: f64,
    /// Across the plug
    pub plug: f64,
    /// Schottky contact; closes the loop so the parts sum to the applied voltage
    pub schottky: f64,
}

impl VoltageDivision {
    /// Voltage over the oxide (disc + plug + Schottky)
    #[inline]
    pub fn oxide(&self) -> f64 {
        self.disc + self.plug + self.schottky
    }

    /// Sum of all parts
    #[inline]
    pub fn total(&self) -> f64 {
        self.series + self.oxide()
    }
}

/// Divide `voltage` over the series network given the current it drives
#[inline]
pub fn divide_voltage(
    voltage: f64,
    current: f64,
    ndisc: f64,
    params: &DeviceParameters,
    instance: &InstanceParameters,
) -> VoltageDivision {
    let circuit = &params.circuit;
    let charge_density =
        params.constants.vacancy_valence * params.constants.elementary_charge * instance.area;
    let mobility = params.kinetics.electron_mobility;

    // Line resistance rises with Joule heating of the line itself
    let line = circuit.line_resistance
        * (1.0
            + circuit.line_temperature_coefficient
                * circuit.line_resistance
                * current
                * current
                * circuit.line_thermal_resistance);
    let series = current * (circuit.series_resistance + line);
    let disc = current * instance.disc_length / (charge_density * ndisc * mobility);
    let plug = current * (params.geometry.cell_length - instance.disc_length)
        / (charge_density * params.kinetics.plug_concentration * mobility);

    VoltageDivision {
        series,
        disc,
        plug,
        schottky: voltage - series - disc - plug,
    }
}

/// Local filament temperature from the power dissipated in the oxide
#[inline]
pub fn local_temperature(
    voltage: f64,
    current: f64,
    division: &VoltageDivision,
    params: &DeviceParameters,
) -> f64 {
    let scaling = if voltage > 0.0 {
        params.circuit.positive_thermal_scaling
    } else {
        1.0
    };
    params.constants.ambient_temperature
        + current * division.oxide() * params.circuit.thermal_resistance * scaling
}
