// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Device Parameters
//!
//! Global, read-only parameter set of the JART v1b cell, grouped the way the
//! physics consumes it:
//!
//! ```text
//! DeviceParameters
//!   ├── constants        e, kB, vacancy valence, ambient temperature
//!   ├── negative_branch  α0..α3, β0, β1, c0..c3, d0..d3, f0..f3
//!   ├── positive_branch  g0, g1, h0..h3, j0, k0
//!   ├── circuit          series/line resistances, thermal resistances
//!   ├── kinetics         hop distance, attempt frequency, barrier, plug
//!   ├── geometry         cell/disc lengths, disc radius, Ndisc means
//!   ├── pulse            pulse length, sub-step, SET/RESET/read voltages
//!   ├── bounds           hard Ndisc bounds
//!   └── readout          read-current window and weight range
//! ```
//!
//! Units are SI throughout (m, m⁻³, s, V, A, K, Ω); activation energy is in eV.
//! The defaults describe a TiOx/HfO2 cell with a 45 nm disc radius.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::current::{current_positive, saturation_current};
use crate::error::{PhysicsError, Result};
use crate::mapping::ReadoutWindow;

/// Physical constants
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Elementary charge (C)
    pub elementary_charge: f64,
    /// Boltzmann constant (J/K)
    pub boltzmann: f64,
    /// Oxygen vacancy charge number
    pub vacancy_valence: f64,
    /// Ambient temperature (K)
    pub ambient_temperature: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            elementary_charge: 1.602_176_634e-19,
            boltzmann: 1.380_649e-23,
            vacancy_valence: 2.0,
            ambient_temperature: 293.0,
        }
    }
}

/// Fit coefficients of the negative-voltage (SET) current branch
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NegativeBranchFit {
    pub alpha0: f64,
    pub alpha1: f64,
    pub alpha2: f64,
    pub alpha3: f64,
    pub beta0: f64,
    pub beta1: f64,
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub d0: f64,
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
    pub f0: f64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
}

impl Default for NegativeBranchFit {
    fn default() -> Self {
        Self {
            alpha0: 4.8e-7,
            alpha1: 2.4e-6,
            alpha2: 3.0,
            alpha3: 0.17,
            beta0: 9.8e-5,
            beta1: 1.96e-5,
            c0: 0.0,
            c1: 0.0,
            c2: 0.11,
            c3: 1.0,
            d0: -2.0,
            d1: 0.0,
            d2: 0.0,
            d3: 1.0,
            f0: 0.21,
            f1: 0.21,
            f2: 1.0,
            f3: 2.0,
        }
    }
}

/// Fit coefficients of the positive-voltage (RESET and read) current branch
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PositiveBranchFit {
    pub g0: f64,
    pub g1: f64,
    pub h0: f64,
    pub h1: f64,
    pub h2: f64,
    pub h3: f64,
    pub j0: f64,
    pub k0: f64,
}

impl Default for PositiveBranchFit {
    fn default() -> Self {
        Self {
            g0: 5e-4,
            g1: 1.0,
            h0: 64.0,
            h1: 0.0,
            h2: 0.0,
            h3: 1.0,
            j0: 1.0,
            k0: 0.5,
        }
    }
}

/// Series circuit and thermal network
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitParameters {
    /// TiOx series layer resistance (Ω)
    pub series_resistance: f64,
    /// Line resistance at ambient temperature (Ω)
    pub line_resistance: f64,
    /// Temperature coefficient of the line resistance (1/K)
    pub line_temperature_coefficient: f64,
    /// Thermal resistance of the line (K/W)
    pub line_thermal_resistance: f64,
    /// Thermal resistance of the cell (K/W)
    pub thermal_resistance: f64,
    /// Scaling of the cell thermal resistance on the positive branch
    pub positive_thermal_scaling: f64,
}

impl Default for CircuitParameters {
    fn default() -> Self {
        Self {
            series_resistance: 650.0,
            line_resistance: 719.2437,
            line_temperature_coefficient: 3.92e-3,
            line_thermal_resistance: 90_471.47,
            thermal_resistance: 1.1e7,
            positive_thermal_scaling: 0.13,
        }
    }
}

/// Ion hopping kinetics
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KineticParameters {
    /// Ion hopping distance (m)
    pub hop_distance: f64,
    /// Attempt frequency (Hz)
    pub attempt_frequency: f64,
    /// Activation energy of the hopping barrier (eV)
    pub activation_energy: f64,
    /// Vacancy concentration of the plug region (m⁻³)
    pub plug_concentration: f64,
    /// Electron mobility (m²/Vs)
    pub electron_mobility: f64,
}

impl Default for KineticParameters {
    fn default() -> Self {
        Self {
            hop_distance: 0.25e-9,
            attempt_frequency: 2e13,
            activation_energy: 1.17,
            plug_concentration: 20e26,
            electron_mobility: 4e-6,
        }
    }
}

/// Cell geometry and mean disc concentrations
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Geometry {
    /// Total cell length (m)
    pub cell_length: f64,
    /// Mean disc (detector) length (m)
    pub disc_length: f64,
    /// Mean disc radius (m)
    pub disc_radius: f64,
    /// Mean upper concentration limit (m⁻³)
    pub ndisc_max: f64,
    /// Mean lower concentration limit (m⁻³); also parameterizes the positive branch
    pub ndisc_min: f64,
    /// Concentration at population (m⁻³)
    pub ndisc_init: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            cell_length: 3e-9,
            disc_length: 0.4e-9,
            disc_radius: 45e-9,
            ndisc_max: 20e26,
            ndisc_min: 0.008e26,
            ndisc_init: 0.008e26,
        }
    }
}

impl Geometry {
    /// Contact area `π·rdet²` of the mean disc radius
    pub fn area(&self) -> f64 {
        PI * self.disc_radius * self.disc_radius
    }
}

/// Pulse timing and voltages
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PulseParameters {
    /// Duration of one programming pulse (s)
    pub pulse_length: f64,
    /// Explicit Euler sub-step (s)
    pub base_time_step: f64,
    /// SET voltage (negative branch)
    pub set_voltage: f64,
    /// RESET voltage (positive branch)
    pub reset_voltage: f64,
    /// Read voltage (positive branch)
    pub read_voltage: f64,
}

impl Default for PulseParameters {
    fn default() -> Self {
        Self {
            pulse_length: 1e-7,
            base_time_step: 1e-9,
            set_voltage: -0.9,
            reset_voltage: 1.45,
            read_voltage: 0.2,
        }
    }
}

impl PulseParameters {
    /// Number of Euler sub-steps per pulse, truncated
    pub fn sub_steps(&self) -> u64 {
        if self.base_time_step <= 0.0 || self.pulse_length <= 0.0 {
            return 0;
        }
        (self.pulse_length / self.base_time_step).floor() as u64
    }
}

/// Hard bounds on Ndisc enforced after every integration
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StateBounds {
    pub ndisc_min: f64,
    pub ndisc_max: f64,
}

impl Default for StateBounds {
    fn default() -> Self {
        let geometry = Geometry::default();
        Self {
            ndisc_min: geometry.ndisc_min,
            ndisc_max: geometry.ndisc_max,
        }
    }
}

impl StateBounds {
    #[inline]
    pub fn clamp(&self, ndisc: f64) -> f64 {
        ndisc.max(self.ndisc_min).min(self.ndisc_max)
    }
}

/// Complete global parameter set, shared read-only by every synapse
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceParameters {
    pub constants: PhysicalConstants,
    pub negative_branch: NegativeBranchFit,
    pub positive_branch: PositiveBranchFit,
    pub circuit: CircuitParameters,
    pub kinetics: KineticParameters,
    pub geometry: Geometry,
    pub pulse: PulseParameters,
    pub bounds: StateBounds,
    pub readout: ReadoutWindow,
}

impl Default for DeviceParameters {
    fn default() -> Self {
        let mut params = Self {
            constants: PhysicalConstants::default(),
            negative_branch: NegativeBranchFit::default(),
            positive_branch: PositiveBranchFit::default(),
            circuit: CircuitParameters::default(),
            kinetics: KineticParameters::default(),
            geometry: Geometry::default(),
            pulse: PulseParameters::default(),
            bounds: StateBounds::default(),
            readout: ReadoutWindow::default(),
        };
        params.readout = ReadoutWindow::spanning_bounds(&params, -1.0, 1.0);
        params
    }
}

impl DeviceParameters {
    /// Read current at the given concentration (positive branch at `V_read`)
    pub fn read_current(&self, ndisc: f64) -> f64 {
        current_positive(ndisc, self.pulse.read_voltage, self)
    }

    /// Check that the parameter set describes a usable cell
    ///
    /// Degenerate values would otherwise surface as NaN or infinite rates deep
    /// inside the integration loop.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &'static str, value: f64) -> Result<()> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(PhysicsError::InvalidParameter {
                    name,
                    reason: format!("must be positive and finite, got {}", value),
                })
            }
        }

        positive("pulse.base_time_step", self.pulse.base_time_step)?;
        positive("pulse.pulse_length", self.pulse.pulse_length)?;
        if self.pulse.pulse_length < self.pulse.base_time_step {
            return Err(PhysicsError::InvalidParameter {
                name: "pulse.pulse_length",
                reason: format!(
                    "shorter than one sub-step ({} < {})",
                    self.pulse.pulse_length, self.pulse.base_time_step
                ),
            });
        }
        positive("pulse.read_voltage", self.pulse.read_voltage)?;
        if self.pulse.set_voltage >= 0.0 {
            return Err(PhysicsError::InvalidParameter {
                name: "pulse.set_voltage",
                reason: format!("must be negative, got {}", self.pulse.set_voltage),
            });
        }
        positive("pulse.reset_voltage", self.pulse.reset_voltage)?;

        positive("geometry.cell_length", self.geometry.cell_length)?;
        positive("geometry.disc_length", self.geometry.disc_length)?;
        positive("geometry.disc_radius", self.geometry.disc_radius)?;
        positive("geometry.ndisc_min", self.geometry.ndisc_min)?;
        if self.geometry.disc_length >= self.geometry.cell_length {
            return Err(PhysicsError::InvalidParameter {
                name: "geometry.disc_length",
                reason: "must be shorter than the cell".to_string(),
            });
        }
        if self.geometry.ndisc_max <= self.geometry.ndisc_min {
            return Err(PhysicsError::InvalidParameter {
                name: "geometry.ndisc_max",
                reason: "must exceed geometry.ndisc_min".to_string(),
            });
        }

        positive("bounds.ndisc_min", self.bounds.ndisc_min)?;
        if self.bounds.ndisc_max <= self.bounds.ndisc_min {
            return Err(PhysicsError::InvalidParameter {
                name: "bounds.ndisc_max",
                reason: "must exceed bounds.ndisc_min".to_string(),
            });
        }

        positive("kinetics.plug_concentration", self.kinetics.plug_concentration)?;
        positive("kinetics.electron_mobility", self.kinetics.electron_mobility)?;
        positive("kinetics.activation_energy", self.kinetics.activation_energy)?;
        positive("constants.ambient_temperature", self.constants.ambient_temperature)?;

        self.readout.validate()?;
        // Weights above the saturation current have no state to resynchronize to
        let saturation = saturation_current(self.pulse.read_voltage, self);
        if self.readout.current_max >= saturation {
            return Err(PhysicsError::InvalidParameter {
                name: "readout.current_max",
                reason: format!(
                    "{} A reaches the read saturation current {} A at {} V",
                    self.readout.current_max, saturation, self.pulse.read_voltage
                ),
            });
        }
        Ok(())
    }
}

/// Per-synapse parameters drawn at population
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct InstanceParameters {
    /// Upper concentration limit of this device (m⁻³)
    pub ndisc_max: f64,
    /// Lower concentration limit of this device (m⁻³)
    pub ndisc_min: f64,
    /// Disc length of this device (m)
    pub disc_length: f64,
    /// Contact area `π·rdet²` of this device (m²)
    pub area: f64,
    /// Weight this device reads as at the window's `current_min`
    pub w_min: f64,
    /// Weight this device reads as at the window's `current_max`
    pub w_max: f64,
}

impl InstanceParameters {
    /// Instance equal to the global means
    pub fn nominal(params: &DeviceParameters) -> Self {
        Self {
            ndisc_max: params.geometry.ndisc_max,
            ndisc_min: params.geometry.ndisc_min,
            disc_length: params.geometry.disc_length,
            area: params.geometry.area(),
            w_min: params.readout.w_min,
            w_max: params.readout.w_max,
        }
    }

    /// Global read-current window mapped onto this device's weight range
    #[inline]
    pub fn readout(&self, params: &DeviceParameters) -> ReadoutWindow {
        params.readout.with_weight_range(self.w_min, self.w_max)
    }

    /// Disc radius recovered from the area
    pub fn disc_radius(&self) -> f64 {
        (self.area / PI).sqrt()
    }

    /// Set the area from a disc radius
    pub fn set_disc_radius(&mut self, radius: f64) {
        self.area = PI * radius * radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_validate() {
        let params = DeviceParameters::default();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_default_sub_steps_truncate() {
        // 1e-7 / 1e-9 evaluates just below 100 in binary floating point
        let pulse = PulseParameters::default();
        assert_eq!(pulse.sub_steps(), 99);

        let pulse = PulseParameters {
            pulse_length: 1e-8,
            base_time_step: 1e-9,
            ..PulseParameters::default()
        };
        assert_eq!(pulse.sub_steps(), 10);
    }

    #[test]
    fn test_zero_time_step_rejected() {
        let mut params = DeviceParameters::default();
        params.pulse.base_time_step = 0.0;
        assert_eq!(params.pulse.sub_steps(), 0);
        assert!(matches!(
            params.validate(),
            Err(PhysicsError::InvalidParameter { name: "pulse.base_time_step", .. })
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut params = DeviceParameters::default();
        params.bounds.ndisc_max = params.bounds.ndisc_min;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_instance_radius_round_trip() {
        let params = DeviceParameters::default();
        let mut instance = InstanceParameters::nominal(&params);
        assert!((instance.disc_radius() - 45e-9).abs() < 1e-18);

        instance.set_disc_radius(50e-9);
        assert!((instance.area - PI * 2.5e-15).abs() < 1e-25);
    }

    #[test]
    fn test_window_above_saturation_rejected() {
        let mut params = DeviceParameters::default();
        params.readout.current_max = saturation_current(params.pulse.read_voltage, &params);
        assert!(matches!(
            params.validate(),
            Err(PhysicsError::InvalidParameter { name: "readout.current_max", .. })
        ));

        params.readout.current_max *= 0.99;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_nominal_instance_reads_through_global_window() {
        let params = DeviceParameters::default();
        let instance = InstanceParameters::nominal(&params);
        assert_eq!(instance.readout(&params), params.readout);
    }

    #[test]
    fn test_default_readout_spans_bounds() {
        let params = DeviceParameters::default();
        let low = params.read_current(params.bounds.ndisc_min);
        let high = params.read_current(params.bounds.ndisc_max);
        assert_eq!(params.readout.current_min, low);
        assert_eq!(params.readout.current_max, high);
        assert!(high > low && low > 0.0);
    }
}
