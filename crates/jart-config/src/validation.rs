// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Configuration validation
//!
//! Collects every violation in the configuration before reporting, so one run
//! shows all the problems in a config file.

use crate::{ConfigError, ConfigResult, JartConfig};
use jart_device::{VariabilityParameters, WeightLawParameters};
use jart_physics::DeviceParameters;

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NonPositive { field: String, value: f64 },
    Negative { field: String, value: f64 },
    InvertedRange { field: String, low: f64, high: f64 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositive { field, value } => {
                write!(f, "{} = {} must be positive", field, value)
            }
            Self::Negative { field, value } => {
                write!(f, "{} = {} must not be negative", field, value)
            }
            Self::InvertedRange { field, low, high } => {
                write!(f, "{} range [{}, {}] is inverted or empty", field, low, high)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks both device sections, the crossbar shape and the logging level.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &JartConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_parameters("device", &config.device.parameters, &mut errors);
    validate_variability("device", &config.device.variability, &mut errors);
    validate_laws("device", &config.device.laws, &mut errors);
    check_non_negative(
        "device.write_noise_std",
        config.device.write_noise_std,
        &mut errors,
    );
    if let Some(dw_min) = config.device.dw_min {
        check_positive("device.dw_min", dw_min, &mut errors);
    }
    check_ratio("device.clamp_warn_ratio", config.device.clamp_warn_ratio, &mut errors);

    let static_device = &config.static_device;
    validate_parameters("static_device", &static_device.parameters, &mut errors);
    validate_variability("static_device", &static_device.variability, &mut errors);
    validate_laws("static_device", &static_device.laws, &mut errors);
    if let Some(dw_min) = static_device.dw_min {
        check_positive("static_device.dw_min", dw_min, &mut errors);
    }
    check_ratio(
        "static_device.clamp_warn_ratio",
        static_device.clamp_warn_ratio,
        &mut errors,
    );

    validate_crossbar(config, &mut errors);

    if config.logging.level.trim().is_empty() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn check_positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value > 0.0) {
        errors.push(ConfigValidationError::NonPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn check_non_negative(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value >= 0.0) {
        errors.push(ConfigValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
}

fn check_ratio(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!("{} must be between 0.0 and 1.0", value),
        });
    }
}

fn check_range(field: &str, low: f64, high: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(low < high) {
        errors.push(ConfigValidationError::InvertedRange {
            field: field.to_string(),
            low,
            high,
        });
    }
}

/// Time steps, voltages and bound pairs of one parameter set
fn validate_parameters(
    section: &str,
    params: &DeviceParameters,
    errors: &mut Vec<ConfigValidationError>,
) {
    let reported_before = errors.len();
    let pulse = &params.pulse;
    check_positive(
        &format!("{}.parameters.pulse.base_time_step", section),
        pulse.base_time_step,
        errors,
    );
    if pulse.base_time_step > 0.0 && pulse.pulse_length < pulse.base_time_step {
        errors.push(ConfigValidationError::InvalidValue {
            field: format!("{}.parameters.pulse.pulse_length", section),
            reason: format!(
                "{} is shorter than base_time_step {}; a pulse would have no sub-steps",
                pulse.pulse_length, pulse.base_time_step
            ),
        });
    }
    check_positive(
        &format!("{}.parameters.pulse.read_voltage", section),
        pulse.read_voltage,
        errors,
    );
    if !(pulse.set_voltage < 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: format!("{}.parameters.pulse.set_voltage", section),
            reason: format!("{} must be negative", pulse.set_voltage),
        });
    }
    check_positive(
        &format!("{}.parameters.pulse.reset_voltage", section),
        pulse.reset_voltage,
        errors,
    );

    check_positive(
        &format!("{}.parameters.bounds.ndisc_min", section),
        params.bounds.ndisc_min,
        errors,
    );
    check_range(
        &format!("{}.parameters.bounds", section),
        params.bounds.ndisc_min,
        params.bounds.ndisc_max,
        errors,
    );
    check_range(
        &format!("{}.parameters.geometry.ndisc", section),
        params.geometry.ndisc_min,
        params.geometry.ndisc_max,
        errors,
    );

    let readout = &params.readout;
    check_positive(
        &format!("{}.parameters.readout.current_min", section),
        readout.current_min,
        errors,
    );
    check_range(
        &format!("{}.parameters.readout.current", section),
        readout.current_min,
        readout.current_max,
        errors,
    );
    check_range(
        &format!("{}.parameters.readout.weight", section),
        readout.w_min,
        readout.w_max,
        errors,
    );

    // Remaining physical constraints (geometry, kinetics) are owned by the physics crate
    if errors.len() == reported_before {
        if let Err(err) = params.validate() {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("{}.parameters", section),
                reason: err.to_string(),
            });
        }
    }
}

fn validate_variability(
    section: &str,
    variability: &VariabilityParameters,
    errors: &mut Vec<ConfigValidationError>,
) {
    for field in variability.invalid_fields() {
        errors.push(ConfigValidationError::InvalidValue {
            field: format!("{}.variability.{}", section, field),
            reason: "spreads must be non-negative and limits ordered".to_string(),
        });
    }
}

fn validate_laws(section: &str, laws: &WeightLawParameters, errors: &mut Vec<ConfigValidationError>) {
    let named = [
        ("lifetime", laws.lifetime),
        ("lifetime_dtod", laws.lifetime_dtod),
        ("diffusion", laws.diffusion),
        ("diffusion_dtod", laws.diffusion_dtod),
        ("reset_dtod", laws.reset_dtod),
        ("reset_std", laws.reset_std),
        ("drift.nu", laws.drift.nu),
        ("drift.nu_dtod", laws.drift.nu_dtod),
        ("drift.reset_tol", laws.drift.reset_tol),
    ];
    for (name, value) in named {
        check_non_negative(&format!("{}.laws.{}", section, name), value, errors);
    }
    if laws.drift.is_enabled() {
        check_positive(&format!("{}.laws.drift.t0", section), laws.drift.t0, errors);
    }
}

fn validate_crossbar(config: &JartConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.crossbar.d_size == 0 || config.crossbar.x_size == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "crossbar".to_string(),
            reason: format!(
                "shape ({}, {}) must be non-empty",
                config.crossbar.d_size, config.crossbar.x_size
            ),
        });
    }
}
