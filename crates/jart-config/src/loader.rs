// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, JartConfig, ModelKind};
use jart_physics::{DeviceParameters, ReadoutWindow};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "jart_configuration.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `JART_CONFIG_PATH` environment variable
/// 2. Current working directory: `./jart_configuration.toml`
/// 3. Parent directories, up to 5 levels
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("JART_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by JART_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        search_paths.extend(
            cwd.ancestors()
                .skip(1)
                .take(5)
                .map(|dir| dir.join(CONFIG_FILE_NAME)),
        );
    }

    if let Some(path) = search_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet JART_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// * `config_path` - Config file; searched for when `None`
/// * `cli_args` - Optional CLI overrides
///
/// The result is not validated; call [`crate::validate_config`].
///
/// # Errors
///
/// Returns error if the config file is not found, cannot be read or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<JartConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: JartConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn env_f64(name: &str) -> Option<f64> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

/// Set the read voltage and re-derive the readout window at the new voltage
fn set_read_voltage(params: &mut DeviceParameters, read_voltage: f64) {
    params.pulse.read_voltage = read_voltage;
    let window = params.readout;
    params.readout = ReadoutWindow::spanning_bounds(params, window.w_min, window.w_max);
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `JART_SEED` -> `seed`
/// - `JART_LOG_LEVEL` -> `logging.level`
/// - `JART_PULSE_LENGTH` -> `pulse.pulse_length` (both models)
/// - `JART_BASE_TIME_STEP` -> `pulse.base_time_step` (both models)
/// - `JART_READ_VOLTAGE` -> `pulse.read_voltage` (both models; readout window re-derived)
/// - `JART_WRITE_NOISE_STD` -> `device.write_noise_std`
///
/// Unparseable values are ignored.
pub fn apply_environment_overrides(config: &mut JartConfig) {
    if let Some(seed) = env::var("JART_SEED").ok().and_then(|v| v.trim().parse().ok()) {
        config.seed = seed;
    }
    if let Ok(value) = env::var("JART_LOG_LEVEL") {
        config.logging.level = value;
    }

    if let Some(pulse_length) = env_f64("JART_PULSE_LENGTH") {
        config.device.parameters.pulse.pulse_length = pulse_length;
        config.static_device.parameters.pulse.pulse_length = pulse_length;
    }
    if let Some(dt) = env_f64("JART_BASE_TIME_STEP") {
        config.device.parameters.pulse.base_time_step = dt;
        config.static_device.parameters.pulse.base_time_step = dt;
    }
    if let Some(read_voltage) = env_f64("JART_READ_VOLTAGE") {
        set_read_voltage(&mut config.device.parameters, read_voltage);
        set_read_voltage(&mut config.static_device.parameters, read_voltage);
    }
    if let Some(std) = env_f64("JART_WRITE_NOISE_STD") {
        config.device.write_noise_std = std;
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys: `seed`, `log_level`, `model`, `d_size`, `x_size`.
pub fn apply_cli_overrides(config: &mut JartConfig, cli_args: &HashMap<String, String>) {
    if let Some(seed) = cli_args.get("seed").and_then(|v| v.parse().ok()) {
        config.seed = seed;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(model) = cli_args.get("model").and_then(|v| v.parse::<ModelKind>().ok()) {
        config.model = model;
    }
    if let Some(d_size) = cli_args.get("d_size").and_then(|v| v.parse().ok()) {
        config.crossbar.d_size = d_size;
    }
    if let Some(x_size) = cli_args.get("x_size").and_then(|v| v.parse().ok()) {
        config.crossbar.x_size = x_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: &[&str] = &[
        "JART_SEED",
        "JART_LOG_LEVEL",
        "JART_PULSE_LENGTH",
        "JART_BASE_TIME_STEP",
        "JART_READ_VOLTAGE",
        "JART_WRITE_NOISE_STD",
    ];

    fn clear_override_vars() {
        for name in OVERRIDE_VARS {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("JART_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("JART_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_reported() {
        let _env_lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        env::set_var("JART_CONFIG_PATH", missing.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("JART_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(msg)) if msg.contains("nope.toml")));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "seed = 17").unwrap();
        writeln!(file, "model = \"static\"").unwrap();
        writeln!(file, "[crossbar]").unwrap();
        writeln!(file, "d_size = 8").unwrap();
        writeln!(file, "[device.parameters.pulse]").unwrap();
        writeln!(file, "pulse_length = 2e-7").unwrap();
        writeln!(file, "[static_device]").unwrap();
        writeln!(file, "track_persistent = false").unwrap();
        writeln!(file, "dw_min = 0.02").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.seed, 17);
        assert_eq!(config.model, ModelKind::Static);
        assert_eq!(config.crossbar.d_size, 8);
        assert_eq!(config.crossbar.x_size, 64);
        assert_eq!(config.device.parameters.pulse.pulse_length, 2e-7);
        assert_eq!(config.device.parameters.pulse.base_time_step, 1e-9);
        assert!(!config.static_device.track_persistent);
        assert_eq!(config.static_device.dw_min, Some(0.02));
        assert_eq!(config.device.parameters.readout, ReadoutWindow::default());
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let _env_lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "model = \"bogus\"\n").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_override_vars();
        let mut config = JartConfig::default();

        env::set_var("JART_SEED", "99");
        env::set_var("JART_BASE_TIME_STEP", "2e-10");
        env::set_var("JART_WRITE_NOISE_STD", "0.05");
        env::set_var("JART_PULSE_LENGTH", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.seed, 99);
        assert_eq!(config.device.parameters.pulse.base_time_step, 2e-10);
        assert_eq!(config.static_device.parameters.pulse.base_time_step, 2e-10);
        assert_eq!(config.device.write_noise_std, 0.05);
        assert_eq!(config.device.parameters.pulse.pulse_length, 1e-7);
    }

    #[test]
    fn test_read_voltage_override_rederives_window() {
        let _env_lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_override_vars();
        let mut config = JartConfig::default();

        env::set_var("JART_READ_VOLTAGE", "0.3");
        apply_environment_overrides(&mut config);
        clear_override_vars();

        let params = &config.device.parameters;
        assert_eq!(params.pulse.read_voltage, 0.3);
        let expected = ReadoutWindow::spanning_bounds(params, -1.0, 1.0);
        assert_eq!(params.readout, expected);
        assert!(params.readout.current_max > ReadoutWindow::default().current_max);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = JartConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("seed".to_string(), "5".to_string());
        cli_args.insert("model".to_string(), "Static".to_string());
        cli_args.insert("x_size".to_string(), "128".to_string());
        cli_args.insert("log_level".to_string(), "debug".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.seed, 5);
        assert_eq!(config.model, ModelKind::Static);
        assert_eq!(config.crossbar.x_size, 128);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "seed = 1").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();

        env::set_var("JART_SEED", "2");
        env::set_var("JART_LOG_LEVEL", "debug");

        let mut cli_args = HashMap::new();
        cli_args.insert("seed".to_string(), "3".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for the seed, environment for the level
        assert_eq!(config.seed, 3);
        assert_eq!(config.logging.level, "debug");
    }
}
