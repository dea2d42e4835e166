// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Configured crossbar: a device model together with the weight matrix and RNG it drives.

use jart_config::{validate_config, ConfigError, JartConfig, ModelKind};
use jart_device::{
    DeviceError, JartV1bDevice, JartV1bStaticDevice, PulsedDevice, UpdateReport,
};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Errors from building or driving a configured crossbar
#[derive(Debug, thiserror::Error)]
pub enum JartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Validate `config` and construct the selected device model (not yet populated)
pub fn build_device(config: &JartConfig) -> Result<Box<dyn PulsedDevice + Send>, JartError> {
    validate_config(config)?;
    let (d_size, x_size) = (config.crossbar.d_size, config.crossbar.x_size);
    let device: Box<dyn PulsedDevice + Send> = match config.model {
        ModelKind::Full => Box::new(JartV1bDevice::new(d_size, x_size, config.device.clone())?),
        ModelKind::Static => Box::new(JartV1bStaticDevice::new(
            d_size,
            x_size,
            config.static_device.clone(),
        )?),
    };
    info!(
        target: "jart",
        model = device.model_name(),
        d_size,
        x_size,
        seed = config.seed,
        "device built"
    );
    Ok(device)
}

/// Owns the weights and the RNG; every call forwards to the device model
pub struct Crossbar {
    device: Box<dyn PulsedDevice + Send>,
    weights: Array2<f32>,
    rng: StdRng,
}

impl Crossbar {
    /// Build, populate and read out the initial weights
    pub fn from_config(config: &JartConfig) -> Result<Self, JartError> {
        let mut device = build_device(config)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        device.populate(&mut rng)?;

        let states = device.states().ok_or(DeviceError::NotPopulated)?;
        let weights = states.map(|state| state.persistent);
        Ok(Self {
            device,
            weights,
            rng,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.device.shape()
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn device(&self) -> &dyn PulsedDevice {
        self.device.as_ref()
    }

    pub fn dense_update(&mut self, coincidences: ArrayView2<'_, i32>) -> Result<UpdateReport, JartError> {
        Ok(self
            .device
            .dense_update(self.weights.view_mut(), coincidences, &mut self.rng)?)
    }

    pub fn sparse_update(
        &mut self,
        row: usize,
        columns: &[(usize, i8)],
        d_sign: i8,
    ) -> Result<UpdateReport, JartError> {
        Ok(self
            .device
            .sparse_update(self.weights.view_mut(), row, columns, d_sign, &mut self.rng)?)
    }

    /// Apply desired weight changes as whole pulses of the calibrated granularity
    pub fn step_update(&mut self, deltas: ArrayView2<'_, f32>) -> Result<UpdateReport, JartError> {
        Ok(self
            .device
            .step_update(self.weights.view_mut(), deltas, &mut self.rng)?)
    }

    /// Decay then drift by `dt`, as done once per simulation step
    pub fn relax(&mut self, alpha: Option<f32>, bias_no_decay: bool, dt: f64) -> Result<(), JartError> {
        self.device
            .decay_weights(self.weights.view_mut(), alpha, bias_no_decay)?;
        self.device.drift_weights(self.weights.view_mut(), dt)?;
        Ok(())
    }

    pub fn diffuse(&mut self) -> Result<(), JartError> {
        Ok(self
            .device
            .diffuse_weights(self.weights.view_mut(), &mut self.rng)?)
    }

    pub fn clip(&mut self, clip: Option<f32>) -> Result<(), JartError> {
        Ok(self.device.clip_weights(self.weights.view_mut(), clip)?)
    }

    pub fn reset_columns(
        &mut self,
        start_col: usize,
        n_cols: usize,
        reset_prob: f64,
    ) -> Result<(), JartError> {
        Ok(self.device.reset_columns(
            self.weights.view_mut(),
            start_col,
            n_cols,
            reset_prob,
            &mut self.rng,
        )?)
    }

    pub fn reset_at_indices(&mut self, indices: &[usize]) -> Result<(), JartError> {
        Ok(self
            .device
            .reset_at_indices(self.weights.view_mut(), indices, &mut self.rng)?)
    }

    /// Overwrite the weights and resynchronize the device; returns whether its state changed
    pub fn set_weights(&mut self, weights: ArrayView2<'_, f32>) -> Result<bool, JartError> {
        jart_device::check_shape(self.shape(), weights.dim())?;
        self.weights.assign(&weights);
        Ok(self.device.on_set_weights(self.weights.view_mut())?)
    }
}
