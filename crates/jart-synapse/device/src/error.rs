// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Error types for device model operations

use jart_physics::PhysicsError;

/// Device model errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    #[error("Device population already sampled")]
    AlreadyPopulated,

    #[error("Device population not sampled yet; call populate() first")]
    NotPopulated,

    #[error("Weight buffer shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Synapse ({row}, {col}) outside population of shape {shape:?}")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        shape: (usize, usize),
    },

    #[error("Flat synapse index {index} outside population of {len} synapses")]
    FlatIndexOutOfRange { index: usize, len: usize },

    #[error("Integration time step must be positive, got {0}")]
    InvalidTimeStep(f64),

    #[error("Invalid device parameters: {0}")]
    InvalidParameters(#[from] PhysicsError),

    #[error("Invalid variability for {0}: spreads must be non-negative and limits ordered")]
    InvalidVariability(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
