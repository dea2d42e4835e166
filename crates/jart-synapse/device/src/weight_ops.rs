// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Non-pulsed weight operations shared by the device models.
//!
//! Each operation maps one synapse's current weight to a new weight. The
//! models decide which weight copy it reads and writes, and how Ndisc is
//! resynchronized afterwards.

use jart_physics::ReadoutWindow;
use ndarray::Array2;
use rand::rngs::StdRng;

use crate::population::SynapseState;
use crate::weight_law::{reset_selected, DriftParameters};

/// A whole-matrix weight operation
#[derive(Debug, Clone, Copy)]
pub enum WeightOp<'a> {
    Decay {
        alpha: f32,
        /// Column left untouched (bias column)
        exempt_col: Option<usize>,
    },
    Drift {
        dt: f64,
        params: DriftParameters,
    },
    Diffuse,
    Clip {
        low: f32,
        high: f32,
    },
    ResetColumns {
        columns: &'a [bool],
        probability: f64,
        reset_std: f64,
    },
    ResetSynapses {
        mask: &'a Array2<bool>,
        reset_std: f64,
    },
}

impl WeightOp<'_> {
    /// Clip range of `clip_weights`: the weight bounds, narrowed to `[-c, c]` for `Some(c)`
    ///
    /// A negative magnitude is treated like `None`.
    pub fn clip(window: &ReadoutWindow, clip: Option<f32>) -> WeightOp<'static> {
        let (w_min, w_max) = (window.w_min as f32, window.w_max as f32);
        match clip {
            Some(magnitude) if magnitude >= 0.0 => WeightOp::Clip {
                low: w_min.max(-magnitude),
                high: w_max.min(magnitude),
            },
            _ => WeightOp::Clip {
                low: w_min,
                high: w_max,
            },
        }
    }

    /// Range the visible weight must respect after the operation, if any
    pub fn visible_range(&self) -> Option<(f32, f32)> {
        match *self {
            WeightOp::Clip { low, high } => Some((low, high)),
            _ => None,
        }
    }

    /// New weight of the synapse at `(row, col)`
    pub fn apply(
        &self,
        (row, col): (usize, usize),
        state: &mut SynapseState,
        weight: f32,
        window: &ReadoutWindow,
        rng: &mut StdRng,
    ) -> f32 {
        let bound = |w: f32| window.clamp_weight(w as f64) as f32;
        match *self {
            WeightOp::Decay { alpha, exempt_col } => {
                if exempt_col == Some(col) {
                    weight
                } else {
                    bound(state.law.decay(weight, alpha))
                }
            }
            WeightOp::Drift { dt, ref params } => {
                bound(state.drift.advance(weight, state.law.drift_nu, dt, params))
            }
            WeightOp::Diffuse => bound(state.law.diffuse(weight, rng)),
            WeightOp::Clip { low, high } => weight.max(low).min(high),
            WeightOp::ResetColumns {
                columns,
                probability,
                reset_std,
            } => {
                if columns[col] && reset_selected(probability, rng) {
                    bound(state.law.reset_value(reset_std, rng))
                } else {
                    weight
                }
            }
            WeightOp::ResetSynapses { mask, reset_std } => {
                if mask[[row, col]] {
                    bound(state.law.reset_value(reset_std, rng))
                } else {
                    weight
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeightOp::Decay { .. } => "decay",
            WeightOp::Drift { .. } => "drift",
            WeightOp::Diffuse => "diffuse",
            WeightOp::Clip { .. } => "clip",
            WeightOp::ResetColumns { .. } => "reset_columns",
            WeightOp::ResetSynapses { .. } => "reset_at_indices",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variability::synapse_rng;
    use crate::weight_law::{DriftState, WeightLaw};
    use jart_physics::{DeviceParameters, InstanceParameters};

    fn synapse(reset_bias: f32) -> SynapseState {
        let params = DeviceParameters::default();
        SynapseState {
            ndisc: params.geometry.ndisc_init,
            instance: InstanceParameters::nominal(&params),
            law: WeightLaw {
                decay_scale: 0.5,
                diffusion_rate: 0.1,
                reset_bias,
                drift_nu: 0.0,
            },
            drift: DriftState::default(),
            persistent: 0.0,
        }
    }

    #[test]
    fn test_clip_range() {
        let window = DeviceParameters::default().readout;
        assert!(matches!(
            WeightOp::clip(&window, Some(0.3)),
            WeightOp::Clip { low, high } if low == -0.3 && high == 0.3
        ));
        assert!(matches!(
            WeightOp::clip(&window, Some(5.0)),
            WeightOp::Clip { low, high } if low == -1.0 && high == 1.0
        ));
        assert!(matches!(
            WeightOp::clip(&window, Some(-1.0)),
            WeightOp::Clip { low, high } if low == -1.0 && high == 1.0
        ));
    }

    #[test]
    fn test_only_clip_bounds_visible_weight() {
        let window = DeviceParameters::default().readout;
        assert_eq!(WeightOp::clip(&window, Some(0.3)).visible_range(), Some((-0.3, 0.3)));
        assert_eq!(WeightOp::Diffuse.visible_range(), None);
    }

    #[test]
    fn test_decay_exempts_bias_column() {
        let window = DeviceParameters::default().readout;
        let mut state = synapse(0.0);
        let mut rng = synapse_rng(0, 0, 0);
        let op = WeightOp::Decay {
            alpha: 1.0,
            exempt_col: Some(3),
        };
        assert_eq!(op.apply((0, 3), &mut state, 0.8, &window, &mut rng), 0.8);
        assert_eq!(op.apply((0, 2), &mut state, 0.8, &window, &mut rng), 0.4);
    }

    #[test]
    fn test_reset_is_bounded() {
        let window = DeviceParameters::default().readout;
        let mut state = synapse(3.0);
        let mut rng = synapse_rng(0, 0, 0);
        let columns = [true, false];
        let op = WeightOp::ResetColumns {
            columns: &columns,
            probability: 1.0,
            reset_std: 0.0,
        };
        assert_eq!(op.apply((0, 0), &mut state, 0.1, &window, &mut rng), 1.0);
        assert_eq!(op.apply((0, 1), &mut state, 0.1, &window, &mut rng), 0.1);
    }

    #[test]
    fn test_diffusion_stays_in_bounds() {
        let window = DeviceParameters::default().readout;
        let mut state = synapse(0.0);
        state.law.diffusion_rate = 10.0;
        let mut rng = synapse_rng(9, 0, 0);
        for _ in 0..50 {
            let w = WeightOp::Diffuse.apply((0, 0), &mut state, 0.0, &window, &mut rng);
            assert!((-1.0..=1.0).contains(&w));
        }
    }
}
