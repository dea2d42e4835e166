// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Runtime-gated per-synapse tracing.
//!
//! Enable with:
//! - `JART_TRACE_PULSES=1`
//! Optional filter:
//! - `JART_TRACE_SYNAPSE=<row>,<col>` (single synapse)

use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::traits::UpdateReport;

struct PulseTraceCfg {
    enabled: bool,
    synapse_filter: Option<(usize, usize)>,
}

fn pulse_trace_cfg() -> &'static PulseTraceCfg {
    static CFG: OnceLock<PulseTraceCfg> = OnceLock::new();
    CFG.get_or_init(|| {
        let enabled = std::env::var("JART_TRACE_PULSES")
            .ok()
            .as_deref()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let synapse_filter = std::env::var("JART_TRACE_SYNAPSE")
            .ok()
            .and_then(|v| parse_coordinate(&v));

        PulseTraceCfg {
            enabled,
            synapse_filter,
        }
    })
}

fn parse_coordinate(value: &str) -> Option<(usize, usize)> {
    let (row, col) = value.split_once(',')?;
    Some((row.trim().parse().ok()?, col.trim().parse().ok()?))
}

/// Whether pulse-level events of the synapse at `(row, col)` should be emitted
#[inline]
pub(crate) fn should_trace(row: usize, col: usize) -> bool {
    let cfg = pulse_trace_cfg();
    cfg.enabled && cfg.synapse_filter.map_or(true, |target| target == (row, col))
}

/// Log the totals of one update call
pub(crate) fn report_update(model: &'static str, report: &UpdateReport, warn_ratio: f64) {
    let clamp_ratio = report.clamp_ratio();
    if report.clamped_sub_steps > 0 && clamp_ratio > warn_ratio {
        warn!(
            target: "jart-device",
            model,
            pulses = report.pulses,
            clamped_sub_steps = report.clamped_sub_steps,
            clamp_ratio,
            "most sub-steps hit a state bound; base_time_step is likely too coarse"
        );
    } else {
        debug!(
            target: "jart-device",
            model,
            pulses = report.pulses,
            sub_steps = report.sub_steps,
            clamped_sub_steps = report.clamped_sub_steps,
            "update applied"
        );
    }
}
