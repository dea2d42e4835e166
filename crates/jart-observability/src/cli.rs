// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Per-crate debug flags
//!
//! Supports `--debug-jart-device`, `--debug-all` and the `JART_DEBUG`
//! environment variable.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Crates whose events are raised to debug level
///
/// # Example
/// ```rust
/// use jart_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-jart-device".to_string()]);
/// assert!(flags.is_enabled("jart-device"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Collect `--debug-{crate-name}` and `--debug-all` arguments
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }
        flags
    }

    /// Add crates from a comma-separated list; `all` enables every known crate
    pub fn extend_from_list(&mut self, list: &str) {
        if list.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in list.split(',').map(str::trim) {
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string());
            }
        }
    }

    fn enable_all(&mut self) {
        self.enabled_crates
            .extend(KNOWN_CRATES.iter().map(|name| name.to_string()));
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directives: one `crate=debug` per enabled crate, then `default_level`
    pub fn to_filter_string(&self, default_level: &str) -> String {
        self.enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .chain(std::iter::once(default_level.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Debug flags from the process arguments and `JART_DEBUG`
///
/// `JART_DEBUG` holds comma-separated crate names, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(list) = env::var("JART_DEBUG") {
        flags.extend_from_list(&list);
    }
    flags
}

pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  JART_DEBUG={{crate-name}}[,{{crate-name}}]   Enable debug for crates (comma-separated)
  JART_DEBUG=all                              Enable debug for all crates
  JART_TRACE_PULSES=1                         Per-pulse trace events
  JART_TRACE_SYNAPSE={{row}},{{col}}              Restrict pulse traces to one synapse
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec![
            "jart-sim".to_string(),
            "--debug-jart-device".to_string(),
        ]);
        assert!(flags.is_enabled("jart-device"));
        assert!(!flags.is_enabled("jart-config"));
        assert!(flags.any_enabled());
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_list_parsing() {
        let mut flags = CrateDebugFlags::default();
        flags.extend_from_list(" jart-config , ,jart ");
        assert_eq!(flags.enabled_crates.len(), 2);
        assert!(flags.is_enabled("jart"));

        let mut all = CrateDebugFlags::default();
        all.extend_from_list("all");
        assert_eq!(all.enabled_crates.len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_filter_string() {
        assert_eq!(CrateDebugFlags::default().to_filter_string("warn"), "warn");

        let flags = CrateDebugFlags::from_args(vec![
            "--debug-jart-device".to_string(),
            "--debug-jart-config".to_string(),
        ]);
        assert_eq!(
            flags.to_filter_string("info"),
            "jart-config=debug,jart-device=debug,info"
        );
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-jart-device".to_string()]);
        assert_eq!(flags.log_level("jart-device"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("jart"), tracing::Level::INFO);
    }
}
