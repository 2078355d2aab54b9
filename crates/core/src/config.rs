// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Layered runtime configuration for the engine. Deserialized from an
//! optional TOML file, then overridden by CLI flags in the `node` binary.
//! Every field has a built-in default so a bare `EngineConfig::default()`
//! is enough to boot a map.

use crate::constants::{DEFAULT_ITERATION_CAP, FRAME_MSEC, MAX_CLIENTS, OPERAND_STACK_MIN};
use serde::{Deserialize, Serialize};

/// Filesystem search-path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Root directories searched, in order, for pak archives and loose files.
    pub search_paths: Vec<String>,
    /// Glob-style filter applied to pak archive names; empty matches all.
    pub pak_filter: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            search_paths: vec!["./baseq".to_string()],
            pak_filter: String::new(),
        }
    }
}

/// Networking and loop cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Server tick period, in milliseconds. Fixed by the protocol at 50 in
    /// practice; exposed here so tests can run an accelerated loop.
    pub frame_msec: u32,
    /// Placeholder for a future real socket port; unused while the
    /// transport is loopback-only.
    pub port: u16,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self { frame_msec: FRAME_MSEC, port: 27960 }
    }
}

/// Server-side gameplay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SvConfig {
    pub max_clients: usize,
    pub hostname: String,
    pub cheats: bool,
}

impl Default for SvConfig {
    fn default() -> Self {
        Self { max_clients: MAX_CLIENTS, hostname: "arena server".to_string(), cheats: false }
    }
}

/// Per-VM resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub iteration_cap: u64,
    pub operand_stack_capacity: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { iteration_cap: DEFAULT_ITERATION_CAP, operand_stack_capacity: OPERAND_STACK_MIN }
    }
}

/// Top-level engine configuration, composed from the sections above.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fs: FsConfig,
    pub net: NetConfig,
    pub sv: SvConfig,
    pub vm: VmConfig,
}

impl EngineConfig {
    /// Parses a TOML document into a config, falling back to defaults for
    /// any section or field the document omits.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg = EngineConfig::from_toml_str("[sv]\nmax_clients = 8\n").unwrap();
        assert_eq!(cfg.sv.max_clients, 8);
        assert_eq!(cfg.net.frame_msec, FRAME_MSEC);
        assert_eq!(cfg.vm.iteration_cap, DEFAULT_ITERATION_CAP);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = EngineConfig::from_toml_str("").unwrap();
        let def = EngineConfig::default();
        assert_eq!(cfg.sv.max_clients, def.sv.max_clients);
        assert_eq!(cfg.net.frame_msec, def.net.frame_msec);
    }
}
