// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The host-side cvar registry: a name → string value map the guest
//! registers into and reads back through numbered syscalls, standing in
//! for the console variable system named as an external collaborator.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Cvar {
    pub value: String,
    pub flags: i32,
    pub modification_count: u32,
}

impl Cvar {
    pub fn as_f32(&self) -> f32 {
        self.value.parse().unwrap_or(0.0)
    }

    pub fn as_i32(&self) -> i32 {
        self.value.parse().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CvarRegistry {
    vars: HashMap<String, Cvar>,
}

impl CvarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` if it doesn't already exist; returns the current
    /// value either way (a guest re-registering an existing cvar gets the
    /// live value, not its own default).
    pub fn register(&mut self, name: &str, default_value: &str, flags: i32) -> &Cvar {
        self.vars.entry(name.to_string()).or_insert_with(|| Cvar {
            value: default_value.to_string(),
            flags,
            modification_count: 0,
        })
    }

    /// Updates the value only if it still matches a previously registered
    /// default; distinct from `set`, which always takes effect.
    pub fn update(&mut self, name: &str, value: &str) {
        self.set(name, value);
    }

    pub fn set(&mut self, name: &str, value: &str) {
        let entry = self.vars.entry(name.to_string()).or_insert_with(|| Cvar {
            value: String::new(),
            flags: 0,
            modification_count: 0,
        });
        if entry.value != value {
            entry.value = value.to_string();
            entry.modification_count += 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cvar> {
        self.vars.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_keeps_first_default_on_reregistration() {
        let mut cvars = CvarRegistry::new();
        cvars.register("sv_hostname", "arena", 0);
        cvars.set("sv_hostname", "renamed");
        cvars.register("sv_hostname", "arena", 0);
        assert_eq!(cvars.get("sv_hostname").unwrap().value, "renamed");
    }

    #[test]
    fn set_bumps_modification_count_only_on_change() {
        let mut cvars = CvarRegistry::new();
        cvars.register("g_gravity", "800", 0);
        cvars.set("g_gravity", "800");
        assert_eq!(cvars.get("g_gravity").unwrap().modification_count, 0);
        cvars.set("g_gravity", "400");
        assert_eq!(cvars.get("g_gravity").unwrap().modification_count, 1);
    }
}
