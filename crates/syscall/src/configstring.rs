// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The fixed 1024-slot configstring table: small, server-authoritative
//! strings (map name, player info, ...) a client's gamestate is built
//! from.

use arena_core::MAX_CONFIGSTRINGS;

#[derive(Debug, Clone)]
pub struct ConfigStringTable {
    slots: Vec<String>,
}

impl Default for ConfigStringTable {
    fn default() -> Self {
        Self { slots: vec![String::new(); MAX_CONFIGSTRINGS] }
    }
}

impl ConfigStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: usize, value: String) {
        if index < self.slots.len() {
            self.slots[index] = value;
        }
    }

    pub fn get(&self, index: usize) -> &str {
        self.slots.get(index).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_index_reads_as_empty_rather_than_panicking() {
        let table = ConfigStringTable::new();
        assert_eq!(table.get(MAX_CONFIGSTRINGS + 10), "");
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut table = ConfigStringTable::new();
        table.set(3, "dm/q3dm17".to_string());
        assert_eq!(table.get(3), "dm/q3dm17");
    }
}
