// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The UI syscall router. The UI module's import table is a single
//! numbered space this core does not enumerate (menu layout, widget
//! drawing, and the rest of the front-end are out of scope); every call
//! is forwarded to a collaborator and logged once per number.

use std::collections::HashSet;

use arena_vm::{DataMemory, SyscallHost, SYSCALL_ARGS};
use tracing::trace;

/// Handles a UI syscall by number; the default no-op lets the router run
/// headless (a dedicated front-end would supply the real implementation).
pub trait UiCollaborator {
    fn dispatch(&mut self, number: i32, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32;
}

pub struct NoUi;

impl UiCollaborator for NoUi {
    fn dispatch(&mut self, _number: i32, _memory: &mut DataMemory, _args: &[i32; SYSCALL_ARGS]) -> i32 {
        0
    }
}

pub struct UiRouter {
    collaborator: Box<dyn UiCollaborator>,
    logged: HashSet<i32>,
}

impl Default for UiRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl UiRouter {
    pub fn new() -> Self {
        Self { collaborator: Box::new(NoUi), logged: HashSet::new() }
    }

    pub fn with_collaborator(collaborator: Box<dyn UiCollaborator>) -> Self {
        Self { collaborator, logged: HashSet::new() }
    }
}

impl SyscallHost for UiRouter {
    fn syscall(&mut self, memory: &mut DataMemory, args: &[i32; SYSCALL_ARGS]) -> i32 {
        if self.logged.insert(args[0]) {
            trace!(syscall = args[0], "UI syscall forwarded to collaborator");
        }
        self.collaborator.dispatch(args[0], memory, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_router_answers_every_number_with_zero() {
        let mut router = UiRouter::new();
        let mut mem = DataMemory::new(64);
        assert_eq!(router.syscall(&mut mem, &[5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]), 0);
        assert_eq!(router.syscall(&mut mem, &[5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]), 0);
    }
}
