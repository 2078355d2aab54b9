// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Syscall routing tables: the bridge between loaded bytecode guest
//! modules (server-game, client-game, UI) and the rest of the engine
//! core. Each router implements `arena_vm::SyscallHost`; the VM crate
//! never depends back on this one.

mod client_game;
mod configstring;
mod cvar;
mod guest_layout;
mod numbers;
mod server_game;
mod ui;

pub use client_game::{AudioCollaborator, ClientGameRouter, NoAudio, NoRenderer, ReceivedEntity, ReceivedSnapshot, RendererCollaborator};
pub use configstring::ConfigStringTable;
pub use cvar::{Cvar, CvarRegistry};
pub use guest_layout::{trace_result_field, vm_cvar_field, CVAR_STRING_CAPACITY};
pub use numbers::{client as client_numbers};
pub use server_game::ServerGameRouter;
pub use ui::{NoUi, UiCollaborator, UiRouter};
