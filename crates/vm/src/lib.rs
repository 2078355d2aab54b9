// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The bytecode virtual machine: parses the fixed binary image format
//! shipped with guest game modules, and interprets it with the exact
//! calling convention and stack discipline those modules depend on.

mod error;
mod host;
mod image;
mod interpreter;
mod memory;
mod opcode;

pub use error::{ImageError, VmError};
pub use host::{SyscallHost, SYSCALL_ARGS};
pub use image::Image;
pub use interpreter::Vm;
pub use memory::{next_power_of_two, DataMemory};
pub use opcode::{OpCode, OPCODE_COUNT};
