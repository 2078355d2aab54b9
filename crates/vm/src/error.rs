// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Error types for image loading and guest execution.

use thiserror::Error;

/// Errors that can occur while parsing a bytecode image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("bad magic: expected {expected:#010x}, got {actual:#010x}")]
    BadMagic { expected: u32, actual: u32 },

    #[error("header truncated: need at least {needed} bytes, file has {available}")]
    HeaderTruncated { needed: usize, available: usize },

    #[error("code segment exceeds file: offset {offset}, length {length}, file size {file_size}")]
    CodeSegmentOutOfRange { offset: u32, length: u32, file_size: usize },

    #[error("data segment exceeds file: offset {offset}, length {length}, file size {file_size}")]
    DataSegmentOutOfRange { offset: u32, length: u32, file_size: usize },

    #[error("unknown opcode {opcode:#04x} at code offset {pc}")]
    UnknownOpcode { opcode: u8, pc: usize },

    #[error("instruction count mismatch: header claims {claimed}, prepare pass found {found}")]
    InstructionCountMismatch { claimed: u32, found: u32 },

    #[error("branch target instruction index {index} out of range (0..{instr_count})")]
    BranchRewriteOutOfRange { index: i32, instr_count: usize },
}

/// Errors raised by the interpreter while executing a guest call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("program counter {pc} out of code bounds ({code_len})")]
    PcOutOfRange { pc: usize, code_len: usize },

    #[error("program stack pointer {ps} fell below stack bottom {stack_bottom}")]
    StackUnderflow { ps: i64, stack_bottom: i64 },

    #[error("operand stack overflow: capacity {capacity} exceeded")]
    OperandStackOverflow { capacity: usize },

    #[error("operand stack underflow: popped an empty stack")]
    OperandStackUnderflow,

    #[error("iteration cap {cap} reached without the guest call returning")]
    IterationCapReached { cap: u64 },

    #[error("guest requested abort: {message}")]
    GuestAbort { message: String },

    #[error("branch target {index} has no instruction offset (instruction table has {table_len})")]
    InvalidBranchTarget { index: i32, table_len: usize },
}
