// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! Parses a bytecode image file into an immutable, shareable [`Image`]: the
//! code segment with branch targets rewritten to byte offsets, the
//! instruction pointer table, and the initial contents of data memory.

use crate::error::ImageError;
use crate::opcode::OpCode;
use arena_core::VM_MAGIC;
use byteorder::{ByteOrder, LittleEndian};

const HEADER_LEN: usize = 32;

/// An immutable, prepared bytecode image. Many [`crate::Vm`] instances can
/// share one `Image` (wrapped in an `Arc` by the caller); preparing it once
/// and running it many times is the point.
#[derive(Debug, Clone)]
pub struct Image {
    /// Code segment, with branch operands already rewritten to byte
    /// offsets.
    pub code: Vec<u8>,
    /// Byte offset of each instruction, indexed by instruction number.
    pub instruction_offsets: Vec<u32>,
    /// Initial data memory contents: the initialized-data segment followed
    /// by the literal segment, copied verbatim into a fresh VM's data
    /// memory at offset 0. BSS is zero-filled separately since it carries
    /// no file bytes.
    pub initial_data: Vec<u8>,
    pub data_len: u32,
    pub lit_len: u32,
    pub bss_len: u32,
}

struct Header {
    instr_count: u32,
    code_off: u32,
    code_len: u32,
    data_off: u32,
    data_len: u32,
    lit_len: u32,
    bss_len: u32,
}

fn read_header(bytes: &[u8]) -> Result<Header, ImageError> {
    if bytes.len() < HEADER_LEN {
        return Err(ImageError::HeaderTruncated { needed: HEADER_LEN, available: bytes.len() });
    }
    let magic = LittleEndian::read_u32(&bytes[0..4]);
    if magic != VM_MAGIC {
        return Err(ImageError::BadMagic { expected: VM_MAGIC, actual: magic });
    }
    Ok(Header {
        instr_count: LittleEndian::read_u32(&bytes[4..8]),
        code_off: LittleEndian::read_u32(&bytes[8..12]),
        code_len: LittleEndian::read_u32(&bytes[12..16]),
        data_off: LittleEndian::read_u32(&bytes[16..20]),
        data_len: LittleEndian::read_u32(&bytes[20..24]),
        lit_len: LittleEndian::read_u32(&bytes[24..28]),
        bss_len: LittleEndian::read_u32(&bytes[28..32]),
    })
}

impl Image {
    /// Loads and prepares a bytecode image from raw file bytes.
    pub fn load(bytes: &[u8]) -> Result<Image, ImageError> {
        let header = read_header(bytes)?;

        let code_end = header.code_off as u64 + header.code_len as u64;
        if code_end > bytes.len() as u64 {
            return Err(ImageError::CodeSegmentOutOfRange {
                offset: header.code_off,
                length: header.code_len,
                file_size: bytes.len(),
            });
        }
        let data_end = header.data_off as u64 + header.data_len as u64 + header.lit_len as u64;
        if data_end > bytes.len() as u64 {
            return Err(ImageError::DataSegmentOutOfRange {
                offset: header.data_off,
                length: header.data_len + header.lit_len,
                file_size: bytes.len(),
            });
        }

        let code_start = header.code_off as usize;
        let code_len = header.code_len as usize;
        let mut code = bytes[code_start..code_start + code_len].to_vec();

        let (instruction_offsets, found) = build_instruction_table(&code)?;
        if found as u32 != header.instr_count {
            return Err(ImageError::InstructionCountMismatch {
                claimed: header.instr_count,
                found: found as u32,
            });
        }

        rewrite_branch_targets(&mut code, &instruction_offsets)?;

        let data_start = header.data_off as usize;
        let mut initial_data = vec![0u8; (header.data_len + header.lit_len) as usize];
        // Initialized data is stored as little-endian 32-bit words and
        // copied word-for-word; on a little-endian host this is a
        // straightforward byte copy of the whole initialized region.
        initial_data[..header.data_len as usize]
            .copy_from_slice(&bytes[data_start..data_start + header.data_len as usize]);
        // The literal segment is raw bytes, copied as-is.
        let lit_start = data_start + header.data_len as usize;
        initial_data[header.data_len as usize..]
            .copy_from_slice(&bytes[lit_start..lit_start + header.lit_len as usize]);

        Ok(Image {
            code,
            instruction_offsets,
            initial_data,
            data_len: header.data_len,
            lit_len: header.lit_len,
            bss_len: header.bss_len,
        })
    }
}

/// Walks the code segment once, decoding each opcode and its inline
/// operand, and records the byte offset of every instruction.
fn build_instruction_table(code: &[u8]) -> Result<(Vec<u32>, usize), ImageError> {
    let mut offsets = Vec::new();
    let mut pc = 0usize;
    while pc < code.len() {
        let opcode = OpCode::decode(code[pc]).ok_or(ImageError::UnknownOpcode { opcode: code[pc], pc })?;
        offsets.push(pc as u32);
        pc += 1 + opcode.operand_size();
    }
    let found = offsets.len();
    Ok((offsets, found))
}

/// Rewrites every branch opcode's 4-byte operand from an instruction index
/// to the byte offset that index maps to. Running this pass twice on
/// already-rewritten code would corrupt it, so `Image::load` calls it
/// exactly once; callers must not call it again.
fn rewrite_branch_targets(code: &mut [u8], offsets: &[u32]) -> Result<(), ImageError> {
    let mut pc = 0usize;
    while pc < code.len() {
        let opcode = OpCode::decode(code[pc]).expect("already validated by build_instruction_table");
        if opcode.is_branch() {
            let index = LittleEndian::read_i32(&code[pc + 1..pc + 5]);
            let target = *offsets.get(index as usize).ok_or(ImageError::BranchRewriteOutOfRange {
                index,
                instr_count: offsets.len(),
            })?;
            LittleEndian::write_u32(&mut code[pc + 1..pc + 5], target);
        }
        pc += 1 + opcode.operand_size();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(instr_count: u32, code_len: u32, data_len: u32, lit_len: u32, bss_len: u32) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        LittleEndian::write_u32(&mut h[0..4], VM_MAGIC);
        LittleEndian::write_u32(&mut h[4..8], instr_count);
        LittleEndian::write_u32(&mut h[8..12], HEADER_LEN as u32);
        LittleEndian::write_u32(&mut h[12..16], code_len);
        LittleEndian::write_u32(&mut h[16..20], HEADER_LEN as u32 + code_len);
        LittleEndian::write_u32(&mut h[20..24], data_len);
        LittleEndian::write_u32(&mut h[24..28], lit_len);
        LittleEndian::write_u32(&mut h[28..32], bss_len);
        h
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = header(0, 0, 0, 0, 0);
        bytes[0] = 0;
        let err = Image::load(&bytes).unwrap_err();
        assert!(matches!(err, ImageError::BadMagic { .. }));
    }

    #[test]
    fn single_leave_instruction_loads() {
        // LEAVE(4) with operand 0.
        let mut code = vec![OpCode::Leave as u8];
        code.extend_from_slice(&0i32.to_le_bytes());
        let mut bytes = header(1, code.len() as u32, 0, 0, 0);
        bytes.extend_from_slice(&code);
        let image = Image::load(&bytes).expect("load should succeed");
        assert_eq!(image.instruction_offsets, vec![0]);
        assert_eq!(image.data_len, 0);
    }

    #[test]
    fn instruction_count_mismatch_fails() {
        let code = vec![OpCode::Break as u8, OpCode::Break as u8];
        let mut bytes = header(1, code.len() as u32, 0, 0, 0);
        bytes.extend_from_slice(&code);
        let err = Image::load(&bytes).unwrap_err();
        assert!(matches!(err, ImageError::InstructionCountMismatch { claimed: 1, found: 2 }));
    }

    #[test]
    fn branch_target_rewrite_is_idempotent_across_loads() {
        // JUMP target isn't rewritten (resolved at execution time); EQ is.
        // Build: instr0 = EQ -> instr1, instr1 = BREAK.
        let mut code = vec![OpCode::Eq as u8];
        code.extend_from_slice(&1i32.to_le_bytes());
        code.push(OpCode::Break as u8);
        let mut bytes = header(2, code.len() as u32, 0, 0, 0);
        bytes.extend_from_slice(&code);

        let image_a = Image::load(&bytes).unwrap();
        let image_b = Image::load(&bytes).unwrap();
        assert_eq!(image_a.code, image_b.code);
        // instr1's byte offset is 5 (1 opcode byte + 4 operand bytes).
        assert_eq!(LittleEndian::read_u32(&image_a.code[1..5]), 5);
    }

    #[test]
    fn unknown_opcode_fails_to_load() {
        let code = vec![0xFFu8];
        let mut bytes = header(1, code.len() as u32, 0, 0, 0);
        bytes.extend_from_slice(&code);
        let err = Image::load(&bytes).unwrap_err();
        assert!(matches!(err, ImageError::UnknownOpcode { opcode: 0xFF, pc: 0 }));
    }
}
