// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The sixty opcodes of the bytecode stack machine, and the inline operand
//! size the interpreter must skip past each one.

/// A single bytecode instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Undef = 0,
    Ignore,
    Break,
    Enter,
    Leave,
    Call,
    Push,
    Pop,
    Const,
    Local,
    Jump,

    Eq,
    Ne,
    Lti,
    Lei,
    Gti,
    Gei,
    Ltu,
    Leu,
    Gtu,
    Geu,

    Eqf,
    Nef,
    Ltf,
    Lef,
    Gtf,
    Gef,

    Load1,
    Load2,
    Load4,
    Store1,
    Store2,
    Store4,
    Arg,
    BlockCopy,

    Sex8,
    Sex16,

    Negi,
    Add,
    Sub,
    Divi,
    Divu,
    Modi,
    Modu,
    Muli,
    Mulu,

    Band,
    Bor,
    Bxor,
    Bcom,

    Lsh,
    Rshi,
    Rshu,

    Negf,
    Addf,
    Subf,
    Divf,
    Mulf,

    Cvif,
    Cvfi,
}

/// Total number of distinct opcodes, used to size dispatch tables.
pub const OPCODE_COUNT: usize = 60;

impl OpCode {
    /// Decodes a raw byte into an opcode. `None` for any byte beyond the
    /// sixty defined values.
    pub fn decode(byte: u8) -> Option<OpCode> {
        if (byte as usize) >= OPCODE_COUNT {
            return None;
        }
        // SAFETY: `OpCode` is `repr(u8)` with contiguous discriminants
        // 0..OPCODE_COUNT, and the bound above guarantees `byte` is one of
        // them.
        Some(unsafe { std::mem::transmute::<u8, OpCode>(byte) })
    }

    /// Size in bytes of the inline operand following this opcode, not
    /// counting the opcode byte itself.
    pub fn operand_size(self) -> usize {
        use OpCode::*;
        match self {
            Enter | Leave | Const | Local => 4,
            Eq | Ne | Lti | Lei | Gti | Gei | Ltu | Leu | Gtu | Geu => 4,
            Eqf | Nef | Ltf | Lef | Gtf | Gef => 4,
            BlockCopy => 4,
            Arg => 1,
            _ => 0,
        }
    }

    /// True for the eleven integer/float compare-branch opcodes whose
    /// 4-byte operand is an *instruction index* that must be rewritten to a
    /// byte offset during image preparation. `Jump` is excluded: its target
    /// comes off the operand stack and is resolved at execution time.
    pub fn is_branch(self) -> bool {
        use OpCode::*;
        matches!(
            self,
            Eq | Ne
                | Lti
                | Lei
                | Gti
                | Gei
                | Ltu
                | Leu
                | Gtu
                | Geu
                | Eqf
                | Nef
                | Ltf
                | Lef
                | Gtf
                | Gef
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_out_of_range() {
        assert!(OpCode::decode(60).is_none());
        assert!(OpCode::decode(255).is_none());
    }

    #[test]
    fn enter_has_four_byte_operand() {
        assert_eq!(OpCode::Enter.operand_size(), 4);
    }

    #[test]
    fn arg_has_one_byte_operand() {
        assert_eq!(OpCode::Arg.operand_size(), 1);
    }

    #[test]
    fn branch_set_covers_both_compare_classes() {
        // 10 integer compares + 6 float compares. `Jump` is deliberately
        // excluded: its target comes off
        // the operand stack and is resolved at execution time, not during
        // image preparation.
        let branches = (0..OPCODE_COUNT as u8)
            .filter_map(OpCode::decode)
            .filter(|op| op.is_branch())
            .count();
        assert_eq!(branches, 16);
    }
}
