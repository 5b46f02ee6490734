use thiserror::Error;

use d3d9_decompiler::{Opcode, RegisterKey, SrcModifier};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("opcode {} is not supported by the interpreter", .0.name())]
    UnsupportedOpcode(Opcode),

    #[error("source modifier '{}' is not supported by the interpreter", .0.name())]
    UnsupportedModifier(SrcModifier),

    #[error("unknown result shift modifier {0}")]
    UnsupportedResultShift(u8),

    #[error("{} instruction has no {what}", .opcode.name())]
    MissingOperand { opcode: Opcode, what: &'static str },

    #[error("{} instruction reads past the last register after {base}", .opcode.name())]
    RegisterRangeOverflow { opcode: Opcode, base: RegisterKey },

    #[error("{} instruction is missing its literal tokens", .0.name())]
    MissingLiterals(Opcode),
}
