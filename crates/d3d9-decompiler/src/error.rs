use thiserror::Error;

use crate::constant_table::RegisterSet;
use crate::instruction::{Opcode, SrcModifier};
use crate::register::{RegisterKey, RegisterType};

/// Fatal failures while loading register state or resolving operands.
///
/// An unresolvable constant register is not an error; see
/// [`SourceResolution::Placeholder`](crate::resolve::SourceResolution::Placeholder).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompileError {
    #[error("unsupported register set {0:?} in constant table")]
    UnsupportedRegisterSet(RegisterSet),

    #[error("unexpected dcl of {} register {key}", .key.ty.name())]
    UnsupportedDeclaration { key: RegisterKey },

    #[error("register {key} is declared more than once")]
    DuplicateDeclaration { key: RegisterKey },

    #[error("unsupported register kind {}", .0.name())]
    UnsupportedRegisterKind(RegisterType),

    #[error("unsupported source modifier '{}' on {context}", .modifier.name())]
    UnsupportedModifier {
        modifier: SrcModifier,
        context: &'static str,
    },

    #[error("unsupported misc register index {0}")]
    UnsupportedMiscRegister(u32),

    #[error("no declaration found for register {key}")]
    MissingDeclaration { key: RegisterKey },

    #[error("{} instruction has no {what}", .opcode.name())]
    MissingOperand { opcode: Opcode, what: &'static str },

    #[error("malformed {} instruction: {message}", .opcode.name())]
    MalformedInstruction { opcode: Opcode, message: String },

    #[error("constant {name} spans past the last register ({register_index} + {register_count})")]
    RegisterRangeOverflow {
        name: String,
        register_index: u32,
        register_count: u32,
    },

    #[error("operand width {0} is outside 1..=4")]
    InvalidWidth(usize),
}
