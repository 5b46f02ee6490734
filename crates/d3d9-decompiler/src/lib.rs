//! Register bookkeeping and operand naming for decompiling D3D9 (SM1-SM3) shaders to HLSL.
//!
//! A [`RegisterState`] is loaded once per shader from the constant table and the decoded
//! instruction stream, then queried for the text of each destination and source operand.

pub mod constant_table;
pub mod error;
pub mod instruction;
pub mod literal;
pub mod modifier;
pub mod options;
pub mod register;
pub mod register_state;
pub mod resolve;

pub use constant_table::{
    ConstantDeclaration, ConstantTable, ParameterClass, ParameterType, RegisterSet,
};
pub use error::DecompileError;
pub use instruction::{Instruction, Opcode, ShaderStage, SrcModifier, Swizzle, WriteMask};
pub use options::ResolverOptions;
pub use register::{RegisterDeclaration, RegisterKey, RegisterType};
pub use register_state::{RegisterState, RegisterStateBuilder};
pub use resolve::SourceResolution;
