//! Reference interpreter for straight-line D3D9 shader arithmetic.
//!
//! Used to check decompiled output against the input bytecode on the CPU. Texture sampling and
//! flow control are out of reach; the interpreter reports them as unsupported instead of guessing.

mod error;
mod machine;

pub use error::ExecError;
pub use machine::{Flow, Machine};
