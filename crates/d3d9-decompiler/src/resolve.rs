//! Operand text for the HLSL emitter.
//!
//! Everything here reads a loaded [`RegisterState`]; resolving the same operand twice yields the
//! same text.

use std::fmt;

use tracing::warn;

use crate::constant_table::{ParameterClass, ParameterType, RegisterSet};
use crate::error::DecompileError;
use crate::instruction::{Instruction, SrcOperand, SwizzleComponent};
use crate::literal::{
    apply_float_modifier, apply_int_modifier, collapse, fold_bool, FloatLiteral,
};
use crate::modifier::apply_modifier;
use crate::register::{RegisterDeclaration, RegisterKey, RegisterType};
use crate::register_state::RegisterState;

/// Text produced for a source operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceResolution {
    /// A named register or constant, with swizzle and modifier applied.
    Named(String),
    /// A folded `def`/`defi`/`defb` literal.
    Literal(String),
    /// A constant register with neither a literal nor a table entry, rendered as
    /// `Error <Kind><index>` so output can still be produced.
    Placeholder(String),
}

impl SourceResolution {
    pub fn text(&self) -> &str {
        match self {
            Self::Named(s) | Self::Literal(s) | Self::Placeholder(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Named(s) | Self::Literal(s) | Self::Placeholder(s) => s,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

impl fmt::Display for SourceResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl RegisterState<'_> {
    /// Destination register name followed by its write mask, e.g. `o.color.xyz`.
    ///
    /// The mask is omitted when it covers exactly the register's declared width.
    pub fn destination_name(&self, inst: &Instruction) -> Result<String, DecompileError> {
        let dst = inst.destination().ok_or(DecompileError::MissingOperand {
            opcode: inst.opcode,
            what: "destination",
        })?;
        let name = self.register_name(dst.reg)?;
        let width = self.register_full_length(dst.reg)?;
        if dst.mask.is_leading(width) {
            Ok(name)
        } else {
            Ok(format!("{name}{}", dst.mask.suffix()))
        }
    }

    /// Text of the `n`th source operand. See [`RegisterState::resolve_source`].
    pub fn source_name(&self, inst: &Instruction, n: usize) -> Result<String, DecompileError> {
        self.resolve_source(inst, n).map(SourceResolution::into_text)
    }

    /// Resolves the `n`th source operand (counting source operands only).
    pub fn resolve_source(
        &self,
        inst: &Instruction,
        n: usize,
    ) -> Result<SourceResolution, DecompileError> {
        let src = inst.source(n).ok_or(DecompileError::MissingOperand {
            opcode: inst.opcode,
            what: "source operand",
        })?;
        let key = src.reg;

        let name = if key.ty.is_constant() {
            if let Some(literal) = self.fold_literal(inst, src)? {
                return Ok(SourceResolution::Literal(literal));
            }
            let parameter_type = match key.ty {
                RegisterType::ConstBool => ParameterType::Bool,
                RegisterType::ConstInt => ParameterType::Int,
                _ => ParameterType::Float,
            };
            match self.constant_table.find_by_type(parameter_type, key.number) {
                Some(decl) if decl.parameter_class == ParameterClass::MatrixRows => {
                    format!("{}[{}]", decl.name, key.number - decl.register_index)
                }
                Some(decl) => decl.name.clone(),
                None => {
                    let text = format!("Error {}{}", key.ty.name(), key.number);
                    warn!(%key, opcode = inst.opcode.name(), "constant register has no definition");
                    return Ok(SourceResolution::Placeholder(text));
                }
            }
        } else {
            self.register_name(key)?
        };

        let swizzled = format!("{name}{}", source_swizzle_suffix(inst, src));
        apply_modifier(src.modifier, &swizzled).map(SourceResolution::Named)
    }

    /// HLSL-facing name of a register, without swizzle or mask.
    pub fn register_name(&self, key: RegisterKey) -> Result<String, DecompileError> {
        match key.ty {
            // Legacy shaders read `v#` without a `dcl`; those keep their positional name.
            RegisterType::Input => Ok(match self.declarations.get(&key) {
                Some(decl) => qualify("i", &decl.name, self.method_inputs.len()),
                None => key.to_string(),
            }),
            ty if ty.is_output() => Ok(match self.declarations.get(&key) {
                Some(decl) => qualify("o", &decl.name, self.method_outputs.len()),
                None => key.to_string(),
            }),
            RegisterType::Const => {
                let decl = self
                    .constant_table
                    .find_by_type(ParameterType::Float, key.number)
                    .ok_or(DecompileError::MissingDeclaration { key })?;
                if decl.rows == 1 {
                    return Ok(decl.name.clone());
                }
                let offset = key.number - decl.register_index;
                if self.options.column_major {
                    Ok(format!("transpose({})[{offset}]", decl.name))
                } else {
                    Ok(format!("{}[{offset}]", decl.name))
                }
            }
            RegisterType::Sampler => self
                .constant_table
                .find_by_set(RegisterSet::Sampler, key.number)
                .map(|decl| decl.name.clone())
                .ok_or(DecompileError::MissingDeclaration { key }),
            RegisterType::MiscType => match key.number {
                0 => Ok("vFace".to_owned()),
                1 => Ok("vPos".to_owned()),
                n => Err(DecompileError::UnsupportedMiscRegister(n)),
            },
            RegisterType::Texture | RegisterType::Temp => Ok(self
                .declarations
                .get(&key)
                .map(|decl| decl.name.clone())
                .unwrap_or_else(|| key.to_string())),
            ty => Err(DecompileError::UnsupportedRegisterKind(ty)),
        }
    }

    /// Component count of a register as declared.
    ///
    /// Float constants take the width of their owning table entry.
    pub fn register_full_length(&self, key: RegisterKey) -> Result<usize, DecompileError> {
        if key.ty == RegisterType::Const {
            return self
                .constant_table
                .find_by_type(ParameterType::Float, key.number)
                .map(|decl| decl.columns as usize)
                .ok_or(DecompileError::MissingDeclaration { key });
        }
        self.require_declaration(key)
            .map(|decl| decl.element_type.width())
    }

    fn require_declaration(
        &self,
        key: RegisterKey,
    ) -> Result<&RegisterDeclaration, DecompileError> {
        self.declarations
            .get(&key)
            .ok_or(DecompileError::MissingDeclaration { key })
    }

    /// Folds a literal-defined constant operand; `None` when the register has no literal.
    fn fold_literal(
        &self,
        inst: &Instruction,
        src: &SrcOperand,
    ) -> Result<Option<String>, DecompileError> {
        let selected = selected_components(inst, src);
        let width = inst.destination_mask_len().unwrap_or(4);
        let number = src.reg.number;

        match src.reg.ty {
            RegisterType::Const
            | RegisterType::Const2
            | RegisterType::Const3
            | RegisterType::Const4 => {
                let Some(def) = self.float_constant(number) else {
                    return Ok(None);
                };
                let components =
                    apply_float_modifier(selected.map(|c| def[c.index()]), src.modifier)?;
                collapse(&components.map(FloatLiteral), width, "float").map(Some)
            }
            RegisterType::ConstInt => {
                let Some(def) = self.int_constant(number) else {
                    return Ok(None);
                };
                let components =
                    apply_int_modifier(selected.map(|c| def[c.index()]), src.modifier)?;
                collapse(&components, width, "int").map(Some)
            }
            RegisterType::ConstBool => match self.bool_constant(number) {
                Some(def) => fold_bool(def.value, src.modifier).map(Some),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

fn qualify(prefix: &str, name: &str, count: usize) -> String {
    if count == 1 {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Source swizzle compacted through the destination write mask.
fn selected_components(inst: &Instruction, src: &SrcOperand) -> [SwizzleComponent; 4] {
    match inst.destination() {
        Some(dst) => src.swizzle.masked(dst.mask),
        None => src.swizzle.0,
    }
}

/// `.x`-style suffix for a source operand; empty when the read is the identity prefix.
fn source_swizzle_suffix(inst: &Instruction, src: &SrcOperand) -> String {
    let selected = selected_components(inst, src);
    let n = inst.destination_mask_len().unwrap_or(4).clamp(1, 4);
    let selected = &selected[..n];

    if selected
        .iter()
        .zip(SwizzleComponent::ALL)
        .all(|(c, identity)| *c == identity)
    {
        return String::new();
    }
    if selected.iter().all(|c| *c == selected[0]) {
        return format!(".{}", selected[0].letter());
    }
    let letters: String = selected.iter().map(|c| c.letter()).collect();
    format!(".{letters}")
}
