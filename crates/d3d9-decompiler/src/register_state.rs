//! Per-shader register bookkeeping.
//!
//! Three sources describe registers, and they do not always agree:
//! * the constant table names `c#`/`i#`/`b#` ranges before any instruction is seen;
//! * `dcl` instructions declare inputs, outputs and samplers;
//! * legacy pixel shaders write `oC#` without ever declaring it.
//!
//! [`RegisterStateBuilder`] merges them in that order, and [`RegisterState`] is the frozen result
//! the resolver reads from.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use tracing::{debug, trace, warn};

use crate::constant_table::{ConstantTable, RegisterSet};
use crate::error::DecompileError;
use crate::instruction::{Instruction, Opcode};
use crate::options::ResolverOptions;
use crate::register::{
    Constant, ConstantBool, ConstantInt, RegisterDeclaration, RegisterKey, RegisterType,
};

/// Mutable load phase of a [`RegisterState`].
///
/// [`RegisterStateBuilder::new`] ingests the constant table, so table-declared registers are
/// always in place before the first instruction is seen.
pub struct RegisterStateBuilder<'a> {
    options: ResolverOptions,
    constant_table: &'a ConstantTable,
    declarations: HashMap<RegisterKey, RegisterDeclaration>,
    method_inputs: BTreeMap<RegisterKey, RegisterDeclaration>,
    method_outputs: BTreeMap<RegisterKey, RegisterDeclaration>,
    float_defs: Vec<Constant>,
    int_defs: Vec<ConstantInt>,
    bool_defs: Vec<ConstantBool>,
}

impl<'a> RegisterStateBuilder<'a> {
    pub fn new(
        constant_table: &'a ConstantTable,
        options: ResolverOptions,
    ) -> Result<Self, DecompileError> {
        let mut builder = Self {
            options,
            constant_table,
            declarations: HashMap::new(),
            method_inputs: BTreeMap::new(),
            method_outputs: BTreeMap::new(),
            float_defs: Vec::new(),
            int_defs: Vec::new(),
            bool_defs: Vec::new(),
        };
        builder.ingest_constant_table()?;
        Ok(builder)
    }

    /// Stage A: one declaration per register covered by a constant table entry.
    ///
    /// Sampler entries are skipped; samplers are declared by `dcl` instructions.
    fn ingest_constant_table(&mut self) -> Result<(), DecompileError> {
        let table = self.constant_table;
        for constant in table.iter() {
            let ty = match constant.register_set {
                RegisterSet::Bool => RegisterType::ConstBool,
                RegisterSet::Float4 => RegisterType::Const,
                RegisterSet::Int4 => RegisterType::ConstInt,
                RegisterSet::Sampler => continue,
                RegisterSet::Unknown(_) => {
                    return Err(DecompileError::UnsupportedRegisterSet(constant.register_set))
                }
            };
            for r in 0..constant.register_count {
                let number = constant.register_index.checked_add(r).ok_or_else(|| {
                    DecompileError::RegisterRangeOverflow {
                        name: constant.name.clone(),
                        register_index: constant.register_index,
                        register_count: constant.register_count,
                    }
                })?;
                let key = RegisterKey::new(ty, number);
                if self.declarations.contains_key(&key) {
                    warn!(%key, name = %constant.name, "constant table entries overlap");
                }
                self.declarations
                    .insert(key, RegisterDeclaration::implicit(key));
            }
        }
        debug!(
            constants = table.declarations.len(),
            registers = self.declarations.len(),
            "ingested constant table"
        );
        Ok(())
    }

    /// Stage B: one instruction of the program, in program order.
    pub fn ingest_instruction(&mut self, inst: &Instruction) -> Result<(), DecompileError> {
        let Some(dst) = inst.destination() else {
            return Ok(());
        };
        let key = dst.reg;

        match inst.opcode {
            Opcode::Dcl => self.declare(inst),
            Opcode::Def => {
                let values = inst.f32_literals().ok_or_else(|| missing_literals(inst))?;
                self.float_defs.push(Constant {
                    register_index: key.number,
                    values,
                });
                Ok(())
            }
            Opcode::DefI => {
                let values = inst.i32_literals().ok_or_else(|| missing_literals(inst))?;
                self.int_defs.push(ConstantInt {
                    register_index: key.number,
                    values,
                });
                Ok(())
            }
            opcode => {
                if opcode == Opcode::DefB {
                    let value = inst.bool_literal().ok_or_else(|| missing_literals(inst))?;
                    self.bool_defs.push(ConstantBool {
                        register_index: key.number,
                        value,
                    });
                }
                self.discover(key);
                Ok(())
            }
        }
    }

    fn declare(&mut self, inst: &Instruction) -> Result<(), DecompileError> {
        let decl = RegisterDeclaration::from_dcl(inst).ok_or(DecompileError::MissingOperand {
            opcode: inst.opcode,
            what: "destination",
        })?;
        let key = decl.key;
        if self.declarations.contains_key(&key) {
            return Err(DecompileError::DuplicateDeclaration { key });
        }

        match key.ty {
            RegisterType::Input | RegisterType::MiscType => {
                self.method_inputs.insert(key, decl.clone());
            }
            ty if ty.is_output() => {
                self.method_outputs.insert(key, decl.clone());
            }
            RegisterType::Sampler | RegisterType::Addr => {}
            _ => return Err(DecompileError::UnsupportedDeclaration { key }),
        }
        trace!(%key, name = %decl.name, "dcl");
        self.declarations.insert(key, decl);
        Ok(())
    }

    /// Pixel shader color outputs are written without a `dcl`; pick them up from their first
    /// write.
    fn discover(&mut self, key: RegisterKey) {
        if self.declarations.contains_key(&key) {
            return;
        }
        let decl = RegisterDeclaration::implicit(key);
        if key.ty.is_output() {
            trace!(%key, name = %decl.name, "discovered undeclared output");
            self.method_outputs.insert(key, decl.clone());
        }
        self.declarations.insert(key, decl);
    }

    pub fn build(self) -> RegisterState<'a> {
        debug!(
            registers = self.declarations.len(),
            inputs = self.method_inputs.len(),
            outputs = self.method_outputs.len(),
            float_defs = self.float_defs.len(),
            int_defs = self.int_defs.len(),
            bool_defs = self.bool_defs.len(),
            "register state built"
        );
        RegisterState {
            options: self.options,
            constant_table: self.constant_table,
            declarations: self.declarations,
            method_inputs: self.method_inputs,
            method_outputs: self.method_outputs,
            float_defs: self.float_defs,
            int_defs: self.int_defs,
            bool_defs: self.bool_defs,
        }
    }
}

fn missing_literals(inst: &Instruction) -> DecompileError {
    DecompileError::MalformedInstruction {
        opcode: inst.opcode,
        message: "missing immediate literal tokens".to_owned(),
    }
}

/// Resolved register information for one shader, immutable once loaded.
#[derive(Debug, Clone)]
pub struct RegisterState<'a> {
    pub(crate) options: ResolverOptions,
    pub(crate) constant_table: &'a ConstantTable,
    pub(crate) declarations: HashMap<RegisterKey, RegisterDeclaration>,
    pub(crate) method_inputs: BTreeMap<RegisterKey, RegisterDeclaration>,
    pub(crate) method_outputs: BTreeMap<RegisterKey, RegisterDeclaration>,
    pub(crate) float_defs: Vec<Constant>,
    pub(crate) int_defs: Vec<ConstantInt>,
    pub(crate) bool_defs: Vec<ConstantBool>,
}

impl<'a> RegisterState<'a> {
    /// Runs both load stages over a whole program.
    pub fn load(
        constant_table: &'a ConstantTable,
        instructions: &[Instruction],
        options: ResolverOptions,
    ) -> Result<Self, DecompileError> {
        let mut builder = RegisterStateBuilder::new(constant_table, options)?;
        for inst in instructions {
            builder.ingest_instruction(inst)?;
        }
        Ok(builder.build())
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    pub fn column_major(&self) -> bool {
        self.options.column_major
    }

    pub fn constant_table(&self) -> &'a ConstantTable {
        self.constant_table
    }

    pub fn declaration(&self, key: RegisterKey) -> Option<&RegisterDeclaration> {
        self.declarations.get(&key)
    }

    pub fn declarations(&self) -> impl Iterator<Item = &RegisterDeclaration> + '_ {
        self.declarations.values()
    }

    pub fn method_inputs(&self) -> &BTreeMap<RegisterKey, RegisterDeclaration> {
        &self.method_inputs
    }

    pub fn method_outputs(&self) -> &BTreeMap<RegisterKey, RegisterDeclaration> {
        &self.method_outputs
    }

    pub fn float_constant(&self, register_index: u32) -> Option<&Constant> {
        self.float_defs
            .iter()
            .find(|c| c.register_index == register_index)
    }

    pub fn int_constant(&self, register_index: u32) -> Option<&ConstantInt> {
        self.int_defs
            .iter()
            .find(|c| c.register_index == register_index)
    }

    pub fn bool_constant(&self, register_index: u32) -> Option<&ConstantBool> {
        self.bool_defs
            .iter()
            .find(|c| c.register_index == register_index)
    }
}
