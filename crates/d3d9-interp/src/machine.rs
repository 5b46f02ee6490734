use hashbrown::HashMap;
use tracing::{debug, trace};

use d3d9_decompiler::instruction::{
    DstOperand, ResultModifier, ResultShift, SrcOperand, SwizzleComponent,
};
use d3d9_decompiler::{Instruction, Opcode, RegisterKey, RegisterType, SrcModifier};

use crate::error::ExecError;

type Vec4 = [f32; 4];

/// `lit` clamps the specular power to this magnitude.
const LIT_MAX_POWER: f32 = 127.9961;

/// What the caller should do after [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Register file for a single shader invocation.
///
/// Registers that were never written read as zero.
#[derive(Debug, Clone, Default)]
pub struct Machine {
    regs: HashMap<RegisterKey, Vec4>,
    int_consts: HashMap<u32, [i32; 4]>,
    bool_consts: HashMap<u32, bool>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: RegisterKey) -> Vec4 {
        match key.ty {
            RegisterType::ConstInt => self.int_consts.get(&key.number).map_or([0.0; 4], |v| {
                v.map(|c| c as f32)
            }),
            RegisterType::ConstBool => {
                let b = self.bool_consts.get(&key.number).copied().unwrap_or(false);
                [if b { 1.0 } else { 0.0 }; 4]
            }
            _ => self.regs.get(&key).copied().unwrap_or([0.0; 4]),
        }
    }

    pub fn set_register(&mut self, key: RegisterKey, value: Vec4) {
        self.regs.insert(key, value);
    }

    pub fn int_constant(&self, number: u32) -> Option<[i32; 4]> {
        self.int_consts.get(&number).copied()
    }

    pub fn bool_constant(&self, number: u32) -> Option<bool> {
        self.bool_consts.get(&number).copied()
    }

    /// Applies every `def`, `defi` and `defb` in `program`, ignoring everything else.
    pub fn load_constants(&mut self, program: &[Instruction]) -> Result<(), ExecError> {
        for inst in program {
            if matches!(inst.opcode, Opcode::Def | Opcode::DefI | Opcode::DefB) {
                self.define(inst)?;
            }
        }
        Ok(())
    }

    /// Steps through `program` until `end`/`ret` or the end of the slice.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self, program: &[Instruction]) -> Result<usize, ExecError> {
        let mut executed = 0;
        for inst in program {
            executed += 1;
            if self.step(inst)? == Flow::Stop {
                break;
            }
        }
        debug!(executed, "shader run finished");
        Ok(executed)
    }

    pub fn step(&mut self, inst: &Instruction) -> Result<Flow, ExecError> {
        trace!(opcode = inst.opcode.name(), "step");
        let value = match inst.opcode {
            Opcode::Nop | Opcode::Dcl | Opcode::Comment => return Ok(Flow::Continue),
            Opcode::End | Opcode::Ret => return Ok(Flow::Stop),
            Opcode::Def | Opcode::DefI | Opcode::DefB => {
                self.define(inst)?;
                return Ok(Flow::Continue);
            }

            Opcode::Mov => self.src(inst, 0)?,
            Opcode::Add => zip2(self.src(inst, 0)?, self.src(inst, 1)?, |a, b| a + b),
            Opcode::Sub => zip2(self.src(inst, 0)?, self.src(inst, 1)?, |a, b| a - b),
            Opcode::Mul => zip2(self.src(inst, 0)?, self.src(inst, 1)?, |a, b| a * b),
            Opcode::Mad => {
                let (a, b, c) = (self.src(inst, 0)?, self.src(inst, 1)?, self.src(inst, 2)?);
                std::array::from_fn(|i| a[i] * b[i] + c[i])
            }
            Opcode::Lrp => {
                // dst = s0*s1 + (1-s0)*s2
                let (a, b, c) = (self.src(inst, 0)?, self.src(inst, 1)?, self.src(inst, 2)?);
                std::array::from_fn(|i| a[i] * b[i] + (1.0 - a[i]) * c[i])
            }
            Opcode::Min => zip2(self.src(inst, 0)?, self.src(inst, 1)?, f32::min),
            Opcode::Max => zip2(self.src(inst, 0)?, self.src(inst, 1)?, f32::max),
            Opcode::Slt => zip2(self.src(inst, 0)?, self.src(inst, 1)?, |a, b| {
                if a < b {
                    1.0
                } else {
                    0.0
                }
            }),
            Opcode::Sge => zip2(self.src(inst, 0)?, self.src(inst, 1)?, |a, b| {
                if a >= b {
                    1.0
                } else {
                    0.0
                }
            }),
            Opcode::Cmp => {
                // Per-component `s0 >= 0 ? s1 : s2`.
                let (a, b, c) = (self.src(inst, 0)?, self.src(inst, 1)?, self.src(inst, 2)?);
                std::array::from_fn(|i| if a[i] >= 0.0 { b[i] } else { c[i] })
            }
            Opcode::Dp2Add => {
                let (a, b, c) = (self.src(inst, 0)?, self.src(inst, 1)?, self.src(inst, 2)?);
                [dot(&a, &b, 2) + c[0]; 4]
            }
            Opcode::Dp3 => [dot(&self.src(inst, 0)?, &self.src(inst, 1)?, 3); 4],
            Opcode::Dp4 => [dot(&self.src(inst, 0)?, &self.src(inst, 1)?, 4); 4],
            Opcode::Abs => self.src(inst, 0)?.map(f32::abs),
            Opcode::Frc => self.src(inst, 0)?.map(|v| v - v.floor()),
            Opcode::Sgn => self.src(inst, 0)?.map(|v| {
                if v > 0.0 {
                    1.0
                } else if v < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }),
            Opcode::Rcp => [1.0 / self.scalar(inst, 0)?; 4],
            Opcode::Rsq => [1.0 / self.scalar(inst, 0)?.abs().sqrt(); 4],
            Opcode::Exp => [self.scalar(inst, 0)?.exp2(); 4],
            Opcode::Log => [self.scalar(inst, 0)?.abs().log2(); 4],
            Opcode::Pow => {
                let (base, exponent) = (self.scalar(inst, 0)?, self.scalar(inst, 1)?);
                [base.abs().powf(exponent); 4]
            }
            Opcode::Crs => {
                let (a, b) = (self.src(inst, 0)?, self.src(inst, 1)?);
                let mut out = self.current(inst)?;
                out[0] = a[1] * b[2] - a[2] * b[1];
                out[1] = a[2] * b[0] - a[0] * b[2];
                out[2] = a[0] * b[1] - a[1] * b[0];
                out
            }
            Opcode::Nrm => {
                let a = self.src(inst, 0)?;
                let scale = 1.0 / dot(&a, &a, 3).sqrt();
                a.map(|v| v * scale)
            }
            Opcode::Dst => {
                let (a, b) = (self.src(inst, 0)?, self.src(inst, 1)?);
                [1.0, a[1] * b[1], a[2], b[3]]
            }
            Opcode::Lit => lit(self.src(inst, 0)?),
            Opcode::SinCos => {
                let angle = self.scalar(inst, 0)?;
                let mut out = self.current(inst)?;
                out[0] = angle.cos();
                out[1] = angle.sin();
                out
            }
            Opcode::M4x4 => self.matrix(inst, 4, 4)?,
            Opcode::M4x3 => self.matrix(inst, 4, 3)?,
            Opcode::M3x4 => self.matrix(inst, 3, 4)?,
            Opcode::M3x3 => self.matrix(inst, 3, 3)?,
            Opcode::M3x2 => self.matrix(inst, 3, 2)?,

            other => return Err(ExecError::UnsupportedOpcode(other)),
        };

        let dst = destination(inst)?;
        self.write(dst, inst.result_modifier, value)?;
        Ok(Flow::Continue)
    }

    fn define(&mut self, inst: &Instruction) -> Result<(), ExecError> {
        let number = destination(inst)?.reg.number;
        match inst.opcode {
            Opcode::Def => {
                let values = inst
                    .f32_literals()
                    .ok_or(ExecError::MissingLiterals(inst.opcode))?;
                self.regs
                    .insert(RegisterKey::new(RegisterType::Const, number), values);
            }
            Opcode::DefI => {
                let values = inst
                    .i32_literals()
                    .ok_or(ExecError::MissingLiterals(inst.opcode))?;
                self.int_consts.insert(number, values);
            }
            Opcode::DefB => {
                let value = inst
                    .bool_literal()
                    .ok_or(ExecError::MissingLiterals(inst.opcode))?;
                self.bool_consts.insert(number, value);
            }
            other => return Err(ExecError::UnsupportedOpcode(other)),
        }
        Ok(())
    }

    /// Swizzled, modified value of the `n`th source operand.
    fn src(&self, inst: &Instruction, n: usize) -> Result<Vec4, ExecError> {
        let src = source(inst, n)?;
        self.read(src, src.reg)
    }

    /// Scalar operand: the first component of the swizzled source, which a replicate swizzle
    /// selects.
    fn scalar(&self, inst: &Instruction, n: usize) -> Result<f32, ExecError> {
        self.src(inst, n).map(|v| v[0])
    }

    fn read(&self, src: &SrcOperand, key: RegisterKey) -> Result<Vec4, ExecError> {
        let raw = self.register(key);
        let v: Vec4 = src.swizzle.0.map(|c: SwizzleComponent| raw[c.index()]);
        Ok(match src.modifier {
            SrcModifier::None => v,
            SrcModifier::Negate => v.map(|x| -x),
            SrcModifier::Bias => v.map(|x| x - 0.5),
            SrcModifier::BiasNegate => v.map(|x| -(x - 0.5)),
            SrcModifier::Sign => v.map(|x| x * 2.0 - 1.0),
            SrcModifier::SignNegate => v.map(|x| -(x * 2.0 - 1.0)),
            SrcModifier::Comp => v.map(|x| 1.0 - x),
            SrcModifier::X2 => v.map(|x| x * 2.0),
            SrcModifier::X2Negate => v.map(|x| -(x * 2.0)),
            SrcModifier::Dz => v.map(|x| x / v[2]),
            SrcModifier::Dw => v.map(|x| x / v[3]),
            SrcModifier::Abs => v.map(f32::abs),
            SrcModifier::AbsNegate => v.map(|x| -x.abs()),
            other @ (SrcModifier::Not | SrcModifier::Unknown(_)) => {
                return Err(ExecError::UnsupportedModifier(other))
            }
        })
    }

    /// Current contents of the destination register, for ops that leave components untouched.
    fn current(&self, inst: &Instruction) -> Result<Vec4, ExecError> {
        destination(inst).map(|dst| self.register(dst.reg))
    }

    /// `mRxC`: one dot product of `src0` against each of `cols` consecutive registers starting at
    /// `src1`.
    fn matrix(&self, inst: &Instruction, rows: usize, cols: usize) -> Result<Vec4, ExecError> {
        let v = self.src(inst, 0)?;
        let m = source(inst, 1)?;
        let mut out = self.current(inst)?;
        for (i, slot) in out.iter_mut().enumerate().take(cols) {
            let number = u32::try_from(i)
                .ok()
                .and_then(|i| m.reg.number.checked_add(i))
                .ok_or(ExecError::RegisterRangeOverflow {
                    opcode: inst.opcode,
                    base: m.reg,
                })?;
            let key = RegisterKey::new(m.reg.ty, number);
            *slot = dot(&v, &self.read(m, key)?, rows);
        }
        Ok(out)
    }

    fn write(
        &mut self,
        dst: &DstOperand,
        modifier: ResultModifier,
        value: Vec4,
    ) -> Result<(), ExecError> {
        let scale = match modifier.shift {
            ResultShift::None => 1.0,
            ResultShift::Mul2 => 2.0,
            ResultShift::Mul4 => 4.0,
            ResultShift::Mul8 => 8.0,
            ResultShift::Div2 => 0.5,
            ResultShift::Div4 => 0.25,
            ResultShift::Div8 => 0.125,
            ResultShift::Unknown(v) => return Err(ExecError::UnsupportedResultShift(v)),
        };
        let mut value = value.map(|v| v * scale);
        if modifier.saturate {
            value = value.map(|v| v.clamp(0.0, 1.0));
        }

        let reg = self.regs.entry(dst.reg).or_insert([0.0; 4]);
        for component in dst.mask.components() {
            reg[component.index()] = value[component.index()];
        }
        Ok(())
    }
}

fn destination(inst: &Instruction) -> Result<&DstOperand, ExecError> {
    inst.destination().ok_or(ExecError::MissingOperand {
        opcode: inst.opcode,
        what: "destination",
    })
}

fn source(inst: &Instruction, n: usize) -> Result<&SrcOperand, ExecError> {
    inst.source(n).ok_or(ExecError::MissingOperand {
        opcode: inst.opcode,
        what: "source operand",
    })
}

fn zip2(a: Vec4, b: Vec4, f: impl Fn(f32, f32) -> f32) -> Vec4 {
    std::array::from_fn(|i| f(a[i], b[i]))
}

fn dot(a: &Vec4, b: &Vec4, n: usize) -> f32 {
    a.iter().zip(b).take(n).map(|(x, y)| x * y).sum()
}

fn lit(src: Vec4) -> Vec4 {
    let power = src[3].clamp(-LIT_MAX_POWER, LIT_MAX_POWER);
    let mut out = [1.0, 0.0, 0.0, 1.0];
    if src[0] > 0.0 {
        out[1] = src[0];
        if src[1] > 0.0 {
            out[2] = src[1].powf(power);
        }
    }
    out
}
