//! Decoded SM1-SM3 instruction model.
//!
//! The token reader that produces these records lives outside this crate; everything here is a
//! plain value type so both the resolver and the interpreter can consume the same stream.

use bitflags::bitflags;

use crate::register::RegisterKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop,
    Mov,
    Add,
    Sub,
    Mad,
    Mul,
    Rcp,
    Rsq,
    Dp3,
    Dp4,
    Min,
    Max,
    Slt,
    Sge,
    Exp,
    Log,
    Lit,
    Dst,
    Lrp,
    Frc,
    M4x4,
    M4x3,
    M3x4,
    M3x3,
    M3x2,
    Call,
    CallNz,
    Loop,
    Ret,
    EndLoop,
    Label,
    Dcl,
    Pow,
    Crs,
    Sgn,
    Abs,
    Nrm,
    SinCos,
    Rep,
    EndRep,
    If,
    Ifc,
    Else,
    EndIf,
    Break,
    Breakc,
    Mova,
    DefB,
    DefI,
    TexCoord,
    TexKill,
    Tex,
    TexBem,
    TexBeml,
    TexReg2Ar,
    TexReg2Gb,
    TexM3x2Pad,
    TexM3x2Tex,
    TexM3x3Pad,
    TexM3x3Tex,
    TexM3x3Spec,
    TexM3x3VSpec,
    ExpP,
    LogP,
    Cnd,
    Def,
    TexReg2Rgb,
    TexDp3Tex,
    TexM3x2Depth,
    TexDp3,
    TexM3x3,
    TexDepth,
    Cmp,
    Bem,
    Dp2Add,
    Dsx,
    Dsy,
    TexLdd,
    Setp,
    TexLdl,
    Breakp,
    Phase,
    Comment,
    End,
    Unknown(u16),
}

impl Opcode {
    /// Maps a `D3DSHADER_INSTRUCTION_OPCODE_TYPE` value.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0x00 => Self::Nop,
            0x01 => Self::Mov,
            0x02 => Self::Add,
            0x03 => Self::Sub,
            0x04 => Self::Mad,
            0x05 => Self::Mul,
            0x06 => Self::Rcp,
            0x07 => Self::Rsq,
            0x08 => Self::Dp3,
            0x09 => Self::Dp4,
            0x0A => Self::Min,
            0x0B => Self::Max,
            0x0C => Self::Slt,
            0x0D => Self::Sge,
            0x0E => Self::Exp,
            0x0F => Self::Log,
            0x10 => Self::Lit,
            0x11 => Self::Dst,
            0x12 => Self::Lrp,
            0x13 => Self::Frc,
            0x14 => Self::M4x4,
            0x15 => Self::M4x3,
            0x16 => Self::M3x4,
            0x17 => Self::M3x3,
            0x18 => Self::M3x2,
            0x19 => Self::Call,
            0x1A => Self::CallNz,
            0x1B => Self::Loop,
            0x1C => Self::Ret,
            0x1D => Self::EndLoop,
            0x1E => Self::Label,
            0x1F => Self::Dcl,
            0x20 => Self::Pow,
            0x21 => Self::Crs,
            0x22 => Self::Sgn,
            0x23 => Self::Abs,
            0x24 => Self::Nrm,
            0x25 => Self::SinCos,
            0x26 => Self::Rep,
            0x27 => Self::EndRep,
            0x28 => Self::If,
            0x29 => Self::Ifc,
            0x2A => Self::Else,
            0x2B => Self::EndIf,
            0x2C => Self::Break,
            0x2D => Self::Breakc,
            0x2E => Self::Mova,
            0x2F => Self::DefB,
            0x30 => Self::DefI,
            0x40 => Self::TexCoord,
            0x41 => Self::TexKill,
            0x42 => Self::Tex,
            0x43 => Self::TexBem,
            0x44 => Self::TexBeml,
            0x45 => Self::TexReg2Ar,
            0x46 => Self::TexReg2Gb,
            0x47 => Self::TexM3x2Pad,
            0x48 => Self::TexM3x2Tex,
            0x49 => Self::TexM3x3Pad,
            0x4A => Self::TexM3x3Tex,
            0x4C => Self::TexM3x3Spec,
            0x4D => Self::TexM3x3VSpec,
            0x4E => Self::ExpP,
            0x4F => Self::LogP,
            0x50 => Self::Cnd,
            0x51 => Self::Def,
            0x52 => Self::TexReg2Rgb,
            0x53 => Self::TexDp3Tex,
            0x54 => Self::TexM3x2Depth,
            0x55 => Self::TexDp3,
            0x56 => Self::TexM3x3,
            0x57 => Self::TexDepth,
            0x58 => Self::Cmp,
            0x59 => Self::Bem,
            0x5A => Self::Dp2Add,
            0x5B => Self::Dsx,
            0x5C => Self::Dsy,
            0x5D => Self::TexLdd,
            0x5E => Self::Setp,
            0x5F => Self::TexLdl,
            0x60 => Self::Breakp,
            0xFFFD => Self::Phase,
            0xFFFE => Self::Comment,
            0xFFFF => Self::End,
            other => Self::Unknown(other),
        }
    }

    /// Assembly mnemonic.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::Mov => "mov",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mad => "mad",
            Self::Mul => "mul",
            Self::Rcp => "rcp",
            Self::Rsq => "rsq",
            Self::Dp3 => "dp3",
            Self::Dp4 => "dp4",
            Self::Min => "min",
            Self::Max => "max",
            Self::Slt => "slt",
            Self::Sge => "sge",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Lit => "lit",
            Self::Dst => "dst",
            Self::Lrp => "lrp",
            Self::Frc => "frc",
            Self::M4x4 => "m4x4",
            Self::M4x3 => "m4x3",
            Self::M3x4 => "m3x4",
            Self::M3x3 => "m3x3",
            Self::M3x2 => "m3x2",
            Self::Call => "call",
            Self::CallNz => "callnz",
            Self::Loop => "loop",
            Self::Ret => "ret",
            Self::EndLoop => "endloop",
            Self::Label => "label",
            Self::Dcl => "dcl",
            Self::Pow => "pow",
            Self::Crs => "crs",
            Self::Sgn => "sgn",
            Self::Abs => "abs",
            Self::Nrm => "nrm",
            Self::SinCos => "sincos",
            Self::Rep => "rep",
            Self::EndRep => "endrep",
            Self::If => "if",
            Self::Ifc => "ifc",
            Self::Else => "else",
            Self::EndIf => "endif",
            Self::Break => "break",
            Self::Breakc => "breakc",
            Self::Mova => "mova",
            Self::DefB => "defb",
            Self::DefI => "defi",
            Self::TexCoord => "texcoord",
            Self::TexKill => "texkill",
            Self::Tex => "texld",
            Self::TexBem => "texbem",
            Self::TexBeml => "texbeml",
            Self::TexReg2Ar => "texreg2ar",
            Self::TexReg2Gb => "texreg2gb",
            Self::TexM3x2Pad => "texm3x2pad",
            Self::TexM3x2Tex => "texm3x2tex",
            Self::TexM3x3Pad => "texm3x3pad",
            Self::TexM3x3Tex => "texm3x3tex",
            Self::TexM3x3Spec => "texm3x3spec",
            Self::TexM3x3VSpec => "texm3x3vspec",
            Self::ExpP => "expp",
            Self::LogP => "logp",
            Self::Cnd => "cnd",
            Self::Def => "def",
            Self::TexReg2Rgb => "texreg2rgb",
            Self::TexDp3Tex => "texdp3tex",
            Self::TexM3x2Depth => "texm3x2depth",
            Self::TexDp3 => "texdp3",
            Self::TexM3x3 => "texm3x3",
            Self::TexDepth => "texdepth",
            Self::Cmp => "cmp",
            Self::Bem => "bem",
            Self::Dp2Add => "dp2add",
            Self::Dsx => "dsx",
            Self::Dsy => "dsy",
            Self::TexLdd => "texldd",
            Self::Setp => "setp",
            Self::TexLdl => "texldl",
            Self::Breakp => "breakp",
            Self::Phase => "phase",
            Self::Comment => "comment",
            Self::End => "end",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwizzleComponent {
    X,
    Y,
    Z,
    W,
}

impl SwizzleComponent {
    pub const ALL: [Self; 4] = [Self::X, Self::Y, Self::Z, Self::W];

    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::W => 3,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
        }
    }
}

bitflags! {
    /// Destination components written by an instruction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteMask: u8 {
        const X = 0b0001;
        const Y = 0b0010;
        const Z = 0b0100;
        const W = 0b1000;
    }
}

impl WriteMask {
    /// A zero mask in the token stream means "all components".
    pub fn from_raw(raw: u8) -> Self {
        match Self::from_bits_truncate(raw) {
            m if m.is_empty() => Self::all(),
            m => m,
        }
    }

    pub fn contains_component(&self, component: SwizzleComponent) -> bool {
        self.bits() & (1 << component.index()) != 0
    }

    /// Number of written components.
    pub fn len(&self) -> usize {
        self.bits().count_ones() as usize
    }

    /// True when the mask is exactly the first `width` components (`.x`, `.xy`, ...).
    pub fn is_leading(&self, width: usize) -> bool {
        width <= 4 && self.bits() == ((1u8 << width) - 1)
    }

    pub fn components(&self) -> impl Iterator<Item = SwizzleComponent> + '_ {
        SwizzleComponent::ALL
            .into_iter()
            .filter(|c| self.contains_component(*c))
    }

    /// Assembly suffix (`.xz`); empty for an empty mask.
    pub fn suffix(&self) -> String {
        let letters: String = self.components().map(SwizzleComponent::letter).collect();
        if letters.is_empty() {
            letters
        } else {
            format!(".{letters}")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle(pub [SwizzleComponent; 4]);

impl Swizzle {
    pub fn identity() -> Self {
        Self(SwizzleComponent::ALL)
    }

    pub fn replicate(component: SwizzleComponent) -> Self {
        Self([component; 4])
    }

    /// Decodes the packed 2-bits-per-component source swizzle byte.
    pub fn from_raw(raw: u8) -> Self {
        let mut comps = [SwizzleComponent::X; 4];
        for (i, comp) in comps.iter_mut().enumerate() {
            *comp = SwizzleComponent::ALL[((raw >> (i * 2)) & 0x3) as usize];
        }
        Self(comps)
    }

    /// Source components feeding each written destination component, packed to the front.
    ///
    /// `mul r0.yz, v0.xyzw, ...` reads `v0.yz`, so the result starts `[Y, Z, ..]`. Slots past the
    /// mask length repeat the last selected component so indexing 0..3 stays valid.
    pub fn masked(&self, mask: WriteMask) -> [SwizzleComponent; 4] {
        let mut out = self.0;
        let mut n = 0;
        for component in mask.components() {
            out[n] = self.0[component.index()];
            n += 1;
        }
        if n > 0 {
            for i in n..4 {
                out[i] = out[n - 1];
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrcModifier {
    None,
    Negate,
    Bias,
    BiasNegate,
    Sign,
    SignNegate,
    Comp,
    X2,
    X2Negate,
    Dz,
    Dw,
    Abs,
    AbsNegate,
    Not,
    Unknown(u8),
}

impl SrcModifier {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Negate,
            2 => Self::Bias,
            3 => Self::BiasNegate,
            4 => Self::Sign,
            5 => Self::SignNegate,
            6 => Self::Comp,
            7 => Self::X2,
            8 => Self::X2Negate,
            9 => Self::Dz,
            10 => Self::Dw,
            11 => Self::Abs,
            12 => Self::AbsNegate,
            13 => Self::Not,
            other => Self::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Negate => "negate",
            Self::Bias => "bias",
            Self::BiasNegate => "bias and negate",
            Self::Sign => "sign",
            Self::SignNegate => "sign and negate",
            Self::Comp => "complement",
            Self::X2 => "x2",
            Self::X2Negate => "x2 and negate",
            Self::Dz => "divide by z",
            Self::Dw => "divide by w",
            Self::Abs => "abs",
            Self::AbsNegate => "abs and negate",
            Self::Not => "not",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShift {
    None,
    Mul2,
    Mul4,
    Mul8,
    Div2,
    Div4,
    Div8,
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultModifier {
    pub saturate: bool,
    pub shift: ResultShift,
}

impl Default for ResultModifier {
    fn default() -> Self {
        Self {
            saturate: false,
            shift: ResultShift::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DclUsage {
    Position,
    BlendWeight,
    BlendIndices,
    Normal,
    PointSize,
    TexCoord,
    Tangent,
    Binormal,
    TessFactor,
    PositionT,
    Color,
    Fog,
    Depth,
    Sample,
    TextureType(TextureType),
    Unknown(u8),
}

impl DclUsage {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Position,
            1 => Self::BlendWeight,
            2 => Self::BlendIndices,
            3 => Self::Normal,
            4 => Self::PointSize,
            5 => Self::TexCoord,
            6 => Self::Tangent,
            7 => Self::Binormal,
            8 => Self::TessFactor,
            9 => Self::PositionT,
            10 => Self::Color,
            11 => Self::Fog,
            12 => Self::Depth,
            13 => Self::Sample,
            other => Self::Unknown(other),
        }
    }

    /// HLSL semantic name without the usage index, if the usage has one.
    pub fn semantic(&self) -> Option<&'static str> {
        Some(match self {
            Self::Position => "POSITION",
            Self::BlendWeight => "BLENDWEIGHT",
            Self::BlendIndices => "BLENDINDICES",
            Self::Normal => "NORMAL",
            Self::PointSize => "PSIZE",
            Self::TexCoord => "TEXCOORD",
            Self::Tangent => "TANGENT",
            Self::Binormal => "BINORMAL",
            Self::TessFactor => "TESSFACTOR",
            Self::PositionT => "POSITIONT",
            Self::Color => "COLOR",
            Self::Fog => "FOG",
            Self::Depth => "DEPTH",
            Self::Sample => "SAMPLE",
            Self::TextureType(_) | Self::Unknown(_) => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureType {
    Texture1D,
    Texture2D,
    TextureCube,
    Texture3D,
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DclInfo {
    pub usage: DclUsage,
    pub usage_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DstOperand {
    pub reg: RegisterKey,
    pub mask: WriteMask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcOperand {
    pub reg: RegisterKey,
    pub swizzle: Swizzle,
    pub modifier: SrcModifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Dst(DstOperand),
    Src(SrcOperand),
    Imm32(u32),
}

impl Operand {
    pub fn dst(reg: RegisterKey, mask: WriteMask) -> Self {
        Self::Dst(DstOperand { reg, mask })
    }

    pub fn src(reg: RegisterKey) -> Self {
        Self::Src(SrcOperand {
            reg,
            swizzle: Swizzle::identity(),
            modifier: SrcModifier::None,
        })
    }

    pub fn src_with(reg: RegisterKey, swizzle: Swizzle, modifier: SrcModifier) -> Self {
        Self::Src(SrcOperand {
            reg,
            swizzle,
            modifier,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub result_modifier: ResultModifier,
    pub operands: Vec<Operand>,
    pub dcl: Option<DclInfo>,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self {
            opcode,
            result_modifier: ResultModifier::default(),
            operands,
            dcl: None,
        }
    }

    pub fn dcl(usage: DclUsage, usage_index: u8, reg: RegisterKey, mask: WriteMask) -> Self {
        Self {
            opcode: Opcode::Dcl,
            result_modifier: ResultModifier::default(),
            operands: vec![Operand::dst(reg, mask)],
            dcl: Some(DclInfo { usage, usage_index }),
        }
    }

    pub fn def(reg: RegisterKey, values: [f32; 4]) -> Self {
        let mut operands = vec![Operand::dst(reg, WriteMask::all())];
        operands.extend(values.iter().map(|v| Operand::Imm32(v.to_bits())));
        Self::new(Opcode::Def, operands)
    }

    pub fn defi(reg: RegisterKey, values: [i32; 4]) -> Self {
        let mut operands = vec![Operand::dst(reg, WriteMask::all())];
        operands.extend(values.iter().map(|v| Operand::Imm32(*v as u32)));
        Self::new(Opcode::DefI, operands)
    }

    pub fn defb(reg: RegisterKey, value: bool) -> Self {
        Self::new(
            Opcode::DefB,
            vec![Operand::dst(reg, WriteMask::all()), Operand::Imm32(value as u32)],
        )
    }

    pub fn with_result_modifier(mut self, result_modifier: ResultModifier) -> Self {
        self.result_modifier = result_modifier;
        self
    }

    /// Destination operands are always encoded first.
    pub fn destination(&self) -> Option<&DstOperand> {
        match self.operands.first() {
            Some(Operand::Dst(dst)) => Some(dst),
            _ => None,
        }
    }

    pub fn has_destination(&self) -> bool {
        self.destination().is_some()
    }

    /// Written component count, or `None` for instructions without a destination.
    pub fn destination_mask_len(&self) -> Option<usize> {
        self.destination().map(|dst| dst.mask.len())
    }

    pub fn sources(&self) -> impl Iterator<Item = &SrcOperand> + '_ {
        self.operands.iter().filter_map(|op| match op {
            Operand::Src(src) => Some(src),
            _ => None,
        })
    }

    /// The `n`th source operand, counting only source operands.
    pub fn source(&self, n: usize) -> Option<&SrcOperand> {
        self.sources().nth(n)
    }

    pub fn immediates(&self) -> impl Iterator<Item = u32> + '_ {
        self.operands.iter().filter_map(|op| match op {
            Operand::Imm32(v) => Some(*v),
            _ => None,
        })
    }

    fn immediate4(&self) -> Option<[u32; 4]> {
        let mut out = [0u32; 4];
        let mut it = self.immediates();
        for slot in out.iter_mut() {
            *slot = it.next()?;
        }
        Some(out)
    }

    /// Literal payload of a `def` instruction.
    pub fn f32_literals(&self) -> Option<[f32; 4]> {
        self.immediate4().map(|v| v.map(f32::from_bits))
    }

    /// Literal payload of a `defi` instruction.
    pub fn i32_literals(&self) -> Option<[i32; 4]> {
        self.immediate4().map(|v| v.map(|bits| bits as i32))
    }

    /// Literal payload of a `defb` instruction.
    pub fn bool_literal(&self) -> Option<bool> {
        self.immediates().next().map(|v| v != 0)
    }
}
