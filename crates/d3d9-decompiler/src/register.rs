use std::fmt;
use std::ops::Index;

use crate::instruction::{DclUsage, Instruction, ShaderStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegisterType {
    Temp,
    Input,
    Const,
    Addr,
    Texture,
    RastOut,
    AttrOut,
    /// `oT#` in vs_1_1/vs_2_0 and the generic `o#` file in vs_3_0.
    Output,
    ConstInt,
    ColorOut,
    DepthOut,
    Sampler,
    Const2,
    Const3,
    Const4,
    ConstBool,
    Loop,
    TempFloat16,
    MiscType,
    Label,
    Predicate,
    Unknown(u8),
}

impl RegisterType {
    /// Decodes a `D3DSHADER_PARAM_REGISTER_TYPE` value.
    ///
    /// Two encodings depend on the stage: type 3 is `a#` in vertex shaders and `t#` in pixel
    /// shaders, and type 8 is `o#` in vertex shaders and `oC#` in pixel shaders.
    pub fn from_raw(raw: u8, stage: ShaderStage) -> Self {
        match raw {
            0 => Self::Temp,
            1 => Self::Input,
            2 => Self::Const,
            3 => match stage {
                ShaderStage::Vertex => Self::Addr,
                ShaderStage::Pixel => Self::Texture,
            },
            4 => Self::RastOut,
            5 => Self::AttrOut,
            6 => Self::Output,
            7 => Self::ConstInt,
            8 => match stage {
                ShaderStage::Vertex => Self::Output,
                ShaderStage::Pixel => Self::ColorOut,
            },
            9 => Self::DepthOut,
            10 => Self::Sampler,
            11 => Self::Const2,
            12 => Self::Const3,
            13 => Self::Const4,
            14 => Self::ConstBool,
            15 => Self::Loop,
            16 => Self::TempFloat16,
            17 => Self::MiscType,
            18 => Self::Label,
            19 => Self::Predicate,
            other => Self::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Temp => "Temp",
            Self::Input => "Input",
            Self::Const => "Const",
            Self::Addr => "Addr",
            Self::Texture => "Texture",
            Self::RastOut => "RastOut",
            Self::AttrOut => "AttrOut",
            Self::Output => "Output",
            Self::ConstInt => "ConstInt",
            Self::ColorOut => "ColorOut",
            Self::DepthOut => "DepthOut",
            Self::Sampler => "Sampler",
            Self::Const2 => "Const2",
            Self::Const3 => "Const3",
            Self::Const4 => "Const4",
            Self::ConstBool => "ConstBool",
            Self::Loop => "Loop",
            Self::TempFloat16 => "TempFloat16",
            Self::MiscType => "MiscType",
            Self::Label => "Label",
            Self::Predicate => "Predicate",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Assembly register prefix (`r`, `c`, `oC`, ...).
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Temp => "r",
            Self::Input => "v",
            Self::Const | Self::Const2 | Self::Const3 | Self::Const4 => "c",
            Self::Addr => "a",
            Self::Texture => "t",
            Self::RastOut => "oPos",
            Self::AttrOut => "oD",
            Self::Output => "o",
            Self::ConstInt => "i",
            Self::ColorOut => "oC",
            Self::DepthOut => "oDepth",
            Self::Sampler => "s",
            Self::ConstBool => "b",
            Self::Loop => "aL",
            Self::TempFloat16 => "half",
            Self::MiscType => "misc",
            Self::Label => "l",
            Self::Predicate => "p",
            Self::Unknown(_) => "?",
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Self::Const
                | Self::Const2
                | Self::Const3
                | Self::Const4
                | Self::ConstBool
                | Self::ConstInt
        )
    }

    /// Register kinds that make up the method output surface.
    pub fn is_output(&self) -> bool {
        matches!(
            self,
            Self::Output | Self::ColorOut | Self::AttrOut | Self::RastOut
        )
    }
}

/// Identity of a register: kind plus index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterKey {
    pub ty: RegisterType,
    pub number: u32,
}

impl RegisterKey {
    pub const fn new(ty: RegisterType, number: u32) -> Self {
        Self { ty, number }
    }
}

impl fmt::Display for RegisterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ty, self.number) {
            (RegisterType::RastOut, 0) => f.write_str("oPos"),
            (RegisterType::RastOut, 1) => f.write_str("oFog"),
            (RegisterType::RastOut, 2) => f.write_str("oPts"),
            (RegisterType::DepthOut, 0) => f.write_str("oDepth"),
            (RegisterType::Loop, 0) => f.write_str("aL"),
            (RegisterType::MiscType, 0) => f.write_str("vFace"),
            (RegisterType::MiscType, 1) => f.write_str("vPos"),
            // c2048..c8191 live in the Const2..Const4 banks.
            (RegisterType::Const2, n) => write!(f, "c{}", n + 2048),
            (RegisterType::Const3, n) => write!(f, "c{}", n + 4096),
            (RegisterType::Const4, n) => write!(f, "c{}", n + 6144),
            (ty, n) => write!(f, "{}{}", ty.prefix(), n),
        }
    }
}

/// Element type of a declared register, derived from its component count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float,
    Float2,
    Float3,
    Float4,
}

impl ElementType {
    /// `None` for widths outside 1..=4.
    pub fn from_width(width: usize) -> Option<Self> {
        match width {
            1 => Some(Self::Float),
            2 => Some(Self::Float2),
            3 => Some(Self::Float3),
            4 => Some(Self::Float4),
            _ => None,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::Float => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Float2 => "float2",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDeclaration {
    pub key: RegisterKey,
    pub semantic: Option<String>,
    pub name: String,
    pub element_type: ElementType,
}

impl RegisterDeclaration {
    /// Declaration for a register that was never declared explicitly.
    ///
    /// Output-like registers get the semantic the fixed-function pipeline implies for them.
    pub fn implicit(key: RegisterKey) -> Self {
        let suffix = |n: u32| if n == 0 { String::new() } else { n.to_string() };
        let semantic = match (key.ty, key.number) {
            (RegisterType::ColorOut | RegisterType::AttrOut, n) => {
                Some(format!("COLOR{}", suffix(n)))
            }
            (RegisterType::RastOut, 0) => Some("POSITION".to_owned()),
            (RegisterType::RastOut, 1) => Some("FOG".to_owned()),
            (RegisterType::RastOut, 2) => Some("PSIZE".to_owned()),
            (RegisterType::Output | RegisterType::Texture, n) => {
                Some(format!("TEXCOORD{}", suffix(n)))
            }
            (RegisterType::DepthOut, _) => Some("DEPTH".to_owned()),
            _ => None,
        };
        Self::with_semantic(key, semantic, ElementType::Float4)
    }

    /// Declaration built from a `dcl` instruction.
    ///
    /// Returns `None` when the instruction carries no destination register.
    pub fn from_dcl(inst: &Instruction) -> Option<Self> {
        let dst = inst.destination()?;
        let semantic = match dst.reg.ty {
            RegisterType::MiscType => match dst.reg.number {
                0 => Some("VFACE".to_owned()),
                1 => Some("VPOS".to_owned()),
                _ => None,
            },
            RegisterType::Sampler => None,
            _ => inst.dcl.and_then(|dcl| {
                let usage = match dcl.usage {
                    DclUsage::TextureType(_) => return None,
                    other => other,
                };
                let base = usage.semantic()?;
                Some(match dcl.usage_index {
                    0 => base.to_owned(),
                    n => format!("{base}{n}"),
                })
            }),
        };
        let element_type = ElementType::from_width(dst.mask.len()).unwrap_or(ElementType::Float4);
        Some(Self::with_semantic(dst.reg, semantic, element_type))
    }

    fn with_semantic(
        key: RegisterKey,
        semantic: Option<String>,
        element_type: ElementType,
    ) -> Self {
        let name = match &semantic {
            Some(s) => s.to_lowercase(),
            None => key.to_string(),
        };
        Self {
            key,
            semantic,
            name,
            element_type,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.element_type.name()
    }
}

/// Float literal from a `def` instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    pub register_index: u32,
    pub values: [f32; 4],
}

impl Index<usize> for Constant {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.values[index]
    }
}

/// Integer literal from a `defi` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantInt {
    pub register_index: u32,
    pub values: [i32; 4],
}

impl Index<usize> for ConstantInt {
    type Output = i32;

    fn index(&self, index: usize) -> &i32 {
        &self.values[index]
    }
}

/// Boolean literal from a `defb` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBool {
    pub register_index: u32,
    pub value: bool,
}
