//! Constant table (`CTAB`) index.
//!
//! The container parser supplies one [`ConstantDeclaration`] per named shader constant. Tables are
//! small (tens of entries) so every lookup is a linear scan.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterSet {
    Bool,
    Int4,
    Float4,
    Sampler,
    Unknown(u16),
}

impl RegisterSet {
    /// Maps a `D3DXREGISTER_SET` value.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Bool,
            1 => Self::Int4,
            2 => Self::Float4,
            3 => Self::Sampler,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterClass {
    Scalar,
    Vector,
    MatrixRows,
    MatrixColumns,
    Object,
    Struct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Void,
    Bool,
    Int,
    Float,
    String,
    Texture,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    Sampler,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
}

impl ParameterType {
    pub fn hlsl_name(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Texture => "texture",
            Self::Texture1D => "texture1D",
            Self::Texture2D => "texture2D",
            Self::Texture3D => "texture3D",
            Self::TextureCube => "textureCUBE",
            Self::Sampler => "sampler",
            Self::Sampler1D => "sampler1D",
            Self::Sampler2D => "sampler2D",
            Self::Sampler3D => "sampler3D",
            Self::SamplerCube => "samplerCUBE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantDeclaration {
    pub name: String,
    pub register_set: RegisterSet,
    pub parameter_type: ParameterType,
    pub parameter_class: ParameterClass,
    pub register_index: u32,
    pub register_count: u32,
    pub rows: u32,
    pub columns: u32,
    /// Array length; 1 for non-array constants.
    pub elements: u32,
}

impl ConstantDeclaration {
    /// A single `float4` (or narrower vector) constant occupying one register.
    pub fn vector(name: impl Into<String>, register_index: u32, columns: u32) -> Self {
        Self {
            name: name.into(),
            register_set: RegisterSet::Float4,
            parameter_type: ParameterType::Float,
            parameter_class: if columns == 1 {
                ParameterClass::Scalar
            } else {
                ParameterClass::Vector
            },
            register_index,
            register_count: 1,
            rows: 1,
            columns,
            elements: 1,
        }
    }

    /// A float matrix occupying one register per row (`MatrixRows`) or per column.
    pub fn matrix(
        name: impl Into<String>,
        class: ParameterClass,
        register_index: u32,
        rows: u32,
        columns: u32,
    ) -> Self {
        let register_count = match class {
            ParameterClass::MatrixColumns => columns,
            _ => rows,
        };
        Self {
            name: name.into(),
            register_set: RegisterSet::Float4,
            parameter_type: ParameterType::Float,
            parameter_class: class,
            register_index,
            register_count,
            rows,
            columns,
            elements: 1,
        }
    }

    pub fn sampler(
        name: impl Into<String>,
        parameter_type: ParameterType,
        register_index: u32,
    ) -> Self {
        Self {
            name: name.into(),
            register_set: RegisterSet::Sampler,
            parameter_type,
            parameter_class: ParameterClass::Object,
            register_index,
            register_count: 1,
            rows: 1,
            columns: 1,
            elements: 1,
        }
    }

    pub fn contains_index(&self, index: u32) -> bool {
        index >= self.register_index && index - self.register_index < self.register_count
    }

    /// HLSL type spelling (`float`, `float3`, `float4x4`, `sampler2D`, ...).
    pub fn hlsl_type(&self) -> String {
        let base = self.parameter_type.hlsl_name();
        match self.parameter_class {
            ParameterClass::Scalar | ParameterClass::Object | ParameterClass::Struct => {
                base.to_owned()
            }
            ParameterClass::Vector => format!("{base}{}", self.columns),
            ParameterClass::MatrixRows | ParameterClass::MatrixColumns => {
                format!("{base}{}x{}", self.rows, self.columns)
            }
        }
    }

    /// Top-level declaration line, e.g. `float4x4 WorldViewProj;` or `float4 Lights[4];`.
    pub fn hlsl_declaration(&self) -> String {
        if self.elements > 1 {
            format!("{} {}[{}];", self.hlsl_type(), self.name, self.elements)
        } else {
            format!("{} {};", self.hlsl_type(), self.name)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantTable {
    pub declarations: Vec<ConstantDeclaration>,
}

impl ConstantTable {
    pub fn new(declarations: Vec<ConstantDeclaration>) -> Self {
        Self { declarations }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstantDeclaration> + '_ {
        self.declarations.iter()
    }

    pub fn find_by_type(&self, ty: ParameterType, index: u32) -> Option<&ConstantDeclaration> {
        self.declarations
            .iter()
            .find(|c| c.parameter_type == ty && c.contains_index(index))
    }

    pub fn find_by_set(&self, set: RegisterSet, index: u32) -> Option<&ConstantDeclaration> {
        self.declarations
            .iter()
            .find(|c| c.register_set == set && c.contains_index(index))
    }

    pub fn find_by_index(&self, index: u32) -> Option<&ConstantDeclaration> {
        self.declarations.iter().find(|c| c.contains_index(index))
    }
}
