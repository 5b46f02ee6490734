//! Folding of `def`/`defi`/`defb` literals into source text.

use std::fmt;
use std::fmt::Display;

use crate::error::DecompileError;
use crate::instruction::SrcModifier;

/// Renders the first `width` components as the narrowest literal expression.
///
/// Width 1 is always a scalar. Wider operands collapse to a scalar when every selected component
/// is equal (HLSL splats scalars implicitly) and otherwise become `{ctor}{width}(a, b, ...)`.
pub fn collapse<T>(components: &[T; 4], width: usize, ctor: &str) -> Result<String, DecompileError>
where
    T: PartialEq + Display,
{
    if !(1..=4).contains(&width) {
        return Err(DecompileError::InvalidWidth(width));
    }
    let selected = &components[..width];
    if selected.iter().all(|c| *c == selected[0]) {
        return Ok(selected[0].to_string());
    }
    let args = selected
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("{ctor}{width}({args})"))
}

/// A float literal as HLSL source.
///
/// Finite values use the shortest round-trip form. NaN and the infinities have no literal
/// spelling, so they render as the constant division that produces them.
#[derive(Debug, Clone, Copy)]
pub struct FloatLiteral(pub f32);

impl PartialEq for FloatLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 || (self.0.is_nan() && other.0.is_nan())
    }
}

impl Display for FloatLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("(0.0 / 0.0)")
        } else if v == f32::INFINITY {
            f.write_str("(1.0 / 0.0)")
        } else if v == f32::NEG_INFINITY {
            f.write_str("(-1.0 / 0.0)")
        } else {
            write!(f, "{v}")
        }
    }
}

/// Applies a source modifier to float literal components.
///
/// Only modifiers with an exact literal meaning fold; the rest have no literal form.
pub fn apply_float_modifier(
    mut components: [f32; 4],
    modifier: SrcModifier,
) -> Result<[f32; 4], DecompileError> {
    let f: fn(f32) -> f32 = match modifier {
        SrcModifier::None => return Ok(components),
        SrcModifier::Negate => |v: f32| -v,
        SrcModifier::Abs => f32::abs,
        SrcModifier::AbsNegate => |v: f32| -v.abs(),
        SrcModifier::X2 => |v: f32| v * 2.0,
        SrcModifier::X2Negate => |v: f32| v * -2.0,
        other => {
            return Err(DecompileError::UnsupportedModifier {
                modifier: other,
                context: "float literal",
            })
        }
    };
    for c in components.iter_mut() {
        *c = f(*c);
    }
    Ok(components)
}

pub fn apply_int_modifier(
    components: [i32; 4],
    modifier: SrcModifier,
) -> Result<[i32; 4], DecompileError> {
    match modifier {
        SrcModifier::None => Ok(components),
        SrcModifier::Negate => Ok(components.map(i32::wrapping_neg)),
        other => Err(DecompileError::UnsupportedModifier {
            modifier: other,
            context: "integer literal",
        }),
    }
}

pub fn fold_bool(value: bool, modifier: SrcModifier) -> Result<String, DecompileError> {
    match modifier {
        SrcModifier::None => Ok(value.to_string()),
        other => Err(DecompileError::UnsupportedModifier {
            modifier: other,
            context: "boolean literal",
        }),
    }
}
