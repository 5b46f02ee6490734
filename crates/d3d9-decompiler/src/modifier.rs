use crate::error::DecompileError;
use crate::instruction::SrcModifier;

/// Wraps an already-swizzled operand in the text form of its source modifier.
///
/// Bias, sign and projective-divide modifiers keep their assembly suffix (`_bias`, `_bx2`, `_dz`,
/// `_dw`) since HLSL has no operator for them.
pub fn apply_modifier(modifier: SrcModifier, value: &str) -> Result<String, DecompileError> {
    Ok(match modifier {
        SrcModifier::None => value.to_owned(),
        SrcModifier::Negate => format!("-{value}"),
        SrcModifier::Bias => format!("{value}_bias"),
        SrcModifier::BiasNegate => format!("-{value}_bias"),
        SrcModifier::Sign => format!("{value}_bx2"),
        SrcModifier::SignNegate => format!("-{value}_bx2"),
        SrcModifier::X2 => format!("(2 * {value})"),
        SrcModifier::X2Negate => format!("(-2 * {value})"),
        SrcModifier::Dz => format!("{value}_dz"),
        SrcModifier::Dw => format!("{value}_dw"),
        SrcModifier::Abs => format!("abs({value})"),
        SrcModifier::AbsNegate => format!("-abs({value})"),
        SrcModifier::Comp | SrcModifier::Not | SrcModifier::Unknown(_) => {
            return Err(DecompileError::UnsupportedModifier {
                modifier,
                context: "register operand",
            })
        }
    })
}
