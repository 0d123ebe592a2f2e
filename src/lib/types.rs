//! Semantic value types flowing through widget graphs.

use std::str::FromStr;

use derive_more::Display;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
/// The restricted GLSL type set widgets are allowed to use.
///
/// `int` is special: it only ever carries UI control values and is never part
/// of type-inferred expressions.
pub enum ValueType {
    #[display(fmt = "float")]
    /// Scalar float.
    Float,
    #[display(fmt = "vec2")]
    /// 2-component float vector.
    Vec2,
    #[display(fmt = "vec3")]
    /// 3-component float vector.
    Vec3,
    #[display(fmt = "vec4")]
    /// 4-component float vector.
    Vec4,
    #[display(fmt = "int")]
    /// Scalar integer, reserved for control-bound parameters.
    Int,
}

impl ValueType {
    /// Number of scalar components.
    pub fn components(&self) -> usize {
        match self {
            ValueType::Float | ValueType::Int => 1,
            ValueType::Vec2 => 2,
            ValueType::Vec3 => 3,
            ValueType::Vec4 => 4,
        }
    }

    /// Float-based type with the given component count, if one exists.
    pub fn vector(components: usize) -> Option<ValueType> {
        Some(match components {
            1 => ValueType::Float,
            2 => ValueType::Vec2,
            3 => ValueType::Vec3,
            4 => ValueType::Vec4,
            _ => return None,
        })
    }

    /// Whether the type belongs to the float family (scalar or vector).
    pub fn is_float_based(&self) -> bool {
        !matches!(self, ValueType::Int)
    }

    /// Whether the type is a float vector (`vec2`..`vec4`).
    pub fn is_vector(&self) -> bool {
        matches!(self, ValueType::Vec2 | ValueType::Vec3 | ValueType::Vec4)
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "int" => Self::Int,
            other => Err(format!("Unrecognized type `{other}`."))?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_matches_glsl_spelling() {
        for (ty, expected) in [
            (ValueType::Float, "float"),
            (ValueType::Vec2, "vec2"),
            (ValueType::Vec3, "vec3"),
            (ValueType::Vec4, "vec4"),
            (ValueType::Int, "int"),
        ] {
            assert_eq!(ty.to_string(), expected);
            assert_eq!(expected.parse::<ValueType>(), Ok(ty));
        }
    }

    #[test]
    fn vector_mapping() {
        assert_eq!(ValueType::vector(1), Some(ValueType::Float));
        assert_eq!(ValueType::vector(4), Some(ValueType::Vec4));
        assert_eq!(ValueType::vector(0), None);
        assert_eq!(ValueType::vector(5), None);
    }
}
