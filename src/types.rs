//! Core scalar types for strata-core.
//!
//! This module contains the closed set of element types the container
//! supports and the single-value counterpart used by scalar nodes.
//!
//! # Main Types
//!
//! - [`ScalarType`] - Enum of supported element types (u8, u16, f32, etc.)
//! - [`ScalarValue`] - A single unshaped value of one of those types
//!
//! The element-type set is fixed by design: stores, neighbor lists and
//! scalars are tagged variants over exactly these types, dispatched by
//! matching on the tag rather than by virtual dispatch.

use serde::{Deserialize, Serialize};

/// The type of a single stored element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ScalarType {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    #[default]
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Boolean value (stored as one byte)
    Bool,
}

impl ScalarType {
    /// All supported element types, in tag order.
    pub fn all() -> &'static [ScalarType] {
        &[
            ScalarType::U8,
            ScalarType::U16,
            ScalarType::U32,
            ScalarType::U64,
            ScalarType::I8,
            ScalarType::I16,
            ScalarType::I32,
            ScalarType::I64,
            ScalarType::F32,
            ScalarType::F64,
            ScalarType::Bool,
        ]
    }

    /// Returns the size in bytes of one element of this type.
    pub fn size_bytes(&self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::I8 | ScalarType::Bool => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::U64 | ScalarType::I64 | ScalarType::F64 => 8,
        }
    }

    /// Returns true if this type can back a neighbor list (numeric only).
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarType::Bool)
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarType::U8 => write!(f, "u8"),
            ScalarType::U16 => write!(f, "u16"),
            ScalarType::U32 => write!(f, "u32"),
            ScalarType::U64 => write!(f, "u64"),
            ScalarType::I8 => write!(f, "i8"),
            ScalarType::I16 => write!(f, "i16"),
            ScalarType::I32 => write!(f, "i32"),
            ScalarType::I64 => write!(f, "i64"),
            ScalarType::F32 => write!(f, "f32"),
            ScalarType::F64 => write!(f, "f64"),
            ScalarType::Bool => write!(f, "bool"),
        }
    }
}

/// A single unshaped value, as held by a scalar node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScalarValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
}

impl ScalarValue {
    /// The element type tag of this value.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarValue::U8(_) => ScalarType::U8,
            ScalarValue::U16(_) => ScalarType::U16,
            ScalarValue::U32(_) => ScalarType::U32,
            ScalarValue::U64(_) => ScalarType::U64,
            ScalarValue::I8(_) => ScalarType::I8,
            ScalarValue::I16(_) => ScalarType::I16,
            ScalarValue::I32(_) => ScalarType::I32,
            ScalarValue::I64(_) => ScalarType::I64,
            ScalarValue::F32(_) => ScalarType::F32,
            ScalarValue::F64(_) => ScalarType::F64,
            ScalarValue::Bool(_) => ScalarType::Bool,
        }
    }

    /// Lossy view of the value as f64, mainly for display and diagnostics.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarValue::U8(v) => v as f64,
            ScalarValue::U16(v) => v as f64,
            ScalarValue::U32(v) => v as f64,
            ScalarValue::U64(v) => v as f64,
            ScalarValue::I8(v) => v as f64,
            ScalarValue::I16(v) => v as f64,
            ScalarValue::I32(v) => v as f64,
            ScalarValue::I64(v) => v as f64,
            ScalarValue::F32(v) => v as f64,
            ScalarValue::F64(v) => v,
            ScalarValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::U8(v) => write!(f, "{v}"),
            ScalarValue::U16(v) => write!(f, "{v}"),
            ScalarValue::U32(v) => write!(f, "{v}"),
            ScalarValue::U64(v) => write!(f, "{v}"),
            ScalarValue::I8(v) => write!(f, "{v}"),
            ScalarValue::I16(v) => write!(f, "{v}"),
            ScalarValue::I32(v) => write!(f, "{v}"),
            ScalarValue::I64(v) => write!(f, "{v}"),
            ScalarValue::F32(v) => write!(f, "{v}"),
            ScalarValue::F64(v) => write!(f, "{v}"),
            ScalarValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bytes() {
        assert_eq!(ScalarType::U8.size_bytes(), 1);
        assert_eq!(ScalarType::I16.size_bytes(), 2);
        assert_eq!(ScalarType::F32.size_bytes(), 4);
        assert_eq!(ScalarType::F64.size_bytes(), 8);
        assert_eq!(ScalarType::Bool.size_bytes(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(ScalarType::F32.to_string(), "f32");
        assert_eq!(ScalarType::Bool.to_string(), "bool");
    }

    #[test]
    fn test_scalar_value_type() {
        assert_eq!(ScalarValue::F64(1.5).scalar_type(), ScalarType::F64);
        assert_eq!(ScalarValue::Bool(true).scalar_type(), ScalarType::Bool);
    }

    #[test]
    fn test_scalar_value_as_f64() {
        assert_eq!(ScalarValue::I32(-7).as_f64(), -7.0);
        assert_eq!(ScalarValue::Bool(true).as_f64(), 1.0);
    }

    #[test]
    fn test_serde_round_trip() {
        for &ty in ScalarType::all() {
            let json = serde_json::to_string(&ty).unwrap();
            let back: ScalarType = serde_json::from_str(&json).unwrap();
            assert_eq!(ty, back);
        }
    }
}
