//! Typed, shape-aware element storage backing array nodes.
//!
//! A store owns one array's raw backing buffer together with its tuple
//! shape and component shape. The total element count is always
//! `product(tuple_shape) * product(component_shape)`, laid out tuple-major
//! and contiguous, so algorithms can treat the buffer as a flat slice.
//!
//! Two backings exist per element type:
//!
//! - **In-memory**: a `Vec<T>` holding real data.
//! - **Empty placeholder**: shape and type metadata only, used when a
//!   Preflight pass must declare an array's shape without allocating.
//!
//! An out-of-core backing is reserved in the [`StoreKind`] vocabulary for
//! format plugins but is not provided by this crate.
//!
//! [`AnyStore`] is the closed tagged variant over the supported element
//! types; everything that handles "an array of some element type" matches
//! on it.

mod any_store;
mod data_store;

pub use any_store::AnyStore;
pub use data_store::{DataStore, StoreKind};

use crate::types::ScalarType;
use thiserror::Error;

/// Errors from store operations. Codes are stable (−150..).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot access element data of an empty placeholder store")]
    EmptyStoreAccess,

    #[error("Shape mismatch: store holds {expected} elements but {actual} were supplied")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Store write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("Store data truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("Element type {0} is not supported here")]
    UnsupportedElement(ScalarType),

    #[error("Index {index} is out of range, only {len} slots exist")]
    OutOfRange { index: usize, len: usize },
}

impl StoreError {
    /// Stable negative code for this error, for cross-layer reporting.
    pub fn code(&self) -> i64 {
        match self {
            StoreError::EmptyStoreAccess => -150,
            StoreError::ShapeMismatch { .. } => -151,
            StoreError::Write(_) => -152,
            StoreError::Truncated { .. } => -153,
            StoreError::UnsupportedElement(_) => -154,
            StoreError::OutOfRange { .. } => -155,
        }
    }
}

/// One supported element type.
///
/// Implemented for exactly the types named by [`ScalarType`]; the set is
/// closed. Byte encoding is native order, matching the raw-buffer dump
/// contract of the binary backends.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Tag of this element type.
    const SCALAR_TYPE: ScalarType;
    /// Encoded width in bytes.
    const BYTE_WIDTH: usize;

    /// Append this element's native-order bytes to `out`.
    fn extend_ne_bytes(&self, out: &mut Vec<u8>);

    /// Decode one element from the first `BYTE_WIDTH` bytes of `bytes`.
    fn from_ne_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $tag:ident),* $(,)?) => {$(
        impl Element for $ty {
            const SCALAR_TYPE: ScalarType = ScalarType::$tag;
            const BYTE_WIDTH: usize = std::mem::size_of::<$ty>();

            fn extend_ne_bytes(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_ne_bytes());
            }

            fn from_ne_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                <$ty>::from_ne_bytes(buf)
            }
        }
    )*};
}

impl_element!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

impl Element for bool {
    const SCALAR_TYPE: ScalarType = ScalarType::Bool;
    const BYTE_WIDTH: usize = 1;

    fn extend_ne_bytes(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }

    fn from_ne_slice(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_round_trip() {
        let mut buf = Vec::new();
        42.5f32.extend_ne_bytes(&mut buf);
        assert_eq!(buf.len(), f32::BYTE_WIDTH);
        assert_eq!(f32::from_ne_slice(&buf), 42.5);
    }

    #[test]
    fn test_bool_encoding() {
        let mut buf = Vec::new();
        true.extend_ne_bytes(&mut buf);
        false.extend_ne_bytes(&mut buf);
        assert_eq!(buf, [1, 0]);
        assert!(bool::from_ne_slice(&buf));
    }

    #[test]
    fn test_error_codes_stable() {
        assert_eq!(StoreError::EmptyStoreAccess.code(), -150);
        assert_eq!(
            StoreError::Truncated { needed: 8, got: 4 }.code(),
            -153
        );
    }
}
