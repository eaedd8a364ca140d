//! Tagged variant over the concrete stores.

use super::{DataStore, Element, StoreError, StoreKind};
use crate::types::{ScalarType, ScalarValue};
use std::io::Write;

/// A store of any supported element type, dispatched by [`ScalarType`] tag.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyStore {
    U8(DataStore<u8>),
    U16(DataStore<u16>),
    U32(DataStore<u32>),
    U64(DataStore<u64>),
    I8(DataStore<i8>),
    I16(DataStore<i16>),
    I32(DataStore<i32>),
    I64(DataStore<i64>),
    F32(DataStore<f32>),
    F64(DataStore<f64>),
    Bool(DataStore<bool>),
}

/// Run `$body` with `$store` bound to the inner `DataStore<T>`.
macro_rules! dispatch {
    ($value:expr, $store:ident => $body:expr) => {
        match $value {
            AnyStore::U8($store) => $body,
            AnyStore::U16($store) => $body,
            AnyStore::U32($store) => $body,
            AnyStore::U64($store) => $body,
            AnyStore::I8($store) => $body,
            AnyStore::I16($store) => $body,
            AnyStore::I32($store) => $body,
            AnyStore::I64($store) => $body,
            AnyStore::F32($store) => $body,
            AnyStore::F64($store) => $body,
            AnyStore::Bool($store) => $body,
        }
    };
}

/// Build an `AnyStore` by running `$make` once per element type.
macro_rules! construct {
    ($scalar_type:expr, $ty:ident => $make:expr) => {{
        match $scalar_type {
            ScalarType::U8 => {
                type $ty = u8;
                AnyStore::U8($make)
            }
            ScalarType::U16 => {
                type $ty = u16;
                AnyStore::U16($make)
            }
            ScalarType::U32 => {
                type $ty = u32;
                AnyStore::U32($make)
            }
            ScalarType::U64 => {
                type $ty = u64;
                AnyStore::U64($make)
            }
            ScalarType::I8 => {
                type $ty = i8;
                AnyStore::I8($make)
            }
            ScalarType::I16 => {
                type $ty = i16;
                AnyStore::I16($make)
            }
            ScalarType::I32 => {
                type $ty = i32;
                AnyStore::I32($make)
            }
            ScalarType::I64 => {
                type $ty = i64;
                AnyStore::I64($make)
            }
            ScalarType::F32 => {
                type $ty = f32;
                AnyStore::F32($make)
            }
            ScalarType::F64 => {
                type $ty = f64;
                AnyStore::F64($make)
            }
            ScalarType::Bool => {
                type $ty = bool;
                AnyStore::Bool($make)
            }
        }
    }};
}

impl AnyStore {
    /// Allocate a default-initialized in-memory store of the given type.
    pub fn new(
        scalar_type: ScalarType,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
    ) -> Self {
        construct!(scalar_type, T => DataStore::<T>::new(tuple_shape, component_shape))
    }

    /// Create an empty placeholder store of the given type.
    pub fn empty(
        scalar_type: ScalarType,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
    ) -> Self {
        construct!(scalar_type, T => DataStore::<T>::empty(tuple_shape, component_shape))
    }

    /// Reconstruct an in-memory store from raw native-order bytes.
    pub fn read_binary(
        scalar_type: ScalarType,
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        bytes: &[u8],
    ) -> Result<Self, StoreError> {
        Ok(match scalar_type {
            ScalarType::U8 => {
                AnyStore::U8(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::U16 => {
                AnyStore::U16(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::U32 => {
                AnyStore::U32(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::U64 => {
                AnyStore::U64(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::I8 => {
                AnyStore::I8(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::I16 => {
                AnyStore::I16(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::I32 => {
                AnyStore::I32(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::I64 => {
                AnyStore::I64(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::F32 => {
                AnyStore::F32(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::F64 => {
                AnyStore::F64(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
            ScalarType::Bool => {
                AnyStore::Bool(DataStore::read_binary(tuple_shape, component_shape, bytes)?)
            }
        })
    }

    /// The element type tag.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            AnyStore::U8(_) => ScalarType::U8,
            AnyStore::U16(_) => ScalarType::U16,
            AnyStore::U32(_) => ScalarType::U32,
            AnyStore::U64(_) => ScalarType::U64,
            AnyStore::I8(_) => ScalarType::I8,
            AnyStore::I16(_) => ScalarType::I16,
            AnyStore::I32(_) => ScalarType::I32,
            AnyStore::I64(_) => ScalarType::I64,
            AnyStore::F32(_) => ScalarType::F32,
            AnyStore::F64(_) => ScalarType::F64,
            AnyStore::Bool(_) => ScalarType::Bool,
        }
    }

    pub fn kind(&self) -> StoreKind {
        dispatch!(self, s => s.kind())
    }

    pub fn is_placeholder(&self) -> bool {
        dispatch!(self, s => s.is_placeholder())
    }

    pub fn tuple_shape(&self) -> &[usize] {
        dispatch!(self, s => s.tuple_shape())
    }

    pub fn component_shape(&self) -> &[usize] {
        dispatch!(self, s => s.component_shape())
    }

    pub fn chunk_shape(&self) -> Option<&[usize]> {
        dispatch!(self, s => s.chunk_shape())
    }

    pub fn set_chunk_shape(&mut self, chunk_shape: Option<Vec<usize>>) {
        dispatch!(self, s => s.set_chunk_shape(chunk_shape))
    }

    pub fn num_tuples(&self) -> usize {
        dispatch!(self, s => s.num_tuples())
    }

    pub fn num_components(&self) -> usize {
        dispatch!(self, s => s.num_components())
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        dispatch!(self, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte length of the raw buffer when serialized.
    pub fn byte_len(&self) -> usize {
        self.len() * self.scalar_type().size_bytes()
    }

    /// Resize the tuple dimension, preserving the overlapping prefix.
    pub fn resize_tuples(&mut self, tuple_shape: Vec<usize>) {
        dispatch!(self, s => s.resize_tuples(tuple_shape))
    }

    /// A fully independent copy with equal content.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// A same-shape, default-initialized in-memory store.
    pub fn new_instance(&self) -> Self {
        dispatch!(self, s => s.new_instance().into())
    }

    /// Convert a placeholder into a default-initialized in-memory store.
    pub fn materialize(&mut self) {
        dispatch!(self, s => s.materialize())
    }

    /// Serialize the raw buffer in native byte order.
    pub fn write_binary<W: Write>(&self, writer: &mut W) -> Result<(), StoreError> {
        dispatch!(self, s => s.write_binary(writer))
    }

    /// Element at `(tuple, component)` widened to f64, for diagnostics.
    pub fn value_as_f64(&self, tuple: usize, component: usize) -> Option<f64> {
        Some(match self {
            AnyStore::U8(s) => s.get(tuple, component)? as f64,
            AnyStore::U16(s) => s.get(tuple, component)? as f64,
            AnyStore::U32(s) => s.get(tuple, component)? as f64,
            AnyStore::U64(s) => s.get(tuple, component)? as f64,
            AnyStore::I8(s) => s.get(tuple, component)? as f64,
            AnyStore::I16(s) => s.get(tuple, component)? as f64,
            AnyStore::I32(s) => s.get(tuple, component)? as f64,
            AnyStore::I64(s) => s.get(tuple, component)? as f64,
            AnyStore::F32(s) => s.get(tuple, component)? as f64,
            AnyStore::F64(s) => s.get(tuple, component)?,
            AnyStore::Bool(s) => ScalarValue::Bool(s.get(tuple, component)?).as_f64(),
        })
    }

    /// Whether `self` and `other` declare the same type and shapes.
    pub fn same_layout(&self, other: &AnyStore) -> bool {
        self.scalar_type() == other.scalar_type()
            && self.tuple_shape() == other.tuple_shape()
            && self.component_shape() == other.component_shape()
    }
}

macro_rules! impl_from_and_accessors {
    ($($variant:ident, $ty:ty, $as_ref:ident, $as_mut:ident);* $(;)?) => {$(
        impl From<DataStore<$ty>> for AnyStore {
            fn from(store: DataStore<$ty>) -> Self {
                AnyStore::$variant(store)
            }
        }

        impl AnyStore {
            /// Typed view; `None` when the tag does not match.
            pub fn $as_ref(&self) -> Option<&DataStore<$ty>> {
                match self {
                    AnyStore::$variant(s) => Some(s),
                    _ => None,
                }
            }

            /// Typed mutable view; `None` when the tag does not match.
            pub fn $as_mut(&mut self) -> Option<&mut DataStore<$ty>> {
                match self {
                    AnyStore::$variant(s) => Some(s),
                    _ => None,
                }
            }
        }
    )*};
}

impl_from_and_accessors!(
    U8, u8, as_u8, as_u8_mut;
    U16, u16, as_u16, as_u16_mut;
    U32, u32, as_u32, as_u32_mut;
    U64, u64, as_u64, as_u64_mut;
    I8, i8, as_i8, as_i8_mut;
    I16, i16, as_i16, as_i16_mut;
    I32, i32, as_i32, as_i32_mut;
    I64, i64, as_i64, as_i64_mut;
    F32, f32, as_f32, as_f32_mut;
    F64, f64, as_f64_store, as_f64_store_mut;
    Bool, bool, as_bool, as_bool_mut;
);
