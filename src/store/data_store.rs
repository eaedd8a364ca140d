//! The concrete per-element-type store.

use super::{Element, StoreError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// What backs a store's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreKind {
    /// Elements live in process memory.
    InMemory,
    /// Shape and type metadata only; no elements are allocated.
    /// Used by Preflight to declare planned arrays.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
enum Backing<T> {
    InMemory(Vec<T>),
    Empty,
}

/// One array's typed backing buffer plus its shape metadata.
///
/// The buffer is tuple-major: element `(t, c)` lives at flat index
/// `t * num_components + c`. The backing memory is contiguous and
/// address-stable as long as no resize occurs.
#[derive(Debug, Clone, PartialEq)]
pub struct DataStore<T: Element> {
    tuple_shape: Vec<usize>,
    component_shape: Vec<usize>,
    chunk_shape: Option<Vec<usize>>,
    backing: Backing<T>,
}

fn shape_product(shape: &[usize]) -> usize {
    shape.iter().product()
}

impl<T: Element> DataStore<T> {
    /// Allocate a default-initialized in-memory store.
    pub fn new(tuple_shape: Vec<usize>, component_shape: Vec<usize>) -> Self {
        let len = shape_product(&tuple_shape) * shape_product(&component_shape);
        Self {
            tuple_shape,
            component_shape,
            chunk_shape: None,
            backing: Backing::InMemory(vec![T::default(); len]),
        }
    }

    /// Create an empty placeholder carrying only shape and type metadata.
    pub fn empty(tuple_shape: Vec<usize>, component_shape: Vec<usize>) -> Self {
        Self {
            tuple_shape,
            component_shape,
            chunk_shape: None,
            backing: Backing::Empty,
        }
    }

    /// Build an in-memory store from existing values, checking the shape.
    pub fn from_vec(
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, StoreError> {
        let expected = shape_product(&tuple_shape) * shape_product(&component_shape);
        if values.len() != expected {
            return Err(StoreError::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            tuple_shape,
            component_shape,
            chunk_shape: None,
            backing: Backing::InMemory(values),
        })
    }

    /// Attach an advisory chunk shape (used by chunked container formats).
    pub fn with_chunk_shape(mut self, chunk_shape: Option<Vec<usize>>) -> Self {
        self.chunk_shape = chunk_shape;
        self
    }

    pub fn set_chunk_shape(&mut self, chunk_shape: Option<Vec<usize>>) {
        self.chunk_shape = chunk_shape;
    }

    pub fn kind(&self) -> StoreKind {
        match self.backing {
            Backing::InMemory(_) => StoreKind::InMemory,
            Backing::Empty => StoreKind::Empty,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.backing, Backing::Empty)
    }

    pub fn tuple_shape(&self) -> &[usize] {
        &self.tuple_shape
    }

    pub fn component_shape(&self) -> &[usize] {
        &self.component_shape
    }

    pub fn chunk_shape(&self) -> Option<&[usize]> {
        self.chunk_shape.as_deref()
    }

    pub fn num_tuples(&self) -> usize {
        shape_product(&self.tuple_shape)
    }

    pub fn num_components(&self) -> usize {
        shape_product(&self.component_shape)
    }

    /// Total element count: `num_tuples() * num_components()`.
    pub fn len(&self) -> usize {
        self.num_tuples() * self.num_components()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The flat element slice. Fails on a placeholder store.
    pub fn values(&self) -> Result<&[T], StoreError> {
        match &self.backing {
            Backing::InMemory(v) => Ok(v),
            Backing::Empty => Err(StoreError::EmptyStoreAccess),
        }
    }

    /// The mutable flat element slice. Fails on a placeholder store.
    pub fn values_mut(&mut self) -> Result<&mut [T], StoreError> {
        match &mut self.backing {
            Backing::InMemory(v) => Ok(v),
            Backing::Empty => Err(StoreError::EmptyStoreAccess),
        }
    }

    /// Element at `(tuple, component)`, or `None` when out of range or
    /// the store is a placeholder.
    pub fn get(&self, tuple: usize, component: usize) -> Option<T> {
        if component >= self.num_components() {
            return None;
        }
        match &self.backing {
            Backing::InMemory(v) => v.get(tuple * self.num_components() + component).copied(),
            Backing::Empty => None,
        }
    }

    /// Set the element at `(tuple, component)`.
    pub fn set(&mut self, tuple: usize, component: usize, value: T) -> Result<(), StoreError> {
        let comps = self.num_components();
        let len = self.len();
        let idx = tuple * comps + component;
        if component >= comps || idx >= len {
            return Err(StoreError::OutOfRange { index: idx, len });
        }
        self.values_mut()?[idx] = value;
        Ok(())
    }

    /// Fill every element with `value`.
    pub fn fill(&mut self, value: T) -> Result<(), StoreError> {
        self.values_mut()?.fill(value);
        Ok(())
    }

    /// Resize the tuple dimension, preserving the overlapping flat-tuple
    /// prefix and default-initializing any new slots. The component shape
    /// is unchanged. Placeholder stores only update their metadata.
    pub fn resize_tuples(&mut self, tuple_shape: Vec<usize>) {
        let comps = self.num_components();
        let new_tuples = shape_product(&tuple_shape);
        if let Backing::InMemory(v) = &mut self.backing {
            let old_tuples = shape_product(&self.tuple_shape);
            let keep = old_tuples.min(new_tuples) * comps;
            let mut next = vec![T::default(); new_tuples * comps];
            next[..keep].copy_from_slice(&v[..keep]);
            *v = next;
        }
        self.tuple_shape = tuple_shape;
    }

    /// A fully independent copy with equal content.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// A same-shape, default-initialized in-memory store.
    ///
    /// This is how creation actions materialize a Preflight placeholder.
    pub fn new_instance(&self) -> Self {
        Self::new(self.tuple_shape.clone(), self.component_shape.clone())
            .with_chunk_shape(self.chunk_shape.clone())
    }

    /// Convert a placeholder into a default-initialized in-memory store.
    /// In-memory stores are left untouched.
    pub fn materialize(&mut self) {
        if self.is_placeholder() {
            let len = self.len();
            self.backing = Backing::InMemory(vec![T::default(); len]);
        }
    }

    /// Serialize the raw buffer in native byte order.
    pub fn write_binary<W: Write>(&self, writer: &mut W) -> Result<(), StoreError> {
        let values = self.values()?;
        let mut buf = Vec::with_capacity(values.len() * T::BYTE_WIDTH);
        for value in values {
            value.extend_ne_bytes(&mut buf);
        }
        writer.write_all(&buf)?;
        Ok(())
    }

    /// Serialize the raw buffer to a file in native byte order.
    pub fn write_binary_file(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let mut file = std::fs::File::create(path)?;
        self.write_binary(&mut file)
    }

    /// Reconstruct an in-memory store of the given shape from raw
    /// native-order bytes.
    pub fn read_binary(
        tuple_shape: Vec<usize>,
        component_shape: Vec<usize>,
        bytes: &[u8],
    ) -> Result<Self, StoreError> {
        let count = shape_product(&tuple_shape) * shape_product(&component_shape);
        let needed = count * T::BYTE_WIDTH;
        if bytes.len() < needed {
            return Err(StoreError::Truncated {
                needed,
                got: bytes.len(),
            });
        }
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            values.push(T::from_ne_slice(&bytes[i * T::BYTE_WIDTH..]));
        }
        Self::from_vec(tuple_shape, component_shape, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_consistency() {
        let store: DataStore<f32> = DataStore::new(vec![4, 2], vec![3]);
        assert_eq!(store.num_tuples(), 8);
        assert_eq!(store.num_components(), 3);
        assert_eq!(store.len(), 24);
        assert_eq!(store.kind(), StoreKind::InMemory);
    }

    #[test]
    fn test_placeholder_has_no_values() {
        let store: DataStore<u32> = DataStore::empty(vec![10], vec![1]);
        assert_eq!(store.kind(), StoreKind::Empty);
        assert_eq!(store.len(), 10);
        assert!(matches!(
            store.values(),
            Err(StoreError::EmptyStoreAccess)
        ));
        assert_eq!(store.get(0, 0), None);
    }

    #[test]
    fn test_get_set() {
        let mut store: DataStore<i32> = DataStore::new(vec![3], vec![2]);
        store.set(1, 1, 42).unwrap();
        assert_eq!(store.get(1, 1), Some(42));
        assert_eq!(store.get(1, 0), Some(0));
        assert_eq!(store.get(3, 0), None);
        assert!(store.set(0, 2, 1).is_err());
        assert_eq!(store.set(3, 0, 1).unwrap_err().code(), -155);
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let mut store: DataStore<u16> = DataStore::new(vec![4], vec![2]);
        for t in 0..4 {
            for c in 0..2 {
                store.set(t, c, (t * 10 + c) as u16).unwrap();
            }
        }
        store.resize_tuples(vec![6]);
        assert_eq!(store.num_tuples(), 6);
        // First 4 tuples unchanged
        for t in 0..4 {
            assert_eq!(store.get(t, 0), Some((t * 10) as u16));
            assert_eq!(store.get(t, 1), Some((t * 10 + 1) as u16));
        }
        // New tuples default-initialized
        assert_eq!(store.get(4, 0), Some(0));
        assert_eq!(store.get(5, 1), Some(0));
    }

    #[test]
    fn test_resize_shrink() {
        let mut store: DataStore<u8> = DataStore::new(vec![5], vec![1]);
        store.fill(7).unwrap();
        store.resize_tuples(vec![2]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.values().unwrap(), &[7, 7]);
    }

    #[test]
    fn test_deep_copy_independent() {
        let mut store: DataStore<f64> = DataStore::new(vec![3], vec![1]);
        store.set(0, 0, 1.5).unwrap();
        let copy = store.deep_copy();
        store.set(0, 0, 9.0).unwrap();
        assert_eq!(copy.get(0, 0), Some(1.5));
        assert_eq!(store.get(0, 0), Some(9.0));
    }

    #[test]
    fn test_new_instance_defaults() {
        let mut store: DataStore<i64> = DataStore::new(vec![2], vec![2]);
        store.fill(-3).unwrap();
        let fresh = store.new_instance();
        assert_eq!(fresh.tuple_shape(), store.tuple_shape());
        assert_eq!(fresh.values().unwrap(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_materialize_placeholder() {
        let mut store: DataStore<f32> = DataStore::empty(vec![3], vec![1]);
        store.materialize();
        assert_eq!(store.kind(), StoreKind::InMemory);
        assert_eq!(store.values().unwrap(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_binary_round_trip() {
        let store =
            DataStore::from_vec(vec![2], vec![2], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        let mut bytes = Vec::new();
        store.write_binary(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 16);
        let back: DataStore<f32> = DataStore::read_binary(vec![2], vec![2], &bytes).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn test_read_binary_truncated() {
        let err = DataStore::<u32>::read_binary(vec![4], vec![1], &[0u8; 3]).unwrap_err();
        assert_eq!(err.code(), -153);
    }

    #[test]
    fn test_write_binary_placeholder_fails() {
        let store: DataStore<u8> = DataStore::empty(vec![1], vec![1]);
        let mut sink = Vec::new();
        let err = store.write_binary(&mut sink).unwrap_err();
        assert_eq!(err.code(), -150);
    }
}
