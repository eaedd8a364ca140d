//! Per-tuple ragged list containers.
//!
//! A neighbor list holds, for each tuple index, a variable-length list of
//! elements (typically ids of neighboring features). Lists are fully
//! independent: mutating one tuple's list never affects another's.

use crate::store::{Element, StoreError};
use crate::types::ScalarType;

#[derive(Debug, Clone, PartialEq)]
enum Lists<T> {
    /// Tuple count only; no per-tuple storage is allocated. Used when a
    /// Preflight pass must declare a list's shape without allocating.
    Planned { num_tuples: usize },
    Allocated(Vec<Vec<T>>),
}

/// Ragged per-tuple lists of `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborList<T: Element> {
    lists: Lists<T>,
}

impl<T: Element> NeighborList<T> {
    /// Create with `num_tuples` empty lists.
    pub fn new(num_tuples: usize) -> Self {
        Self {
            lists: Lists::Allocated(vec![Vec::new(); num_tuples]),
        }
    }

    /// Create a placeholder carrying only the tuple count.
    pub fn placeholder(num_tuples: usize) -> Self {
        Self {
            lists: Lists::Planned { num_tuples },
        }
    }

    pub fn from_lists(lists: Vec<Vec<T>>) -> Self {
        Self {
            lists: Lists::Allocated(lists),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.lists, Lists::Planned { .. })
    }

    /// Allocate empty per-tuple lists for a placeholder. Allocated lists
    /// are left untouched.
    pub fn materialize(&mut self) {
        if let Lists::Planned { num_tuples } = self.lists {
            self.lists = Lists::Allocated(vec![Vec::new(); num_tuples]);
        }
    }

    pub fn num_tuples(&self) -> usize {
        match &self.lists {
            Lists::Planned { num_tuples } => *num_tuples,
            Lists::Allocated(lists) => lists.len(),
        }
    }

    /// Total element count across all lists.
    pub fn total_len(&self) -> usize {
        self.allocated().iter().map(Vec::len).sum()
    }

    /// The list at `tuple`. `None` when out of range or the container is
    /// a placeholder.
    pub fn list(&self, tuple: usize) -> Option<&[T]> {
        self.allocated().get(tuple).map(Vec::as_slice)
    }

    /// Append one value to the list at `tuple`.
    pub fn push_to(&mut self, tuple: usize, value: T) -> Result<(), StoreError> {
        self.slot(tuple)?.push(value);
        Ok(())
    }

    /// Replace the list at `tuple`.
    pub fn set_list(&mut self, tuple: usize, values: Vec<T>) -> Result<(), StoreError> {
        *self.slot(tuple)? = values;
        Ok(())
    }

    /// Resize the tuple count; dropped lists are discarded, new ones start
    /// empty. Surviving lists keep their contents. Placeholders only
    /// update their count.
    pub fn resize_tuples(&mut self, num_tuples: usize) {
        match &mut self.lists {
            Lists::Planned { num_tuples: n } => *n = num_tuples,
            Lists::Allocated(lists) => lists.resize(num_tuples, Vec::new()),
        }
    }

    /// A fully independent copy.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[T]> {
        self.allocated().iter().map(Vec::as_slice)
    }

    fn allocated(&self) -> &[Vec<T>] {
        match &self.lists {
            Lists::Planned { .. } => &[],
            Lists::Allocated(lists) => lists,
        }
    }

    fn slot(&mut self, tuple: usize) -> Result<&mut Vec<T>, StoreError> {
        let len = self.num_tuples();
        match &mut self.lists {
            Lists::Planned { .. } => Err(StoreError::EmptyStoreAccess),
            Lists::Allocated(lists) => lists
                .get_mut(tuple)
                .ok_or(StoreError::OutOfRange { index: tuple, len }),
        }
    }
}

/// A neighbor list of any supported numeric element type.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyNeighborList {
    U8(NeighborList<u8>),
    U16(NeighborList<u16>),
    U32(NeighborList<u32>),
    U64(NeighborList<u64>),
    I8(NeighborList<i8>),
    I16(NeighborList<i16>),
    I32(NeighborList<i32>),
    I64(NeighborList<i64>),
    F32(NeighborList<f32>),
    F64(NeighborList<f64>),
}

macro_rules! nl_dispatch {
    ($value:expr, $list:ident => $body:expr) => {
        match $value {
            AnyNeighborList::U8($list) => $body,
            AnyNeighborList::U16($list) => $body,
            AnyNeighborList::U32($list) => $body,
            AnyNeighborList::U64($list) => $body,
            AnyNeighborList::I8($list) => $body,
            AnyNeighborList::I16($list) => $body,
            AnyNeighborList::I32($list) => $body,
            AnyNeighborList::I64($list) => $body,
            AnyNeighborList::F32($list) => $body,
            AnyNeighborList::F64($list) => $body,
        }
    };
}

impl AnyNeighborList {
    /// Create with `num_tuples` empty lists. Bool is not a valid neighbor
    /// element type.
    pub fn new(scalar_type: ScalarType, num_tuples: usize) -> Result<Self, StoreError> {
        Ok(match scalar_type {
            ScalarType::U8 => AnyNeighborList::U8(NeighborList::new(num_tuples)),
            ScalarType::U16 => AnyNeighborList::U16(NeighborList::new(num_tuples)),
            ScalarType::U32 => AnyNeighborList::U32(NeighborList::new(num_tuples)),
            ScalarType::U64 => AnyNeighborList::U64(NeighborList::new(num_tuples)),
            ScalarType::I8 => AnyNeighborList::I8(NeighborList::new(num_tuples)),
            ScalarType::I16 => AnyNeighborList::I16(NeighborList::new(num_tuples)),
            ScalarType::I32 => AnyNeighborList::I32(NeighborList::new(num_tuples)),
            ScalarType::I64 => AnyNeighborList::I64(NeighborList::new(num_tuples)),
            ScalarType::F32 => AnyNeighborList::F32(NeighborList::new(num_tuples)),
            ScalarType::F64 => AnyNeighborList::F64(NeighborList::new(num_tuples)),
            ScalarType::Bool => return Err(StoreError::UnsupportedElement(ScalarType::Bool)),
        })
    }

    /// Create a placeholder carrying only the element type and tuple
    /// count, with no per-tuple storage.
    pub fn placeholder(scalar_type: ScalarType, num_tuples: usize) -> Result<Self, StoreError> {
        Ok(match scalar_type {
            ScalarType::U8 => AnyNeighborList::U8(NeighborList::placeholder(num_tuples)),
            ScalarType::U16 => AnyNeighborList::U16(NeighborList::placeholder(num_tuples)),
            ScalarType::U32 => AnyNeighborList::U32(NeighborList::placeholder(num_tuples)),
            ScalarType::U64 => AnyNeighborList::U64(NeighborList::placeholder(num_tuples)),
            ScalarType::I8 => AnyNeighborList::I8(NeighborList::placeholder(num_tuples)),
            ScalarType::I16 => AnyNeighborList::I16(NeighborList::placeholder(num_tuples)),
            ScalarType::I32 => AnyNeighborList::I32(NeighborList::placeholder(num_tuples)),
            ScalarType::I64 => AnyNeighborList::I64(NeighborList::placeholder(num_tuples)),
            ScalarType::F32 => AnyNeighborList::F32(NeighborList::placeholder(num_tuples)),
            ScalarType::F64 => AnyNeighborList::F64(NeighborList::placeholder(num_tuples)),
            ScalarType::Bool => return Err(StoreError::UnsupportedElement(ScalarType::Bool)),
        })
    }

    pub fn is_placeholder(&self) -> bool {
        nl_dispatch!(self, l => l.is_placeholder())
    }

    /// Allocate empty per-tuple lists for a placeholder.
    pub fn materialize(&mut self) {
        nl_dispatch!(self, l => l.materialize())
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            AnyNeighborList::U8(_) => ScalarType::U8,
            AnyNeighborList::U16(_) => ScalarType::U16,
            AnyNeighborList::U32(_) => ScalarType::U32,
            AnyNeighborList::U64(_) => ScalarType::U64,
            AnyNeighborList::I8(_) => ScalarType::I8,
            AnyNeighborList::I16(_) => ScalarType::I16,
            AnyNeighborList::I32(_) => ScalarType::I32,
            AnyNeighborList::I64(_) => ScalarType::I64,
            AnyNeighborList::F32(_) => ScalarType::F32,
            AnyNeighborList::F64(_) => ScalarType::F64,
        }
    }

    pub fn num_tuples(&self) -> usize {
        nl_dispatch!(self, l => l.num_tuples())
    }

    pub fn total_len(&self) -> usize {
        nl_dispatch!(self, l => l.total_len())
    }

    pub fn resize_tuples(&mut self, num_tuples: usize) {
        nl_dispatch!(self, l => l.resize_tuples(num_tuples))
    }

    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Serialize as, per tuple, a little-endian u64 length followed by the
    /// list's elements in native order.
    pub fn write_binary(&self, out: &mut Vec<u8>) {
        fn write_lists<T: Element>(lists: &NeighborList<T>, out: &mut Vec<u8>) {
            for list in lists.iter() {
                out.extend_from_slice(&(list.len() as u64).to_le_bytes());
                for value in list {
                    value.extend_ne_bytes(out);
                }
            }
        }
        nl_dispatch!(self, l => write_lists(l, out))
    }

    /// Reconstruct from the [`write_binary`](Self::write_binary) layout.
    pub fn read_binary(
        scalar_type: ScalarType,
        num_tuples: usize,
        bytes: &[u8],
    ) -> Result<Self, StoreError> {
        fn read_lists<T: Element>(
            num_tuples: usize,
            bytes: &[u8],
        ) -> Result<NeighborList<T>, StoreError> {
            let mut lists = Vec::with_capacity(num_tuples);
            let mut offset = 0usize;
            for _ in 0..num_tuples {
                if offset + 8 > bytes.len() {
                    return Err(StoreError::Truncated {
                        needed: offset + 8,
                        got: bytes.len(),
                    });
                }
                let mut len_buf = [0u8; 8];
                len_buf.copy_from_slice(&bytes[offset..offset + 8]);
                offset += 8;
                let len = u64::from_le_bytes(len_buf) as usize;
                let needed = offset + len * T::BYTE_WIDTH;
                if needed > bytes.len() {
                    return Err(StoreError::Truncated {
                        needed,
                        got: bytes.len(),
                    });
                }
                let mut list = Vec::with_capacity(len);
                for i in 0..len {
                    list.push(T::from_ne_slice(&bytes[offset + i * T::BYTE_WIDTH..]));
                }
                offset = needed;
                lists.push(list);
            }
            Ok(NeighborList::from_lists(lists))
        }

        Ok(match scalar_type {
            ScalarType::U8 => AnyNeighborList::U8(read_lists(num_tuples, bytes)?),
            ScalarType::U16 => AnyNeighborList::U16(read_lists(num_tuples, bytes)?),
            ScalarType::U32 => AnyNeighborList::U32(read_lists(num_tuples, bytes)?),
            ScalarType::U64 => AnyNeighborList::U64(read_lists(num_tuples, bytes)?),
            ScalarType::I8 => AnyNeighborList::I8(read_lists(num_tuples, bytes)?),
            ScalarType::I16 => AnyNeighborList::I16(read_lists(num_tuples, bytes)?),
            ScalarType::I32 => AnyNeighborList::I32(read_lists(num_tuples, bytes)?),
            ScalarType::I64 => AnyNeighborList::I64(read_lists(num_tuples, bytes)?),
            ScalarType::F32 => AnyNeighborList::F32(read_lists(num_tuples, bytes)?),
            ScalarType::F64 => AnyNeighborList::F64(read_lists(num_tuples, bytes)?),
            ScalarType::Bool => return Err(StoreError::UnsupportedElement(ScalarType::Bool)),
        })
    }

    /// Typed view for i32 lists, the most common feature-id element type.
    pub fn as_i32(&self) -> Option<&NeighborList<i32>> {
        match self {
            AnyNeighborList::I32(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_i32_mut(&mut self) -> Option<&mut NeighborList<i32>> {
        match self {
            AnyNeighborList::I32(l) => Some(l),
            _ => None,
        }
    }
}
