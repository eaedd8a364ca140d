//! Identity type for nodes in the data structure graph.
//!
//! Ids are opaque `u64` newtypes assigned monotonically by a
//! [`DataStructure`](crate::graph::DataStructure) and never reused while
//! any reference to them exists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key into a `DataStructure`'s node arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DataId(pub u64);

impl DataId {
    pub const INVALID: DataId = DataId(u64::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "DataId(INVALID)")
        } else {
            write!(f, "DataId({})", self.0)
        }
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_id() {
        let id = DataId(42);
        assert!(id.is_valid());
        assert!(!DataId::INVALID.is_valid());
        assert_eq!(format!("{id}"), "DataId(42)");
        assert_eq!(format!("{}", DataId::INVALID), "DataId(INVALID)");
    }
}
