//! Planned, replayable mutations and the two-phase application protocol.
//!
//! Filters never mutate a [`DataStructure`](crate::graph::DataStructure)
//! directly. They build [`Action`] values describing every path they will
//! create, copy, rename, graft or delete, collected in an
//! [`OutputActions`] plan. The plan is applied twice:
//!
//! - **Preflight** validates feasibility without allocating element data.
//!   Creation actions insert placeholder (empty) stores so later actions
//!   and downstream consumers can reference not-yet-real data.
//! - **Execute** performs the real mutation, and is only meaningful after
//!   an equivalent Preflight succeeded against a structurally identical
//!   structure.
//!
//! Applying a list accumulates warnings per action but stops at the first
//! hard failure. Deferred actions run only after every regular action in
//! the plan succeeded, the home for deletions that must not run until
//! all creations validate. There is no rollback: an Execute failure
//! leaves prior actions applied, and the caller decides whether the
//! pipeline stops.

mod action;
mod cancel;
mod output;

pub use action::{Action, ActionError, ActionWarning, ApplyMode};
pub use cancel::CancelToken;
pub use output::{ActionFailure, ApplyReport, OutputActions};

/// Warning code: a deep copy found a reference escaping the subtree.
pub const WARN_EXTERNAL_REFERENCE: i64 = 300;
/// Warning code: a rename overwrote an existing sibling.
pub const WARN_OVERWROTE_SIBLING: i64 = 301;
/// Warning code: an import replaced an existing object.
pub const WARN_REPLACED_EXISTING: i64 = 302;
