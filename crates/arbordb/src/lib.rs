//! ## Crate layout
//! - `core`: the hierarchy-statistics runtime — predicates, visitors,
//!   computers, sorting, and producer orchestration.
//! - `primitives`: the `PrimaryKey` scalar and ordered `IdSet`.
//!
//! The `prelude` module mirrors the runtime surface used by query
//! translation code.

pub use arbordb_core as core;
pub use arbordb_primitives as primitives;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::Error;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        index::{HierarchyIndex, HierarchyNodeRef, HierarchyVisitor},
        prelude::*,
        query::hierarchy::NestedContextSorter as _,
    };
}
