//! Core runtime for ArborDB hierarchy statistics: predicates, the shared
//! traversal visitor, the five computers, batched sorting, and the
//! producer orchestration exported via the `prelude`.

pub mod error;
pub mod index;
pub mod obs;
pub mod query;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::HierarchyError as Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, visitors, or internal helpers are re-exported here.
///

pub mod prelude {
    pub use crate::query::{
        Formula,
        hierarchy::{
            FilteringPredicate, Hierarchy, HierarchyFilter, LevelInfo, ProducerContext,
            QueryExecution, StatisticsBase, StatisticsProducer, StatisticsType, StatisticsTypeSet,
            TraversalPredicate,
        },
    };
    pub use arbordb_primitives::{IdSet, PrimaryKey};
}
