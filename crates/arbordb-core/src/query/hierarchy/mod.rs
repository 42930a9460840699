//! Hierarchy-statistics computation.
//!
//! The producer registers computers per scope, computers share one
//! traversal algorithm driven by the external hierarchy index, and a
//! hierarchy set applies the single deferred sort pass over everything
//! computed for one target entity type.

pub mod accumulator;
pub mod computer;
pub mod context;
pub mod predicate;
pub mod producer;
pub mod set;
pub mod sorter;

pub(crate) mod visitor;

#[cfg(test)]
mod tests;

pub use accumulator::{Accumulator, LevelInfo};
pub use computer::{
    ChildrenStatisticsComputer, ComputerBase, NodeRelativeStatisticsComputer,
    ParentStatisticsComputer, RootStatisticsComputer, SiblingsStatisticsComputer,
    SiblingsStatisticsTravelingComputer, StatisticsComputer,
};
pub use context::{
    EntityFetcher, FilteringPredicateProducer, HierarchyFilter, ProducerContext,
    QueriedEntitiesProducer, QueryExecution, StatisticsBase, StatisticsType, StatisticsTypeSet,
};
pub use predicate::{FilteringPredicate, TraversalPredicate};
pub use producer::{Hierarchy, StatisticsProducer};
pub use set::HierarchySet;
pub use sorter::NestedContextSorter;
