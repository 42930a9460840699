use crate::{
    error::HierarchyError,
    query::hierarchy::{
        accumulator::Accumulator,
        computer::{ComputerBase, TraversalEntry},
        context::QueryExecution,
    },
};

///
/// RootStatisticsComputer
///
/// Computes statistics for the whole tree, starting at the externally
/// supplied root-node set; every root is a traversal origin at distance 0.
///

pub struct RootStatisticsComputer<E> {
    pub(super) base: ComputerBase<E>,
}

impl<E> RootStatisticsComputer<E> {
    pub const fn new(base: ComputerBase<E>) -> Self {
        Self { base }
    }

    pub(crate) fn compute(
        &self,
        execution: &QueryExecution,
    ) -> Result<Vec<Accumulator<E>>, HierarchyError> {
        Ok(self
            .base
            .traverse(execution, TraversalEntry::RootSet { exclude: None }, None, 0))
    }
}
