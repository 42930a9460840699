use crate::{
    error::HierarchyError,
    query::{
        formula::Formula,
        hierarchy::{
            accumulator::Accumulator,
            computer::{ComputerBase, TraversalEntry},
            context::QueryExecution,
        },
    },
};

///
/// NodeRelativeStatisticsComputer
///
/// Computes children statistics relative to one node selected by an
/// arbitrary filter-by expression. The expression must not match more
/// than one node; matching none yields an empty result.
///

pub struct NodeRelativeStatisticsComputer<E> {
    pub(super) base: ComputerBase<E>,
    node_selector: Formula,
}

impl<E> NodeRelativeStatisticsComputer<E> {
    pub const fn new(base: ComputerBase<E>, node_selector: Formula) -> Self {
        Self {
            base,
            node_selector,
        }
    }

    pub(crate) fn compute(
        &self,
        execution: &QueryExecution,
    ) -> Result<Vec<Accumulator<E>>, HierarchyError> {
        let Some(pivot) =
            ComputerBase::<E>::resolve_unique_node(&self.node_selector, "node-relative")?
        else {
            return Ok(Vec::new());
        };

        Ok(self.base.traverse(
            execution,
            TraversalEntry::Subtree {
                node: pivot,
                include_self: false,
            },
            None,
            0,
        ))
    }
}
