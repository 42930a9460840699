use crate::{
    error::HierarchyError,
    query::hierarchy::{
        accumulator::Accumulator,
        computer::{ComputerBase, TraversalEntry},
        context::{HierarchyFilter, QueryExecution},
    },
};

///
/// ChildrenStatisticsComputer
///
/// Computes statistics one level below the anchor. A `Within` filter
/// selects exactly one pivot node, which is excluded from the output but
/// remains the distance origin (children report distance 1). With
/// `WithinRoot` or no hierarchy filter the traversal starts at the index's
/// root nodes.
///

pub struct ChildrenStatisticsComputer<E> {
    pub(super) base: ComputerBase<E>,
}

impl<E> ChildrenStatisticsComputer<E> {
    pub const fn new(base: ComputerBase<E>) -> Self {
        Self { base }
    }

    pub(crate) fn compute(
        &self,
        execution: &QueryExecution,
    ) -> Result<Vec<Accumulator<E>>, HierarchyError> {
        match self.base.context().hierarchy_filter() {
            Some(HierarchyFilter::Within { node, .. }) => {
                let Some(pivot) = ComputerBase::<E>::resolve_unique_node(node, "hierarchyWithin")?
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
            Some(HierarchyFilter::WithinRoot { .. }) | None => {
                Ok(self
                    .base
                    .traverse(execution, TraversalEntry::WholeTree, None, 0))
            }
        }
    }
}
