use crate::{
    error::HierarchyError,
    query::hierarchy::{
        accumulator::Accumulator,
        computer::{ComputerBase, TraversalEntry},
        context::{HierarchyFilter, QueryExecution},
        predicate::FilteringPredicate,
    },
};
use arbordb_primitives::PrimaryKey;

///
/// SiblingsStatisticsComputer
///
/// Computes statistics for all nodes sharing the pivot's parent, the pivot
/// included. The omitted parent is the traversal origin, so distance is
/// compensated by -1 and siblings report distance 0. A pivot that is
/// itself a root draws its siblings from the root-node set.
///

pub struct SiblingsStatisticsComputer<E> {
    pub(super) base: ComputerBase<E>,
}

impl<E> SiblingsStatisticsComputer<E> {
    pub const fn new(base: ComputerBase<E>) -> Self {
        Self { base }
    }

    pub(crate) fn compute(
        &self,
        execution: &QueryExecution,
    ) -> Result<Vec<Accumulator<E>>, HierarchyError> {
        let Some(HierarchyFilter::Within { node, .. }) = self.base.context().hierarchy_filter()
        else {
            return Ok(Vec::new());
        };
        let Some(pivot) = ComputerBase::<E>::resolve_unique_node(node, "hierarchyWithin")? else {
            return Ok(Vec::new());
        };

        Ok(traverse_sibling_level(
            &self.base,
            execution,
            self.base.context().index().parent_node(pivot),
            None,
        ))
    }
}

///
/// SiblingsStatisticsTravelingComputer
///
/// The re-invocable variant used per ancestor level of a parents
/// traversal. The pivot is a per-call parameter and is always excluded
/// from the output via a single-node exclusion predicate.
///

pub struct SiblingsStatisticsTravelingComputer<E> {
    pub(super) base: ComputerBase<E>,
}

impl<E> SiblingsStatisticsTravelingComputer<E> {
    pub const fn new(base: ComputerBase<E>) -> Self {
        Self { base }
    }

    /// Siblings of `excluded` under `parent`; `None` means the excluded
    /// node is a root and its siblings come from the root-node set.
    pub(crate) fn compute_for(
        &self,
        execution: &QueryExecution,
        parent: Option<PrimaryKey>,
        excluded: PrimaryKey,
    ) -> Result<Vec<Accumulator<E>>, HierarchyError> {
        Ok(traverse_sibling_level(
            &self.base,
            execution,
            parent,
            Some(excluded),
        ))
    }

    /// Standalone registration: the pivot comes from the `Within` filter
    /// and is excluded from its own sibling set.
    pub(crate) fn compute(
        &self,
        execution: &QueryExecution,
    ) -> Result<Vec<Accumulator<E>>, HierarchyError> {
        let Some(HierarchyFilter::Within { node, .. }) = self.base.context().hierarchy_filter()
        else {
            return Ok(Vec::new());
        };
        let Some(pivot) = ComputerBase::<E>::resolve_unique_node(node, "hierarchyWithin")? else {
            return Ok(Vec::new());
        };

        self.compute_for(
            execution,
            self.base.context().index().parent_node(pivot),
            pivot,
        )
    }
}

/// One sibling level: the children of `parent`, or the root set when the
/// pivot has no parent. Distance compensation keeps siblings at 0.
fn traverse_sibling_level<E>(
    base: &ComputerBase<E>,
    execution: &QueryExecution,
    parent: Option<PrimaryKey>,
    excluded: Option<PrimaryKey>,
) -> Vec<Accumulator<E>> {
    let exclusion = excluded.map(FilteringPredicate::excluding);

    match parent {
        Some(parent) => base.traverse(
            execution,
            TraversalEntry::Subtree {
                node: parent,
                include_self: false,
            },
            exclusion,
            -1,
        ),
        None => base.traverse(
            execution,
            TraversalEntry::RootSet { exclude: excluded },
            exclusion,
            0,
        ),
    }
}
