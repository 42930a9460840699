use crate::{
    error::HierarchyError,
    index::{HierarchyNodeRef, HierarchyVisitor},
    query::{
        formula::Formula,
        hierarchy::{
            accumulator::Accumulator,
            computer::{ComputerBase, SiblingsStatisticsTravelingComputer},
            context::{HierarchyFilter, QueryExecution},
            predicate::FilteringPredicate,
        },
    },
};
use arbordb_primitives::PrimaryKey;
use std::collections::BTreeSet;

///
/// ParentStatisticsComputer
///
/// Walks from the `Within` pivot up to the tree root, excluding the pivot
/// itself, and emits the ancestor chain top-down: each ancestor's children
/// are the next chain node plus — when sibling statistics were requested —
/// that node's siblings, computed by a shared traveling computer so no
/// tree walk is duplicated. Chain nodes are exempt from empty-result
/// pruning.
///

pub struct ParentStatisticsComputer<E> {
    pub(super) base: ComputerBase<E>,
    siblings: Option<SiblingsStatisticsTravelingComputer<E>>,
}

impl<E> ParentStatisticsComputer<E> {
    pub const fn new(
        base: ComputerBase<E>,
        siblings: Option<SiblingsStatisticsTravelingComputer<E>>,
    ) -> Self {
        Self { base, siblings }
    }

    pub(crate) fn compute(
        &self,
        execution: &QueryExecution,
    ) -> Result<Vec<Accumulator<E>>, HierarchyError> {
        let context = self.base.context();
        let Some(HierarchyFilter::Within { node, .. }) = context.hierarchy_filter() else {
            return Ok(Vec::new());
        };
        let Some(pivot) = ComputerBase::<E>::resolve_unique_node(node, "hierarchyWithin")? else {
            return Ok(Vec::new());
        };

        let mut collector = ChainCollector::default();
        context.index().traverse_hierarchy_to_root(&mut collector, pivot);
        // chain[0] is the pivot itself; everything above it is emitted
        let chain = collector.chain;
        if chain.len() <= 1 {
            return Ok(Vec::new());
        }

        let filter = self.base.resolved_filter(execution);
        filter.initialize();
        let need_queried = self.base.need_queried();
        let queried = |node: PrimaryKey| self.base.queried_formula(execution, node);
        let index_filter = |node: PrimaryKey| filter.test(node);

        let mut carried: Option<Accumulator<E>> = None;
        let mut child_on_path = pivot;
        let mut reached_top = true;

        for ancestor in chain.iter().skip(1) {
            let ancestor_key = ancestor.primary_key;
            let distance = i32::try_from(ancestor.distance).unwrap_or(i32::MAX);
            if !self.base.scope().test(ancestor_key, ancestor.level, distance) {
                reached_top = false;
                break;
            }
            let Some(entity) = (context.entity_fetcher())(ancestor_key) else {
                reached_top = false;
                break;
            };

            let mut accumulator =
                Accumulator::new(ancestor_key, entity, queried(ancestor_key));
            accumulator.mark_preserved();

            // siblings of the chain node below, attached under this ancestor
            let sibling_accumulators = match &self.siblings {
                Some(traveling) => {
                    traveling.compute_for(execution, Some(ancestor_key), child_on_path)?
                }
                None => Vec::new(),
            };

            // the sweep completes direct-child and subtree counts for
            // everything not carried by a materialized child accumulator
            let mut skip_totals: BTreeSet<PrimaryKey> = sibling_accumulators
                .iter()
                .map(Accumulator::primary_key)
                .collect();
            if child_on_path != pivot {
                skip_totals.insert(child_on_path);
            }

            let mut sweep = ChildSweepVisitor {
                filter: &filter,
                queried: &queried,
                need_queried,
                skip_totals: &skip_totals,
                admitted: 0,
                total: 0,
            };
            context
                .index()
                .traverse_hierarchy_from_node(&mut sweep, ancestor_key, false, &index_filter);

            accumulator.set_children_count(sweep.admitted);
            if need_queried {
                accumulator.add_omitted_queried(sweep.total);
            }

            if let Some(finished) = carried.take() {
                accumulator.register_child(finished);
            }
            for sibling in sibling_accumulators {
                accumulator.register_child(sibling);
            }
            accumulator.sort_children_by_primary_key();

            child_on_path = ancestor_key;
            carried = Some(accumulator);
        }

        let Some(top) = carried else {
            return Ok(Vec::new());
        };

        let mut output = Vec::new();
        if reached_top && let Some(traveling) = &self.siblings {
            output.extend(traveling.compute_for(execution, None, top.primary_key())?);
        }
        output.push(top);
        output.sort_by_key(Accumulator::primary_key);

        Ok(output)
    }
}

///
/// ChainCollector
///

#[derive(Default)]
struct ChainCollector {
    chain: Vec<HierarchyNodeRef>,
}

impl HierarchyVisitor for ChainCollector {
    fn visit(
        &mut self,
        node: HierarchyNodeRef,
        traverser: &mut dyn FnMut(&mut dyn HierarchyVisitor),
    ) {
        self.chain.push(node);
        traverser(self);
    }
}

///
/// ChildSweepVisitor
///
/// Counts one ancestor's admitted direct children and, when queried totals
/// are needed, the queried entities of every child subtree whose counts
/// are not already carried by a materialized accumulator.
///

struct ChildSweepVisitor<'a> {
    filter: &'a FilteringPredicate,
    queried: &'a dyn Fn(PrimaryKey) -> Formula,
    need_queried: bool,
    skip_totals: &'a BTreeSet<PrimaryKey>,
    admitted: u32,
    total: u32,
}

impl HierarchyVisitor for ChildSweepVisitor<'_> {
    fn visit(
        &mut self,
        node: HierarchyNodeRef,
        traverser: &mut dyn FnMut(&mut dyn HierarchyVisitor),
    ) {
        let key = node.primary_key;
        if !self.filter.test(key) {
            return;
        }

        if node.distance == 1 {
            self.admitted += 1;
            if self.skip_totals.contains(&key) || !self.need_queried {
                return;
            }
        }

        self.total += (self.queried)(key).cardinality();
        traverser(self);
    }
}
