use crate::{
    index::{HierarchyNodeRef, HierarchyVisitor},
    query::{
        formula::Formula,
        hierarchy::{
            accumulator::Accumulator,
            predicate::{FilteringPredicate, TraversalPredicate},
        },
    },
};
use arbordb_primitives::PrimaryKey;
use std::mem;

///
/// StatisticsVisitor
///
/// The one traversal algorithm shared by all computers. The external index
/// drives it depth-first, pre-order; it checks visibility (filtering
/// predicate), then scope (traversal predicate), and builds the
/// accumulator tree. Admitted subtrees that the scope keeps out of the
/// output are folded into the nearest in-scope ancestor in count-only
/// mode — scope and visibility stay orthogonal.
///

pub(crate) struct StatisticsVisitor<'a, E> {
    entity_fetcher: &'a dyn Fn(PrimaryKey) -> Option<E>,
    queried: &'a dyn Fn(PrimaryKey) -> Formula,
    scope: &'a TraversalPredicate,
    filter: &'a FilteringPredicate,
    /// queried totals are needed when the count was requested or pruning
    /// depends on it; otherwise out-of-scope subtrees are not walked
    need_queried: bool,
    distance_compensation: i32,
    counting_only: bool,
    omitted: u32,
    stack: Vec<Accumulator<E>>,
    output: Vec<Accumulator<E>>,
}

impl<'a, E> StatisticsVisitor<'a, E> {
    pub fn new(
        entity_fetcher: &'a dyn Fn(PrimaryKey) -> Option<E>,
        queried: &'a dyn Fn(PrimaryKey) -> Formula,
        scope: &'a TraversalPredicate,
        filter: &'a FilteringPredicate,
        need_queried: bool,
        distance_compensation: i32,
    ) -> Self {
        Self {
            entity_fetcher,
            queried,
            scope,
            filter,
            need_queried,
            distance_compensation,
            counting_only: false,
            omitted: 0,
            stack: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Root accumulators collected so far; the stack must be drained.
    pub fn into_accumulators(self) -> Vec<Accumulator<E>> {
        debug_assert!(self.stack.is_empty(), "unfinished traversal");
        self.output
    }

    fn direct_count(&self, node: PrimaryKey) -> u32 {
        (self.queried)(node).cardinality()
    }
}

impl<E> HierarchyVisitor for StatisticsVisitor<'_, E> {
    fn visit(
        &mut self,
        node: HierarchyNodeRef,
        traverser: &mut dyn FnMut(&mut dyn HierarchyVisitor),
    ) {
        let pk = node.primary_key;

        // visibility: a node failing the filter contributes nothing
        if !self.filter.test(pk) {
            return;
        }

        if self.counting_only {
            self.omitted += self.direct_count(pk);
            traverser(self);
            return;
        }

        // admitted: the parent sees one more direct child whether or not
        // this node stays inside the output scope
        if let Some(parent) = self.stack.last_mut() {
            parent.register_admitted_child();
        }

        let distance =
            i32::try_from(node.distance).unwrap_or(i32::MAX).saturating_add(self.distance_compensation);
        if !self.scope.test(pk, node.level, distance) {
            if self.need_queried {
                self.counting_only = true;
                self.omitted += self.direct_count(pk);
                traverser(self);
                self.counting_only = false;

                let subtotal = mem::take(&mut self.omitted);
                if let Some(parent) = self.stack.last_mut() {
                    parent.add_omitted_queried(subtotal);
                }
            }
            return;
        }

        let Some(entity) = (self.entity_fetcher)(pk) else {
            return;
        };

        self.stack
            .push(Accumulator::new(pk, entity, (self.queried)(pk)));
        traverser(self);

        if let Some(finished) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.register_child(finished),
                None => self.output.push(finished),
            }
        }
    }
}
