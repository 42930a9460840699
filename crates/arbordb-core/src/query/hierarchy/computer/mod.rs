mod children;
mod node_relative;
mod parent;
mod root;
mod siblings;

pub use children::ChildrenStatisticsComputer;
pub use node_relative::NodeRelativeStatisticsComputer;
pub use parent::ParentStatisticsComputer;
pub use root::RootStatisticsComputer;
pub use siblings::{SiblingsStatisticsComputer, SiblingsStatisticsTravelingComputer};

use crate::{
    error::{HierarchyError, InternalError},
    obs::TraceComputerKind,
    query::{
        formula::Formula,
        hierarchy::{
            accumulator::{Accumulator, LevelInfo},
            context::{ProducerContext, QueryExecution, StatisticsBase, StatisticsType, StatisticsTypeSet},
            predicate::{FilteringPredicate, TraversalPredicate},
            visitor::StatisticsVisitor,
        },
    },
};
use arbordb_primitives::PrimaryKey;
use std::rc::Rc;

///
/// StatisticsComputer
///
/// Closed set of traversal entry strategies. Every variant shares the
/// accumulation algorithm of [`StatisticsVisitor`]; only the entry point
/// and distance bookkeeping differ.
///

pub enum StatisticsComputer<E> {
    Root(RootStatisticsComputer<E>),
    Children(ChildrenStatisticsComputer<E>),
    Parent(ParentStatisticsComputer<E>),
    Siblings(SiblingsStatisticsComputer<E>),
    SiblingsTraveling(SiblingsStatisticsTravelingComputer<E>),
    NodeRelative(NodeRelativeStatisticsComputer<E>),
}

impl<E> StatisticsComputer<E> {
    /// Run the traversal and convert the accumulated tree into the
    /// immutable result form.
    pub fn create_statistics(
        &self,
        execution: &QueryExecution,
    ) -> Result<Vec<LevelInfo<E>>, HierarchyError> {
        let accumulators = match self {
            Self::Root(computer) => computer.compute(execution)?,
            Self::Children(computer) => computer.compute(execution)?,
            Self::Parent(computer) => computer.compute(execution)?,
            Self::Siblings(computer) => computer.compute(execution)?,
            Self::SiblingsTraveling(computer) => computer.compute(execution)?,
            Self::NodeRelative(computer) => computer.compute(execution)?,
        };

        Ok(self.base().finalize(accumulators))
    }

    pub(crate) const fn trace_kind(&self) -> TraceComputerKind {
        match self {
            Self::Root(_) => TraceComputerKind::Root,
            Self::Children(_) => TraceComputerKind::Children,
            Self::Parent(_) => TraceComputerKind::Parent,
            Self::Siblings(_) => TraceComputerKind::Siblings,
            Self::SiblingsTraveling(_) => TraceComputerKind::SiblingsTraveling,
            Self::NodeRelative(_) => TraceComputerKind::NodeRelative,
        }
    }

    const fn base(&self) -> &ComputerBase<E> {
        match self {
            Self::Root(computer) => &computer.base,
            Self::Children(computer) => &computer.base,
            Self::Parent(computer) => &computer.base,
            Self::Siblings(computer) => &computer.base,
            Self::SiblingsTraveling(computer) => &computer.base,
            Self::NodeRelative(computer) => &computer.base,
        }
    }
}

///
/// ComputerBase
///
/// Settings shared by every computer: the scope context it was registered
/// under, the traversal/filtering predicates, and the requested
/// aggregates.
///

pub struct ComputerBase<E> {
    context: Rc<ProducerContext<E>>,
    scope: TraversalPredicate,
    filter: Option<FilteringPredicate>,
    statistics_base: StatisticsBase,
    statistics_types: StatisticsTypeSet,
}

impl<E> ComputerBase<E> {
    pub fn new(
        context: Rc<ProducerContext<E>>,
        statistics_base: StatisticsBase,
        statistics_types: StatisticsTypeSet,
    ) -> Self {
        Self {
            context,
            scope: TraversalPredicate::never_stop(),
            filter: None,
            statistics_base,
            statistics_types,
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: TraversalPredicate) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilteringPredicate) -> Self {
        self.filter = Some(filter);
        self
    }

    pub(crate) fn context(&self) -> &ProducerContext<E> {
        &self.context
    }

    pub(crate) const fn scope(&self) -> &TraversalPredicate {
        &self.scope
    }

    /// Queried totals are materialized when requested or when pruning
    /// depends on them.
    pub(crate) fn need_queried(&self) -> bool {
        self.statistics_types
            .contains(StatisticsType::QueriedEntityCount)
            || self.context.remove_empty_results()
    }

    /// Merge the basis-dependent producer predicate, the computer's own
    /// predicate, and the query-wide visibility predicate via AND; when
    /// only one is present it is used as-is. Hierarchy-filter subtree
    /// exclusions join the same chain.
    pub(crate) fn resolved_filter(&self, execution: &QueryExecution) -> FilteringPredicate {
        let mut merged: Option<FilteringPredicate> = None;

        if let Some(producer) = self.context.filter_producer() {
            merged = and_merge(merged, producer(self.statistics_base));
        }
        if let Some(own) = &self.filter {
            merged = and_merge(merged, own.clone());
        }
        if let Some(visibility) = execution.entity_visibility() {
            merged = and_merge(merged, visibility.clone());
        }
        if let Some(excluded) = self
            .context
            .hierarchy_filter()
            .and_then(|filter| filter.excluded_subtrees())
        {
            merged = and_merge(merged, FilteringPredicate::excluding_set(excluded.clone()));
        }

        merged.unwrap_or_else(FilteringPredicate::accept_all)
    }

    /// The node's directly queried entities restricted to the query's
    /// filter result.
    pub(crate) fn queried_formula(&self, execution: &QueryExecution, node: PrimaryKey) -> Formula {
        self.context
            .queried_entities(node, self.statistics_base)
            .intersect(execution.filtered_entities())
    }

    /// Resolve a filter that must match at most one node. Zero matches is
    /// an empty result; two or more is a defect of the calling query plan.
    pub(crate) fn resolve_unique_node(
        selector: &Formula,
        role: &str,
    ) -> Result<Option<PrimaryKey>, InternalError> {
        let nodes = selector.compute();

        match nodes.cardinality() {
            0 => Ok(None),
            1 => Ok(nodes.first()),
            found => Err(InternalError::computer_invariant(format!(
                "{role} filter must resolve to exactly one node, found {found}"
            ))),
        }
    }

    /// Shared traversal entry: resolve predicates, run the visitor, and
    /// collect root accumulators.
    pub(crate) fn traverse(
        &self,
        execution: &QueryExecution,
        entry: TraversalEntry,
        extra_filter: Option<FilteringPredicate>,
        distance_compensation: i32,
    ) -> Vec<Accumulator<E>> {
        let mut filter = self.resolved_filter(execution);
        if let Some(extra) = extra_filter {
            filter = filter.and(&extra);
        }
        filter.initialize();

        let queried = |node: PrimaryKey| self.queried_formula(execution, node);
        let mut visitor = StatisticsVisitor::new(
            self.context.entity_fetcher(),
            &queried,
            &self.scope,
            &filter,
            self.need_queried(),
            distance_compensation,
        );
        let index_filter = |node: PrimaryKey| filter.test(node);
        let index = self.context.index();

        match entry {
            TraversalEntry::WholeTree => index.traverse_hierarchy(&mut visitor, &index_filter),
            TraversalEntry::RootSet { exclude } => {
                let roots = self.context.root_nodes().compute();
                for root in roots.iter() {
                    if Some(root) == exclude {
                        continue;
                    }
                    index.traverse_hierarchy_from_node(&mut visitor, root, true, &index_filter);
                }
            }
            TraversalEntry::Subtree { node, include_self } => {
                index.traverse_hierarchy_from_node(&mut visitor, node, include_self, &index_filter);
            }
        }

        visitor.into_accumulators()
    }

    fn finalize(&self, accumulators: Vec<Accumulator<E>>) -> Vec<LevelInfo<E>> {
        let remove_empty = self.context.remove_empty_results();

        accumulators
            .into_iter()
            .filter_map(|accumulator| accumulator.to_level_info(self.statistics_types, remove_empty))
            .collect()
    }
}

///
/// TraversalEntry
///

pub(crate) enum TraversalEntry {
    WholeTree,
    RootSet { exclude: Option<PrimaryKey> },
    Subtree { node: PrimaryKey, include_self: bool },
}

fn and_merge(
    merged: Option<FilteringPredicate>,
    next: FilteringPredicate,
) -> Option<FilteringPredicate> {
    Some(match merged {
        Some(current) => current.and(&next),
        None => next,
    })
}

impl<E> From<RootStatisticsComputer<E>> for StatisticsComputer<E> {
    fn from(computer: RootStatisticsComputer<E>) -> Self {
        Self::Root(computer)
    }
}

impl<E> From<ChildrenStatisticsComputer<E>> for StatisticsComputer<E> {
    fn from(computer: ChildrenStatisticsComputer<E>) -> Self {
        Self::Children(computer)
    }
}

impl<E> From<ParentStatisticsComputer<E>> for StatisticsComputer<E> {
    fn from(computer: ParentStatisticsComputer<E>) -> Self {
        Self::Parent(computer)
    }
}

impl<E> From<SiblingsStatisticsComputer<E>> for StatisticsComputer<E> {
    fn from(computer: SiblingsStatisticsComputer<E>) -> Self {
        Self::Siblings(computer)
    }
}

impl<E> From<SiblingsStatisticsTravelingComputer<E>> for StatisticsComputer<E> {
    fn from(computer: SiblingsStatisticsTravelingComputer<E>) -> Self {
        Self::SiblingsTraveling(computer)
    }
}

impl<E> From<NodeRelativeStatisticsComputer<E>> for StatisticsComputer<E> {
    fn from(computer: NodeRelativeStatisticsComputer<E>) -> Self {
        Self::NodeRelative(computer)
    }
}
