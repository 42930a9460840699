use crate::{
    index::HierarchyIndex,
    query::{formula::Formula, hierarchy::predicate::FilteringPredicate, hierarchy::sorter::NestedContextSorter},
};
use arbordb_primitives::PrimaryKey;
use std::rc::Rc;

///
/// StatisticsBase
///
/// Selects which filter the queried-entity counts reflect: the hierarchy
/// filter alone, or the caller's complete user filter.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatisticsBase {
    CompleteFilter,
    WithoutUserFilter,
}

///
/// StatisticsType
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatisticsType {
    ChildrenCount,
    QueriedEntityCount,
}

///
/// StatisticsTypeSet
///
/// Copyable set of requested aggregate kinds. Controls which `LevelInfo`
/// fields are populated.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatisticsTypeSet(u8);

impl StatisticsTypeSet {
    pub const EMPTY: Self = Self(0);

    const fn bit(statistics_type: StatisticsType) -> u8 {
        match statistics_type {
            StatisticsType::ChildrenCount => 0b01,
            StatisticsType::QueriedEntityCount => 0b10,
        }
    }

    #[must_use]
    pub const fn of(statistics_type: StatisticsType) -> Self {
        Self(Self::bit(statistics_type))
    }

    #[must_use]
    pub const fn with(self, statistics_type: StatisticsType) -> Self {
        Self(self.0 | Self::bit(statistics_type))
    }

    #[must_use]
    pub const fn contains(self, statistics_type: StatisticsType) -> bool {
        self.0 & Self::bit(statistics_type) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

///
/// HierarchyFilter
///
/// The query's hierarchy-placement constraint. `Within` anchors on exactly
/// one pivot node selected by `node`; `WithinRoot` anchors on the root
/// node set. Either may exclude whole subtrees.
///

#[derive(Clone, Debug)]
pub enum HierarchyFilter {
    WithinRoot {
        excluded_subtrees: Option<Formula>,
    },
    Within {
        node: Formula,
        excluded_subtrees: Option<Formula>,
    },
}

impl HierarchyFilter {
    #[must_use]
    pub const fn within(node: Formula) -> Self {
        Self::Within {
            node,
            excluded_subtrees: None,
        }
    }

    #[must_use]
    pub const fn within_root() -> Self {
        Self::WithinRoot {
            excluded_subtrees: None,
        }
    }

    /// Exclude whole subtrees anchored at the given node set.
    #[must_use]
    pub fn with_excluded_subtrees(mut self, excluded: Formula) -> Self {
        match &mut self {
            Self::WithinRoot { excluded_subtrees } | Self::Within {
                excluded_subtrees, ..
            } => *excluded_subtrees = Some(excluded),
        }
        self
    }

    #[must_use]
    pub const fn excluded_subtrees(&self) -> Option<&Formula> {
        match self {
            Self::WithinRoot { excluded_subtrees } | Self::Within {
                excluded_subtrees, ..
            } => excluded_subtrees.as_ref(),
        }
    }
}

/// Converts an accepted node id into the caller's requested representation.
pub type EntityFetcher<E> = Rc<dyn Fn(PrimaryKey) -> Option<E>>;

/// Produces the set of directly queried entities for a node under a basis.
pub type QueriedEntitiesProducer = Rc<dyn Fn(PrimaryKey, StatisticsBase) -> Formula>;

/// Produces the basis-dependent visibility predicate, when one applies.
pub type FilteringPredicateProducer = Rc<dyn Fn(StatisticsBase) -> FilteringPredicate>;

///
/// ProducerContext
///
/// Immutable snapshot of everything a computer needs for one top-level
/// statistics request. Created exactly once per hierarchyOfSelf /
/// hierarchyOfReference scope and dropped when the scope closes.
///

pub struct ProducerContext<E> {
    entity_type: String,
    reference_name: Option<String>,
    hierarchy_filter: Option<HierarchyFilter>,
    root_nodes: Formula,
    index: Rc<dyn HierarchyIndex>,
    entity_fetcher: EntityFetcher<E>,
    queried_entities: QueriedEntitiesProducer,
    filter_producer: Option<FilteringPredicateProducer>,
    sorter: Option<Rc<dyn NestedContextSorter>>,
    remove_empty_results: bool,
}

impl<E> ProducerContext<E> {
    pub fn new(
        entity_type: impl Into<String>,
        index: Rc<dyn HierarchyIndex>,
        root_nodes: Formula,
        entity_fetcher: EntityFetcher<E>,
        queried_entities: QueriedEntitiesProducer,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            reference_name: None,
            hierarchy_filter: None,
            root_nodes,
            index,
            entity_fetcher,
            queried_entities,
            filter_producer: None,
            sorter: None,
            remove_empty_results: false,
        }
    }

    #[must_use]
    pub fn for_reference(mut self, reference_name: impl Into<String>) -> Self {
        self.reference_name = Some(reference_name.into());
        self
    }

    #[must_use]
    pub fn with_hierarchy_filter(mut self, filter: HierarchyFilter) -> Self {
        self.hierarchy_filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_filter_producer(mut self, producer: FilteringPredicateProducer) -> Self {
        self.filter_producer = Some(producer);
        self
    }

    #[must_use]
    pub fn with_sorter(mut self, sorter: Rc<dyn NestedContextSorter>) -> Self {
        self.sorter = Some(sorter);
        self
    }

    #[must_use]
    pub const fn with_remove_empty_results(mut self, remove: bool) -> Self {
        self.remove_empty_results = remove;
        self
    }

    //
    // Accessors
    //

    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    #[must_use]
    pub fn reference_name(&self) -> Option<&str> {
        self.reference_name.as_deref()
    }

    #[must_use]
    pub const fn hierarchy_filter(&self) -> Option<&HierarchyFilter> {
        self.hierarchy_filter.as_ref()
    }

    #[must_use]
    pub const fn root_nodes(&self) -> &Formula {
        &self.root_nodes
    }

    #[must_use]
    pub fn index(&self) -> &dyn HierarchyIndex {
        self.index.as_ref()
    }

    #[must_use]
    pub fn entity_fetcher(&self) -> &dyn Fn(PrimaryKey) -> Option<E> {
        self.entity_fetcher.as_ref()
    }

    #[must_use]
    pub fn queried_entities(&self, node: PrimaryKey, base: StatisticsBase) -> Formula {
        (self.queried_entities)(node, base)
    }

    #[must_use]
    pub const fn filter_producer(&self) -> Option<&FilteringPredicateProducer> {
        self.filter_producer.as_ref()
    }

    #[must_use]
    pub fn sorter(&self) -> Option<Rc<dyn NestedContextSorter>> {
        self.sorter.clone()
    }

    #[must_use]
    pub const fn remove_empty_results(&self) -> bool {
        self.remove_empty_results
    }

    /// Render the constraint this context was created for, for error
    /// messages.
    #[must_use]
    pub fn constraint_name(&self) -> String {
        match &self.reference_name {
            None => "hierarchyOfSelf".to_string(),
            Some(reference) => format!("hierarchyOfReference(`{reference}`)"),
        }
    }
}

///
/// QueryExecution
///
/// Per-execution inputs shared by every computer of one query: the user
/// filter's result set and the query-wide visibility predicate (e.g. the
/// locale predicate).
///

pub struct QueryExecution {
    filtered_entities: Formula,
    entity_visibility: Option<FilteringPredicate>,
}

impl QueryExecution {
    #[must_use]
    pub const fn new(filtered_entities: Formula) -> Self {
        Self {
            filtered_entities,
            entity_visibility: None,
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, predicate: FilteringPredicate) -> Self {
        self.entity_visibility = Some(predicate);
        self
    }

    #[must_use]
    pub const fn filtered_entities(&self) -> &Formula {
        &self.filtered_entities
    }

    #[must_use]
    pub const fn entity_visibility(&self) -> Option<&FilteringPredicate> {
        self.entity_visibility.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_set_bit_operations() {
        let set = StatisticsTypeSet::of(StatisticsType::ChildrenCount);
        assert!(set.contains(StatisticsType::ChildrenCount));
        assert!(!set.contains(StatisticsType::QueriedEntityCount));

        let both = set.with(StatisticsType::QueriedEntityCount);
        assert!(both.contains(StatisticsType::QueriedEntityCount));
        assert!(StatisticsTypeSet::EMPTY.is_empty());
        assert!(!both.is_empty());
    }
}
