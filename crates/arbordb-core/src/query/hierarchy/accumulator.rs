use crate::query::{
    formula::Formula,
    hierarchy::context::{StatisticsType, StatisticsTypeSet},
};
use arbordb_primitives::PrimaryKey;
use serde::Serialize;

///
/// LevelInfo
///
/// One emitted node of hierarchy statistics. Count fields are populated
/// only when the corresponding `StatisticsType` was requested. Children
/// follow the externally supplied global order when a sorter is
/// configured, ascending primary key otherwise.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LevelInfo<E> {
    pub primary_key: PrimaryKey,
    pub entity: E,
    pub children_count: Option<u32>,
    pub queried_entity_count: Option<u32>,
    pub children: Vec<LevelInfo<E>>,
}

///
/// Accumulator
///
/// Mutable per-node record built during one traversal pass. Owns its child
/// accumulators exclusively (tree-shaped, no back-references) and the
/// lazily computed formula of directly queried entities; consumed by
/// conversion to `LevelInfo`.
///

#[derive(Debug)]
pub struct Accumulator<E> {
    primary_key: PrimaryKey,
    entity: E,
    directly_queried: Formula,
    children_count: u32,
    omitted_queried: u32,
    preserved: bool,
    children: Vec<Accumulator<E>>,
}

impl<E> Accumulator<E> {
    pub fn new(primary_key: PrimaryKey, entity: E, directly_queried: Formula) -> Self {
        Self {
            primary_key,
            entity,
            directly_queried,
            children_count: 0,
            omitted_queried: 0,
            preserved: false,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub const fn primary_key(&self) -> PrimaryKey {
        self.primary_key
    }

    /// Record one admitted direct child, whether or not it ends up emitted.
    pub const fn register_admitted_child(&mut self) {
        self.children_count += 1;
    }

    pub const fn set_children_count(&mut self, count: u32) {
        self.children_count = count;
    }

    /// Attach a finished child accumulator.
    pub fn register_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Fold in queried-entity counts from an admitted subtree that the
    /// traversal scope keeps out of the output.
    pub const fn add_omitted_queried(&mut self, count: u32) {
        self.omitted_queried += count;
    }

    /// Exempt this node from empty-result pruning (chain nodes of a
    /// parents traversal).
    pub const fn mark_preserved(&mut self) {
        self.preserved = true;
    }

    pub fn sort_children_by_primary_key(&mut self) {
        self.children.sort_by_key(Self::primary_key);
    }

    /// Queried entities in this node's admitted subtree: the node's own
    /// directly queried entities plus everything below, including counts
    /// folded in from out-of-scope subtrees.
    #[must_use]
    pub fn queried_total(&self) -> u32 {
        self.directly_queried.cardinality()
            + self.omitted_queried
            + self.children.iter().map(Self::queried_total).sum::<u32>()
    }

    /// Convert to the immutable result node, nulling out fields that were
    /// not requested. Returns `None` when the node carries no counts and
    /// `remove_empty` pruning applies.
    pub fn to_level_info(
        self,
        statistics: StatisticsTypeSet,
        remove_empty: bool,
    ) -> Option<LevelInfo<E>> {
        let want_children = statistics.contains(StatisticsType::ChildrenCount);
        let want_queried = statistics.contains(StatisticsType::QueriedEntityCount);

        let queried_total = (want_queried || remove_empty).then(|| self.queried_total());

        if remove_empty
            && !self.preserved
            && self.children_count == 0
            && queried_total.unwrap_or(0) == 0
        {
            return None;
        }

        let children_count = self.children_count;
        let children = self
            .children
            .into_iter()
            .filter_map(|child| child.to_level_info(statistics, remove_empty))
            .collect();

        Some(LevelInfo {
            primary_key: self.primary_key,
            entity: self.entity,
            children_count: want_children.then_some(children_count),
            queried_entity_count: if want_queried { queried_total } else { None },
            children,
        })
    }
}
