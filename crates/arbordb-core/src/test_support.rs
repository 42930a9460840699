//! In-memory hierarchy fixtures for tests: a small tree index driving the
//! visitor contract the way the production index does, plus context
//! builders shared across the hierarchy test modules.

use crate::{
    index::{HierarchyIndex, HierarchyNodeRef, HierarchyVisitor, NodeFilter},
    query::{
        formula::Formula,
        hierarchy::{context::ProducerContext, context::QueryExecution, sorter::NestedContextSorter},
    },
};
use arbordb_primitives::{IdSet, PrimaryKey};
use std::{
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

///
/// TreeIndex
///
/// Depth-first pre-order walker over an explicit parent/child map.
/// Children are visited in ascending primary-key order; a node failing
/// the filter is skipped together with its subtree.
///

#[derive(Debug, Default)]
pub struct TreeIndex {
    children: BTreeMap<PrimaryKey, Vec<PrimaryKey>>,
    parents: BTreeMap<PrimaryKey, PrimaryKey>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_children(mut self, parent: u32, children: &[u32]) -> Self {
        let parent = PrimaryKey(parent);
        let entry = self.children.entry(parent).or_default();

        for &child in children {
            let child = PrimaryKey(child);
            entry.push(child);
            self.parents.insert(child, parent);
        }
        entry.sort_unstable();

        self
    }

    pub fn roots(&self) -> Vec<PrimaryKey> {
        let known: BTreeSet<PrimaryKey> = self
            .children
            .keys()
            .copied()
            .chain(self.children.values().flatten().copied())
            .collect();

        known
            .into_iter()
            .filter(|key| !self.parents.contains_key(key))
            .collect()
    }

    fn level(&self, node: PrimaryKey) -> u32 {
        let mut level = 1;
        let mut current = node;
        while let Some(&parent) = self.parents.get(&current) {
            level += 1;
            current = parent;
        }
        level
    }

    fn children_of(&self, node: PrimaryKey) -> &[PrimaryKey] {
        self.children.get(&node).map_or(&[], Vec::as_slice)
    }

    fn descend(
        &self,
        visitor: &mut dyn HierarchyVisitor,
        key: PrimaryKey,
        level: u32,
        distance: u32,
        filter: NodeFilter,
    ) {
        if !filter(key) {
            return;
        }

        let node = HierarchyNodeRef {
            primary_key: key,
            level,
            distance,
        };
        visitor.visit(node, &mut |inner: &mut dyn HierarchyVisitor| {
            for &child in self.children_of(key) {
                self.descend(inner, child, level + 1, distance + 1, filter);
            }
        });
    }

    fn ascend(&self, visitor: &mut dyn HierarchyVisitor, key: PrimaryKey, distance: u32) {
        let node = HierarchyNodeRef {
            primary_key: key,
            level: self.level(key),
            distance,
        };
        visitor.visit(node, &mut |inner: &mut dyn HierarchyVisitor| {
            if let Some(&parent) = self.parents.get(&key) {
                self.ascend(inner, parent, distance + 1);
            }
        });
    }
}

impl HierarchyIndex for TreeIndex {
    fn traverse_hierarchy(&self, visitor: &mut dyn HierarchyVisitor, filter: NodeFilter) {
        for root in self.roots() {
            self.descend(visitor, root, self.level(root), 0, filter);
        }
    }

    fn traverse_hierarchy_from_node(
        &self,
        visitor: &mut dyn HierarchyVisitor,
        node: PrimaryKey,
        include_self: bool,
        filter: NodeFilter,
    ) {
        let level = self.level(node);
        if include_self {
            self.descend(visitor, node, level, 0, filter);
        } else {
            for &child in self.children_of(node) {
                self.descend(visitor, child, level + 1, 1, filter);
            }
        }
    }

    fn traverse_hierarchy_to_root(&self, visitor: &mut dyn HierarchyVisitor, node: PrimaryKey) {
        self.ascend(visitor, node, 0);
    }

    fn parent_node(&self, node: PrimaryKey) -> Option<PrimaryKey> {
        self.parents.get(&node).copied()
    }
}

///
/// RankingSorter
///
/// Ranks by a fixed preference order, restricted to the candidate set.
///

pub struct RankingSorter {
    order: Vec<PrimaryKey>,
}

impl RankingSorter {
    pub fn new(order: &[u32]) -> Self {
        Self {
            order: order.iter().copied().map(PrimaryKey).collect(),
        }
    }
}

impl NestedContextSorter for RankingSorter {
    fn sort(&self, candidates: &IdSet) -> Vec<PrimaryKey> {
        self.order
            .iter()
            .copied()
            .filter(|key| candidates.contains(*key))
            .collect()
    }
}

/// Context over `index` where nodes fetch as their own primary key and
/// each node's directly queried entities come from the given table.
pub fn context_for(
    index: &Rc<TreeIndex>,
    queried: &[(u32, &[u32])],
) -> ProducerContext<PrimaryKey> {
    let table: Rc<BTreeMap<PrimaryKey, IdSet>> = Rc::new(
        queried
            .iter()
            .map(|(node, entities)| {
                (PrimaryKey(*node), entities.iter().copied().collect::<IdSet>())
            })
            .collect(),
    );

    let roots_index = Rc::clone(index);
    let root_nodes = Formula::deferred(move || roots_index.roots().into_iter().collect());

    ProducerContext::new(
        "category",
        Rc::clone(index) as Rc<dyn HierarchyIndex>,
        root_nodes,
        Rc::new(|node| Some(node)),
        Rc::new(move |node, _| {
            let table = Rc::clone(&table);
            Formula::deferred(move || table.get(&node).cloned().unwrap_or_default())
        }),
    )
}

/// Execution whose user filter accepted exactly `filtered`.
pub fn execution(filtered: &[u32]) -> QueryExecution {
    QueryExecution::new(Formula::constant(filtered.iter().copied().collect()))
}
