//! Hierarchy-index boundary.
//!
//! The index owns the tree structure and performs the raw walk; this
//! subsystem only supplies the visitor and a node-level filter. Traversal is
//! depth-first pre-order, children in ascending primary-key order.

use arbordb_primitives::PrimaryKey;

///
/// HierarchyNodeRef
///
/// One visited node. `level` is absolute depth in the tree (roots are 1).
/// `distance` is relative depth from the traversal origin: the origin node
/// is 0 whether or not it is itself visited, so with `include_self = false`
/// the origin's children still report distance 1.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HierarchyNodeRef {
    pub primary_key: PrimaryKey,
    pub level: u32,
    pub distance: u32,
}

///
/// NodeFilter
///
/// Index-level visibility filter. A node failing the filter is not yielded
/// and its subtree is not descended into.
///

pub type NodeFilter<'a> = &'a dyn Fn(PrimaryKey) -> bool;

///
/// HierarchyVisitor
///
/// Callback contract the index drives node-by-node. The visitor decides
/// whether to descend by invoking `traverser` with itself; not invoking it
/// skips the node's subtree.
///

pub trait HierarchyVisitor {
    fn visit(
        &mut self,
        node: HierarchyNodeRef,
        traverser: &mut dyn FnMut(&mut dyn HierarchyVisitor),
    );
}

///
/// HierarchyIndex
///
/// External collaborator owning tree structure and node-set algebra. All
/// methods are read-only for the duration of one query execution.
///

pub trait HierarchyIndex {
    /// Walk the whole tree from its root nodes.
    fn traverse_hierarchy(&self, visitor: &mut dyn HierarchyVisitor, filter: NodeFilter);

    /// Walk the subtree anchored at `node`. With `include_self` the anchor
    /// itself is visited at distance 0; otherwise the walk starts at its
    /// children, which report distance 1 either way.
    fn traverse_hierarchy_from_node(
        &self,
        visitor: &mut dyn HierarchyVisitor,
        node: PrimaryKey,
        include_self: bool,
        filter: NodeFilter,
    );

    /// Walk from `node` upward to the tree root. The starting node is
    /// visited first at distance 0, each ancestor one step further. The
    /// visitor's `traverser` continues the upward walk.
    fn traverse_hierarchy_to_root(&self, visitor: &mut dyn HierarchyVisitor, node: PrimaryKey);

    /// Parent of `node`, or `None` for root nodes and unknown keys.
    fn parent_node(&self, node: PrimaryKey) -> Option<PrimaryKey>;
}
