//! The scene graph: an ordered tree of primitives keyed by stable uids.
//!
//! Containment lives in a stable directed graph so uids survive arbitrary
//! modify/delete sequences; sibling order is tracked explicitly per parent
//! because paint order is defined as depth-first, children in insertion
//! order. A side index maps element ids to uids for O(1) addressing.
//!
//! Graphs are plain values. Scenes build or rebuild one, hand it to
//! `put_graph`, and the registry swaps whole compiled snapshots — nothing
//! downstream ever observes a graph mid-mutation.

use crate::error::GraphError;
use crate::id::Atom;
use crate::primitive::{Primitive, PrimitiveKind};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use std::collections::HashMap;

/// Per-graph primitive identifier. The root is always uid 0.
pub type Uid = u32;

/// Uid of every graph's root group.
pub const ROOT_UID: Uid = 0;

fn ix(uid: Uid) -> NodeIndex {
    NodeIndex::new(uid as usize)
}

fn uid_of_ix(idx: NodeIndex) -> Uid {
    idx.index() as Uid
}

/// An immutable-by-convention tree of primitives.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: StableDiGraph<Primitive, ()>,
    /// Child uids per container, in insertion (paint) order.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
    /// Element id → uid for primitives that declare an id.
    id_index: HashMap<Atom, NodeIndex>,
}

impl Graph {
    /// Create a graph containing only the root group (uid 0).
    pub fn new() -> Self {
        let mut nodes = StableDiGraph::new();
        let root = nodes.add_node(Primitive::group());
        let mut child_order = HashMap::new();
        child_order.insert(root, Vec::new());
        Self {
            nodes,
            child_order,
            id_index: HashMap::new(),
        }
    }

    /// Build a graph declaratively; the closure works relative to the root.
    pub fn build(f: impl FnOnce(&mut GraphBuilder<'_>)) -> Self {
        let mut graph = Self::new();
        let mut builder = GraphBuilder {
            graph: &mut graph,
            parent: ix(ROOT_UID),
        };
        f(&mut builder);
        graph
    }

    /// Number of primitives, root included.
    pub fn len(&self) -> usize {
        self.nodes.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.node_count() <= 1
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.nodes.contains_node(ix(uid))
    }

    pub fn get(&self, uid: Uid) -> Option<&Primitive> {
        self.nodes.node_weight(ix(uid))
    }

    /// Look up a primitive by its element id.
    pub fn get_by_id(&self, id: Atom) -> Option<&Primitive> {
        self.id_index.get(&id).and_then(|idx| self.nodes.node_weight(*idx))
    }

    /// Uid for an element id, when one is declared.
    pub fn uid_of(&self, id: Atom) -> Option<Uid> {
        self.id_index.get(&id).map(|idx| uid_of_ix(*idx))
    }

    /// Child uids of a container in insertion order.
    pub fn children(&self, uid: Uid) -> Vec<Uid> {
        self.child_order
            .get(&ix(uid))
            .map(|c| c.iter().map(|i| uid_of_ix(*i)).collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, uid: Uid) -> Option<Uid> {
        self.nodes
            .neighbors_directed(ix(uid), Direction::Incoming)
            .next()
            .map(uid_of_ix)
    }

    /// Insert a primitive under `parent`, assigning the next free uid and
    /// appending it to the parent's child list.
    pub fn insert(&mut self, parent: Uid, primitive: Primitive) -> Result<Uid, GraphError> {
        let parent_ix = ix(parent);
        let parent_prim = self
            .nodes
            .node_weight(parent_ix)
            .ok_or(GraphError::MissingUid(parent))?;
        if !parent_prim.kind.is_container() {
            return Err(GraphError::NotAContainer(parent));
        }
        Ok(uid_of_ix(self.insert_unchecked(parent_ix, primitive)))
    }

    fn insert_unchecked(&mut self, parent: NodeIndex, primitive: Primitive) -> NodeIndex {
        let id = primitive.id;
        let is_container = primitive.kind.is_container();
        let idx = self.nodes.add_node(primitive);
        self.nodes.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        if is_container {
            self.child_order.entry(idx).or_default();
        }
        if let Some(id) = id {
            self.id_index.insert(id, idx);
        }
        idx
    }

    /// Replace a primitive with a new value. The uid is stable across
    /// modification and the child list is untouched. Nothing is committed
    /// when the replacement is invalid (root losing its group kind, a
    /// populated container becoming a leaf).
    pub fn modify(
        &mut self,
        uid: Uid,
        f: impl FnOnce(&mut Primitive),
    ) -> Result<(), GraphError> {
        let idx = ix(uid);
        let has_children = self
            .child_order
            .get(&idx)
            .is_some_and(|c| !c.is_empty());
        let prim = self
            .nodes
            .node_weight(idx)
            .ok_or(GraphError::MissingUid(uid))?;

        let old_id = prim.id;
        let mut updated = prim.clone();
        f(&mut updated);

        if uid == ROOT_UID && !matches!(updated.kind, PrimitiveKind::Group) {
            return Err(GraphError::RootImmutable);
        }
        if has_children && !updated.kind.is_container() {
            return Err(GraphError::NotAContainer(uid));
        }

        let new_id = updated.id;
        if let Some(slot) = self.nodes.node_weight_mut(idx) {
            *slot = updated;
        }
        if old_id != new_id {
            if let Some(old) = old_id {
                self.id_index.remove(&old);
            }
            if let Some(new) = new_id {
                self.id_index.insert(new, idx);
            }
        }
        Ok(())
    }

    /// Modify by element id; O(1) through the side index.
    pub fn modify_by_id(
        &mut self,
        id: Atom,
        f: impl FnOnce(&mut Primitive),
    ) -> Result<(), GraphError> {
        let uid = self.uid_of(id).ok_or(GraphError::MissingId(id))?;
        self.modify(uid, f)
    }

    /// Delete a primitive and its entire subtree. The root cannot be
    /// deleted.
    pub fn delete(&mut self, uid: Uid) -> Result<(), GraphError> {
        if uid == ROOT_UID {
            return Err(GraphError::RootImmutable);
        }
        let idx = ix(uid);
        if !self.nodes.contains_node(idx) {
            return Err(GraphError::MissingUid(uid));
        }
        if let Some(parent) = self
            .nodes
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            && let Some(siblings) = self.child_order.get_mut(&parent)
        {
            siblings.retain(|i| *i != idx);
        }
        self.delete_subtree(idx);
        Ok(())
    }

    fn delete_subtree(&mut self, idx: NodeIndex) {
        let children = self.child_order.remove(&idx).unwrap_or_default();
        for child in children {
            self.delete_subtree(child);
        }
        if let Some(prim) = self.nodes.remove_node(idx)
            && let Some(id) = prim.id
        {
            self.id_index.remove(&id);
        }
    }

    /// Every uid in the graph, root first, then depth-first paint order.
    pub fn uids(&self) -> Vec<Uid> {
        let mut out = Vec::with_capacity(self.nodes.node_count());
        self.collect_uids(ix(ROOT_UID), &mut out);
        out
    }

    fn collect_uids(&self, idx: NodeIndex, out: &mut Vec<Uid>) {
        out.push(uid_of_ix(idx));
        if let Some(children) = self.child_order.get(&idx) {
            for child in children.clone() {
                self.collect_uids(child, out);
            }
        }
    }

    /// Corrupt the child table directly, bypassing every structural check.
    /// Lets compiler tests exercise the cycle and missing-child guards that
    /// the public mutation API makes unreachable.
    #[cfg(test)]
    pub(crate) fn force_child_link(&mut self, parent: Uid, child: Uid) {
        self.child_order.entry(ix(parent)).or_default().push(ix(child));
    }
}

/// Declarative construction helper handed out by [`Graph::build`].
pub struct GraphBuilder<'a> {
    graph: &'a mut Graph,
    parent: NodeIndex,
}

impl GraphBuilder<'_> {
    /// Insert a primitive under the current parent.
    pub fn push(&mut self, primitive: Primitive) -> Uid {
        uid_of_ix(self.graph.insert_unchecked(self.parent, primitive))
    }

    /// Insert a plain group and populate it from the closure.
    pub fn group(&mut self, f: impl FnOnce(&mut GraphBuilder<'_>)) -> Uid {
        self.container(Primitive::group(), f)
    }

    /// Insert a container primitive (group or component ref, possibly styled
    /// or transformed) and populate it from the closure.
    pub fn container(
        &mut self,
        primitive: Primitive,
        f: impl FnOnce(&mut GraphBuilder<'_>),
    ) -> Uid {
        let idx = self.graph.insert_unchecked(self.parent, primitive);
        let mut inner = GraphBuilder {
            graph: self.graph,
            parent: idx,
        };
        f(&mut inner);
        uid_of_ix(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleSet;
    use crate::transform::Transform;

    #[test]
    fn root_is_uid_zero_and_a_group() {
        let g = Graph::new();
        assert_eq!(g.len(), 1);
        assert!(matches!(g.get(ROOT_UID).unwrap().kind, PrimitiveKind::Group));
    }

    #[test]
    fn insert_assigns_sequential_uids_in_paint_order() {
        let mut g = Graph::new();
        let a = g.insert(ROOT_UID, Primitive::rect(10.0, 10.0)).unwrap();
        let b = g.insert(ROOT_UID, Primitive::rect(20.0, 20.0)).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(g.children(ROOT_UID), vec![a, b]);
        assert_eq!(g.parent(a), Some(ROOT_UID));
    }

    #[test]
    fn insert_under_non_container_is_rejected() {
        let mut g = Graph::new();
        let a = g.insert(ROOT_UID, Primitive::rect(10.0, 10.0)).unwrap();
        let err = g.insert(a, Primitive::circle(5.0)).unwrap_err();
        assert_eq!(err, GraphError::NotAContainer(a));
        assert_eq!(
            g.insert(99, Primitive::circle(5.0)).unwrap_err(),
            GraphError::MissingUid(99)
        );
    }

    #[test]
    fn modify_keeps_uid_and_updates_id_index() {
        let mut g = Graph::new();
        let a = g
            .insert(ROOT_UID, Primitive::rect(10.0, 10.0).with_id("old"))
            .unwrap();
        assert_eq!(g.uid_of(Atom::new("old")), Some(a));

        g.modify(a, |p| {
            p.id = Some(Atom::new("new"));
            p.transform = Transform::translate(5.0, 5.0);
        })
        .unwrap();

        assert_eq!(g.uid_of(Atom::new("old")), None);
        assert_eq!(g.uid_of(Atom::new("new")), Some(a));
        assert_eq!(g.children(ROOT_UID), vec![a]);
    }

    #[test]
    fn modify_by_id_reaches_the_primitive() {
        let mut g = Graph::new();
        g.insert(ROOT_UID, Primitive::rect(10.0, 10.0).with_id("box"))
            .unwrap();
        g.modify_by_id(Atom::new("box"), |p| {
            p.styles = StyleSet::new().with_hidden(true);
        })
        .unwrap();
        assert_eq!(
            g.get_by_id(Atom::new("box")).unwrap().styles.hidden,
            Some(true)
        );
    }

    #[test]
    fn delete_removes_subtree_and_ids() {
        let mut g = Graph::build(|b| {
            b.group(|b| {
                b.push(Primitive::rect(1.0, 1.0).with_id("inner"));
            });
        });
        let group_uid = g.children(ROOT_UID)[0];
        g.delete(group_uid).unwrap();
        assert_eq!(g.len(), 1);
        assert_eq!(g.uid_of(Atom::new("inner")), None);
        assert!(g.children(ROOT_UID).is_empty());
        assert_eq!(g.delete(ROOT_UID).unwrap_err(), GraphError::RootImmutable);
    }

    #[test]
    fn build_dsl_produces_paint_order() {
        let g = Graph::build(|b| {
            b.push(Primitive::rect(1.0, 1.0).with_id("a"));
            b.group(|b| {
                b.push(Primitive::circle(2.0).with_id("b"));
            });
            b.push(Primitive::text("hello"));
        });
        let uids = g.uids();
        assert_eq!(uids, vec![0, 1, 2, 3, 4]);
        assert_eq!(g.uid_of(Atom::new("a")), Some(1));
        assert_eq!(g.uid_of(Atom::new("b")), Some(3));
    }
}
