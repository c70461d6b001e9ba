//! Concurrent registries: the script table, semantic table, and global id
//! index.
//!
//! Single-writer, many-reader. Only the coordinator mutates these maps, and
//! every value is an `Arc` swapped wholesale — a reader either sees the old
//! entry or the new one, never a torn one. Readers (drivers, queries, the
//! hit tester) take a read lock just long enough to clone the `Arc`.

use crate::scene::SceneId;
use slate_core::{Atom, GraphId, InputList, Script, SemanticSnapshot, Uid};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One registered script and its compiled by-products. Replaced wholesale
/// on every effective `put_graph`; never mutated in place.
#[derive(Debug)]
pub struct ScriptEntry {
    pub graph_id: GraphId,
    /// Canonical script bytes; the change-detection key and the zero-copy
    /// payload drivers consume.
    pub bytes: Vec<u8>,
    pub script: Script,
    pub input: InputList,
    pub owner: SceneId,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    scripts: RwLock<HashMap<GraphId, Arc<ScriptEntry>>>,
    semantics: RwLock<HashMap<GraphId, Arc<SemanticSnapshot>>>,
    id_index: RwLock<HashMap<Atom, (GraphId, Uid)>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Reader paths (any thread) ───────────────────────────────────────

    pub fn get(&self, graph_id: GraphId) -> Option<Arc<ScriptEntry>> {
        self.scripts.read().ok()?.get(&graph_id).cloned()
    }

    pub fn semantics(&self, graph_id: GraphId) -> Option<Arc<SemanticSnapshot>> {
        self.semantics.read().ok()?.get(&graph_id).cloned()
    }

    /// All semantic snapshots, ordered by graph id for deterministic
    /// query output.
    pub fn all_semantics(&self) -> Vec<(GraphId, Arc<SemanticSnapshot>)> {
        let mut out: Vec<_> = match self.semantics.read() {
            Ok(map) => map.iter().map(|(k, v)| (*k, v.clone())).collect(),
            Err(_) => Vec::new(),
        };
        out.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        out
    }

    pub fn lookup_id(&self, id: Atom) -> Option<(GraphId, Uid)> {
        self.id_index.read().ok()?.get(&id).copied()
    }

    pub fn ids(&self) -> Vec<GraphId> {
        let mut out: Vec<GraphId> = match self.scripts.read() {
            Ok(map) => map.keys().copied().collect(),
            Err(_) => Vec::new(),
        };
        out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        out
    }

    pub fn ids_owned_by(&self, owner: SceneId) -> Vec<GraphId> {
        let mut out: Vec<GraphId> = match self.scripts.read() {
            Ok(map) => map
                .values()
                .filter(|e| e.owner == owner)
                .map(|e| e.graph_id)
                .collect(),
            Err(_) => Vec::new(),
        };
        out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        out
    }

    // ─── Writer paths (coordinator only) ─────────────────────────────────

    /// Install or replace a script entry together with its semantic
    /// snapshot, keeping the id index consistent: ids previously published
    /// by this graph are dropped, ids from the new snapshot are added
    /// (most recent write wins on cross-graph collisions).
    ///
    /// All three write guards are held for the swap so the tables move to
    /// the new generation as a unit. Lock order is scripts → semantics →
    /// id_index everywhere.
    pub fn install(&self, entry: ScriptEntry, snapshot: Option<SemanticSnapshot>) {
        let graph_id = entry.graph_id;
        let (Ok(mut scripts), Ok(mut semantics), Ok(mut index)) = (
            self.scripts.write(),
            self.semantics.write(),
            self.id_index.write(),
        ) else {
            return;
        };
        scripts.insert(graph_id, Arc::new(entry));
        index.retain(|_, (gid, _)| *gid != graph_id);
        match snapshot {
            Some(snap) => {
                for e in snap.iter_paint_order() {
                    index.insert(e.id, (graph_id, e.uid));
                }
                semantics.insert(graph_id, Arc::new(snap));
            }
            None => {
                semantics.remove(&graph_id);
            }
        }
    }

    /// Remove a graph from every table. Returns the removed entry.
    pub fn remove(&self, graph_id: GraphId) -> Option<Arc<ScriptEntry>> {
        let (Ok(mut scripts), Ok(mut semantics), Ok(mut index)) = (
            self.scripts.write(),
            self.semantics.write(),
            self.id_index.write(),
        ) else {
            return None;
        };
        let removed = scripts.remove(&graph_id);
        if removed.is_some() {
            semantics.remove(&graph_id);
            index.retain(|_, (gid, _)| *gid != graph_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::{CompileOptions, Graph, Primitive, compile};

    fn entry_for(graph_id: &str, owner: &str, graph: &Graph) -> (ScriptEntry, SemanticSnapshot) {
        let out = compile(graph, &CompileOptions::with_semantics()).unwrap();
        (
            ScriptEntry {
                graph_id: GraphId::new(graph_id),
                bytes: out.bytes,
                script: out.script,
                input: out.input,
                owner: SceneId::new(owner),
            },
            out.semantics.unwrap(),
        )
    }

    #[test]
    fn install_and_lookup() {
        let reg = Registry::new();
        let g = Graph::build(|b| {
            b.push(Primitive::rect(10.0, 10.0).with_id("btn"));
        });
        let (entry, snap) = entry_for("main", "s1", &g);
        reg.install(entry, Some(snap));

        assert!(reg.get(GraphId::new("main")).is_some());
        assert_eq!(
            reg.lookup_id(Atom::new("btn")),
            Some((GraphId::new("main"), 1))
        );
        assert_eq!(reg.ids(), vec![GraphId::new("main")]);
    }

    #[test]
    fn reinstall_replaces_id_slice() {
        let reg = Registry::new();
        let g1 = Graph::build(|b| {
            b.push(Primitive::rect(10.0, 10.0).with_id("old"));
        });
        let g2 = Graph::build(|b| {
            b.push(Primitive::rect(10.0, 10.0).with_id("new"));
        });
        let (e1, s1) = entry_for("main", "s1", &g1);
        reg.install(e1, Some(s1));
        let (e2, s2) = entry_for("main", "s1", &g2);
        reg.install(e2, Some(s2));

        assert_eq!(reg.lookup_id(Atom::new("old")), None);
        assert!(reg.lookup_id(Atom::new("new")).is_some());
    }

    #[test]
    fn most_recent_write_wins_on_cross_graph_collision() {
        let reg = Registry::new();
        let g = Graph::build(|b| {
            b.push(Primitive::rect(10.0, 10.0).with_id("shared"));
        });
        let (e1, s1) = entry_for("a", "s1", &g);
        reg.install(e1, Some(s1));
        let (e2, s2) = entry_for("b", "s2", &g);
        reg.install(e2, Some(s2));

        assert_eq!(
            reg.lookup_id(Atom::new("shared")).map(|(g, _)| g),
            Some(GraphId::new("b"))
        );
    }

    #[test]
    fn remove_clears_every_table() {
        let reg = Registry::new();
        let g = Graph::build(|b| {
            b.push(Primitive::rect(10.0, 10.0).with_id("btn"));
        });
        let (entry, snap) = entry_for("main", "s1", &g);
        reg.install(entry, Some(snap));

        assert!(reg.remove(GraphId::new("main")).is_some());
        assert!(reg.get(GraphId::new("main")).is_none());
        assert!(reg.semantics(GraphId::new("main")).is_none());
        assert_eq!(reg.lookup_id(Atom::new("btn")), None);
        assert!(reg.remove(GraphId::new("main")).is_none());
    }

    #[test]
    fn ownership_filter() {
        let reg = Registry::new();
        let g = Graph::new();
        let (e1, _) = entry_for("a", "s1", &g);
        let (e2, _) = entry_for("b", "s2", &g);
        let (e3, _) = entry_for("c", "s1", &g);
        reg.install(e1, None);
        reg.install(e2, None);
        reg.install(e3, None);

        assert_eq!(
            reg.ids_owned_by(SceneId::new("s1")),
            vec![GraphId::new("a"), GraphId::new("c")]
        );
    }
}
