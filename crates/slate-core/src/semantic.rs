//! Semantic metadata: the queryable index of addressable UI elements.
//!
//! A primitive joins the index when it carries an explicit id (other than
//! the root sentinel) or an explicit [`Semantic`] overlay. The compiler
//! builds one [`SemanticSnapshot`] per graph alongside the script; the
//! viewport registry swaps snapshots atomically with script entries.

use crate::id::Atom;
use crate::primitive::PrimitiveTag;
use kurbo::Rect;
use std::collections::HashMap;

/// Explicit semantic overlay declared on a primitive. Every field overrides
/// the compiler's inferred default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Semantic {
    /// Element type, e.g. `button`, `checkbox`.
    pub kind: Option<Atom>,
    /// Accessibility role.
    pub role: Option<Atom>,
    /// Human-readable label.
    pub label: Option<String>,
    /// Current value, for stateful elements.
    pub value: Option<String>,
    pub clickable: Option<bool>,
    pub focusable: Option<bool>,
}

impl Semantic {
    pub fn button(label: &str) -> Self {
        Self {
            kind: Some(Atom::new("button")),
            label: Some(label.to_string()),
            clickable: Some(true),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(Atom::new(kind));
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(Atom::new(role));
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn clickable(mut self, v: bool) -> Self {
        self.clickable = Some(v);
        self
    }

    pub fn focusable(mut self, v: bool) -> Self {
        self.focusable = Some(v);
        self
    }
}

/// Compile-time record of one addressable element.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticEntry {
    pub id: Atom,
    /// Uid of the producing primitive in its graph; keys the global
    /// id index together with the graph id.
    pub uid: u32,
    /// Element type (`button`, ...). Defaults to the primitive tag name.
    pub kind: Atom,
    /// The primitive module that produced this element.
    pub primitive: PrimitiveTag,
    /// Nearest ancestor with an id, or the hosting component's id for
    /// top-level elements of a component sub-scene.
    pub parent_id: Option<Atom>,
    /// Module-specific AABB in local coordinates.
    pub local_bounds: Rect,
    /// `local_bounds` mapped through the cumulative transform to root space.
    pub screen_bounds: Rect,
    pub clickable: bool,
    pub focusable: bool,
    pub label: Option<String>,
    pub role: Option<Atom>,
    pub value: Option<String>,
    pub hidden: bool,
    /// Depth from the graph root at compile time.
    pub z_index: u32,
}

/// Per-graph element map plus secondary indices, built during compilation.
#[derive(Debug, Clone, Default)]
pub struct SemanticSnapshot {
    pub elements: HashMap<Atom, SemanticEntry>,
    pub by_type: HashMap<Atom, Vec<Atom>>,
    pub by_role: HashMap<Atom, Vec<Atom>>,
    pub by_primitive: HashMap<PrimitiveTag, Vec<Atom>>,
    /// Ids in paint order; later entries paint on top. Drives the
    /// tie-break in point queries.
    pub paint_order: Vec<Atom>,
    /// Wall-clock time the snapshot was registered. Zero until the registry
    /// stamps it — compilation itself never reads the clock.
    pub timestamp_ms: u64,
}

impl SemanticSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, keeping every secondary index in sync. A duplicate
    /// id within one graph replaces the earlier element but keeps its
    /// original paint position.
    pub fn insert(&mut self, entry: SemanticEntry) {
        let id = entry.id;
        if self.elements.contains_key(&id) {
            self.remove_from_indices(id);
        } else {
            self.paint_order.push(id);
        }
        self.by_type.entry(entry.kind).or_default().push(id);
        if let Some(role) = entry.role {
            self.by_role.entry(role).or_default().push(id);
        }
        self.by_primitive.entry(entry.primitive).or_default().push(id);
        self.elements.insert(id, entry);
    }

    fn remove_from_indices(&mut self, id: Atom) {
        let Some(old) = self.elements.get(&id) else {
            return;
        };
        if let Some(ids) = self.by_type.get_mut(&old.kind) {
            ids.retain(|i| *i != id);
        }
        if let Some(role) = old.role
            && let Some(ids) = self.by_role.get_mut(&role)
        {
            ids.retain(|i| *i != id);
        }
        if let Some(ids) = self.by_primitive.get_mut(&old.primitive) {
            ids.retain(|i| *i != id);
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All entries in paint order.
    pub fn iter_paint_order(&self) -> impl Iterator<Item = &SemanticEntry> {
        self.paint_order.iter().filter_map(|id| self.elements.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, kind: &str) -> SemanticEntry {
        SemanticEntry {
            id: Atom::new(id),
            uid: 1,
            kind: Atom::new(kind),
            primitive: PrimitiveTag::Rect,
            parent_id: None,
            local_bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            screen_bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            clickable: false,
            focusable: false,
            label: None,
            role: None,
            value: None,
            hidden: false,
            z_index: 1,
        }
    }

    #[test]
    fn indices_stay_in_sync() {
        let mut snap = SemanticSnapshot::new();
        snap.insert(entry("a", "button"));
        snap.insert(entry("b", "button"));
        snap.insert(entry("c", "slider"));

        assert_eq!(snap.len(), 3);
        assert_eq!(snap.by_type[&Atom::new("button")].len(), 2);
        assert_eq!(snap.by_type[&Atom::new("slider")].len(), 1);
        assert_eq!(snap.by_primitive[&PrimitiveTag::Rect].len(), 3);
        assert_eq!(snap.paint_order.len(), 3);
    }

    #[test]
    fn duplicate_id_replaces_without_double_indexing() {
        let mut snap = SemanticSnapshot::new();
        snap.insert(entry("a", "button"));
        snap.insert(entry("a", "slider"));

        assert_eq!(snap.len(), 1);
        assert!(snap.by_type[&Atom::new("button")].is_empty());
        assert_eq!(snap.by_type[&Atom::new("slider")].len(), 1);
        assert_eq!(snap.paint_order.len(), 1);
    }
}
