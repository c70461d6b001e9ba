//! Semantic queries and the automation hook.
//!
//! All queries are concurrent reads against the registry snapshots; only
//! `click` produces side effects, and it does so by synthesizing cursor
//! input through the router — captures and hit testing apply to it exactly
//! as they do to driver input.

use crate::error::ViewPortError;
use crate::input::root_transform_of;
use crate::viewport::ViewPort;
use kurbo::Rect;
use log::debug;
use slate_core::{Atom, ButtonAction, GraphId, InputEvent, PrimitiveTag, SemanticEntry};
use std::thread;
use std::time::Duration;

/// Hierarchy of semantic entries reconstructed from `parent_id` links.
#[derive(Debug, Clone)]
pub struct SemanticTree {
    pub entry: SemanticEntry,
    /// Children in insertion (paint) order.
    pub children: Vec<SemanticTree>,
}

impl ViewPort {
    fn ensure_semantics(&self) -> Result<(), ViewPortError> {
        if self.semantics_enabled() {
            Ok(())
        } else {
            Err(ViewPortError::SemanticDisabled)
        }
    }

    /// O(1) lookup through the global id index. On a cross-graph id
    /// collision the most recently registered graph wins.
    pub fn find_by_id(&self, id: Atom) -> Result<SemanticEntry, ViewPortError> {
        self.ensure_semantics()?;
        let (graph_id, _) = self
            .inner
            .registry
            .lookup_id(id)
            .ok_or(ViewPortError::NotFound)?;
        let snap = self
            .inner
            .registry
            .semantics(graph_id)
            .ok_or(ViewPortError::NotFound)?;
        snap.elements.get(&id).cloned().ok_or(ViewPortError::NotFound)
    }

    /// Every element of the given type, across all graphs.
    pub fn find_by_type(&self, kind: Atom) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.ensure_semantics()?;
        let mut out = Vec::new();
        for (_, snap) in self.inner.registry.all_semantics() {
            if let Some(ids) = snap.by_type.get(&kind) {
                out.extend(ids.iter().filter_map(|i| snap.elements.get(i)).cloned());
            }
        }
        Ok(out)
    }

    pub fn find_by_role(&self, role: Atom) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.ensure_semantics()?;
        let mut out = Vec::new();
        for (_, snap) in self.inner.registry.all_semantics() {
            if let Some(ids) = snap.by_role.get(&role) {
                out.extend(ids.iter().filter_map(|i| snap.elements.get(i)).cloned());
            }
        }
        Ok(out)
    }

    pub fn find_by_primitive(&self, tag: PrimitiveTag) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.ensure_semantics()?;
        let mut out = Vec::new();
        for (_, snap) in self.inner.registry.all_semantics() {
            if let Some(ids) = snap.by_primitive.get(&tag) {
                out.extend(ids.iter().filter_map(|i| snap.elements.get(i)).cloned());
            }
        }
        Ok(out)
    }

    /// Elements whose screen bounds contain the point, topmost first:
    /// deeper `z_index` wins, ties go to the later-painted element.
    pub fn elements_at_point(&self, x: f64, y: f64) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.ensure_semantics()?;
        let mut found: Vec<(u32, usize, usize, SemanticEntry)> = Vec::new();
        for (graph_pos, (_, snap)) in self.inner.registry.all_semantics().iter().enumerate() {
            for (paint_pos, entry) in snap.iter_paint_order().enumerate() {
                if rect_contains(entry.screen_bounds, x, y) {
                    found.push((entry.z_index, paint_pos, graph_pos, entry.clone()));
                }
            }
        }
        found.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(b.1.cmp(&a.1))
                .then(a.2.cmp(&b.2))
        });
        Ok(found.into_iter().map(|(_, _, _, e)| e).collect())
    }

    /// Reconstruct the element hierarchy under `root_id` from `parent_id`
    /// links; children enumerate in insertion order.
    pub fn tree(&self, root_id: Atom) -> Result<SemanticTree, ViewPortError> {
        self.ensure_semantics()?;
        let (graph_id, _) = self
            .inner
            .registry
            .lookup_id(root_id)
            .ok_or(ViewPortError::NotFound)?;
        let snap = self
            .inner
            .registry
            .semantics(graph_id)
            .ok_or(ViewPortError::NotFound)?;
        build_tree(&snap, root_id).ok_or(ViewPortError::NotFound)
    }

    /// Automation hook: press and release the cursor at the center of the
    /// element's screen bounds. The synthetic events pass through the
    /// router like any driver input, so captures and hit-test order apply.
    pub fn click(&self, id: Atom) -> Result<(), ViewPortError> {
        self.ensure_semantics()?;
        let entry = self.find_by_id(id)?;
        if self.driver_count() == 0 {
            return Err(ViewPortError::NoDriver);
        }
        let (graph_id, _) = self
            .inner
            .registry
            .lookup_id(id)
            .ok_or(ViewPortError::NotFound)?;

        // Screen bounds are in the element's graph-root space; compose with
        // the graph's embedding to reach global coordinates.
        let center = entry.screen_bounds.center();
        let global = root_transform_of(&self.inner.registry, GraphId::root(), graph_id)
            .map(|a| a * center)
            .unwrap_or(center);
        let position = (global.x, global.y);
        debug!("click {id:?} at ({}, {})", position.0, position.1);

        self.inject_input(InputEvent::CursorButton {
            button: 0,
            action: ButtonAction::Press,
            modifiers: 0,
            position,
        });
        thread::sleep(Duration::from_millis(10));
        self.inject_input(InputEvent::CursorButton {
            button: 0,
            action: ButtonAction::Release,
            modifiers: 0,
            position,
        });
        Ok(())
    }
}

fn build_tree(snap: &slate_core::SemanticSnapshot, id: Atom) -> Option<SemanticTree> {
    let entry = snap.elements.get(&id)?.clone();
    let children = snap
        .iter_paint_order()
        .filter(|e| e.parent_id == Some(id) && e.id != id)
        .filter_map(|e| build_tree(snap, e.id))
        .collect();
    Some(SemanticTree { entry, children })
}

fn rect_contains(r: Rect, x: f64, y: f64) -> bool {
    x >= r.x0 && x <= r.x1 && y >= r.y0 && y <= r.y1
}
