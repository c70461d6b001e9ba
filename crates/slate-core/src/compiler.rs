//! The graph compiler: depth-first flatten into a script, an input list,
//! and a semantic snapshot.
//!
//! Compilation is a total, pure function of the graph and its options —
//! no clocks, no randomness, no global state. The same graph value always
//! produces byte-identical script output, which is what lets the registry
//! treat an unchanged `put_graph` as a no-op without diffing structures.
//!
//! State handling: the walker keeps a stack of (cumulative transform,
//! inherited styles). A node that changes nothing emits no state commands;
//! otherwise it is bracketed by `push_state`/`pop_state` with only the
//! delta in between. The minimization never changes rendered output.

use crate::error::CompileError;
use crate::graph::{Graph, ROOT_UID, Uid};
use crate::id::Atom;
use crate::input::{InputEntry, InputList};
use crate::primitive::{Primitive, PrimitiveKind, PrimitiveTag};
use crate::script::{Command, Script};
use crate::semantic::{SemanticEntry, SemanticSnapshot};
use crate::style::{InputSet, StyleSet};
use crate::transform::transform_bounds;
use kurbo::Affine;
use smallvec::SmallVec;
use std::collections::HashSet;

/// Compile-time options.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Id of the hosting component when compiling a component sub-scene;
    /// becomes the `parent_id` of the sub-scene's top-level elements.
    pub parent_id: Option<Atom>,
    /// Build the semantic snapshot. Off means zero semantic cost.
    pub semantics: bool,
}

impl CompileOptions {
    pub fn with_semantics() -> Self {
        Self {
            parent_id: None,
            semantics: true,
        }
    }
}

/// Everything one compilation produces. Swapped into the registry as a unit.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub script: Script,
    /// Canonical encoding of `script`; the change-detection key.
    pub bytes: Vec<u8>,
    pub input: InputList,
    pub semantics: Option<SemanticSnapshot>,
}

/// Compile a graph. Fails without partial output on structural errors.
pub fn compile(graph: &Graph, opts: &CompileOptions) -> Result<Compiled, CompileError> {
    let root = graph.get(ROOT_UID).ok_or(CompileError::RootNotGroup)?;
    if !matches!(root.kind, PrimitiveKind::Group) {
        return Err(CompileError::RootNotGroup);
    }

    let mut walker = Walker {
        graph,
        commands: Vec::new(),
        input: InputList::new(),
        semantics: opts.semantics.then(SemanticSnapshot::new),
        visited: HashSet::new(),
    };
    walker.walk(ROOT_UID, Affine::IDENTITY, &StyleSet::default(), opts.parent_id, 0)?;

    let script = Script::from(walker.commands);
    let bytes = script.encode()?;
    log::trace!(
        "compiled {} primitives into {} commands ({} input entries)",
        graph.len(),
        script.len(),
        walker.input.len(),
    );
    Ok(Compiled {
        script,
        bytes,
        input: walker.input,
        semantics: walker.semantics,
    })
}

struct Walker<'a> {
    graph: &'a Graph,
    commands: Vec<Command>,
    input: InputList,
    semantics: Option<SemanticSnapshot>,
    visited: HashSet<Uid>,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        uid: Uid,
        cumulative: Affine,
        inherited: &StyleSet,
        parent_sem: Option<Atom>,
        depth: u32,
    ) -> Result<(), CompileError> {
        if !self.visited.insert(uid) {
            return Err(CompileError::Cycle(uid));
        }
        let prim = match self.graph.get(uid) {
            Some(p) => p,
            // Unreachable through the mutation API; guards corrupted input.
            None => {
                return Err(CompileError::MissingChild {
                    parent: self.graph.parent(uid).unwrap_or(ROOT_UID),
                    child: uid,
                });
            }
        };

        let local = prim.transform.to_affine();
        let cumulative = cumulative * local;
        let effective = prim.styles.merge_over(inherited);

        let style_cmds = style_delta(&prim.styles, inherited);
        let needs_state = !prim.transform.is_identity() || !style_cmds.is_empty();
        if needs_state {
            self.commands.push(Command::PushState);
            if !prim.transform.is_identity() {
                self.commands.push(Command::Transform(local.as_coeffs()));
            }
            self.commands.extend(style_cmds);
        }

        prim.kind.emit(&mut self.commands);

        let hidden = effective.hidden == Some(true);
        if !hidden {
            self.collect_input(uid, prim, cumulative, &effective);
        }
        if self.semantics.is_some() {
            self.collect_semantic(uid, prim, cumulative, parent_sem, hidden, depth);
        }

        let child_sem = prim
            .id
            .filter(|id| *id != Atom::root_sentinel())
            .or(parent_sem);
        for child in self.graph.children(uid) {
            if !self.graph.contains(child) {
                return Err(CompileError::MissingChild { parent: uid, child });
            }
            self.walk(child, cumulative, &effective, child_sem, depth + 1)?;
        }

        if needs_state {
            self.commands.push(Command::PopState);
        }
        Ok(())
    }

    fn collect_input(&mut self, uid: Uid, prim: &Primitive, cumulative: Affine, effective: &StyleSet) {
        let is_ref = matches!(
            prim.kind,
            PrimitiveKind::ScriptRef { .. } | PrimitiveKind::ComponentRef { .. }
        );
        let classes = match &effective.input {
            Some(set) if !set.is_empty() => Some(set.clone()),
            _ => None,
        };
        // References always land in the list so hit testing can descend
        // into the target graph, input-styled or not.
        if classes.is_none() && !is_ref {
            return;
        }
        self.input.push(InputEntry {
            uid,
            id: prim.id,
            transform: cumulative,
            shape: prim.kind.clone(),
            classes: classes.unwrap_or(InputSet::Classes(SmallVec::new())),
        });
    }

    fn collect_semantic(
        &mut self,
        uid: Uid,
        prim: &Primitive,
        cumulative: Affine,
        parent_sem: Option<Atom>,
        hidden: bool,
        depth: u32,
    ) {
        let explicit_id = prim.id.filter(|id| *id != Atom::root_sentinel());
        if explicit_id.is_none() && prim.semantic.is_none() {
            return;
        }
        // Elements declared only through a semantic payload get a
        // deterministic per-graph id derived from their uid.
        let id = match explicit_id {
            Some(id) => id,
            None => Atom::new(&format!("_uid_{uid}")),
        };

        let overlay = prim.semantic.clone().unwrap_or_default();
        let tag = prim.tag();
        let local_bounds = prim.kind.bounds();
        let entry = SemanticEntry {
            id,
            uid,
            kind: overlay.kind.unwrap_or_else(|| Atom::new(tag.name())),
            primitive: tag,
            parent_id: parent_sem,
            local_bounds,
            screen_bounds: transform_bounds(cumulative, local_bounds),
            clickable: overlay
                .clickable
                .unwrap_or(tag == PrimitiveTag::ComponentRef),
            focusable: overlay.focusable.unwrap_or(false),
            label: overlay.label.or_else(|| match &prim.kind {
                PrimitiveKind::Text { content } => Some(content.clone()),
                _ => None,
            }),
            role: overlay.role,
            value: overlay.value,
            hidden,
            z_index: depth,
        };
        if let Some(snapshot) = &mut self.semantics {
            snapshot.insert(entry);
        }
    }
}

/// Commands for the styles a node sets explicitly, minus anything that
/// matches the inherited value. Canonical field order keeps output
/// deterministic. The `input` style never reaches the script.
fn style_delta(own: &StyleSet, inherited: &StyleSet) -> Vec<Command> {
    let mut out = Vec::new();
    if let Some(fill) = &own.fill
        && inherited.fill.as_ref() != Some(fill)
    {
        out.push(Command::FillColor(fill.clone()));
    }
    if let Some(stroke) = &own.stroke
        && inherited.stroke.as_ref() != Some(stroke)
    {
        out.push(Command::StrokeColor(stroke.1.clone()));
        out.push(Command::StrokeWidth(stroke.0));
    }
    if let Some(cap) = own.line_cap
        && inherited.line_cap != Some(cap)
    {
        out.push(Command::LineCap(cap));
    }
    if let Some(join) = own.line_join
        && inherited.line_join != Some(join)
    {
        out.push(Command::LineJoin(join));
    }
    if let Some(limit) = own.miter_limit
        && inherited.miter_limit != Some(limit)
    {
        out.push(Command::MiterLimit(limit));
    }
    if let Some(font) = &own.font
        && inherited.font.as_ref() != Some(font)
    {
        out.push(Command::Font(font.clone()));
    }
    if let Some(size) = own.font_size
        && inherited.font_size != Some(size)
    {
        out.push(Command::FontSize(size));
    }
    if let Some(align) = own.text_align
        && inherited.text_align != Some(align)
    {
        out.push(Command::TextAlign(align));
    }
    if let Some(base) = own.text_base
        && inherited.text_base != Some(base)
    {
        out.push(Command::TextBase(base));
    }
    if let Some(scissor) = own.scissor
        && inherited.scissor != Some(scissor)
    {
        out.push(Command::Scissor(scissor));
    }
    if let Some(hidden) = own.hidden
        && inherited.hidden != Some(hidden)
    {
        out.push(Command::Hidden(hidden));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, NamedColor};
    use crate::semantic::Semantic;
    use crate::transform::Transform;
    use kurbo::Rect;
    use pretty_assertions::assert_eq;

    fn opts() -> CompileOptions {
        CompileOptions::with_semantics()
    }

    #[test]
    fn empty_graph_compiles_to_empty_script() {
        let g = Graph::new();
        let out = compile(&g, &opts()).unwrap();
        assert!(out.script.is_empty());
        assert!(out.input.is_empty());
        assert!(out.semantics.unwrap().is_empty());
    }

    #[test]
    fn single_rect_with_transform_and_semantic() {
        let g = Graph::build(|b| {
            b.push(
                Primitive::rect(100.0, 50.0)
                    .with_id("save_btn")
                    .with_transform(Transform::translate(10.0, 20.0))
                    .with_semantic(Semantic::button("Save")),
            );
        });
        let out = compile(&g, &opts()).unwrap();

        assert_eq!(
            out.script.commands(),
            &[
                Command::PushState,
                Command::Transform([1.0, 0.0, 0.0, 1.0, 10.0, 20.0]),
                Command::DrawRect(100.0, 50.0),
                Command::PopState,
            ]
        );

        let snap = out.semantics.unwrap();
        let entry = &snap.elements[&Atom::new("save_btn")];
        assert_eq!(entry.local_bounds, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(entry.screen_bounds, Rect::new(10.0, 20.0, 110.0, 70.0));
        assert!(entry.clickable);
        assert_eq!(entry.label.as_deref(), Some("Save"));
        assert_eq!(entry.kind, Atom::new("button"));
        assert_eq!(entry.z_index, 1);
    }

    #[test]
    fn compile_is_deterministic() {
        let build = || {
            Graph::build(|b| {
                b.group(|b| {
                    b.push(
                        Primitive::rect(10.0, 10.0)
                            .with_styles(StyleSet::new().with_fill(Color::Named(NamedColor::Red))),
                    );
                    b.push(Primitive::text("hi").with_id("greeting"));
                });
            })
        };
        let a = compile(&build(), &opts()).unwrap();
        let b = compile(&build(), &opts()).unwrap();
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn inherited_styles_are_not_re_emitted() {
        let g = Graph::build(|b| {
            b.container(
                Primitive::group()
                    .with_styles(StyleSet::new().with_fill(Color::Named(NamedColor::Red))),
                |b| {
                    // Same fill as inherited: no state commands for the child.
                    b.push(
                        Primitive::rect(10.0, 10.0)
                            .with_styles(StyleSet::new().with_fill(Color::Named(NamedColor::Red))),
                    );
                },
            );
        });
        let out = compile(&g, &opts()).unwrap();
        assert_eq!(
            out.script.commands(),
            &[
                Command::PushState,
                Command::FillColor(Color::Named(NamedColor::Red)),
                Command::DrawRect(10.0, 10.0),
                Command::PopState,
            ]
        );
    }

    #[test]
    fn input_entries_follow_paint_order() {
        use crate::input::InputClass;
        let g = Graph::build(|b| {
            b.push(
                Primitive::rect(100.0, 50.0)
                    .with_id("a")
                    .with_styles(StyleSet::new().with_input(InputClass::CursorButton)),
            );
            b.push(
                Primitive::rect(100.0, 50.0)
                    .with_id("b")
                    .with_styles(StyleSet::new().with_input(InputClass::CursorButton)),
            );
        });
        let out = compile(&g, &opts()).unwrap();
        let ids: Vec<_> = out.input.iter().map(|e| e.id.unwrap()).collect();
        assert_eq!(ids, vec![Atom::new("a"), Atom::new("b")]);
    }

    #[test]
    fn hidden_subtree_is_not_input_eligible() {
        use crate::input::InputClass;
        let g = Graph::build(|b| {
            b.container(
                Primitive::group().with_styles(StyleSet::new().with_hidden(true)),
                |b| {
                    b.push(
                        Primitive::rect(10.0, 10.0)
                            .with_styles(StyleSet::new().with_input(InputClass::CursorButton)),
                    );
                },
            );
        });
        let out = compile(&g, &opts()).unwrap();
        assert!(out.input.is_empty());
    }

    #[test]
    fn refs_always_enter_the_input_list() {
        use crate::id::GraphId;
        let g = Graph::build(|b| {
            b.push(Primitive::script_ref(GraphId::new("toolbar")));
        });
        let out = compile(&g, &opts()).unwrap();
        assert_eq!(out.input.len(), 1);
        let entry = out.input.iter().next().unwrap();
        assert_eq!(entry.descend_target(), Some(GraphId::new("toolbar")));
        assert!(entry.classes.is_empty());
    }

    #[test]
    fn semantics_can_be_disabled() {
        let g = Graph::build(|b| {
            b.push(Primitive::rect(1.0, 1.0).with_id("x"));
        });
        let out = compile(&g, &CompileOptions::default()).unwrap();
        assert!(out.semantics.is_none());
    }

    #[test]
    fn component_hosts_parent_semantic_ids() {
        let g = Graph::build(|b| {
            b.push(Primitive::rect(5.0, 5.0).with_id("child"));
        });
        let out = compile(
            &g,
            &CompileOptions {
                parent_id: Some(Atom::new("host")),
                semantics: true,
            },
        )
        .unwrap();
        let snap = out.semantics.unwrap();
        assert_eq!(
            snap.elements[&Atom::new("child")].parent_id,
            Some(Atom::new("host"))
        );
    }

    #[test]
    fn cycle_is_a_compile_error() {
        let mut g = Graph::build(|b| {
            b.group(|b| {
                b.push(Primitive::rect(1.0, 1.0));
            });
        });
        let group_uid = g.children(ROOT_UID)[0];
        g.force_child_link(group_uid, ROOT_UID);
        let err = compile(&g, &opts()).unwrap_err();
        assert!(matches!(err, CompileError::Cycle(ROOT_UID)));
    }

    #[test]
    fn missing_child_is_a_compile_error() {
        let mut g = Graph::new();
        g.force_child_link(ROOT_UID, 99);
        let err = compile(&g, &opts()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingChild { parent: ROOT_UID, child: 99 }
        ));
    }
}
