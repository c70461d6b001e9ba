//! Input classes, events, and the per-graph input list the router consumes.
//!
//! The input list is a by-product of compilation: every input-eligible
//! primitive lands in it in paint order, together with the cumulative
//! transform and enough local data to answer `contains_point`. Hit testing
//! walks the list in reverse.

use crate::id::{Atom, GraphId};
use crate::primitive::PrimitiveKind;
use crate::style::InputSet;
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

/// The closed set of input classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputClass {
    CursorButton,
    CursorPos,
    CursorScroll,
    Key,
    Codepoint,
    Viewport,
}

impl InputClass {
    /// Positional classes carry a global coordinate and are hit-tested.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            InputClass::CursorButton | InputClass::CursorPos | InputClass::CursorScroll
        )
    }

    /// Classes a driver may rate-limit (high-frequency motion).
    pub fn is_coalescable(self) -> bool {
        matches!(self, InputClass::CursorPos | InputClass::CursorScroll)
    }
}

/// Press or release of a button or key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    Press,
    Release,
}

/// Viewport lifecycle payloads carried as input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportInput {
    /// Cursor entered the viewport at the given position.
    Enter((f64, f64)),
    /// Cursor left the viewport; last known position.
    Exit((f64, f64)),
    /// The viewport was reshaped to the given size.
    Reshape((f64, f64)),
}

/// One raw input event, tagged by class via [`InputEvent::class`].
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    CursorButton {
        button: u8,
        action: ButtonAction,
        modifiers: u32,
        position: (f64, f64),
    },
    CursorPos {
        position: (f64, f64),
    },
    CursorScroll {
        offset: (f64, f64),
        position: (f64, f64),
    },
    Key {
        key: String,
        action: ButtonAction,
        modifiers: u32,
    },
    Codepoint {
        codepoint: char,
        modifiers: u32,
    },
    Viewport(ViewportInput),
}

impl InputEvent {
    pub fn class(&self) -> InputClass {
        match self {
            InputEvent::CursorButton { .. } => InputClass::CursorButton,
            InputEvent::CursorPos { .. } => InputClass::CursorPos,
            InputEvent::CursorScroll { .. } => InputClass::CursorScroll,
            InputEvent::Key { .. } => InputClass::Key,
            InputEvent::Codepoint { .. } => InputClass::Codepoint,
            InputEvent::Viewport(_) => InputClass::Viewport,
        }
    }

    /// Global coordinate for positional events.
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::CursorButton { position, .. }
            | InputEvent::CursorPos { position }
            | InputEvent::CursorScroll { position, .. } => {
                Some(Point::new(position.0, position.1))
            }
            _ => None,
        }
    }

    /// Copy of the event with its global coordinate replaced (used when
    /// projecting into a capturer's or hit target's local space).
    pub fn with_position(&self, p: Point) -> InputEvent {
        let mut out = self.clone();
        match &mut out {
            InputEvent::CursorButton { position, .. }
            | InputEvent::CursorPos { position }
            | InputEvent::CursorScroll { position, .. } => *position = (p.x, p.y),
            _ => {}
        }
        out
    }
}

/// One hit-test candidate: an input-eligible primitive or a cross-graph
/// reference the hit test descends into.
#[derive(Debug, Clone)]
pub struct InputEntry {
    /// Uid of the primitive in its owning graph.
    pub uid: u32,
    /// Element id, when the primitive has one.
    pub id: Option<Atom>,
    /// Compiled local-to-graph-root transform.
    pub transform: Affine,
    /// Local shape data for `contains_point`.
    pub shape: PrimitiveKind,
    /// Accepted input classes. Empty for pure descent entries.
    pub classes: InputSet,
}

impl InputEntry {
    /// Target graph when this entry is a `script_ref`/`component_ref`
    /// descent point.
    pub fn descend_target(&self) -> Option<GraphId> {
        match &self.shape {
            PrimitiveKind::ScriptRef { target } | PrimitiveKind::ComponentRef { target } => {
                Some(*target)
            }
            _ => None,
        }
    }
}

/// Paint-ordered list of input candidates for one graph. Hit testing walks
/// it back-to-front (last drawn is hit first).
#[derive(Debug, Clone, Default)]
pub struct InputList {
    entries: Vec<InputEntry>,
}

impl InputList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: InputEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &InputEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_partition() {
        assert!(InputClass::CursorButton.is_positional());
        assert!(InputClass::CursorPos.is_positional());
        assert!(InputClass::CursorScroll.is_positional());
        assert!(!InputClass::Key.is_positional());
        assert!(!InputClass::Viewport.is_positional());
        assert!(InputClass::CursorPos.is_coalescable());
        assert!(!InputClass::CursorButton.is_coalescable());
    }

    #[test]
    fn position_projection() {
        let ev = InputEvent::CursorButton {
            button: 0,
            action: ButtonAction::Press,
            modifiers: 0,
            position: (10.0, 20.0),
        };
        assert_eq!(ev.position(), Some(Point::new(10.0, 20.0)));
        let moved = ev.with_position(Point::new(1.0, 2.0));
        assert_eq!(moved.position(), Some(Point::new(1.0, 2.0)));

        let key = InputEvent::Codepoint {
            codepoint: 'a',
            modifiers: 0,
        };
        assert_eq!(key.position(), None);
    }
}
