//! Scene plumbing: identities, mailboxes, and the events scenes receive.
//!
//! A scene is an application-owned state machine running on its own thread
//! (or task). The coordinator holds only its identity, parentage, and a
//! mailbox sender; events that cannot be delivered because the scene died
//! are dropped silently and the scene is cleaned up.

use crate::theme::Theme;
use crate::viewport::ViewPort;
use crossbeam_channel::Sender;
use log::debug;
use slate_core::{Atom, InputClass, InputEvent};
use std::fmt;

/// Identity of a scene, interned like every other atom.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(Atom);

impl SceneId {
    pub fn new(s: &str) -> Self {
        SceneId(Atom::new(s))
    }

    /// Generate a fresh unique scene id.
    pub fn unique(prefix: &str) -> Self {
        SceneId(Atom::with_prefix(prefix))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene:{}", self.as_str())
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Context delivered alongside a routed input event.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneContext {
    /// Resolved element id for hit-tested deliveries; `None` for broadcast
    /// and captured deliveries.
    pub element_id: Option<Atom>,
    /// Event coordinate in the target's local space, when positional.
    pub local_xy: Option<(f64, f64)>,
    /// The viewport this event came through.
    pub viewport_id: Atom,
}

/// Lifecycle notifications the viewport pushes into scenes.
#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle {
    ThemeChanged(Theme),
    Resized(f64, f64),
    Shutdown,
    /// The scene's capture of `class` was taken over from a dying holder.
    CaptureLost(InputClass),
}

/// Everything a scene's mailbox can receive.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Input {
        event: InputEvent,
        context: SceneContext,
    },
    Lifecycle(Lifecycle),
}

/// Coordinator-side record of a live scene.
#[derive(Debug, Clone)]
pub(crate) struct SceneRecord {
    pub parent: Option<SceneId>,
    /// Module tag for diagnostics ("root", "button", ...).
    pub tag: String,
    pub mailbox: Sender<SceneEvent>,
}

/// Behavior of an application scene. Implementations own their state; the
/// viewport only ever talks to them through their mailbox.
pub trait Scene: Send + 'static {
    fn handle_input(&mut self, vp: &ViewPort, event: InputEvent, context: SceneContext);

    /// Default: ignore lifecycle notifications.
    fn handle_lifecycle(&mut self, vp: &ViewPort, lifecycle: Lifecycle) {
        let _ = (vp, lifecycle);
    }
}

/// Register `scene` and drive it on a dedicated thread until shutdown.
///
/// The thread drains the mailbox in FIFO order, so events delivered to one
/// scene retain their relative order. A `Shutdown` lifecycle ends the loop
/// after the handler sees it.
pub fn spawn_scene(
    vp: &ViewPort,
    id: SceneId,
    parent: Option<SceneId>,
    tag: &str,
    mut scene: impl Scene,
) -> std::thread::JoinHandle<()> {
    let events = vp.register_scene(id, parent, tag);
    let vp = vp.clone();
    std::thread::spawn(move || {
        debug!("{id} event loop started");
        while let Ok(event) = events.recv() {
            match event {
                SceneEvent::Input { event, context } => {
                    scene.handle_input(&vp, event, context);
                }
                SceneEvent::Lifecycle(Lifecycle::Shutdown) => {
                    scene.handle_lifecycle(&vp, Lifecycle::Shutdown);
                    break;
                }
                SceneEvent::Lifecycle(lifecycle) => {
                    scene.handle_lifecycle(&vp, lifecycle);
                }
            }
        }
        debug!("{id} event loop stopped");
    })
}
