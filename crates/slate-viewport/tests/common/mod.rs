//! Shared fixtures: recording scenes and a convenience graph vocabulary.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use slate_core::{
    Graph, InputClass, InputEvent, Primitive, Semantic, StyleSet, Transform,
};
use slate_viewport::{SceneContext, SceneEvent, SceneId, ViewPort};

/// Route log output through the test harness when `RUST_LOG` is set.
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A registered scene whose mailbox the test drains directly.
pub struct TestScene {
    pub id: SceneId,
    pub events: Receiver<SceneEvent>,
}

impl TestScene {
    pub fn register(vp: &ViewPort, name: &str) -> Self {
        let id = SceneId::new(name);
        let events = vp.register_scene(id, None, "test");
        Self { id, events }
    }

    pub fn drain(&self) -> Vec<SceneEvent> {
        self.events.try_iter().collect()
    }

    /// Drain, keeping only input deliveries.
    pub fn drain_input(&self) -> Vec<(InputEvent, SceneContext)> {
        self.drain()
            .into_iter()
            .filter_map(|e| match e {
                SceneEvent::Input { event, context } => Some((event, context)),
                SceneEvent::Lifecycle(_) => None,
            })
            .collect()
    }
}

/// A rect that accepts `cursor_button`, positioned by translation.
pub fn clickable_rect(id: &str, w: f64, h: f64, at: (f64, f64)) -> Primitive {
    Primitive::rect(w, h)
        .with_id(id)
        .with_transform(Transform::translate(at.0, at.1))
        .with_styles(StyleSet::new().with_input(InputClass::CursorButton))
}

/// The scenario-2 graph: one 100x50 rect at (10, 20) tagged as a button.
pub fn save_button_graph() -> Graph {
    Graph::build(|b| {
        b.push(
            Primitive::rect(100.0, 50.0)
                .with_id("save_btn")
                .with_transform(Transform::translate(10.0, 20.0))
                .with_styles(StyleSet::new().with_input(InputClass::CursorButton))
                .with_semantic(Semantic::button("Save")),
        );
    })
}

/// A press at the given global position.
pub fn press_at(x: f64, y: f64) -> InputEvent {
    InputEvent::CursorButton {
        button: 0,
        action: slate_core::ButtonAction::Press,
        modifiers: 0,
        position: (x, y),
    }
}
