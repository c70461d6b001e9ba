//! Integration test: a full feedback loop through a threaded scene.
//!
//! A counter scene owns the root graph; every click on its button re-puts
//! a modified graph, which drivers observe as an update notification.

use slate_core::{
    Atom, ButtonAction, Graph, GraphId, InputClass, InputEvent, Primitive, Semantic, StyleSet,
    Transform,
};
use slate_viewport::{
    DriverEvent, Lifecycle, Scene, SceneContext, SceneId, ViewPort, spawn_scene,
};
use std::time::{Duration, Instant};

struct CounterScene {
    id: SceneId,
    clicks: u32,
}

impl CounterScene {
    fn graph(&self) -> Graph {
        let clicks = self.clicks;
        Graph::build(|b| {
            b.push(
                Primitive::rect(100.0, 40.0)
                    .with_id("increment")
                    .with_styles(StyleSet::new().with_input(InputClass::CursorButton))
                    .with_semantic(Semantic::button("Increment")),
            );
            b.push(
                Primitive::text(&format!("count: {clicks}"))
                    .with_id("count_label")
                    .with_transform(Transform::translate(0.0, 60.0)),
            );
        })
    }

    fn publish(&self, vp: &ViewPort) {
        vp.put_graph(GraphId::root(), &self.graph(), self.id).unwrap();
    }
}

impl Scene for CounterScene {
    fn handle_input(&mut self, vp: &ViewPort, event: InputEvent, context: SceneContext) {
        if context.element_id == Some(Atom::new("increment"))
            && matches!(
                event,
                InputEvent::CursorButton {
                    action: ButtonAction::Release,
                    ..
                }
            )
        {
            self.clicks += 1;
            self.publish(vp);
        }
    }

    fn handle_lifecycle(&mut self, _vp: &ViewPort, _lifecycle: Lifecycle) {}
}

fn wait_for_label(vp: &ViewPort, expected: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if let Ok(entry) = vp.find_by_id(Atom::new("count_label"))
            && entry.label.as_deref() == Some(expected)
        {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn clicks_round_trip_through_a_threaded_scene() {
    let vp = ViewPort::start();
    let conn = vp.attach_driver("headless");
    let _: Vec<_> = conn.events.try_iter().collect();

    let id = SceneId::new("counter");
    let scene = CounterScene { id, clicks: 0 };
    scene.publish(&vp);
    let handle = spawn_scene(&vp, id, None, "counter", scene);

    assert!(wait_for_label(&vp, "count: 0"));

    // Automation click drives the same router path as driver input.
    vp.click(Atom::new("increment")).unwrap();
    assert!(wait_for_label(&vp, "count: 1"));

    vp.click(Atom::new("increment")).unwrap();
    assert!(wait_for_label(&vp, "count: 2"));

    // Each republish produced a driver notification.
    let updates: Vec<_> = conn
        .events
        .try_iter()
        .filter(|e| matches!(e, DriverEvent::ScriptsUpdated(_)))
        .collect();
    assert!(updates.len() >= 3);

    vp.terminate_scene(id, "test over");
    handle.join().unwrap();
}
