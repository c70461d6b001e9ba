//! The input router: requests, captures, hit testing, and dispatch.
//!
//! Dispatch contract per event of class C:
//! 1. A capturer for C receives the event exclusively (positional
//!    coordinates projected into its local space).
//! 2. Otherwise positional events are hit-tested against the live input
//!    tree, topmost first, and delivered to the hit's owner with the
//!    resolved element id.
//! 3. Independently of step 2, the event is broadcast to every scene that
//!    requested C, carrying the global coordinate and no element id.
//!
//! Hit-tested delivery is additive to broadcast delivery, not a
//! replacement.

use crate::driver::DriverId;
use crate::registry::Registry;
use crate::scene::{Lifecycle, SceneContext, SceneEvent, SceneId, SceneRecord};
use kurbo::{Affine, Point};
use log::{debug, warn};
use slate_core::transform::untransform_point;
use slate_core::{Atom, GraphId, InputClass, InputEvent};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// A resolved positional hit.
#[derive(Debug, Clone)]
pub(crate) struct Hit {
    pub owner: SceneId,
    pub element_id: Option<Atom>,
    pub local: Point,
}

/// Coalescing gate for one (driver, class) pair.
#[derive(Debug)]
struct RateGate {
    interval: Duration,
    last_sent: Option<Instant>,
    /// Latest event held back during the current interval.
    pending: Option<InputEvent>,
}

/// Router state. Lives inside the coordinator; all mutation is serialized
/// through the coordinator lock.
#[derive(Debug, Default)]
pub(crate) struct Router {
    /// Non-exclusive subscriptions, in registration order per class.
    requests: HashMap<InputClass, Vec<SceneId>>,
    /// Exclusive holders per class; last element is the active capturer.
    captures: HashMap<InputClass, Vec<SceneId>>,
    gates: HashMap<(DriverId, InputClass), RateGate>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Scene API ───────────────────────────────────────────────────────

    pub fn request(&mut self, scene: SceneId, classes: &[InputClass]) {
        for class in classes {
            let list = self.requests.entry(*class).or_default();
            if !list.contains(&scene) {
                list.push(scene);
            }
        }
    }

    pub fn release(&mut self, scene: SceneId, classes: &[InputClass]) {
        for class in classes {
            if let Some(list) = self.requests.get_mut(class) {
                list.retain(|s| *s != scene);
            }
        }
    }

    pub fn capture(&mut self, scene: SceneId, classes: &[InputClass]) {
        for class in classes {
            self.captures.entry(*class).or_default().push(scene);
        }
    }

    /// Pop the top of each class stack, provided the caller holds it.
    /// Release by a non-holder is an invalid state: logged, not an error.
    pub fn release_capture(&mut self, scene: SceneId, classes: &[InputClass]) {
        for class in classes {
            match self.captures.get_mut(class) {
                Some(stack) if stack.last() == Some(&scene) => {
                    stack.pop();
                }
                _ => {
                    warn!("{scene} released a capture of {class:?} it does not hold");
                }
            }
        }
    }

    /// Strip every request and capture held by a dead scene. Where the
    /// scene was the active capturer, the newly exposed capturer is told
    /// the capture changed hands mid-stream.
    pub fn scene_terminated(&mut self, scene: SceneId, scenes: &HashMap<SceneId, SceneRecord>) {
        for list in self.requests.values_mut() {
            list.retain(|s| *s != scene);
        }
        for (class, stack) in self.captures.iter_mut() {
            let was_top = stack.last() == Some(&scene);
            stack.retain(|s| *s != scene);
            if was_top && let Some(next) = stack.last() {
                let _ = send_to(
                    scenes,
                    *next,
                    SceneEvent::Lifecycle(Lifecycle::CaptureLost(*class)),
                );
            }
        }
    }

    pub fn set_rate_limit(&mut self, driver: DriverId, class: InputClass, interval: Duration) {
        self.gates.insert(
            (driver, class),
            RateGate {
                interval,
                last_sent: None,
                pending: None,
            },
        );
    }

    pub fn driver_detached(&mut self, driver: DriverId) {
        self.gates.retain(|(d, _), _| *d != driver);
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    /// Route one event. Returns scene ids whose mailboxes turned out to be
    /// disconnected so the coordinator can run ownership cleanup.
    pub fn route(
        &mut self,
        registry: &Registry,
        scenes: &HashMap<SceneId, SceneRecord>,
        root: GraphId,
        viewport_id: Atom,
        event: InputEvent,
        from_driver: Option<DriverId>,
    ) -> Vec<SceneId> {
        let mut dead = Vec::new();

        // Any gated event whose interval has elapsed goes out first so a
        // coalesced trailing event is not starved by unrelated traffic.
        for held in self.take_ready_pending() {
            self.deliver(registry, scenes, root, viewport_id, held, &mut dead);
        }

        let class = event.class();
        if let Some(driver) = from_driver
            && class.is_coalescable()
            && let Some(gate) = self.gates.get_mut(&(driver, class))
        {
            let now = Instant::now();
            let within_interval = gate
                .last_sent
                .is_some_and(|t| now.duration_since(t) < gate.interval);
            if within_interval {
                // Coalesce: keep only the latest.
                gate.pending = Some(event);
                return dead;
            }
            gate.last_sent = Some(now);
            gate.pending = None;
        }

        self.deliver(registry, scenes, root, viewport_id, event, &mut dead);
        dead
    }

    /// Flush coalesced events whose interval has elapsed. Called by the
    /// coordinator on demand (e.g. a driver tick) so a trailing cursor
    /// position is not held forever.
    pub fn flush_pending(
        &mut self,
        registry: &Registry,
        scenes: &HashMap<SceneId, SceneRecord>,
        root: GraphId,
        viewport_id: Atom,
    ) -> Vec<SceneId> {
        let mut dead = Vec::new();
        for held in self.take_ready_pending() {
            self.deliver(registry, scenes, root, viewport_id, held, &mut dead);
        }
        dead
    }

    fn take_ready_pending(&mut self) -> Vec<InputEvent> {
        let now = Instant::now();
        let mut out = Vec::new();
        for gate in self.gates.values_mut() {
            if let Some(last) = gate.last_sent
                && now.duration_since(last) >= gate.interval
                && let Some(ev) = gate.pending.take()
            {
                gate.last_sent = Some(now);
                out.push(ev);
            }
        }
        out
    }

    fn deliver(
        &self,
        registry: &Registry,
        scenes: &HashMap<SceneId, SceneRecord>,
        root: GraphId,
        viewport_id: Atom,
        event: InputEvent,
        dead: &mut Vec<SceneId>,
    ) {
        let class = event.class();

        // Capture overrides routing entirely.
        if let Some(capturer) = self.captures.get(&class).and_then(|s| s.last().copied()) {
            let projected = match event.position() {
                Some(global) => {
                    match capturer_local(registry, root, capturer, global) {
                        Some(local) => (event.with_position(local), Some((local.x, local.y))),
                        None => (event.clone(), None),
                    }
                }
                None => (event.clone(), None),
            };
            debug!("{class:?} captured by {capturer}");
            if !send_to(
                scenes,
                capturer,
                SceneEvent::Input {
                    event: projected.0,
                    context: SceneContext {
                        element_id: None,
                        local_xy: projected.1,
                        viewport_id,
                    },
                },
            ) {
                dead.push(capturer);
            }
            return;
        }

        // Hit-tested delivery for positional classes.
        if class.is_positional()
            && let Some(global) = event.position()
            && let Some(hit) = hit_test(registry, root, class, global)
        {
            debug!("{class:?} hit {:?} in {}", hit.element_id, hit.owner);
            if !send_to(
                scenes,
                hit.owner,
                SceneEvent::Input {
                    event: event.with_position(hit.local),
                    context: SceneContext {
                        element_id: hit.element_id,
                        local_xy: Some((hit.local.x, hit.local.y)),
                        viewport_id,
                    },
                },
            ) {
                dead.push(hit.owner);
            }
        }

        // Broadcast to requesters, additively.
        if let Some(requesters) = self.requests.get(&class) {
            for &scene in requesters {
                if !send_to(
                    scenes,
                    scene,
                    SceneEvent::Input {
                        event: event.clone(),
                        context: SceneContext {
                            element_id: None,
                            local_xy: None,
                            viewport_id,
                        },
                    },
                ) {
                    dead.push(scene);
                }
            }
        }
    }
}

/// Deliver one event to one scene; undeliverable events are dropped
/// silently. Returns `false` when the mailbox is disconnected.
fn send_to(
    scenes: &HashMap<SceneId, SceneRecord>,
    scene: SceneId,
    event: SceneEvent,
) -> bool {
    match scenes.get(&scene) {
        Some(record) => record.mailbox.send(event).is_ok(),
        None => true,
    }
}

/// Walk entries in reverse paint order, starting from the root graph and
/// descending through script/component references with composed transforms.
/// The first containing, class-accepting entry wins.
pub(crate) fn hit_test(
    registry: &Registry,
    root: GraphId,
    class: InputClass,
    global: Point,
) -> Option<Hit> {
    let mut visiting = HashSet::new();
    hit_in_graph(registry, root, Affine::IDENTITY, class, global, &mut visiting)
}

fn hit_in_graph(
    registry: &Registry,
    graph_id: GraphId,
    outer: Affine,
    class: InputClass,
    global: Point,
    visiting: &mut HashSet<GraphId>,
) -> Option<Hit> {
    // Reference cycles are rejected at registration time; this guard keeps
    // a stale registry from looping the router.
    if !visiting.insert(graph_id) {
        return None;
    }
    let entry = registry.get(graph_id);
    let result = entry.as_ref().and_then(|entry| {
        for candidate in entry.input.iter().rev() {
            if let Some(target) = candidate.descend_target() {
                let hit = hit_in_graph(
                    registry,
                    target,
                    outer * candidate.transform,
                    class,
                    global,
                    visiting,
                );
                if hit.is_some() {
                    return hit;
                }
                continue;
            }
            if !candidate.classes.accepts(class) {
                continue;
            }
            let full = outer * candidate.transform;
            let Some(local) = untransform_point(full, global) else {
                continue;
            };
            if candidate.shape.contains_point(local) {
                return Some(Hit {
                    owner: entry.owner,
                    element_id: candidate.id,
                    local,
                });
            }
        }
        None
    });
    visiting.remove(&graph_id);
    result
}

/// Root-relative transform of `target`'s graph content, found by walking
/// reference entries from the root graph. Identity when `target` owns the
/// root graph itself.
pub(crate) fn root_transform_of(
    registry: &Registry,
    root: GraphId,
    target: GraphId,
) -> Option<Affine> {
    let mut visiting = HashSet::new();
    find_graph_transform(registry, root, target, Affine::IDENTITY, &mut visiting)
}

fn find_graph_transform(
    registry: &Registry,
    current: GraphId,
    target: GraphId,
    outer: Affine,
    visiting: &mut HashSet<GraphId>,
) -> Option<Affine> {
    if current == target {
        return Some(outer);
    }
    if !visiting.insert(current) {
        return None;
    }
    let entry = registry.get(current);
    let result = entry.and_then(|entry| {
        for candidate in entry.input.iter() {
            if let Some(next) = candidate.descend_target()
                && let Some(found) = find_graph_transform(
                    registry,
                    next,
                    target,
                    outer * candidate.transform,
                    visiting,
                )
            {
                return Some(found);
            }
        }
        None
    });
    visiting.remove(&current);
    result
}

/// Project a global coordinate into the local space of the graph owned by
/// `capturer` that is reachable from the root mapping.
fn capturer_local(
    registry: &Registry,
    root: GraphId,
    capturer: SceneId,
    global: Point,
) -> Option<Point> {
    let owned = registry.ids_owned_by(capturer);
    for graph_id in owned {
        if let Some(affine) = root_transform_of(registry, root, graph_id) {
            return untransform_point(affine, global);
        }
    }
    None
}
