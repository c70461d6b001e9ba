//! The ViewPort coordinator: the single writer over every registry.
//!
//! Readers (drivers, semantic queries, the hit tester) go straight to the
//! concurrent tables in [`crate::registry`]; everything that mutates —
//! script installs, scene and driver lifecycles, router state — is
//! serialized through one coordinator lock. Compilation runs outside the
//! lock; only the byte compare, the table swap, and the notification
//! enqueue happen inside it.
//!
//! Driver notification is fire-and-forget: each driver has its own bounded
//! queue and a slow driver never stalls the coordinator.

use crate::driver::{DriverConn, DriverEvent, DriverId, DriverSeat};
use crate::error::ViewPortError;
use crate::input::Router;
use crate::registry::{Registry, ScriptEntry};
use crate::scene::{Lifecycle, SceneEvent, SceneId, SceneRecord};
use crate::theme::Theme;
use crossbeam_channel::Receiver;
use log::{debug, warn};
use slate_core::{
    Atom, CompileOptions, Graph, GraphId, InputClass, InputEvent, Script, compile,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Starts (or restarts) the root scene: registers it and spawns whatever
/// the application uses to run it.
pub type RootStarter = Arc<dyn Fn(&ViewPort, SceneId) + Send + Sync>;

/// Outcome of a `put_graph`/`put_script`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The registry changed and drivers were notified.
    Updated,
    /// Byte-identical to the registered script: total no-op.
    Unchanged,
}

/// Start-time configuration.
#[derive(Debug, Clone)]
pub struct ViewPortBuilder {
    name: String,
    size: (f64, f64),
    theme: Theme,
    semantics: bool,
    driver_queue_capacity: usize,
}

impl Default for ViewPortBuilder {
    fn default() -> Self {
        Self {
            name: "viewport".to_string(),
            size: (800.0, 600.0),
            theme: Theme::default(),
            semantics: true,
            driver_queue_capacity: 64,
        }
    }
}

impl ViewPortBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.size = (width, height);
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Turn semantic indexing off entirely; semantic APIs then return
    /// `SemanticDisabled` and snapshots are never built.
    pub fn semantics(mut self, enabled: bool) -> Self {
        self.semantics = enabled;
        self
    }

    pub fn driver_queue_capacity(mut self, capacity: usize) -> Self {
        self.driver_queue_capacity = capacity;
        self
    }

    pub fn build(self) -> ViewPort {
        ViewPort {
            inner: Arc::new(Inner {
                id: Atom::with_prefix(&self.name),
                semantics_enabled: self.semantics,
                driver_queue_capacity: self.driver_queue_capacity,
                registry: Registry::new(),
                state: Mutex::new(Coordinator {
                    scenes: HashMap::new(),
                    drivers: Vec::new(),
                    next_driver: 0,
                    router: Router::new(),
                    theme: self.theme,
                    size: self.size,
                    root_starter: None,
                    root_scene: None,
                }),
            }),
        }
    }
}

/// Handle to one running viewport. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct ViewPort {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) id: Atom,
    pub(crate) semantics_enabled: bool,
    driver_queue_capacity: usize,
    pub(crate) registry: Registry,
    state: Mutex<Coordinator>,
}

struct Coordinator {
    scenes: HashMap<SceneId, SceneRecord>,
    drivers: Vec<DriverSeat>,
    next_driver: u32,
    router: Router,
    theme: Theme,
    size: (f64, f64),
    root_starter: Option<RootStarter>,
    root_scene: Option<SceneId>,
}

impl Coordinator {
    /// Push a notification to every driver, reaping the disconnected.
    fn notify_drivers(&mut self, event: DriverEvent) {
        let mut dead = Vec::new();
        for seat in &self.drivers {
            if !seat.send(event.clone()) {
                dead.push(seat.id);
            }
        }
        if !dead.is_empty() {
            self.drivers.retain(|s| !dead.contains(&s.id));
            for id in dead {
                self.router.driver_detached(id);
            }
        }
    }

    fn broadcast_lifecycle(&mut self, lifecycle: Lifecycle) {
        for record in self.scenes.values() {
            let _ = record.mailbox.send(SceneEvent::Lifecycle(lifecycle.clone()));
        }
    }
}

impl ViewPort {
    /// Start a viewport with default options.
    pub fn start() -> Self {
        ViewPortBuilder::new().build()
    }

    pub fn builder() -> ViewPortBuilder {
        ViewPortBuilder::new()
    }

    pub fn id(&self) -> Atom {
        self.inner.id
    }

    pub fn semantics_enabled(&self) -> bool {
        self.inner.semantics_enabled
    }

    fn lock(&self) -> MutexGuard<'_, Coordinator> {
        // A poisoned lock means a coordinator panic already took the
        // runtime down in spirit; recover the data rather than cascade.
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ─── Scene lifecycle ─────────────────────────────────────────────────

    /// Register a scene and hand back its mailbox receiver. The scene (or
    /// the code hosting it) consumes events on its own thread.
    pub fn register_scene(
        &self,
        id: SceneId,
        parent: Option<SceneId>,
        tag: &str,
    ) -> Receiver<SceneEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut state = self.lock();
        if state
            .scenes
            .insert(
                id,
                SceneRecord {
                    parent,
                    tag: tag.to_string(),
                    mailbox: tx,
                },
            )
            .is_some()
        {
            warn!("scene {id} re-registered, replacing previous mailbox");
        }
        rx
    }

    /// Supervisor hook: stop a scene and cascade-clean everything it owns —
    /// registry entries, semantic slices, input requests and captures, and
    /// all of its child scenes.
    pub fn terminate_scene(&self, scene: SceneId, reason: &str) {
        debug!("terminating {scene}: {reason}");
        let mut state = self.lock();
        self.terminate_locked(&mut state, scene);
    }

    fn terminate_locked(&self, state: &mut Coordinator, scene: SceneId) {
        // Children first, then the scene itself.
        let mut doomed = vec![scene];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            for (id, record) in &state.scenes {
                if record.parent == Some(parent) && !doomed.contains(id) {
                    doomed.push(*id);
                }
            }
            i += 1;
        }

        let mut removed_ids = Vec::new();
        for id in doomed.iter().rev() {
            let Some(record) = state.scenes.remove(id) else {
                continue;
            };
            let _ = record.mailbox.send(SceneEvent::Lifecycle(Lifecycle::Shutdown));
            for graph_id in self.inner.registry.ids_owned_by(*id) {
                if self.inner.registry.remove(graph_id).is_some() {
                    removed_ids.push(graph_id);
                }
            }
            let Coordinator { router, scenes, .. } = &mut *state;
            router.scene_terminated(*id, scenes);
        }

        if state.root_scene == Some(scene) {
            state.root_scene = None;
        }
        if !removed_ids.is_empty() {
            state.notify_drivers(DriverEvent::ScriptsDeleted(removed_ids));
        }
    }

    /// Replace the root scene. The starter is retained so the root can be
    /// re-initialized on theme changes.
    pub fn set_root(&self, starter: RootStarter) {
        let old_root = {
            let mut state = self.lock();
            state.root_starter = Some(starter.clone());
            state.root_scene.take()
        };
        if let Some(old) = old_root {
            self.terminate_scene(old, "root replaced");
        }
        self.start_root(starter);
    }

    fn start_root(&self, starter: RootStarter) {
        let scene_id = SceneId::unique("root");
        {
            let mut state = self.lock();
            state.root_scene = Some(scene_id);
            state.notify_drivers(DriverEvent::ResetScene);
        }
        starter(self, scene_id);
    }

    pub fn root_scene(&self) -> Option<SceneId> {
        self.lock().root_scene
    }

    // ─── Script registry ─────────────────────────────────────────────────

    /// Compile and register a graph. Byte-identical output is a total
    /// no-op: no table swap, no driver notification, no timestamp refresh.
    pub fn put_graph(
        &self,
        graph_id: GraphId,
        graph: &Graph,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        self.put_graph_inner(graph_id, graph, owner, None)
    }

    /// Register a component sub-scene's graph; `host` becomes the
    /// `parent_id` of the sub-scene's top-level semantic elements.
    pub fn put_component_graph(
        &self,
        graph_id: GraphId,
        graph: &Graph,
        owner: SceneId,
        host: Atom,
    ) -> Result<PutOutcome, ViewPortError> {
        self.put_graph_inner(graph_id, graph, owner, Some(host))
    }

    fn put_graph_inner(
        &self,
        graph_id: GraphId,
        graph: &Graph,
        owner: SceneId,
        parent_id: Option<Atom>,
    ) -> Result<PutOutcome, ViewPortError> {
        // Compilation is pure: run it before taking the writer lock.
        let compiled = compile(
            graph,
            &CompileOptions {
                parent_id,
                semantics: self.inner.semantics_enabled,
            },
        )?;

        let mut state = self.lock();
        if let Some(existing) = self.inner.registry.get(graph_id)
            && existing.bytes == compiled.bytes
        {
            debug!("put_graph {graph_id}: unchanged");
            return Ok(PutOutcome::Unchanged);
        }

        let mut snapshot = compiled.semantics;
        if let Some(snap) = &mut snapshot {
            snap.timestamp_ms = now_ms();
        }
        self.inner.registry.install(
            ScriptEntry {
                graph_id,
                bytes: compiled.bytes,
                script: compiled.script,
                input: compiled.input,
                owner,
            },
            snapshot,
        );
        debug!("put_graph {graph_id}: updated");
        state.notify_drivers(DriverEvent::ScriptsUpdated(vec![graph_id]));
        Ok(PutOutcome::Updated)
    }

    /// Register a pre-built script. No input list, no semantic snapshot.
    pub fn put_script(
        &self,
        graph_id: GraphId,
        script: Script,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        let bytes = script.encode().map_err(slate_core::CompileError::from)?;

        let mut state = self.lock();
        if let Some(existing) = self.inner.registry.get(graph_id)
            && existing.bytes == bytes
        {
            return Ok(PutOutcome::Unchanged);
        }
        self.inner.registry.install(
            ScriptEntry {
                graph_id,
                bytes,
                script,
                input: Default::default(),
                owner,
            },
            None,
        );
        state.notify_drivers(DriverEvent::ScriptsUpdated(vec![graph_id]));
        Ok(PutOutcome::Updated)
    }

    pub fn del_graph(&self, graph_id: GraphId) -> Result<(), ViewPortError> {
        let mut state = self.lock();
        if self.inner.registry.remove(graph_id).is_none() {
            return Err(ViewPortError::NotFound);
        }
        state.notify_drivers(DriverEvent::ScriptsDeleted(vec![graph_id]));
        Ok(())
    }

    /// Concurrent read; never touches the coordinator lock.
    pub fn get_script(&self, graph_id: GraphId) -> Option<Script> {
        self.inner.registry.get(graph_id).map(|e| e.script.clone())
    }

    /// Zero-copy read of the whole registry entry (bytes, input list).
    pub fn get_entry(&self, graph_id: GraphId) -> Option<Arc<ScriptEntry>> {
        self.inner.registry.get(graph_id)
    }

    pub fn list_script_ids(&self) -> Vec<GraphId> {
        self.inner.registry.ids()
    }

    // ─── Drivers ─────────────────────────────────────────────────────────

    /// Attach a driver. It immediately receives a snapshot of the current
    /// state: every script id, the theme, and the viewport size.
    pub fn attach_driver(&self, name: &str) -> DriverConn {
        let mut state = self.lock();
        let id = DriverId(state.next_driver);
        state.next_driver += 1;
        let (seat, conn) = DriverSeat::new(id, name, self.inner.driver_queue_capacity);
        seat.send(DriverEvent::ScriptsUpdated(self.inner.registry.ids()));
        seat.send(DriverEvent::Theme(state.theme.clone()));
        seat.send(DriverEvent::Resize(state.size.0, state.size.1));
        state.drivers.push(seat);
        debug!("driver {name} attached as {id}");
        conn
    }

    /// Detach a driver. Detaching twice is an invalid state: logged,
    /// not an error.
    pub fn detach_driver(&self, id: DriverId) {
        let mut state = self.lock();
        let before = state.drivers.len();
        state.drivers.retain(|s| s.id != id);
        if state.drivers.len() == before {
            warn!("{id} detached twice");
        }
        state.router.driver_detached(id);
    }

    pub fn driver_count(&self) -> usize {
        self.lock().drivers.len()
    }

    /// Declare a minimum delivery interval for a coalescable class coming
    /// from this driver. The router keeps only the latest event per
    /// interval.
    pub fn set_input_rate_limit(&self, driver: DriverId, class: InputClass, interval: Duration) {
        self.lock().router.set_rate_limit(driver, class, interval);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Driver-originated input. Events from one driver are processed FIFO.
    pub fn send_input(&self, driver: DriverId, event: InputEvent) {
        self.route_input(event, Some(driver));
    }

    /// Synthetic input (automation, tests). Bypasses rate limiting.
    pub fn inject_input(&self, event: InputEvent) {
        self.route_input(event, None);
    }

    fn route_input(&self, event: InputEvent, from_driver: Option<DriverId>) {
        let mut state = self.lock();
        let viewport_id = self.inner.id;
        let Coordinator { router, scenes, .. } = &mut *state;
        let dead = router.route(
            &self.inner.registry,
            scenes,
            GraphId::root(),
            viewport_id,
            event,
            from_driver,
        );
        for scene in dead {
            self.terminate_locked(&mut state, scene);
        }
    }

    /// Release any coalesced events whose interval has elapsed. Drivers
    /// call this on their frame tick.
    pub fn flush_input(&self) {
        let mut state = self.lock();
        let viewport_id = self.inner.id;
        let Coordinator { router, scenes, .. } = &mut *state;
        let dead = router.flush_pending(&self.inner.registry, scenes, GraphId::root(), viewport_id);
        for scene in dead {
            self.terminate_locked(&mut state, scene);
        }
    }

    pub fn request_input(&self, scene: SceneId, classes: &[InputClass]) {
        self.lock().router.request(scene, classes);
    }

    pub fn release_input(&self, scene: SceneId, classes: &[InputClass]) {
        self.lock().router.release(scene, classes);
    }

    /// Take exclusive hold of the given classes. Captures stack: a later
    /// capture shadows an earlier one until released.
    pub fn capture_input(&self, scene: SceneId, classes: &[InputClass]) {
        self.lock().router.capture(scene, classes);
    }

    pub fn release_capture(&self, scene: SceneId, classes: &[InputClass]) {
        self.lock().router.release_capture(scene, classes);
    }

    // ─── Theme and size ──────────────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.lock().theme.clone()
    }

    /// Change the theme: drivers are notified, scenes get a lifecycle
    /// event, and the root scene is re-initialized.
    pub fn set_theme(&self, theme: Theme) {
        let starter = {
            let mut state = self.lock();
            state.theme = theme.clone();
            state.notify_drivers(DriverEvent::Theme(theme.clone()));
            state.broadcast_lifecycle(Lifecycle::ThemeChanged(theme));
            state.root_starter.clone()
        };
        if let Some(starter) = starter {
            let old_root = self.lock().root_scene.take();
            if let Some(old) = old_root {
                self.terminate_scene(old, "theme changed");
            }
            self.start_root(starter);
        }
    }

    pub fn size(&self) -> (f64, f64) {
        self.lock().size
    }

    pub fn set_size(&self, width: f64, height: f64) {
        let mut state = self.lock();
        state.size = (width, height);
        state.notify_drivers(DriverEvent::Resize(width, height));
        state.broadcast_lifecycle(Lifecycle::Resized(width, height));
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
