//! Slate viewport: the coordination core of the runtime.
//!
//! One [`ViewPort`] owns the concurrent script/semantic registries, the
//! scene and driver lifecycles, and the input router. Scenes push compiled
//! graphs in with [`ViewPort::put_graph`]; drivers read scripts out of the
//! registry and feed raw input back; the router hit-tests positional input
//! against the live input tree and dispatches to scenes; the semantic API
//! answers queries about addressable elements and can synthesize clicks
//! for automated tests.
//!
//! Concurrency model: the coordinator is a single-writer state machine
//! behind one lock, while reads (script fetches, semantic queries, hit
//! testing) go to read-mostly tables whose entries are swapped wholesale —
//! a reader sees the old entry or the new one, never a torn one. The
//! viewport survives any single-scene or single-driver failure.

pub mod driver;
pub mod error;
mod input;
pub mod registry;
pub mod scene;
pub mod semantic;
pub mod theme;
pub mod viewport;

pub use driver::{DriverConn, DriverEvent, DriverId};
pub use error::ViewPortError;
pub use registry::ScriptEntry;
pub use scene::{Lifecycle, Scene, SceneContext, SceneEvent, SceneId, spawn_scene};
pub use semantic::SemanticTree;
pub use theme::Theme;
pub use viewport::{PutOutcome, RootStarter, ViewPort, ViewPortBuilder};
