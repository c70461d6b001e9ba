//! ViewPort error surface.
//!
//! Invalid-state conditions (capture release by a non-holder, double driver
//! detach) are deliberately absent: they are logged and swallowed, never
//! propagated to callers.

use slate_core::CompileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewPortError {
    /// Graph id, element id, or scene unknown to the coordinator.
    #[error("not found")]
    NotFound,
    /// Semantic query against a viewport started with indexing off.
    #[error("semantic indexing is disabled on this viewport")]
    SemanticDisabled,
    /// Automation click with no driver attached to carry the synthetic
    /// input.
    #[error("no driver is attached")]
    NoDriver,
    /// The graph failed to compile; registry state is unchanged.
    #[error(transparent)]
    InvalidGraph(#[from] CompileError),
}
