//! Error types for graph construction and compilation.

use crate::graph::Uid;
use thiserror::Error;

/// Structural mutation errors on a [`crate::graph::Graph`].
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("uid {0} does not exist in this graph")]
    MissingUid(Uid),
    #[error("no primitive declares the id {0:?}")]
    MissingId(crate::id::Atom),
    #[error("uid {0} is not a container and cannot hold children")]
    NotAContainer(Uid),
    #[error("the root primitive cannot be deleted or replaced")]
    RootImmutable,
}

/// Reasons a graph fails to compile. The offending `put_graph` is rejected
/// and no partial output is committed.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("cycle detected in child references at uid {0}")]
    Cycle(Uid),
    #[error("child uid {child} referenced by {parent} is missing from the graph")]
    MissingChild { parent: Uid, child: Uid },
    #[error("the root primitive (uid 0) must be a group")]
    RootNotGroup,
    #[error("script encoding failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
}
