use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner shared by all atom-like identifiers.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight interned string used wherever the runtime needs atom
/// semantics: element ids, semantic types, roles, font names.
/// Internally a `Spur` index — 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(Spur);

impl Atom {
    /// Intern a string, or return the existing atom if already interned.
    pub fn new(s: &str) -> Self {
        Atom(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The sentinel id reserved for graph roots. Primitives carrying this id
    /// are never registered in the semantic index.
    pub fn root_sentinel() -> Self {
        Self::new("_root_")
    }

    /// Generate a unique id with a prefix (e.g. `scene_1`, `scene_2`).
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::new(&format!("{prefix}_{n}"))
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.as_str())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Atom::new(&s))
    }
}

/// Registry key for a compiled script. Distinct from [`Atom`] so that graph
/// names and element ids cannot be confused at call sites, but backed by the
/// same interner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(Spur);

impl GraphId {
    pub fn new(s: &str) -> Self {
        GraphId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The graph registered by the root scene.
    pub fn root() -> Self {
        Self::new("_root_")
    }

    /// Conventional name for an application's main graph.
    pub fn main() -> Self {
        Self::new("_main_")
    }
}

impl fmt::Debug for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph:{}", self.as_str())
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for GraphId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GraphId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(GraphId::new(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = Atom::new("save_btn");
        let b = Atom::new("save_btn");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "save_btn");
    }

    #[test]
    fn prefixed_ids_are_unique() {
        let a = Atom::with_prefix("scene");
        let b = Atom::with_prefix("scene");
        assert_ne!(a, b);
    }

    #[test]
    fn graph_ids_and_atoms_are_distinct_types() {
        let g = GraphId::new("_main_");
        assert_eq!(g, GraphId::main());
        assert_eq!(g.as_str(), "_main_");
    }
}
