// id.rs — Stable identifiers shared by the frontend, IR and backend
//
// IDs are allocated in source order so that every run over the same input
// assigns the same numbers. Output (IR dumps, bitcode, metadata) is therefore
// reproducible byte for byte.

use std::fmt;

/// Index of a loaded source file within one compilation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Stable identifier for a top-level declaration (`fun` or `val`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

/// Function-local binding introduced by `let`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

/// IR symbol, allocated by the per-run symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// SSA value produced by an IR instruction, unique within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Allocator for frontend IDs. Produces monotonically increasing IDs in
/// allocation (source) order.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_def: u32,
    next_local: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_def(&mut self) -> DefId {
        let id = DefId(self.next_def);
        self.next_def += 1;
        id
    }

    pub fn alloc_local(&mut self) -> LocalId {
        let id = LocalId(self.next_local);
        self.next_local += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_monotonic_per_kind() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.alloc_def(), DefId(0));
        assert_eq!(ids.alloc_local(), LocalId(0));
        assert_eq!(ids.alloc_def(), DefId(1));
        assert_eq!(ids.alloc_local(), LocalId(1));
    }

    #[test]
    fn value_id_display() {
        assert_eq!(ValueId(7).to_string(), "%7");
    }
}
