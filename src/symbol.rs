use lasso::{Rodeo, Spur};

/// A unique identifier for an interned symbol: a predicate, constant, or
/// variable name. This is an interned string ID for fast equality comparison.
pub type SymId = Spur;

/// Symbol store for interning predicate, constant, and variable names.
///
/// Guarantees:
/// - Same string always produces same SymId
/// - Different strings always produce different SymIds
/// - SymId can be resolved back to the original string
///
/// The store is single-threaded: interning takes `&mut self`, resolution
/// takes `&self`.
pub struct SymbolStore {
    rodeo: Rodeo,
}

impl SymbolStore {
    /// Create a new empty symbol store.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Intern a symbol string, returning its unique SymId.
    /// If the symbol was already interned, returns the existing SymId.
    pub fn intern(&mut self, name: &str) -> SymId {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a SymId back to its string representation.
    /// Returns None if the SymId was not created by this store.
    pub fn resolve(&self, id: SymId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Check if a symbol string has already been interned.
    pub fn contains(&self, name: &str) -> bool {
        self.rodeo.contains(name)
    }

    /// Get the SymId for a symbol if it exists, without interning.
    pub fn get(&self, name: &str) -> Option<SymId> {
        self.rodeo.get(name)
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}
