use thiserror::Error;

/// Errors reported for invalid knowledge-base operations.
///
/// All variants are non-fatal: the offending operation is a no-op and the
/// store is left unchanged. An empty `ask` result is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KbError {
    /// Rules cannot be retracted directly; a derived rule disappears only
    /// when its support does.
    #[error("cannot retract a rule")]
    RetractRule,
    /// The fact to retract is not present in the knowledge base.
    #[error("fact not present in the knowledge base")]
    UnknownFact,
    /// `ask` accepts fact queries only.
    #[error("query must be a fact, not a rule")]
    InvalidQuery,
}

/// Rendering failure: a statement referenced a symbol id that does not
/// belong to the given symbol store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown symbol id")]
    UnknownSymbol,
}
