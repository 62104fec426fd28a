use crate::error::FormatError;
use crate::symbol::{SymId, SymbolStore};
use smallvec::SmallVec;

/// An argument position in a statement: a constant or a named variable.
///
/// Variable names are significant for matching: two occurrences of the same
/// name within a pattern must bind consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    /// A named variable.
    Var(SymId),
    /// A constant symbol.
    Const(SymId),
}

impl Term {
    /// Check if this term is a variable.
    pub fn is_var(self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// Check if this term is a constant.
    pub fn is_const(self) -> bool {
        matches!(self, Term::Const(_))
    }
}

/// An atomic statement: a predicate applied to an ordered argument list.
///
/// Statements are immutable once constructed; instantiation produces a new
/// statement. Structural equality and hashing are derived, so statements can
/// key deduplication maps directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pred: SymId,
    args: SmallVec<[Term; 4]>,
}

impl Statement {
    /// Create a statement from a predicate and its arguments.
    pub fn new(pred: SymId, args: impl Into<SmallVec<[Term; 4]>>) -> Self {
        Self {
            pred,
            args: args.into(),
        }
    }

    /// The predicate symbol.
    pub fn pred(&self) -> SymId {
        self.pred
    }

    /// The ordered argument list.
    pub fn args(&self) -> &[Term] {
        &self.args
    }

    /// Check if the statement contains no variables.
    pub fn is_ground(&self) -> bool {
        self.args.iter().all(|t| t.is_const())
    }
}

/// A conditional statement: an ordered conjunction of conditions (the first
/// condition is resolved first) and a conclusion template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleForm {
    lhs: SmallVec<[Statement; 2]>,
    rhs: Statement,
}

impl RuleForm {
    /// Create a rule from its conditions and conclusion.
    ///
    /// Panics if `lhs` is empty; a rule with no conditions is a programming
    /// error, not a recoverable input.
    pub fn new(lhs: impl Into<SmallVec<[Statement; 2]>>, rhs: Statement) -> Self {
        let lhs = lhs.into();
        assert!(!lhs.is_empty(), "rule needs at least one condition");
        Self { lhs, rhs }
    }

    /// The conjunctive conditions, in resolution order.
    pub fn lhs(&self) -> &[Statement] {
        &self.lhs
    }

    /// The conclusion template.
    pub fn rhs(&self) -> &Statement {
        &self.rhs
    }
}

/// A fact or rule as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    Fact(Statement),
    Rule(RuleForm),
}

/// Render a statement as `(pred arg ...)`, variables prefixed with `?`.
pub fn format_statement(
    statement: &Statement,
    symbols: &SymbolStore,
) -> Result<String, FormatError> {
    let mut out = String::new();
    render(statement, symbols, &mut out)?;
    Ok(out)
}

/// Render a rule as `(cond) (cond) -> (conclusion)`.
pub fn format_rule(rule: &RuleForm, symbols: &SymbolStore) -> Result<String, FormatError> {
    let mut out = String::new();
    for cond in rule.lhs() {
        render(cond, symbols, &mut out)?;
        out.push(' ');
    }
    out.push_str("-> ");
    render(rule.rhs(), symbols, &mut out)?;
    Ok(out)
}

fn render(statement: &Statement, symbols: &SymbolStore, out: &mut String) -> Result<(), FormatError> {
    out.push('(');
    out.push_str(symbols.resolve(statement.pred()).ok_or(FormatError::UnknownSymbol)?);
    for arg in statement.args() {
        out.push(' ');
        match *arg {
            Term::Var(v) => {
                out.push('?');
                out.push_str(symbols.resolve(v).ok_or(FormatError::UnknownSymbol)?);
            }
            Term::Const(c) => {
                out.push_str(symbols.resolve(c).ok_or(FormatError::UnknownSymbol)?);
            }
        }
    }
    out.push(')');
    Ok(())
}
