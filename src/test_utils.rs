use crate::statement::{Item, RuleForm, Statement, Term};
use crate::symbol::SymbolStore;
use smallvec::SmallVec;

pub(crate) fn setup() -> SymbolStore {
    SymbolStore::new()
}

/// Build a statement from whitespace-separated tokens: the first token is
/// the predicate, `?`-prefixed tokens are variables, everything else is a
/// constant. Test convenience only; the real parser is external.
pub(crate) fn stmt(symbols: &mut SymbolStore, src: &str) -> Statement {
    let mut parts = src.split_whitespace();
    let pred = symbols.intern(parts.next().expect("statement needs a predicate"));
    let args: SmallVec<[Term; 4]> = parts
        .map(|token| match token.strip_prefix('?') {
            Some(name) => Term::Var(symbols.intern(name)),
            None => Term::Const(symbols.intern(token)),
        })
        .collect();
    Statement::new(pred, args)
}

pub(crate) fn fact(symbols: &mut SymbolStore, src: &str) -> Item {
    Item::Fact(stmt(symbols, src))
}

pub(crate) fn rule(symbols: &mut SymbolStore, lhs: &[&str], rhs: &str) -> Item {
    let lhs: SmallVec<[Statement; 2]> = lhs.iter().map(|src| stmt(symbols, src)).collect();
    let rhs = stmt(symbols, rhs);
    Item::Rule(RuleForm::new(lhs, rhs))
}
