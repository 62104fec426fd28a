//! Matching and instantiation over statements.
//!
//! Statements are flat (a predicate over constants and variables), so
//! matching is a single left-to-right pass over argument pairs with
//! dereference through the accumulated bindings. Variables on either side
//! may bind, consistent with the shared variable namespace of patterns and
//! stored statements.

use crate::bindings::Bindings;
use crate::statement::{Statement, Term};
use smallvec::SmallVec;

/// Match a pattern statement against a target statement.
///
/// Succeeds iff the two statements can be made syntactically identical by
/// substituting variables, returning the binding set. Returns None on
/// mismatch; no partial bindings escape.
pub fn match_statement(pattern: &Statement, target: &Statement) -> Option<Bindings> {
    if pattern.pred() != target.pred() {
        return None;
    }
    if pattern.args().len() != target.args().len() {
        return None;
    }

    let mut bindings = Bindings::new();
    for (&p, &t) in pattern.args().iter().zip(target.args()) {
        let p = bindings.resolve(p);
        let t = bindings.resolve(t);
        if p == t {
            // Same constant or same variable - already consistent
            continue;
        }
        match (p, t) {
            (Term::Var(v), other) => bindings.bind(v, other),
            (other, Term::Var(v)) => bindings.bind(v, other),
            (Term::Const(_), Term::Const(_)) => return None,
        }
    }

    Some(bindings)
}

/// Instantiate a statement template under a binding set.
///
/// Bound variables are substituted (following variable chains); unbound
/// variables are left as-is. Produces a new statement.
pub fn instantiate(template: &Statement, bindings: &Bindings) -> Statement {
    let args: SmallVec<[Term; 4]> = template
        .args()
        .iter()
        .map(|&t| bindings.resolve(t))
        .collect();
    Statement::new(template.pred(), args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{setup, stmt};

    // ========== MATCHING: GROUND STATEMENTS ==========

    #[test]
    fn match_identical_ground_statements() {
        let mut symbols = setup();
        let a = stmt(&mut symbols, "isMan Socrates");
        let b = stmt(&mut symbols, "isMan Socrates");
        let bindings = match_statement(&a, &b).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn match_fails_on_different_predicate() {
        let mut symbols = setup();
        let a = stmt(&mut symbols, "isMan Socrates");
        let b = stmt(&mut symbols, "isMortal Socrates");
        assert!(match_statement(&a, &b).is_none());
    }

    #[test]
    fn match_fails_on_different_constant() {
        let mut symbols = setup();
        let a = stmt(&mut symbols, "isMan Socrates");
        let b = stmt(&mut symbols, "isMan Plato");
        assert!(match_statement(&a, &b).is_none());
    }

    #[test]
    fn match_fails_on_different_arity() {
        let mut symbols = setup();
        let a = stmt(&mut symbols, "rel a");
        let b = stmt(&mut symbols, "rel a b");
        assert!(match_statement(&a, &b).is_none());
    }

    // ========== MATCHING: VARIABLES ==========

    #[test]
    fn match_binds_pattern_variable() {
        let mut symbols = setup();
        let pattern = stmt(&mut symbols, "isMan ?x");
        let target = stmt(&mut symbols, "isMan Socrates");
        let bindings = match_statement(&pattern, &target).unwrap();

        let x = symbols.intern("x");
        let socrates = Term::Const(symbols.intern("Socrates"));
        assert_eq!(bindings.get(x), Some(socrates));
    }

    #[test]
    fn match_binds_target_variable() {
        let mut symbols = setup();
        let pattern = stmt(&mut symbols, "isMan Socrates");
        let target = stmt(&mut symbols, "isMan ?x");
        let bindings = match_statement(&pattern, &target).unwrap();

        let x = symbols.intern("x");
        let socrates = Term::Const(symbols.intern("Socrates"));
        assert_eq!(bindings.get(x), Some(socrates));
    }

    #[test]
    fn repeated_variable_must_bind_consistently() {
        let mut symbols = setup();
        let pattern = stmt(&mut symbols, "likes ?x ?x");
        let ok = stmt(&mut symbols, "likes Plato Plato");
        let bad = stmt(&mut symbols, "likes Plato Socrates");

        assert!(match_statement(&pattern, &ok).is_some());
        assert!(match_statement(&pattern, &bad).is_none());
    }

    #[test]
    fn variable_to_variable_binding_chains() {
        let mut symbols = setup();
        let pattern = stmt(&mut symbols, "likes ?x ?x");
        let target = stmt(&mut symbols, "likes ?y Plato");
        let bindings = match_statement(&pattern, &target).unwrap();

        // ?x bound through ?y, which picks up Plato from the second argument
        let x = symbols.intern("x");
        let plato = Term::Const(symbols.intern("Plato"));
        assert_eq!(bindings.resolve(Term::Var(x)), plato);
    }

    #[test]
    fn match_same_variable_both_sides() {
        let mut symbols = setup();
        let pattern = stmt(&mut symbols, "isMan ?x");
        let target = stmt(&mut symbols, "isMan ?x");
        let bindings = match_statement(&pattern, &target).unwrap();
        assert!(bindings.is_empty());
    }

    // ========== INSTANTIATION ==========

    #[test]
    fn instantiate_substitutes_bound_variables() {
        let mut symbols = setup();
        let pattern = stmt(&mut symbols, "isMan ?x");
        let target = stmt(&mut symbols, "isMan Socrates");
        let bindings = match_statement(&pattern, &target).unwrap();

        let template = stmt(&mut symbols, "willDie ?x");
        let expected = stmt(&mut symbols, "willDie Socrates");
        assert_eq!(instantiate(&template, &bindings), expected);
    }

    #[test]
    fn instantiate_leaves_unbound_variables() {
        let mut symbols = setup();
        let pattern = stmt(&mut symbols, "isMan ?x");
        let target = stmt(&mut symbols, "isMan Socrates");
        let bindings = match_statement(&pattern, &target).unwrap();

        let template = stmt(&mut symbols, "related ?x ?y");
        let expected = stmt(&mut symbols, "related Socrates ?y");
        assert_eq!(instantiate(&template, &bindings), expected);
    }

    #[test]
    fn instantiate_with_empty_bindings_is_identity() {
        let mut symbols = setup();
        let template = stmt(&mut symbols, "related ?x ?y");
        assert_eq!(instantiate(&template, &Bindings::new()), template);
    }
}
