use crate::statement::Term;
use crate::symbol::SymId;
use smallvec::SmallVec;

/// A binding set: an insertion-ordered map from variable names to terms.
///
/// A variable may be bound to another variable, forming a chain that is
/// resolved when the binding set is consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    pairs: SmallVec<[(SymId, Term); 4]>,
}

impl Bindings {
    /// Create an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a term, replacing any existing binding.
    pub fn bind(&mut self, var: SymId, term: Term) {
        if let Some(entry) = self.pairs.iter_mut().find(|(v, _)| *v == var) {
            entry.1 = term;
        } else {
            self.pairs.push((var, term));
        }
    }

    /// Get the binding for a variable, if any.
    pub fn get(&self, var: SymId) -> Option<Term> {
        self.pairs
            .iter()
            .find(|(v, _)| *v == var)
            .map(|&(_, t)| t)
    }

    /// Check if a variable is bound.
    pub fn is_bound(&self, var: SymId) -> bool {
        self.get(var).is_some()
    }

    /// Check if the binding set is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Iterator over (variable, term) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (SymId, Term)> + '_ {
        self.pairs.iter().copied()
    }

    /// Follow a chain of variable-to-variable bindings until a constant, an
    /// unbound variable, or a cycle. Returns the final term in the chain.
    pub fn resolve(&self, term: Term) -> Term {
        let mut current = term;
        let mut visited: SmallVec<[SymId; 8]> = SmallVec::new();
        while let Term::Var(v) = current {
            // Cycle: stop at the variable we have already seen
            if visited.contains(&v) {
                return current;
            }
            visited.push(v);
            match self.get(v) {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }
}
