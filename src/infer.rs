//! InferenceEngine - the single forward-chaining derivation step.
//!
//! Chaining is condition-at-a-time rather than whole-rule unification: a
//! fact consuming a rule's first condition yields a first-class partial rule
//! over the remaining instantiated conditions, so later facts continue the
//! chain without re-matching what was already consumed. The leftmost
//! condition is always the one resolved; there is no reordering.

use crate::kb::{FactId, ItemId, Justification, KnowledgeBase, RuleId};
use crate::statement::{Item, RuleForm, Statement};
use crate::trace::trace;
use crate::unify::{instantiate, match_statement};
use smallvec::SmallVec;

/// Attempts single derivation steps against a knowledge base.
#[derive(Clone, Copy, Debug, Default)]
pub struct InferenceEngine;

impl InferenceEngine {
    /// Attempt one derivation from `fact` and `rule`.
    ///
    /// Matches the fact's statement against the rule's first condition. On
    /// success with bindings β: a single-condition rule completes, deriving
    /// the instantiated conclusion; a longer rule derives a partial rule
    /// whose conditions are the remaining ones instantiated under β. Either
    /// way the (fact, rule) justification is recorded on the canonical
    /// instance of the conclusion. A failed match, or a dead id, leaves
    /// every structure untouched and returns None.
    pub fn infer(self, fact: FactId, rule: RuleId, kb: &mut KnowledgeBase) -> Option<ItemId> {
        kb.metrics_mut().infer_attempt();

        let fact_rec = kb.fact(fact)?;
        let rule_rec = kb.rule(rule)?;

        let bindings = match_statement(fact_rec.statement(), &rule_rec.lhs()[0])?;

        let item = if rule_rec.lhs().len() == 1 {
            Item::Fact(instantiate(rule_rec.rhs(), &bindings))
        } else {
            let remaining: SmallVec<[Statement; 2]> = rule_rec.lhs()[1..]
                .iter()
                .map(|condition| instantiate(condition, &bindings))
                .collect();
            Item::Rule(RuleForm::new(remaining, instantiate(rule_rec.rhs(), &bindings)))
        };

        trace!(
            fact = fact.raw(),
            rule = rule.raw(),
            "first condition matched"
        );
        Some(kb.add_derived(item, Justification { fact, rule }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fact, rule, setup, stmt};

    #[test]
    fn mismatch_has_no_effect() {
        let mut symbols = setup();
        let mut kb = KnowledgeBase::new();
        let rule_id = match kb.assert(rule(&mut symbols, &["isMan ?x"], "isMortal ?x")) {
            ItemId::Rule(id) => id,
            other => panic!("expected rule id, got {other:?}"),
        };
        let fact_id = match kb.assert(fact(&mut symbols, "isDog Rex")) {
            ItemId::Fact(id) => id,
            other => panic!("expected fact id, got {other:?}"),
        };
        assert_eq!(kb.fact_count(), 1);

        let engine = InferenceEngine;
        assert_eq!(engine.infer(fact_id, rule_id, &mut kb), None);
        assert_eq!(kb.fact_count(), 1);
        assert_eq!(kb.rule_count(), 1);
        kb.validate_support_graph();
    }

    #[test]
    fn single_condition_rule_derives_instantiated_conclusion() {
        let mut symbols = setup();
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(&mut symbols, &["isMan ?x"], "isMortal ?x"));
        kb.assert(fact(&mut symbols, "isMan Socrates"));

        let derived = stmt(&mut symbols, "isMortal Socrates");
        let id = kb.fact_id(&derived).expect("conclusion should be derived");
        let stored = kb.fact(id).unwrap();
        assert!(!stored.asserted());
        assert_eq!(stored.supported_by().len(), 1);
        kb.validate_support_graph();
    }

    #[test]
    fn multi_condition_rule_derives_partial_rule() {
        let mut symbols = setup();
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(
            &mut symbols,
            &["isMan ?x", "isMortal ?x"],
            "willDie ?x",
        ));
        kb.assert(fact(&mut symbols, "isMan Socrates"));

        // The partial rule carries the remaining condition, instantiated
        let remaining = stmt(&mut symbols, "isMortal Socrates");
        let conclusion = stmt(&mut symbols, "willDie Socrates");
        let partial = RuleForm::new(vec![remaining], conclusion);
        let id = kb.rule_id(&partial).expect("partial rule should exist");
        let stored = kb.rule(id).unwrap();
        assert!(!stored.asserted());
        assert_eq!(stored.supported_by().len(), 1);
        kb.validate_support_graph();
    }

    #[test]
    fn repeated_infer_suppresses_duplicate_pair() {
        let mut symbols = setup();
        let mut kb = KnowledgeBase::new();
        let rule_id = match kb.assert(rule(&mut symbols, &["isMan ?x"], "isMortal ?x")) {
            ItemId::Rule(id) => id,
            other => panic!("expected rule id, got {other:?}"),
        };
        let fact_id = match kb.assert(fact(&mut symbols, "isMan Socrates")) {
            ItemId::Fact(id) => id,
            other => panic!("expected fact id, got {other:?}"),
        };

        let derived = stmt(&mut symbols, "isMortal Socrates");
        let derived_id = kb.fact_id(&derived).unwrap();
        assert_eq!(kb.fact(derived_id).unwrap().supported_by().len(), 1);

        // Re-running the identical derivation must not add a second pair
        let engine = InferenceEngine;
        let result = engine.infer(fact_id, rule_id, &mut kb);
        assert_eq!(result, Some(ItemId::Fact(derived_id)));
        assert_eq!(kb.fact(derived_id).unwrap().supported_by().len(), 1);
        kb.validate_support_graph();
    }
}
