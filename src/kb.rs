//! KnowledgeBase - fact/rule storage, deduplication, forward chaining, and
//! retraction with justification-based truth maintenance.
//!
//! Storage is an arena of slots per collection. Ids are never reused, so a
//! cascade in progress can hold ids whose slots have already been
//! tombstoned; those resolve to None and are skipped (idempotent removal).
//! Structural-equality lookups go through hash indexes keyed by the
//! statement (facts) or the (lhs, rhs) form (rules), not linear scans.

use crate::bindings::Bindings;
use crate::error::KbError;
use crate::infer::InferenceEngine;
use crate::metrics::ChainMetrics;
use crate::statement::{Item, RuleForm, Statement};
use crate::trace::{debug, debug_span, info, trace, warn};
use crate::unify::match_statement;
use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Stable identifier of a stored fact. Never reused after removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub(crate) u32);

impl FactId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Stable identifier of a stored rule. Never reused after removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) u32);

impl RuleId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to either kind of stored item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemId {
    Fact(FactId),
    Rule(RuleId),
}

/// The specific (fact, rule) combination that produced a derived item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Justification {
    pub fact: FactId,
    pub rule: RuleId,
}

/// Truth-maintenance bookkeeping shared by facts and rules.
///
/// `supports_facts` / `supports_rules` are non-owning back-references kept
/// as the exact inverse of the `supported_by` edges: a dependent appears in
/// a supporter's list once per justification pair naming that supporter.
#[derive(Debug, Clone, Default)]
struct Support {
    asserted: bool,
    supported_by: Vec<Justification>,
    supports_facts: Vec<FactId>,
    supports_rules: Vec<RuleId>,
}

impl Support {
    /// Bookkeeping for an item supplied directly by a caller.
    fn direct() -> Self {
        Self {
            asserted: true,
            ..Self::default()
        }
    }

    /// Bookkeeping for an item produced by inference.
    fn derived() -> Self {
        Self::default()
    }
}

/// A stored fact with its truth-maintenance bookkeeping.
#[derive(Debug, Clone)]
pub struct Fact {
    statement: Statement,
    support: Support,
}

impl Fact {
    /// The fact's statement.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// True when the fact was supplied directly by a caller and not since
    /// retracted.
    pub fn asserted(&self) -> bool {
        self.support.asserted
    }

    /// Justification pairs that derived this fact.
    pub fn supported_by(&self) -> &[Justification] {
        &self.support.supported_by
    }

    /// Facts whose continued existence depends on this fact.
    pub fn supports_facts(&self) -> &[FactId] {
        &self.support.supports_facts
    }

    /// Rules whose continued existence depends on this fact.
    pub fn supports_rules(&self) -> &[RuleId] {
        &self.support.supports_rules
    }
}

/// A stored rule with its truth-maintenance bookkeeping.
#[derive(Debug, Clone)]
pub struct Rule {
    form: RuleForm,
    support: Support,
}

impl Rule {
    /// The rule's conditions, in resolution order.
    pub fn lhs(&self) -> &[Statement] {
        self.form.lhs()
    }

    /// The rule's conclusion template.
    pub fn rhs(&self) -> &Statement {
        self.form.rhs()
    }

    /// The full (lhs, rhs) form.
    pub fn form(&self) -> &RuleForm {
        &self.form
    }

    /// True when the rule was supplied directly by a caller.
    pub fn asserted(&self) -> bool {
        self.support.asserted
    }

    /// Justification pairs that derived this rule.
    pub fn supported_by(&self) -> &[Justification] {
        &self.support.supported_by
    }

    /// Facts whose continued existence depends on this rule.
    pub fn supports_facts(&self) -> &[FactId] {
        &self.support.supports_facts
    }

    /// Rules whose continued existence depends on this rule.
    pub fn supports_rules(&self) -> &[RuleId] {
        &self.support.supports_rules
    }
}

/// Forward-chaining deduction store.
///
/// Owns the fact and rule collections exclusively; every insertion and
/// removal goes through it. Adding an item triggers inference against all
/// applicable stored items until no new derivations appear; retracting a
/// fact strips the justifications that mentioned it and cascades through
/// the support graph.
pub struct KnowledgeBase {
    facts: Vec<Option<Fact>>,
    rules: Vec<Option<Rule>>,
    fact_index: HashMap<Statement, FactId, FxBuildHasher>,
    rule_index: HashMap<RuleForm, RuleId, FxBuildHasher>,
    /// Newly inserted items awaiting their inference pass.
    pending: VecDeque<ItemId>,
    engine: InferenceEngine,
    metrics: ChainMetrics,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self {
            facts: Vec::new(),
            rules: Vec::new(),
            fact_index: HashMap::default(),
            rule_index: HashMap::default(),
            pending: VecDeque::new(),
            engine: InferenceEngine,
            metrics: ChainMetrics::new(),
        }
    }

    /// Number of live facts.
    pub fn fact_count(&self) -> usize {
        self.fact_index.len()
    }

    /// Number of live rules.
    pub fn rule_count(&self) -> usize {
        self.rule_index.len()
    }

    /// Live facts in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> + '_ {
        self.facts
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|fact| (FactId(i as u32), fact)))
    }

    /// Live rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|rule| (RuleId(i as u32), rule)))
    }

    /// Resolve a fact id to the stored fact, if still live.
    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id.0 as usize)?.as_ref()
    }

    /// Resolve a rule id to the stored rule, if still live.
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0 as usize)?.as_ref()
    }

    /// Canonical id of the stored fact structurally equal to `statement`.
    pub fn fact_id(&self, statement: &Statement) -> Option<FactId> {
        self.fact_index.get(statement).copied()
    }

    /// Canonical id of the stored rule structurally equal to `form`.
    pub fn rule_id(&self, form: &RuleForm) -> Option<RuleId> {
        self.rule_index.get(form).copied()
    }

    /// Metrics collected so far (all zero unless the `tracing` feature is
    /// enabled).
    pub fn metrics(&self) -> &ChainMetrics {
        &self.metrics
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut ChainMetrics {
        &mut self.metrics
    }

    /// Assert a caller-supplied fact or rule and derive everything that
    /// follows from it.
    pub fn assert(&mut self, item: Item) -> ItemId {
        info!(is_fact = matches!(item, Item::Fact(_)), "assert");
        self.add(item)
    }

    /// Lower-level entry point behind `assert`. Inserts the item (or merges
    /// it with the structurally equal stored instance, marking it asserted)
    /// and drives forward chaining to fixpoint.
    pub fn add(&mut self, item: Item) -> ItemId {
        let id = self.insert_or_merge(item);
        self.chain();
        id
    }

    fn insert_or_merge(&mut self, item: Item) -> ItemId {
        match item {
            Item::Fact(statement) => {
                if let Some(&id) = self.fact_index.get(&statement) {
                    trace!(id = id.raw(), "re-asserting existing fact");
                    self.metrics.merge();
                    self.facts[id.0 as usize]
                        .as_mut()
                        .expect("index entry is live")
                        .support
                        .asserted = true;
                    ItemId::Fact(id)
                } else {
                    let id = FactId(self.facts.len() as u32);
                    self.facts.push(Some(Fact {
                        statement: statement.clone(),
                        support: Support::direct(),
                    }));
                    self.fact_index.insert(statement, id);
                    self.pending.push_back(ItemId::Fact(id));
                    ItemId::Fact(id)
                }
            }
            Item::Rule(form) => {
                if let Some(&id) = self.rule_index.get(&form) {
                    trace!(id = id.raw(), "re-asserting existing rule");
                    self.metrics.merge();
                    self.rules[id.0 as usize]
                        .as_mut()
                        .expect("index entry is live")
                        .support
                        .asserted = true;
                    ItemId::Rule(id)
                } else {
                    let id = RuleId(self.rules.len() as u32);
                    self.rules.push(Some(Rule {
                        form: form.clone(),
                        support: Support::direct(),
                    }));
                    self.rule_index.insert(form, id);
                    self.pending.push_back(ItemId::Rule(id));
                    ItemId::Rule(id)
                }
            }
        }
    }

    /// Drive forward chaining to fixpoint: every newly inserted item is
    /// paired with all live items of the other kind, and derivations feed
    /// back into the worklist. The explicit queue replaces the recursive
    /// formulation, so derivation depth is bounded by memory, not the stack.
    fn chain(&mut self) {
        let _span = debug_span!("chain").entered();
        let engine = self.engine;
        while let Some(next) = self.pending.pop_front() {
            match next {
                ItemId::Fact(fact) => {
                    // Snapshot ids before inference mutates the collections
                    let rule_ids: Vec<RuleId> = self.rules().map(|(id, _)| id).collect();
                    for rule in rule_ids {
                        engine.infer(fact, rule, self);
                    }
                }
                ItemId::Rule(rule) => {
                    let fact_ids: Vec<FactId> = self.facts().map(|(id, _)| id).collect();
                    for fact in fact_ids {
                        engine.infer(fact, rule, self);
                    }
                }
            }
        }
    }

    /// Record a derivation: adopt the canonical stored instance if one
    /// exists, append the justification pair unless already present, mirror
    /// it into the supporters' back-reference lists, and enqueue the item
    /// for its own inference pass when it is new.
    pub(crate) fn add_derived(&mut self, item: Item, justification: Justification) -> ItemId {
        self.metrics.infer_match();
        let (id, created) = match item {
            Item::Fact(statement) => {
                if let Some(&id) = self.fact_index.get(&statement) {
                    (ItemId::Fact(id), false)
                } else {
                    let id = FactId(self.facts.len() as u32);
                    self.facts.push(Some(Fact {
                        statement: statement.clone(),
                        support: Support::derived(),
                    }));
                    self.fact_index.insert(statement, id);
                    self.metrics.fact_derived();
                    (ItemId::Fact(id), true)
                }
            }
            Item::Rule(form) => {
                if let Some(&id) = self.rule_index.get(&form) {
                    (ItemId::Rule(id), false)
                } else {
                    let id = RuleId(self.rules.len() as u32);
                    self.rules.push(Some(Rule {
                        form: form.clone(),
                        support: Support::derived(),
                    }));
                    self.rule_index.insert(form, id);
                    self.metrics.rule_derived();
                    (ItemId::Rule(id), true)
                }
            }
        };

        // Duplicate-pair suppression: the same (fact, rule) combination is
        // recorded at most once per derived item.
        let fresh_pair = {
            let support = self.support_mut(id).expect("canonical id is live");
            if support.supported_by.contains(&justification) {
                false
            } else {
                support.supported_by.push(justification);
                true
            }
        };
        if fresh_pair {
            self.push_backref(ItemId::Fact(justification.fact), id);
            self.push_backref(ItemId::Rule(justification.rule), id);
        }
        if !created {
            self.metrics.merge();
        }

        if created {
            trace!("derivation produced a new item");
            self.pending.push_back(id);
        }
        id
    }

    /// Query the store with a fact pattern.
    ///
    /// Matches the query against every stored fact in insertion order, one
    /// binding set per match. Zero matches is a normal outcome (`Ok` with an
    /// empty vector), distinct from a malformed (rule) query.
    pub fn ask(&self, query: &Item) -> Result<Vec<Bindings>, KbError> {
        let statement = match query {
            Item::Fact(statement) => statement,
            Item::Rule(_) => {
                warn!("invalid ask: query must be a fact");
                return Err(KbError::InvalidQuery);
            }
        };
        let mut results = Vec::new();
        for (_, fact) in self.facts() {
            if let Some(bindings) = match_statement(statement, fact.statement()) {
                results.push(bindings);
            }
        }
        Ok(results)
    }

    /// Withdraw a caller's assertion of a fact.
    ///
    /// Only facts may be retracted. The canonical stored instance loses its
    /// `asserted` flag; if nothing derives it either, it is removed and the
    /// cascade strips every justification that mentioned it, removing
    /// dependents whose own support becomes empty and which are not
    /// themselves asserted. A fact that is still derived survives the
    /// retraction of its assertion.
    pub fn retract(&mut self, item: &Item) -> Result<(), KbError> {
        let statement = match item {
            Item::Rule(_) => {
                warn!("invalid retract: rules cannot be retracted");
                return Err(KbError::RetractRule);
            }
            Item::Fact(statement) => statement,
        };
        let id = self.fact_index.get(statement).copied().ok_or_else(|| {
            warn!("invalid retract: fact not in the knowledge base");
            KbError::UnknownFact
        })?;

        debug!(id = id.raw(), "retracting fact");
        self.metrics.retraction();
        let fact = self.facts[id.0 as usize]
            .as_mut()
            .expect("index entry is live");
        fact.support.asserted = false;
        if fact.support.supported_by.is_empty() {
            self.remove_cascade(ItemId::Fact(id));
        }
        Ok(())
    }

    /// Cascading delete for an item whose support is gone.
    ///
    /// Iterative with an explicit stack. The dependents list is moved out of
    /// the tombstoned slot before any other mutation, so iteration never
    /// observes the structure mid-update. Already-removed ids resolve to
    /// dead slots and are skipped.
    fn remove_cascade(&mut self, root: ItemId) {
        let mut stack: Vec<ItemId> = vec![root];
        while let Some(target) = stack.pop() {
            let (dep_facts, dep_rules) = match target {
                ItemId::Fact(id) => {
                    let Some(fact) = self.facts[id.0 as usize].take() else {
                        continue;
                    };
                    debug_assert!(fact.support.supported_by.is_empty());
                    self.fact_index.remove(&fact.statement);
                    trace!(id = id.raw(), "removing fact");
                    (fact.support.supports_facts, fact.support.supports_rules)
                }
                ItemId::Rule(id) => {
                    let Some(rule) = self.rules[id.0 as usize].take() else {
                        continue;
                    };
                    debug_assert!(rule.support.supported_by.is_empty());
                    self.rule_index.remove(&rule.form);
                    trace!(id = id.raw(), "removing rule");
                    (rule.support.supports_facts, rule.support.supports_rules)
                }
            };
            self.metrics.cascade_removal();

            for dep in dep_facts {
                if self.strip_support(ItemId::Fact(dep), target) {
                    stack.push(ItemId::Fact(dep));
                }
            }
            for dep in dep_rules {
                if self.strip_support(ItemId::Rule(dep), target) {
                    stack.push(ItemId::Rule(dep));
                }
            }
        }
    }

    /// Remove every justification pair in `dependent` that mentions
    /// `removed`, unlinking the surviving pair members' back-references.
    /// Returns true when the dependent itself must now be removed: its
    /// support is empty and it is not directly asserted.
    fn strip_support(&mut self, dependent: ItemId, removed: ItemId) -> bool {
        let mut dropped: SmallVec<[Justification; 4]> = SmallVec::new();
        let cascade = {
            let Some(support) = self.support_mut(dependent) else {
                return false;
            };
            support.supported_by.retain(|justification| {
                let mentions = match removed {
                    ItemId::Fact(f) => justification.fact == f,
                    ItemId::Rule(r) => justification.rule == r,
                };
                if mentions {
                    dropped.push(*justification);
                }
                !mentions
            });
            support.supported_by.is_empty() && !support.asserted
        };
        // Keep supports_* the exact inverse of supported_by: the other
        // member of each dropped pair no longer supports the dependent.
        for justification in dropped {
            if ItemId::Fact(justification.fact) != removed {
                self.drop_backref(ItemId::Fact(justification.fact), dependent);
            }
            if ItemId::Rule(justification.rule) != removed {
                self.drop_backref(ItemId::Rule(justification.rule), dependent);
            }
        }
        cascade
    }

    fn support_mut(&mut self, id: ItemId) -> Option<&mut Support> {
        match id {
            ItemId::Fact(f) => self
                .facts
                .get_mut(f.0 as usize)?
                .as_mut()
                .map(|fact| &mut fact.support),
            ItemId::Rule(r) => self
                .rules
                .get_mut(r.0 as usize)?
                .as_mut()
                .map(|rule| &mut rule.support),
        }
    }

    /// Record `dependent` in `supporter`'s back-reference list.
    fn push_backref(&mut self, supporter: ItemId, dependent: ItemId) {
        let support = self
            .support_mut(supporter)
            .expect("supporter is live during inference");
        match dependent {
            ItemId::Fact(f) => support.supports_facts.push(f),
            ItemId::Rule(r) => support.supports_rules.push(r),
        }
    }

    /// Remove one occurrence of `dependent` from `supporter`'s
    /// back-reference list, if the supporter is still live.
    fn drop_backref(&mut self, supporter: ItemId, dependent: ItemId) {
        let Some(support) = self.support_mut(supporter) else {
            return;
        };
        match dependent {
            ItemId::Fact(f) => {
                if let Some(pos) = support.supports_facts.iter().position(|&x| x == f) {
                    support.supports_facts.remove(pos);
                }
            }
            ItemId::Rule(r) => {
                if let Some(pos) = support.supports_rules.iter().position(|&x| x == r) {
                    support.supports_rules.remove(pos);
                }
            }
        }
    }

    /// Check the support-graph invariants, panicking on corruption.
    ///
    /// - every justification pair references live items
    /// - `supports_facts`/`supports_rules` are the exact inverse, as
    ///   multisets, of the `supported_by` edges
    /// - every live unasserted item carries at least one justification
    /// - the dedup indexes and the arenas agree
    ///
    /// A violation is a programming error in the store itself, not a
    /// recoverable condition.
    pub fn validate_support_graph(&self) {
        let mut expected: HashMap<(ItemId, ItemId), usize, FxBuildHasher> = HashMap::default();
        let mut actual: HashMap<(ItemId, ItemId), usize, FxBuildHasher> = HashMap::default();

        for (id, fact) in self.facts() {
            let this = ItemId::Fact(id);
            assert!(
                fact.asserted() || !fact.supported_by().is_empty(),
                "live fact with neither assertion nor support"
            );
            assert_eq!(
                self.fact_id(fact.statement()),
                Some(id),
                "fact index out of sync"
            );
            for justification in fact.supported_by() {
                assert!(
                    self.fact(justification.fact).is_some(),
                    "justification references a dead fact"
                );
                assert!(
                    self.rule(justification.rule).is_some(),
                    "justification references a dead rule"
                );
                *expected
                    .entry((ItemId::Fact(justification.fact), this))
                    .or_default() += 1;
                *expected
                    .entry((ItemId::Rule(justification.rule), this))
                    .or_default() += 1;
            }
            for &dep in fact.supports_facts() {
                *actual.entry((this, ItemId::Fact(dep))).or_default() += 1;
            }
            for &dep in fact.supports_rules() {
                *actual.entry((this, ItemId::Rule(dep))).or_default() += 1;
            }
        }

        for (id, rule) in self.rules() {
            let this = ItemId::Rule(id);
            assert!(
                rule.asserted() || !rule.supported_by().is_empty(),
                "live rule with neither assertion nor support"
            );
            assert_eq!(
                self.rule_id(rule.form()),
                Some(id),
                "rule index out of sync"
            );
            for justification in rule.supported_by() {
                assert!(
                    self.fact(justification.fact).is_some(),
                    "justification references a dead fact"
                );
                assert!(
                    self.rule(justification.rule).is_some(),
                    "justification references a dead rule"
                );
                *expected
                    .entry((ItemId::Fact(justification.fact), this))
                    .or_default() += 1;
                *expected
                    .entry((ItemId::Rule(justification.rule), this))
                    .or_default() += 1;
            }
            for &dep in rule.supports_facts() {
                *actual.entry((this, ItemId::Fact(dep))).or_default() += 1;
            }
            for &dep in rule.supports_rules() {
                *actual.entry((this, ItemId::Rule(dep))).or_default() += 1;
            }
        }

        assert_eq!(
            expected, actual,
            "supports_* lists are not the inverse of supported_by"
        );
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/kb.rs"]
mod tests;
