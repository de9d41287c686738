//! In-memory pattern store for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::info;

use ledgerpilot_core::{CounterpartyId, DomainError, DomainResult, PatternId, TenantId};
use ledgerpilot_ledger::DocumentCategory;

use crate::pattern::{LearnedPattern, PatternAction, PatternPredicate};
use crate::store::PatternStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PredicateKey {
    tenant_id: TenantId,
    predicate: PatternPredicate,
}

#[derive(Debug, Default)]
struct State {
    patterns: HashMap<PredicateKey, LearnedPattern>,
    by_id: HashMap<PatternId, PredicateKey>,
}

/// In-memory [`PatternStore`].
///
/// A single mutex covers the whole read-modify-write of `upsert` and
/// `record_outcome`, which makes them atomic per predicate key; `find_match`
/// takes the same lock so it can never observe a half-written pattern.
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    state: Mutex<State>,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DomainResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| DomainError::persistence("pattern store lock poisoned"))
    }
}

impl PatternStore for InMemoryPatternStore {
    fn find_match(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
        category: DocumentCategory,
        total: i64,
    ) -> DomainResult<Option<LearnedPattern>> {
        let state = self.lock()?;

        let best = state
            .patterns
            .values()
            .filter(|p| p.tenant_id == tenant_id && p.active)
            .filter(|p| p.predicate.matches(counterparty, category, total))
            .max_by(|a, b| {
                a.predicate
                    .specificity()
                    .cmp(&b.predicate.specificity())
                    .then(
                        a.success_rate()
                            .partial_cmp(&b.success_rate())
                            .unwrap_or(core::cmp::Ordering::Equal),
                    )
                    .then(a.updated_at.cmp(&b.updated_at))
                    // Iteration order over the map is arbitrary; pin full
                    // ties to the id so repeated lookups agree.
                    .then(a.id.cmp(&b.id))
            })
            .cloned();

        Ok(best)
    }

    fn upsert(
        &self,
        tenant_id: TenantId,
        predicate: PatternPredicate,
        action: PatternAction,
    ) -> DomainResult<LearnedPattern> {
        let mut state = self.lock()?;
        let key = PredicateKey {
            tenant_id,
            predicate: predicate.clone(),
        };

        if let Some(existing) = state.patterns.get_mut(&key) {
            existing.strengthen(&action);
            let strengthened = existing.clone();
            info!(
                tenant = %tenant_id,
                pattern = %strengthened.id,
                confirmations = strengthened.confirmations,
                boost = strengthened.action.boost,
                "pattern strengthened"
            );
            return Ok(strengthened);
        }

        let pattern = LearnedPattern::new(tenant_id, predicate, action);
        state.by_id.insert(pattern.id, key.clone());
        state.patterns.insert(key, pattern.clone());
        info!(
            tenant = %tenant_id,
            pattern = %pattern.id,
            counterparty = %pattern.predicate.counterparty,
            "pattern learned"
        );
        Ok(pattern)
    }

    fn record_outcome(
        &self,
        pattern_id: PatternId,
        confirmed: bool,
    ) -> DomainResult<LearnedPattern> {
        let mut state = self.lock()?;
        let key = state
            .by_id
            .get(&pattern_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("pattern {pattern_id}")))?;
        let pattern = state
            .patterns
            .get_mut(&key)
            .ok_or_else(|| DomainError::not_found(format!("pattern {pattern_id}")))?;

        let was_active = pattern.active;
        pattern.record_outcome(confirmed);
        if was_active && !pattern.active {
            info!(
                pattern = %pattern_id,
                success_rate = pattern.success_rate(),
                "pattern deactivated after repeated contradictions"
            );
        }
        Ok(pattern.clone())
    }

    fn get(&self, pattern_id: PatternId) -> DomainResult<LearnedPattern> {
        let state = self.lock()?;
        let key = state
            .by_id
            .get(&pattern_id)
            .ok_or_else(|| DomainError::not_found(format!("pattern {pattern_id}")))?;
        state
            .patterns
            .get(key)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("pattern {pattern_id}")))
    }

    fn deactivate(&self, pattern_id: PatternId) -> DomainResult<()> {
        let mut state = self.lock()?;
        let key = state
            .by_id
            .get(&pattern_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("pattern {pattern_id}")))?;
        if let Some(pattern) = state.patterns.get_mut(&key) {
            pattern.active = false;
        }
        Ok(())
    }
}
