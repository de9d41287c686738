use std::sync::Arc;

use ledgerpilot_core::{CounterpartyId, DomainResult, PatternId, TenantId};
use ledgerpilot_ledger::DocumentCategory;

use crate::pattern::{LearnedPattern, PatternAction, PatternPredicate};

/// Store of learned correction patterns.
///
/// Contract:
/// - `upsert` is atomic per predicate key: concurrent corrections for the
///   same counterparty strengthen one pattern, they do not race into two.
/// - `find_match` only ever sees fully-written patterns; it may lag a
///   just-committed upsert, never return a half-written one.
/// - Patterns are deactivated, never deleted.
pub trait PatternStore: Send + Sync {
    /// Best active pattern for a proposal's counterparty/category/amount.
    ///
    /// Most specific predicate wins; ties break by higher success rate, then
    /// most recently updated.
    fn find_match(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
        category: DocumentCategory,
        total: i64,
    ) -> DomainResult<Option<LearnedPattern>>;

    /// Create a pattern, or strengthen the existing one with the same
    /// predicate.
    fn upsert(
        &self,
        tenant_id: TenantId,
        predicate: PatternPredicate,
        action: PatternAction,
    ) -> DomainResult<LearnedPattern>;

    /// Feed a confirmation/contradiction back into the pattern's counters.
    /// May deactivate the pattern once the success floor is crossed.
    fn record_outcome(&self, pattern_id: PatternId, confirmed: bool)
    -> DomainResult<LearnedPattern>;

    fn get(&self, pattern_id: PatternId) -> DomainResult<LearnedPattern>;

    fn deactivate(&self, pattern_id: PatternId) -> DomainResult<()>;
}

impl<S> PatternStore for Arc<S>
where
    S: PatternStore + ?Sized,
{
    fn find_match(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
        category: DocumentCategory,
        total: i64,
    ) -> DomainResult<Option<LearnedPattern>> {
        (**self).find_match(tenant_id, counterparty, category, total)
    }

    fn upsert(
        &self,
        tenant_id: TenantId,
        predicate: PatternPredicate,
        action: PatternAction,
    ) -> DomainResult<LearnedPattern> {
        (**self).upsert(tenant_id, predicate, action)
    }

    fn record_outcome(
        &self,
        pattern_id: PatternId,
        confirmed: bool,
    ) -> DomainResult<LearnedPattern> {
        (**self).record_outcome(pattern_id, confirmed)
    }

    fn get(&self, pattern_id: PatternId) -> DomainResult<LearnedPattern> {
        (**self).get(pattern_id)
    }

    fn deactivate(&self, pattern_id: PatternId) -> DomainResult<()> {
        (**self).deactivate(pattern_id)
    }
}
