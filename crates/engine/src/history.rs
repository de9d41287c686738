//! Seam to the collaborator that owns transaction history.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ledgerpilot_core::{CounterpartyId, DomainError, DomainResult, TenantId};
use ledgerpilot_scoring::{HistoricalEntry, TransactionHistory};

/// Supplies the history snapshot the scorer works on.
///
/// The core does not own posted-history analytics; a reporting collaborator
/// does. This trait is the boundary: implementations may hit a read model, a
/// cache, or (in tests) an in-memory map.
pub trait HistoryProvider: Send + Sync {
    fn history_for(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
    ) -> DomainResult<TransactionHistory>;
}

impl<H> HistoryProvider for Arc<H>
where
    H: HistoryProvider + ?Sized,
{
    fn history_for(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
    ) -> DomainResult<TransactionHistory> {
        (**self).history_for(tenant_id, counterparty)
    }
}

/// In-memory history provider for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryHistoryProvider {
    entries: RwLock<HashMap<TenantId, Vec<HistoricalEntry>>>,
}

impl InMemoryHistoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tenant_id: TenantId, entry: HistoricalEntry) -> DomainResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| DomainError::persistence("history lock poisoned"))?;
        map.entry(tenant_id).or_default().push(entry);
        Ok(())
    }
}

impl HistoryProvider for InMemoryHistoryProvider {
    fn history_for(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
    ) -> DomainResult<TransactionHistory> {
        let map = self
            .entries
            .read()
            .map_err(|_| DomainError::persistence("history lock poisoned"))?;
        let entries = map
            .get(&tenant_id)
            .map(|all| {
                all.iter()
                    .filter(|e| &e.counterparty == counterparty)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(TransactionHistory::new(entries))
    }
}
