//! In-memory queue store for tests/dev.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use ledgerpilot_core::{CounterpartyId, DomainError, DomainResult, QueueItemId, TenantId};

use crate::item::{QueueItem, Status};
use crate::store::QueueStore;

#[derive(Debug, Default)]
struct State {
    items: HashMap<QueueItemId, QueueItem>,
    /// Pending-status index per tenant; ids are v7 so the set orders by
    /// creation time.
    pending: HashMap<TenantId, BTreeSet<QueueItemId>>,
}

#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    state: Mutex<State>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DomainResult<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| DomainError::persistence("queue store lock poisoned"))
    }
}

impl QueueStore for InMemoryQueueStore {
    fn insert(&self, item: QueueItem) -> DomainResult<()> {
        let mut state = self.lock()?;
        if state.items.contains_key(&item.id) {
            return Err(DomainError::conflict(format!(
                "queue item {} already exists",
                item.id
            )));
        }
        if item.status == Status::Pending {
            state.pending.entry(item.tenant_id).or_default().insert(item.id);
        }
        state.items.insert(item.id, item);
        Ok(())
    }

    fn get(&self, tenant_id: TenantId, item_id: QueueItemId) -> DomainResult<QueueItem> {
        let state = self.lock()?;
        match state.items.get(&item_id) {
            Some(item) if item.tenant_id == tenant_id => Ok(item.clone()),
            _ => Err(DomainError::not_found(format!("queue item {item_id}"))),
        }
    }

    fn update(&self, item: QueueItem) -> DomainResult<()> {
        let mut state = self.lock()?;
        let existing = state
            .items
            .get(&item.id)
            .ok_or_else(|| DomainError::not_found(format!("queue item {}", item.id)))?;

        if existing.tenant_id != item.tenant_id {
            return Err(DomainError::not_found(format!("queue item {}", item.id)));
        }
        if existing.status.is_terminal() {
            return Err(DomainError::conflict(format!(
                "queue item {} is already {:?}",
                item.id, existing.status
            )));
        }
        if existing.status == Status::Pending
            && item.status.is_terminal()
            && item.resolution.is_none()
        {
            return Err(DomainError::validation(
                "terminal queue item must carry a resolution",
            ));
        }

        if item.status.is_terminal() {
            if let Some(set) = state.pending.get_mut(&item.tenant_id) {
                set.remove(&item.id);
            }
        }
        state.items.insert(item.id, item);
        Ok(())
    }

    fn pending_for_tenant(&self, tenant_id: TenantId) -> DomainResult<Vec<QueueItem>> {
        let state = self.lock()?;
        let ids = state.pending.get(&tenant_id);
        Ok(ids
            .into_iter()
            .flatten()
            .filter_map(|id| state.items.get(id).cloned())
            .collect())
    }

    fn pending_for_counterparty(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
    ) -> DomainResult<Vec<QueueItem>> {
        Ok(self
            .pending_for_tenant(tenant_id)?
            .into_iter()
            .filter(|item| &item.proposal.counterparty == counterparty)
            .collect())
    }
}
