use std::sync::Arc;

use ledgerpilot_core::{CounterpartyId, DomainResult, QueueItemId, TenantId};

use crate::item::QueueItem;

/// Store of review queue items.
///
/// Contract:
/// - `update` must refuse to touch an item whose stored state is terminal —
///   the state machine's one-way door is enforced at the storage seam too.
/// - Reads are tenant-scoped; an id from another tenant does not exist.
pub trait QueueStore: Send + Sync {
    fn insert(&self, item: QueueItem) -> DomainResult<()>;

    fn get(&self, tenant_id: TenantId, item_id: QueueItemId) -> DomainResult<QueueItem>;

    /// Persist a mutated item. Rejects updates to terminal items and any
    /// status regression.
    fn update(&self, item: QueueItem) -> DomainResult<()>;

    /// All Pending items for a tenant, oldest first.
    fn pending_for_tenant(&self, tenant_id: TenantId) -> DomainResult<Vec<QueueItem>>;

    /// Pending items for one counterparty, oldest first. Used by the learner
    /// to find items a fresh pattern might resolve.
    fn pending_for_counterparty(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
    ) -> DomainResult<Vec<QueueItem>>;
}

impl<S> QueueStore for Arc<S>
where
    S: QueueStore + ?Sized,
{
    fn insert(&self, item: QueueItem) -> DomainResult<()> {
        (**self).insert(item)
    }

    fn get(&self, tenant_id: TenantId, item_id: QueueItemId) -> DomainResult<QueueItem> {
        (**self).get(tenant_id, item_id)
    }

    fn update(&self, item: QueueItem) -> DomainResult<()> {
        (**self).update(item)
    }

    fn pending_for_tenant(&self, tenant_id: TenantId) -> DomainResult<Vec<QueueItem>> {
        (**self).pending_for_tenant(tenant_id)
    }

    fn pending_for_counterparty(
        &self,
        tenant_id: TenantId,
        counterparty: &CounterpartyId,
    ) -> DomainResult<Vec<QueueItem>> {
        (**self).pending_for_counterparty(tenant_id, counterparty)
    }
}
