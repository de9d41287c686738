use ledgerpilot_core::TenantId;

/// Helper trait for tenant-scoped messages.
///
/// Marks message types that carry a tenant id, so infrastructure (workers,
/// subscription loops) can filter or pin processing to one tenant without
/// knowing the concrete event type.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;
}
