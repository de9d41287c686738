//! Per-tenant auto-post threshold.
//!
//! The default of 85 lives here and nowhere else. The router and the rescore
//! path read the value at call time, so a configuration change takes effect
//! for the very next routing decision.

use std::collections::HashMap;
use std::sync::RwLock;

use ledgerpilot_core::{DomainError, DomainResult, TenantId};

/// Minimum score for automatic posting, per tenant.
#[derive(Debug)]
pub struct ThresholdConfig {
    default: u8,
    overrides: RwLock<HashMap<TenantId, u8>>,
}

impl ThresholdConfig {
    pub const DEFAULT_THRESHOLD: u8 = 85;

    pub fn new() -> Self {
        Self {
            default: Self::DEFAULT_THRESHOLD,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Threshold in effect for a tenant right now.
    pub fn threshold_for(&self, tenant_id: TenantId) -> u8 {
        self.overrides
            .read()
            .ok()
            .and_then(|map| map.get(&tenant_id).copied())
            .unwrap_or(self.default)
    }

    /// Set a tenant's threshold. Values above 100 are rejected.
    pub fn set(&self, tenant_id: TenantId, threshold: u8) -> DomainResult<()> {
        if threshold > 100 {
            return Err(DomainError::validation(format!(
                "threshold must be in [0, 100], got {threshold}"
            )));
        }
        let mut map = self
            .overrides
            .write()
            .map_err(|_| DomainError::persistence("threshold config lock poisoned"))?;
        map.insert(tenant_id, threshold);
        Ok(())
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::new()
    }
}
