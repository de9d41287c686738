use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerpilot_core::TenantId;
use ledgerpilot_events::{Event, TenantScoped};
use ledgerpilot_review::Correction;

/// Events the decision core publishes on its bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A queue item was resolved with corrected lines; the learner consumes
    /// this to derive or strengthen a pattern.
    CorrectionRecorded(Correction),
}

impl Event for EngineEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::CorrectionRecorded(_) => "review.correction_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EngineEvent::CorrectionRecorded(c) => c.recorded_at,
        }
    }
}

impl TenantScoped for EngineEvent {
    fn tenant_id(&self) -> TenantId {
        match self {
            EngineEvent::CorrectionRecorded(c) => c.tenant_id,
        }
    }
}
