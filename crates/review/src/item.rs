use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerpilot_core::{
    CorrectionId, CounterpartyId, DomainError, DomainResult, QueueItemId, ResolverId, TenantId,
};
use ledgerpilot_ledger::{DocumentCategory, Line, Proposal};
use ledgerpilot_scoring::{Factor, Score};

/// Queue item lifecycle state. Approved and Corrected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Approved,
    Corrected,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

/// Review urgency, banded from the escalation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Fixed score-to-priority banding, shared by initial routing and any
    /// later rescore.
    pub fn from_score(total: u8) -> Self {
        match total {
            0..=29 => Priority::Urgent,
            30..=49 => Priority::High,
            50..=69 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

/// Why an item needs human eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    /// Little or no history with this counterparty.
    UnknownCounterparty,
    /// The line pattern deviates from what this counterparty usually books.
    UnusualPattern,
    /// Declared VAT does not reconcile with the net amount.
    VatMismatch,
    /// A learned pattern matched but contributed too little to trust.
    WeakPattern,
    /// The amount is out of the ordinary range for this counterparty.
    UnusualAmount,
    /// The ledger rejected the posting; demoted here so it is not lost.
    PostingRejected,
}

impl IssueCategory {
    /// Derive the category from the factor that scored lowest.
    pub fn from_score(score: &Score) -> Self {
        match score.weakest_factor() {
            Factor::CounterpartyFamiliarity => IssueCategory::UnknownCounterparty,
            Factor::HistoricalSimilarity => IssueCategory::UnusualPattern,
            Factor::AmountValidation => IssueCategory::VatMismatch,
            Factor::PatternMatch => IssueCategory::WeakPattern,
            Factor::AmountReasonableness => IssueCategory::UnusualAmount,
        }
    }
}

/// How and by whom a terminal item was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolver: ResolverId,
    pub resolved_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// A proposal held for human review.
///
/// Created by the escalation router when a score misses the threshold (or a
/// posting is rejected). Mutated only by a resolution or an automated
/// rescore while still Pending; terminal items are immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub tenant_id: TenantId,
    pub proposal: Proposal,
    pub status: Status,
    pub priority: Priority,
    pub category: IssueCategory,
    /// The score that caused escalation; replaced on rescore while Pending.
    pub score: Score,
    pub created_at: DateTime<Utc>,
    pub resolution: Option<Resolution>,
}

impl QueueItem {
    pub fn new(proposal: Proposal, score: Score, category: IssueCategory) -> Self {
        Self {
            id: QueueItemId::new(),
            tenant_id: proposal.tenant_id,
            priority: Priority::from_score(score.total),
            status: Status::Pending,
            category,
            proposal,
            score,
            created_at: Utc::now(),
            resolution: None,
        }
    }

    /// Guard for callers that must not act on a terminal item. The
    /// resolution path checks this before posting anything, so a conflict
    /// rejects with the ledger untouched.
    pub fn ensure_pending(&self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::conflict(format!(
                "queue item {} is already {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Pending → Approved. The caller must have posted the original lines
    /// successfully before calling this; approval is only final once the
    /// posting exists.
    pub fn approve(
        &mut self,
        resolver: ResolverId,
        notes: Option<String>,
    ) -> DomainResult<()> {
        self.ensure_pending()?;
        self.status = Status::Approved;
        self.resolution = Some(Resolution {
            resolver,
            resolved_at: Utc::now(),
            notes,
        });
        Ok(())
    }

    /// Pending → Corrected. As with approve, posting precedes the
    /// transition.
    pub fn correct(&mut self, resolver: ResolverId, notes: Option<String>) -> DomainResult<()> {
        self.ensure_pending()?;
        self.status = Status::Corrected;
        self.resolution = Some(Resolution {
            resolver,
            resolved_at: Utc::now(),
            notes,
        });
        Ok(())
    }

    /// Replace the score (and derived priority/category) after a pattern
    /// update. Only legal while Pending.
    pub fn rescore(&mut self, score: Score) -> DomainResult<()> {
        self.ensure_pending()?;
        self.priority = Priority::from_score(score.total);
        self.category = IssueCategory::from_score(&score);
        self.score = score;
        Ok(())
    }
}

/// An immutable record of a human correction, emitted when a queue item is
/// resolved via correct. Input to the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub id: CorrectionId,
    pub queue_item_id: QueueItemId,
    pub tenant_id: TenantId,
    pub counterparty: CounterpartyId,
    pub category: DocumentCategory,
    pub original_lines: Vec<Line>,
    pub corrected_lines: Vec<Line>,
    pub reason: String,
    pub resolver: ResolverId,
    pub recorded_at: DateTime<Utc>,
}
