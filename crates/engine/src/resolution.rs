//! Human resolutions of queued items, and automated rescoring.
//!
//! Ordering discipline for both resolution paths: the ledger posting happens
//! first, the status transition second, the pattern outcome third, the event
//! publication last. A crash between steps leaves the item Pending with the
//! entry posted, which a reviewer can see and close; it never leaves an
//! Approved/Corrected item without its posting.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use ledgerpilot_core::{
    CorrectionId, DomainResult, Period, QueueItemId, ResolverId, TenantId,
};
use ledgerpilot_events::{Event, EventBus};
use ledgerpilot_ledger::{Entry, LedgerStore, Line, SourceType, validate_lines};
use ledgerpilot_patterns::PatternStore;
use ledgerpilot_review::{Correction, QueueItem, QueueStore};
use ledgerpilot_scoring::ConfidenceScorer;

use crate::config::ThresholdConfig;
use crate::events::EngineEvent;
use crate::history::HistoryProvider;
use crate::router::apply_pattern_override;

/// Result of rescoring a single queue item after a pattern update.
#[derive(Debug, Clone)]
pub enum RescoreOutcome {
    /// The new score cleared the threshold: posted and auto-approved.
    AutoPosted { item: QueueItem, entry: Entry },
    /// Still below threshold; the item keeps waiting with its new score.
    StillPending(QueueItem),
}

/// Applies reviewer decisions to queue items.
pub struct ResolutionService<B> {
    ledger: Arc<dyn LedgerStore>,
    queue: Arc<dyn QueueStore>,
    patterns: Arc<dyn PatternStore>,
    history: Arc<dyn HistoryProvider>,
    scorer: ConfidenceScorer<Arc<dyn PatternStore>>,
    thresholds: Arc<ThresholdConfig>,
    bus: B,
}

impl<B> ResolutionService<B>
where
    B: EventBus<EngineEvent>,
{
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        queue: Arc<dyn QueueStore>,
        patterns: Arc<dyn PatternStore>,
        history: Arc<dyn HistoryProvider>,
        thresholds: Arc<ThresholdConfig>,
        bus: B,
    ) -> Self {
        Self {
            ledger,
            queue,
            scorer: ConfidenceScorer::new(Arc::clone(&patterns)),
            patterns,
            history,
            thresholds,
            bus,
        }
    }

    /// Approve a pending item: post its proposal as-is, then close it.
    ///
    /// An approval confirms whatever pattern contributed to the item's score.
    pub fn approve(
        &self,
        tenant_id: TenantId,
        item_id: QueueItemId,
        resolver: ResolverId,
        notes: Option<String>,
    ) -> DomainResult<(QueueItem, Entry)> {
        let mut item = self.queue.get(tenant_id, item_id)?;
        item.ensure_pending()?;

        let entry = self.post(&item, SourceType::ManualApproval, item.proposal.lines.clone())?;
        item.approve(resolver, notes)?;
        self.queue.update(item.clone())?;

        if let Some(pattern_id) = item.score.matched_pattern {
            self.patterns.record_outcome(pattern_id, true)?;
        }

        info!(
            tenant = %tenant_id,
            item = %item_id,
            voucher = entry.voucher_no,
            "queue item approved"
        );
        Ok((item, entry))
    }

    /// Correct a pending item: post the reviewer's lines instead of the
    /// proposed ones, close the item, and emit a correction for the learner.
    ///
    /// The corrected lines face the same balance validation as any posting;
    /// on failure the item stays Pending and nothing is written.
    pub fn correct(
        &self,
        tenant_id: TenantId,
        item_id: QueueItemId,
        resolver: ResolverId,
        corrected_lines: Vec<Line>,
        reason: String,
    ) -> DomainResult<(QueueItem, Entry, Correction)> {
        let mut item = self.queue.get(tenant_id, item_id)?;
        item.ensure_pending()?;
        validate_lines(&corrected_lines)?;

        let entry = self.post(&item, SourceType::ManualCorrection, corrected_lines.clone())?;
        item.correct(resolver.clone(), Some(reason.clone()))?;
        self.queue.update(item.clone())?;

        // A correction contradicts the pattern that scored the proposal.
        if let Some(pattern_id) = item.score.matched_pattern {
            self.patterns.record_outcome(pattern_id, false)?;
        }

        let correction = Correction {
            id: CorrectionId::new(),
            queue_item_id: item.id,
            tenant_id,
            counterparty: item.proposal.counterparty.clone(),
            category: item.proposal.category,
            original_lines: item.proposal.lines.clone(),
            corrected_lines,
            reason,
            resolver,
            recorded_at: Utc::now(),
        };

        // The correction itself is durable in the queue store; a failed
        // publication only delays learning until the next correction.
        let event = EngineEvent::CorrectionRecorded(correction.clone());
        let event_type = event.event_type();
        if let Err(error) = self.bus.publish(event) {
            warn!(
                tenant = %tenant_id,
                item = %item_id,
                event = event_type,
                ?error,
                "failed to publish correction event"
            );
        }

        info!(
            tenant = %tenant_id,
            item = %item_id,
            voucher = entry.voucher_no,
            "queue item corrected"
        );
        Ok((item, entry, correction))
    }

    /// Rescore one queue item against the current pattern state.
    ///
    /// Returns `Ok(None)` if the item reached a terminal state in the
    /// meantime; a resolution that raced ahead of the rescan wins.
    pub fn rescore_if_pending(
        &self,
        tenant_id: TenantId,
        item_id: QueueItemId,
    ) -> DomainResult<Option<RescoreOutcome>> {
        let mut item = self.queue.get(tenant_id, item_id)?;
        if item.status.is_terminal() {
            return Ok(None);
        }

        let history = self
            .history
            .history_for(tenant_id, &item.proposal.counterparty)?;
        let score = self.scorer.score(&item.proposal, &history)?;
        let threshold = self.thresholds.threshold_for(tenant_id);

        if score.total < threshold {
            item.rescore(score)?;
            self.queue.update(item.clone())?;
            return Ok(Some(RescoreOutcome::StillPending(item)));
        }

        let lines = match score.matched_pattern {
            Some(pattern_id) => {
                let pattern = self.patterns.get(pattern_id)?;
                apply_pattern_override(item.proposal.lines.clone(), &pattern)
            }
            None => item.proposal.lines.clone(),
        };

        let entry = self.post(&item, SourceType::Auto, lines)?;
        let notes = score
            .matched_pattern
            .map(|pattern_id| format!("auto-posted after pattern {pattern_id} update"));
        item.rescore(score)?;
        item.approve(ResolverId::system_rescore(), notes)?;
        self.queue.update(item.clone())?;

        info!(
            tenant = %tenant_id,
            item = %item_id,
            score = item.score.total,
            threshold,
            voucher = entry.voucher_no,
            "queue item auto-posted on rescore"
        );
        Ok(Some(RescoreOutcome::AutoPosted { item, entry }))
    }

    fn post(&self, item: &QueueItem, source: SourceType, lines: Vec<Line>) -> DomainResult<Entry> {
        self.ledger.post(
            item.tenant_id,
            Period::from_date(item.proposal.date),
            item.proposal.date,
            source,
            lines,
        )
    }
}
