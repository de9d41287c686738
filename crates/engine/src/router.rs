//! Escalation routing: auto-post or send to review.

use std::sync::Arc;

use tracing::{info, warn};

use ledgerpilot_core::{DomainError, DomainResult, Period};
use ledgerpilot_ledger::{Entry, LedgerStore, Line, Proposal, SourceType};
use ledgerpilot_patterns::{LearnedPattern, PatternStore};
use ledgerpilot_review::{IssueCategory, Priority, QueueItem, QueueStore};
use ledgerpilot_scoring::{ConfidenceScorer, Score};

use crate::config::ThresholdConfig;
use crate::history::HistoryProvider;

/// Where a routed proposal ended up. Every proposal lands in exactly one of
/// these; none is ever dropped.
#[derive(Debug, Clone)]
pub enum RoutingOutcome {
    Posted(Entry),
    Queued(QueueItem),
}

/// The escalation decision point.
///
/// Stateless apart from reads: safe to share across threads and call
/// concurrently. The decision is synchronous from score to post/enqueue, so
/// a cancelled caller can never leave a proposal half-routed.
pub struct Router {
    ledger: Arc<dyn LedgerStore>,
    queue: Arc<dyn QueueStore>,
    patterns: Arc<dyn PatternStore>,
    history: Arc<dyn HistoryProvider>,
    scorer: ConfidenceScorer<Arc<dyn PatternStore>>,
    thresholds: Arc<ThresholdConfig>,
}

impl Router {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        queue: Arc<dyn QueueStore>,
        patterns: Arc<dyn PatternStore>,
        history: Arc<dyn HistoryProvider>,
        thresholds: Arc<ThresholdConfig>,
    ) -> Self {
        Self {
            ledger,
            queue,
            scorer: ConfidenceScorer::new(Arc::clone(&patterns)),
            patterns,
            history,
            thresholds,
        }
    }

    /// Score a proposal and route it to the ledger or the review queue.
    ///
    /// Threshold is read per call. If the ledger rejects a proposal that
    /// scored above threshold, it is demoted to a queue item instead of
    /// being lost.
    pub fn route(&self, proposal: Proposal) -> DomainResult<RoutingOutcome> {
        proposal.validate()?;

        let threshold = self.thresholds.threshold_for(proposal.tenant_id);
        let history = self
            .history
            .history_for(proposal.tenant_id, &proposal.counterparty)?;
        let score = self.scorer.score(&proposal, &history)?;

        if score.total < threshold {
            return Ok(RoutingOutcome::Queued(self.enqueue(proposal, score)?));
        }

        let lines = self.lines_with_override(&proposal, &score)?;
        match self.ledger.post(
            proposal.tenant_id,
            Period::from_date(proposal.date),
            proposal.date,
            SourceType::Auto,
            lines,
        ) {
            Ok(entry) => {
                info!(
                    tenant = %proposal.tenant_id,
                    counterparty = %proposal.counterparty,
                    score = score.total,
                    threshold,
                    voucher = entry.voucher_no,
                    "proposal auto-posted"
                );
                Ok(RoutingOutcome::Posted(entry))
            }
            Err(DomainError::Validation(reason)) => {
                // Never drop a proposal: a posting rejection demotes it to
                // the queue regardless of its score.
                warn!(
                    tenant = %proposal.tenant_id,
                    counterparty = %proposal.counterparty,
                    score = score.total,
                    %reason,
                    "posting rejected, demoting proposal to review"
                );
                let mut item = QueueItem::new(proposal, score, IssueCategory::PostingRejected);
                item.priority = Priority::High;
                self.queue.insert(item.clone())?;
                Ok(RoutingOutcome::Queued(item))
            }
            Err(other) => Err(other),
        }
    }

    fn enqueue(&self, proposal: Proposal, score: Score) -> DomainResult<QueueItem> {
        let category = IssueCategory::from_score(&score);
        let item = QueueItem::new(proposal, score, category);
        self.queue.insert(item.clone())?;
        info!(
            tenant = %item.tenant_id,
            item = %item.id,
            score = item.score.total,
            priority = ?item.priority,
            category = ?item.category,
            "proposal escalated to review"
        );
        Ok(item)
    }

    fn lines_with_override(&self, proposal: &Proposal, score: &Score) -> DomainResult<Vec<Line>> {
        let Some(pattern_id) = score.matched_pattern else {
            return Ok(proposal.lines.clone());
        };
        let pattern = self.patterns.get(pattern_id)?;
        Ok(apply_pattern_override(proposal.lines.clone(), &pattern))
    }
}

/// Rewrite lines per the pattern's account override, if it has one.
/// Swapping only the account keeps amounts, and therefore balance, intact.
pub(crate) fn apply_pattern_override(mut lines: Vec<Line>, pattern: &LearnedPattern) -> Vec<Line> {
    if let Some(mapping) = &pattern.action.account_override {
        for line in &mut lines {
            if line.account == mapping.from {
                line.account = mapping.to.clone();
            }
        }
    }
    lines
}
