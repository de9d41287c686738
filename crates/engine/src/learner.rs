//! Corrections learner: turns human corrections into patterns and rescans
//! the queue so a fresh pattern can release items already waiting.

use std::sync::Arc;

use tracing::info;

use ledgerpilot_core::{DomainResult, TenantId};
use ledgerpilot_events::{EventBus, EventWorker, WorkerHandle};
use ledgerpilot_ledger::Line;
use ledgerpilot_patterns::{AccountOverride, LearnedPattern, PatternAction, PatternPredicate, PatternStore};
use ledgerpilot_review::{Correction, QueueStore};

use crate::events::EngineEvent;
use crate::resolution::{RescoreOutcome, ResolutionService};

/// Boost a freshly-derived pattern starts with. Subsequent confirmations of
/// the same predicate nudge it toward the cap.
const INITIAL_BOOST: u8 = 10;

/// What one correction taught us.
#[derive(Debug, Clone)]
pub struct LearnOutcome {
    /// The pattern derived or strengthened, when the correction was
    /// isolable to an account substitution. `None` means nothing learned.
    pub pattern: Option<LearnedPattern>,
    /// Pending items for the counterparty that were rescored.
    pub rescanned: usize,
    /// How many of those cleared the threshold and were posted.
    pub auto_posted: usize,
}

/// Consumes corrections and maintains the pattern store.
pub struct Learner<B> {
    patterns: Arc<dyn PatternStore>,
    queue: Arc<dyn QueueStore>,
    resolutions: Arc<ResolutionService<B>>,
}

impl<B> Learner<B>
where
    B: EventBus<EngineEvent>,
{
    pub fn new(
        patterns: Arc<dyn PatternStore>,
        queue: Arc<dyn QueueStore>,
        resolutions: Arc<ResolutionService<B>>,
    ) -> Self {
        Self {
            patterns,
            queue,
            resolutions,
        }
    }

    /// Learn from one correction, then rescan the counterparty's pending
    /// items against the updated pattern state.
    ///
    /// Idempotent at the pattern level: replaying the same correction
    /// strengthens the same predicate rather than minting a duplicate.
    pub fn learn(&self, correction: &Correction) -> DomainResult<LearnOutcome> {
        // Only an unambiguous account substitution teaches a rule. A
        // correction that reshapes amounts or line structure must not mint
        // a confidence-boosting pattern.
        let Some(mapping) = derive_override(&correction.original_lines, &correction.corrected_lines)
        else {
            info!(
                tenant = %correction.tenant_id,
                counterparty = %correction.counterparty,
                "correction not isolable to an account substitution, nothing learned"
            );
            return Ok(LearnOutcome {
                pattern: None,
                rescanned: 0,
                auto_posted: 0,
            });
        };

        let predicate = PatternPredicate::for_counterparty(correction.counterparty.clone())
            .with_category(correction.category);
        let action = PatternAction::new(Some(mapping), INITIAL_BOOST);
        let pattern = self.patterns.upsert(correction.tenant_id, predicate, action)?;

        let (rescanned, auto_posted) =
            self.rescan(correction.tenant_id, correction)?;

        info!(
            tenant = %correction.tenant_id,
            counterparty = %correction.counterparty,
            pattern = %pattern.id,
            rescanned,
            auto_posted,
            "correction learned"
        );
        Ok(LearnOutcome {
            pattern: Some(pattern),
            rescanned,
            auto_posted,
        })
    }

    fn rescan(&self, tenant_id: TenantId, correction: &Correction) -> DomainResult<(usize, usize)> {
        let pending = self
            .queue
            .pending_for_counterparty(tenant_id, &correction.counterparty)?;

        let mut rescanned = 0usize;
        let mut auto_posted = 0usize;
        for item in pending {
            // Skip the item this correction just resolved; the store may
            // still list it if the rescan raced the status update.
            if item.id == correction.queue_item_id {
                continue;
            }
            match self.resolutions.rescore_if_pending(tenant_id, item.id)? {
                Some(RescoreOutcome::AutoPosted { .. }) => {
                    rescanned += 1;
                    auto_posted += 1;
                }
                Some(RescoreOutcome::StillPending(_)) => rescanned += 1,
                None => {}
            }
        }
        Ok((rescanned, auto_posted))
    }
}

/// Infer an account substitution from a correction.
///
/// Only the unambiguous case produces an override: both line sets have the
/// same shape and amounts, and exactly one consistent account remap explains
/// the difference. Anything else teaches nothing about accounts (the pattern
/// still records that this counterparty needs care).
pub fn derive_override(original: &[Line], corrected: &[Line]) -> Option<AccountOverride> {
    if original.len() != corrected.len() {
        return None;
    }

    let sort_key = |l: &Line| (l.debit, l.credit, l.account.clone());
    let mut orig: Vec<&Line> = original.iter().collect();
    let mut corr: Vec<&Line> = corrected.iter().collect();
    orig.sort_by_key(|l| sort_key(l));
    corr.sort_by_key(|l| sort_key(l));

    let mut mapping: Option<AccountOverride> = None;
    for (o, c) in orig.iter().zip(corr.iter()) {
        if o.debit != c.debit || o.credit != c.credit {
            return None;
        }
        if o.account == c.account {
            continue;
        }
        match &mapping {
            None => {
                mapping = Some(AccountOverride {
                    from: o.account.clone(),
                    to: c.account.clone(),
                });
            }
            Some(existing) => {
                if existing.from != o.account || existing.to != c.account {
                    return None;
                }
            }
        }
    }
    mapping
}

/// Background worker that feeds bus corrections into a [`Learner`].
pub struct LearnerWorker;

impl LearnerWorker {
    /// Spawn the learner loop on its own thread. The handle shuts it down
    /// gracefully; corrections already received are processed first.
    pub fn spawn<B>(bus: B, learner: Learner<B>) -> WorkerHandle
    where
        B: EventBus<EngineEvent> + Send + Sync + 'static,
    {
        EventWorker::spawn(
            "corrections-learner",
            bus,
            None,
            move |event: EngineEvent| -> DomainResult<()> {
                let EngineEvent::CorrectionRecorded(correction) = event;
                learner.learn(&correction).map(|_| ())
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use ledgerpilot_core::AccountCode;

    use super::*;

    fn acc(code: &str) -> AccountCode {
        AccountCode::new(code).unwrap()
    }

    #[test]
    fn single_account_swap_yields_an_override() {
        let original = vec![
            Line::debit(acc("6100"), 1000, ""),
            Line::credit(acc("2400"), 1000, ""),
        ];
        let corrected = vec![
            Line::debit(acc("6540"), 1000, ""),
            Line::credit(acc("2400"), 1000, ""),
        ];

        let mapping = derive_override(&original, &corrected).unwrap();
        assert_eq!(mapping.from, acc("6100"));
        assert_eq!(mapping.to, acc("6540"));
    }

    #[test]
    fn identical_lines_yield_no_override() {
        let lines = vec![
            Line::debit(acc("6100"), 1000, ""),
            Line::credit(acc("2400"), 1000, ""),
        ];
        assert!(derive_override(&lines, &lines).is_none());
    }

    #[test]
    fn amount_changes_yield_no_override() {
        let original = vec![
            Line::debit(acc("6100"), 1000, ""),
            Line::credit(acc("2400"), 1000, ""),
        ];
        let corrected = vec![
            Line::debit(acc("6100"), 1200, ""),
            Line::credit(acc("2400"), 1200, ""),
        ];
        assert!(derive_override(&original, &corrected).is_none());
    }

    #[test]
    fn inconsistent_remaps_yield_no_override() {
        let original = vec![
            Line::debit(acc("6100"), 1000, ""),
            Line::debit(acc("6100"), 500, ""),
            Line::credit(acc("2400"), 1500, ""),
        ];
        let corrected = vec![
            Line::debit(acc("6540"), 1000, ""),
            Line::debit(acc("7140"), 500, ""),
            Line::credit(acc("2400"), 1500, ""),
        ];
        assert!(derive_override(&original, &corrected).is_none());
    }

    #[test]
    fn reordered_lines_still_derive_the_override() {
        let original = vec![
            Line::credit(acc("2400"), 1250, ""),
            Line::debit(acc("2710"), 250, ""),
            Line::debit(acc("6100"), 1000, ""),
        ];
        let corrected = vec![
            Line::debit(acc("6540"), 1000, ""),
            Line::credit(acc("2400"), 1250, ""),
            Line::debit(acc("2710"), 250, ""),
        ];

        let mapping = derive_override(&original, &corrected).unwrap();
        assert_eq!(mapping.from, acc("6100"));
        assert_eq!(mapping.to, acc("6540"));
    }
}
