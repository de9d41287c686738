use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::debug;

use ledgerpilot_core::{AccountCode, DomainResult};
use ledgerpilot_ledger::Proposal;
use ledgerpilot_patterns::PatternStore;

use crate::history::TransactionHistory;
use crate::score::{Factor, FactorScore, Score};

/// Tunables for the scorer. Defaults follow Norwegian bookkeeping
/// conventions: VAT on 27xx accounts, standard rates 25/15/12%.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Account-code prefix identifying declared VAT lines.
    pub vat_account_prefix: String,
    /// Standard VAT rates, in permille.
    pub vat_rates_permille: Vec<u32>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            vat_account_prefix: "27".to_string(),
            vat_rates_permille: vec![250, 150, 120],
        }
    }
}

/// Computes a bounded trust score for a proposal.
///
/// Pure with respect to shared state: the pattern store is consulted
/// read-only, and the same proposal + history + store state always produces
/// the same score.
#[derive(Debug)]
pub struct ConfidenceScorer<P> {
    patterns: P,
    config: ScorerConfig,
}

impl<P> ConfidenceScorer<P>
where
    P: PatternStore,
{
    pub fn new(patterns: P) -> Self {
        Self {
            patterns,
            config: ScorerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScorerConfig) -> Self {
        self.config = config;
        self
    }

    /// Score a proposal against the counterparty's history and any learned
    /// pattern. Factors are additive, individually capped, and the total is
    /// clamped to [0, 100].
    pub fn score(&self, proposal: &Proposal, history: &TransactionHistory) -> DomainResult<Score> {
        let mut breakdown = Vec::with_capacity(Factor::ALL.len());
        let mut phrases = Vec::new();

        let familiarity = self.familiarity(proposal, history, &mut phrases);
        breakdown.push(FactorScore {
            factor: Factor::CounterpartyFamiliarity,
            points: familiarity,
        });

        let similarity = self.similarity(proposal, history, &mut phrases);
        breakdown.push(FactorScore {
            factor: Factor::HistoricalSimilarity,
            points: similarity,
        });

        let vat = self.amount_validation(proposal, &mut phrases);
        breakdown.push(FactorScore {
            factor: Factor::AmountValidation,
            points: vat,
        });

        let (pattern_points, matched_pattern) = self.pattern_match(proposal, &mut phrases)?;
        breakdown.push(FactorScore {
            factor: Factor::PatternMatch,
            points: pattern_points,
        });

        let reasonableness = self.reasonableness(proposal, history, &mut phrases);
        breakdown.push(FactorScore {
            factor: Factor::AmountReasonableness,
            points: reasonableness,
        });

        let score = Score::from_breakdown(breakdown, phrases, matched_pattern);
        debug!(
            tenant = %proposal.tenant_id,
            counterparty = %proposal.counterparty,
            total = score.total,
            "proposal scored"
        );
        Ok(score)
    }

    /// Cap 30. Monotonically increasing in prior accepted entries from the
    /// counterparty; saturates at ten entries.
    fn familiarity(
        &self,
        proposal: &Proposal,
        history: &TransactionHistory,
        phrases: &mut Vec<String>,
    ) -> u8 {
        let count = history.accepted_count(&proposal.counterparty);
        let cap = Factor::CounterpartyFamiliarity.cap();
        let points = (count.min(10) as u8).saturating_mul(3).min(cap);
        if points > 0 {
            phrases.push(format!("{count} prior entries from this counterparty"));
        }
        points
    }

    /// Cap 30. Compares the proposed account set and relative debit split to
    /// the counterparty's modal pattern; zero without history.
    fn similarity(
        &self,
        proposal: &Proposal,
        history: &TransactionHistory,
        phrases: &mut Vec<String>,
    ) -> u8 {
        let Some(modal) = history.modal_pattern(&proposal.counterparty) else {
            return 0;
        };

        let proposed: BTreeSet<AccountCode> =
            proposal.lines.iter().map(|l| l.account.clone()).collect();

        if proposed == modal.accounts {
            let mut points = 20u8;
            let deviation = split_deviation(proposal, &modal.split);
            if deviation <= 0.10 {
                points += 10;
                phrases.push("matches the usual account pattern and split".to_string());
            } else if deviation <= 0.25 {
                points += 5;
                phrases.push("matches the usual account pattern".to_string());
            } else {
                phrases.push("matches the usual accounts with an unusual split".to_string());
            }
            return points;
        }

        let shared = proposed.intersection(&modal.accounts).count();
        let union = proposed.union(&modal.accounts).count();
        if union > 0 && shared * 2 >= union {
            phrases.push("partially matches the usual account pattern".to_string());
            10
        } else {
            0
        }
    }

    /// Cap 20. Declared VAT lines must be numerically consistent with the
    /// net amount under one of the standard rates. No declared VAT lines is
    /// consistent by definition (zero-rated purchases are legitimate).
    fn amount_validation(&self, proposal: &Proposal, phrases: &mut Vec<String>) -> u8 {
        let prefix = self.config.vat_account_prefix.as_str();
        let vat: i64 = proposal
            .lines
            .iter()
            .filter(|l| l.account.as_str().starts_with(prefix))
            .map(|l| l.debit)
            .sum();
        let net: i64 = proposal
            .lines
            .iter()
            .filter(|l| !l.account.as_str().starts_with(prefix))
            .map(|l| l.debit)
            .sum();

        if vat == 0 {
            phrases.push("no VAT lines declared".to_string());
            return 20;
        }
        if net <= 0 {
            return 0;
        }

        let best_diff = self
            .config
            .vat_rates_permille
            .iter()
            .map(|rate| {
                let expected = (net as i128 * i128::from(*rate) + 500) / 1000;
                (vat as i128 - expected).abs()
            })
            .min()
            .unwrap_or(i128::MAX);

        // Rounding slack of one minor unit counts as exact; beyond that a
        // small discrepancy (≤ 2% of net) earns partial credit.
        if best_diff <= 1 {
            phrases.push("VAT consistent with the net amount".to_string());
            20
        } else if best_diff <= (net as i128 * 2) / 100 {
            phrases.push("VAT close to a standard rate".to_string());
            10
        } else {
            0
        }
    }

    /// Cap 15. A matching active learned pattern contributes its boost.
    fn pattern_match(
        &self,
        proposal: &Proposal,
        phrases: &mut Vec<String>,
    ) -> DomainResult<(u8, Option<ledgerpilot_core::PatternId>)> {
        let matched = self.patterns.find_match(
            proposal.tenant_id,
            &proposal.counterparty,
            proposal.category,
            proposal.total(),
        )?;

        Ok(match matched {
            Some(pattern) => {
                let points = pattern.action.boost.min(Factor::PatternMatch.cap());
                phrases.push(format!("learned pattern {} applies", pattern.id));
                (points, Some(pattern.id))
            }
            None => (0, None),
        })
    }

    /// Cap 5. Full credit when the total sits inside the statistically
    /// ordinary range for this counterparty; conservative partial credit on
    /// thin history.
    fn reasonableness(
        &self,
        proposal: &Proposal,
        history: &TransactionHistory,
        phrases: &mut Vec<String>,
    ) -> u8 {
        let Some(stats) = history.amount_stats(&proposal.counterparty) else {
            return 0;
        };
        if stats.samples < 3 {
            phrases.push("too little history to judge the amount".to_string());
            return 2;
        }

        let diff = (proposal.total() as f64 - stats.mean).abs();
        let points = if stats.stddev <= f64::EPSILON {
            if diff < 0.5 {
                5
            } else if diff <= stats.mean.abs() * 0.1 {
                2
            } else {
                0
            }
        } else {
            let z = diff / stats.stddev;
            if z <= 2.0 {
                5
            } else if z <= 3.0 {
                2
            } else {
                0
            }
        };

        if points == 5 {
            phrases.push("amount is ordinary for this counterparty".to_string());
        }
        points
    }
}

fn split_deviation(proposal: &Proposal, modal_split: &BTreeMap<AccountCode, f64>) -> f64 {
    let total = proposal.total();
    if total <= 0 {
        return 1.0;
    }

    let mut max_dev: f64 = 0.0;
    for line in proposal.lines.iter().filter(|l| l.debit > 0) {
        let share = line.debit as f64 / total as f64;
        let modal = modal_split.get(&line.account).copied().unwrap_or(0.0);
        max_dev = max_dev.max((share - modal).abs());
    }
    max_dev
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use ledgerpilot_core::{CounterpartyId, TenantId};
    use ledgerpilot_ledger::{DocumentCategory, Line};
    use ledgerpilot_patterns::{
        InMemoryPatternStore, PatternAction, PatternPredicate, PatternStore,
    };

    use super::*;
    use crate::history::HistoricalEntry;

    fn acc(code: &str) -> AccountCode {
        AccountCode::new(code).unwrap()
    }

    fn counterparty() -> CounterpartyId {
        CounterpartyId::new("991234567").unwrap()
    }

    fn proposal(tenant: TenantId, lines: Vec<Line>) -> Proposal {
        Proposal {
            tenant_id: tenant,
            lines,
            counterparty: counterparty(),
            category: DocumentCategory::SupplierInvoice,
            source_ref: "doc-1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
        }
    }

    fn invoice_lines(net: i64, vat: i64) -> Vec<Line> {
        vec![
            Line::debit(acc("6100"), net, "freight"),
            Line::debit(acc("2710"), vat, "input VAT"),
            Line::credit(acc("2400"), net + vat, "payable"),
        ]
    }

    fn rich_history(n: usize) -> TransactionHistory {
        TransactionHistory::new(
            (0..n)
                .map(|_| HistoricalEntry {
                    counterparty: counterparty(),
                    lines: invoice_lines(1000, 250),
                })
                .collect(),
        )
    }

    fn scorer() -> ConfidenceScorer<Arc<InMemoryPatternStore>> {
        ConfidenceScorer::new(Arc::new(InMemoryPatternStore::new()))
    }

    #[test]
    fn scoring_is_deterministic_for_identical_inputs() {
        let tenant = TenantId::new();
        let scorer = scorer();
        let history = rich_history(6);
        let p = proposal(tenant, invoice_lines(1000, 250));

        let a = scorer.score(&p, &history).unwrap();
        let b = scorer.score(&p, &history).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_counterparty_with_clean_vat_scores_only_the_vat_factor() {
        let tenant = TenantId::new();
        let scorer = scorer();
        let p = proposal(tenant, invoice_lines(1000, 250));

        let score = scorer.score(&p, &TransactionHistory::default()).unwrap();
        assert_eq!(score.points_for(Factor::CounterpartyFamiliarity), 0);
        assert_eq!(score.points_for(Factor::HistoricalSimilarity), 0);
        assert_eq!(score.points_for(Factor::AmountValidation), 20);
        assert_eq!(score.total, 20);
    }

    #[test]
    fn familiar_counterparty_with_usual_shape_scores_high() {
        let tenant = TenantId::new();
        let scorer = scorer();
        let history = rich_history(10);
        let p = proposal(tenant, invoice_lines(1000, 250));

        let score = scorer.score(&p, &history).unwrap();
        assert_eq!(score.points_for(Factor::CounterpartyFamiliarity), 30);
        assert_eq!(score.points_for(Factor::HistoricalSimilarity), 30);
        assert_eq!(score.points_for(Factor::AmountValidation), 20);
        assert_eq!(score.points_for(Factor::AmountReasonableness), 5);
        assert_eq!(score.total, 85);
        assert!(score.rationale.contains("prior entries"));
    }

    #[test]
    fn familiarity_saturates_at_ten_entries() {
        let tenant = TenantId::new();
        let scorer = scorer();
        let p = proposal(tenant, invoice_lines(1000, 250));

        let ten = scorer.score(&p, &rich_history(10)).unwrap();
        let fifty = scorer.score(&p, &rich_history(50)).unwrap();
        assert_eq!(
            ten.points_for(Factor::CounterpartyFamiliarity),
            fifty.points_for(Factor::CounterpartyFamiliarity)
        );
    }

    #[test]
    fn inconsistent_vat_earns_zero_and_slight_drift_earns_partial() {
        let tenant = TenantId::new();
        let scorer = scorer();

        // 250 expected at 25%; 400 is far off any standard rate.
        let wild = proposal(tenant, invoice_lines(1000, 400));
        let score = scorer.score(&wild, &TransactionHistory::default()).unwrap();
        assert_eq!(score.points_for(Factor::AmountValidation), 0);

        // 10000 net → 2500 expected; 2600 is within 2% of net... (diff 100 ≤ 200)
        let close = proposal(tenant, invoice_lines(10_000, 2_600));
        let score = scorer.score(&close, &TransactionHistory::default()).unwrap();
        assert_eq!(score.points_for(Factor::AmountValidation), 10);
    }

    #[test]
    fn matched_pattern_contributes_its_boost_and_its_id() {
        let tenant = TenantId::new();
        let patterns = Arc::new(InMemoryPatternStore::new());
        let learned = patterns
            .upsert(
                tenant,
                PatternPredicate::for_counterparty(counterparty()),
                PatternAction::new(None, 12),
            )
            .unwrap();

        let scorer = ConfidenceScorer::new(Arc::clone(&patterns));
        let p = proposal(tenant, invoice_lines(1000, 250));
        let score = scorer.score(&p, &TransactionHistory::default()).unwrap();

        assert_eq!(score.points_for(Factor::PatternMatch), 12);
        assert_eq!(score.matched_pattern, Some(learned.id));
    }

    #[test]
    fn unusual_amount_for_a_known_counterparty_loses_reasonableness_points() {
        let tenant = TenantId::new();
        let scorer = scorer();

        let history = TransactionHistory::new(
            [900i64, 1000, 1100, 1000, 950]
                .into_iter()
                .map(|net| HistoricalEntry {
                    counterparty: counterparty(),
                    lines: invoice_lines(net, net / 4),
                })
                .collect(),
        );

        let ordinary = proposal(tenant, invoice_lines(1000, 250));
        let outlier = proposal(tenant, invoice_lines(90_000, 22_500));

        let a = scorer.score(&ordinary, &history).unwrap();
        let b = scorer.score(&outlier, &history).unwrap();
        assert_eq!(a.points_for(Factor::AmountReasonableness), 5);
        assert_eq!(b.points_for(Factor::AmountReasonableness), 0);
        assert!(a.total > b.total);
    }
}
