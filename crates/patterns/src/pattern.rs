use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerpilot_core::{AccountCode, CounterpartyId, PatternId, TenantId};
use ledgerpilot_ledger::DocumentCategory;

/// Hard cap on the scoring boost any single pattern can contribute.
pub const MAX_BOOST: u8 = 15;

/// A pattern must have been observed this often before a bad success rate
/// can deactivate it, so one outlier cannot kill a generally-useful rule.
pub const MIN_OBSERVATIONS: u32 = 5;

/// Success-rate floor below which a sufficiently-observed pattern goes
/// inactive.
pub const SUCCESS_FLOOR: f64 = 0.3;

/// Inclusive amount window, minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: i64,
    pub max: i64,
}

impl AmountRange {
    pub fn contains(&self, amount: i64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// What a pattern matches on. The counterparty is always bound; category and
/// amount range narrow the predicate further. The predicate doubles as the
/// pattern's identity key: upserting the same predicate strengthens the
/// existing pattern instead of duplicating it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternPredicate {
    pub counterparty: CounterpartyId,
    pub category: Option<DocumentCategory>,
    pub amount_range: Option<AmountRange>,
}

impl PatternPredicate {
    pub fn for_counterparty(counterparty: CounterpartyId) -> Self {
        Self {
            counterparty,
            category: None,
            amount_range: None,
        }
    }

    pub fn with_category(mut self, category: DocumentCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_amount_range(mut self, range: AmountRange) -> Self {
        self.amount_range = Some(range);
        self
    }

    /// Number of bound conditions; a more specific predicate wins a match.
    pub fn specificity(&self) -> u8 {
        1 + self.category.is_some() as u8 + self.amount_range.is_some() as u8
    }

    pub fn matches(
        &self,
        counterparty: &CounterpartyId,
        category: DocumentCategory,
        total: i64,
    ) -> bool {
        if &self.counterparty != counterparty {
            return false;
        }
        if let Some(c) = self.category {
            if c != category {
                return false;
            }
        }
        if let Some(range) = self.amount_range {
            if !range.contains(total) {
                return false;
            }
        }
        true
    }
}

/// Account substitution a pattern suggests: lines hitting `from` are
/// rewritten to `to` before posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountOverride {
    pub from: AccountCode,
    pub to: AccountCode,
}

/// What a matching pattern does: optionally remap an account, and boost the
/// confidence score (capped at [`MAX_BOOST`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAction {
    pub account_override: Option<AccountOverride>,
    pub boost: u8,
}

impl PatternAction {
    pub fn new(account_override: Option<AccountOverride>, boost: u8) -> Self {
        Self {
            account_override,
            boost: boost.min(MAX_BOOST),
        }
    }
}

/// A reusable rule learned from one or more human corrections.
///
/// Never deleted: a pattern that keeps contradicting human decisions is
/// deactivated and stops matching, but its history stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub id: PatternId,
    pub tenant_id: TenantId,
    pub predicate: PatternPredicate,
    pub action: PatternAction,
    pub confirmations: u32,
    pub contradictions: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearnedPattern {
    pub fn new(tenant_id: TenantId, predicate: PatternPredicate, action: PatternAction) -> Self {
        let now = Utc::now();
        Self {
            id: PatternId::new(),
            tenant_id,
            predicate,
            action: PatternAction::new(action.account_override, action.boost),
            confirmations: 1,
            contradictions: 0,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn observations(&self) -> u32 {
        self.confirmations + self.contradictions
    }

    /// Fraction of observations where the pattern was confirmed useful.
    /// A fresh pattern starts at 1.0.
    pub fn success_rate(&self) -> f64 {
        let total = self.observations();
        if total == 0 {
            return 1.0;
        }
        f64::from(self.confirmations) / f64::from(total)
    }

    /// Another correction produced the same predicate: count it as a
    /// confirmation and nudge the boost up to the cap.
    pub fn strengthen(&mut self, action: &PatternAction) {
        self.confirmations += 1;
        self.action.boost = self.action.boost.saturating_add(1).min(MAX_BOOST);
        if self.action.account_override.is_none() {
            self.action.account_override = action.account_override.clone();
        }
        self.updated_at = Utc::now();
    }

    /// Record a confirmation (human approved an entry this pattern
    /// influenced) or a contradiction (human corrected it again).
    pub fn record_outcome(&mut self, confirmed: bool) {
        if confirmed {
            self.confirmations += 1;
        } else {
            self.contradictions += 1;
        }
        self.updated_at = Utc::now();

        if self.observations() >= MIN_OBSERVATIONS && self.success_rate() < SUCCESS_FLOOR {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counterparty() -> CounterpartyId {
        CounterpartyId::new("991234567").unwrap()
    }

    fn pattern(predicate: PatternPredicate) -> LearnedPattern {
        LearnedPattern::new(TenantId::new(), predicate, PatternAction::new(None, 10))
    }

    #[test]
    fn specificity_counts_bound_conditions() {
        let base = PatternPredicate::for_counterparty(counterparty());
        assert_eq!(base.specificity(), 1);

        let narrow = base
            .clone()
            .with_category(DocumentCategory::Expense)
            .with_amount_range(AmountRange { min: 0, max: 1000 });
        assert_eq!(narrow.specificity(), 3);
    }

    #[test]
    fn predicate_matches_respect_every_bound_condition() {
        let p = PatternPredicate::for_counterparty(counterparty())
            .with_category(DocumentCategory::Expense)
            .with_amount_range(AmountRange { min: 100, max: 500 });

        assert!(p.matches(&counterparty(), DocumentCategory::Expense, 300));
        assert!(!p.matches(&counterparty(), DocumentCategory::SupplierInvoice, 300));
        assert!(!p.matches(&counterparty(), DocumentCategory::Expense, 501));
        assert!(!p.matches(
            &CounterpartyId::new("other").unwrap(),
            DocumentCategory::Expense,
            300
        ));
    }

    #[test]
    fn boost_is_capped_at_construction_and_on_strengthen() {
        let mut p = pattern(PatternPredicate::for_counterparty(counterparty()));
        p.action = PatternAction::new(None, 200);
        assert_eq!(p.action.boost, MAX_BOOST);

        for _ in 0..10 {
            p.strengthen(&PatternAction::new(None, 0));
        }
        assert_eq!(p.action.boost, MAX_BOOST);
    }

    #[test]
    fn repeated_contradictions_deactivate_after_the_floor() {
        let mut p = pattern(PatternPredicate::for_counterparty(counterparty()));

        // Starts with one confirmation. Contradictions below the minimum
        // observation count must not deactivate.
        p.record_outcome(false);
        p.record_outcome(false);
        assert!(p.active);

        p.record_outcome(false);
        p.record_outcome(false);
        // 1 confirmation / 5 observations = 0.2 < 0.3 floor.
        assert!(!p.active);
    }

    #[test]
    fn confirmations_keep_a_pattern_active() {
        let mut p = pattern(PatternPredicate::for_counterparty(counterparty()));
        for _ in 0..10 {
            p.record_outcome(true);
        }
        p.record_outcome(false);
        assert!(p.active);
        assert!(p.success_rate() > 0.9);
    }
}
