use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerpilot_core::{CounterpartyId, DomainResult, TenantId};

use crate::line::{Line, validate_lines};

/// Kind of source document a proposal was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentCategory {
    SupplierInvoice,
    Expense,
    Adjustment,
    Other,
}

/// A candidate accounting entry awaiting routing.
///
/// Produced by the external extraction collaborator; immutable once handed
/// to the core. Never persisted directly — it becomes a posted [`crate::Entry`]
/// or is wrapped into a review queue item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub tenant_id: TenantId,
    pub lines: Vec<Line>,
    pub counterparty: CounterpartyId,
    pub category: DocumentCategory,
    /// Reference to the external document/event that produced this proposal.
    pub source_ref: String,
    pub date: NaiveDate,
}

impl Proposal {
    /// Boundary validation: line shape and balance, checked before anything
    /// loosely-typed from a request body can reach the scorer.
    pub fn validate(&self) -> DomainResult<()> {
        validate_lines(&self.lines)
    }

    /// Total amount of the proposal (debit side).
    pub fn total(&self) -> i64 {
        self.lines.iter().map(|l| l.debit).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerpilot_core::AccountCode;

    fn acc(code: &str) -> AccountCode {
        AccountCode::new(code).unwrap()
    }

    fn proposal(lines: Vec<Line>) -> Proposal {
        Proposal {
            tenant_id: TenantId::new(),
            lines,
            counterparty: CounterpartyId::new("999888777").unwrap(),
            category: DocumentCategory::SupplierInvoice,
            source_ref: "doc-42".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 2, 2).unwrap(),
        }
    }

    #[test]
    fn validate_rejects_unbalanced_proposal() {
        let p = proposal(vec![
            Line::debit(acc("6100"), 800, ""),
            Line::credit(acc("2400"), 1000, ""),
        ]);
        assert!(p.validate().is_err());
    }

    #[test]
    fn total_is_the_debit_side() {
        let p = proposal(vec![
            Line::debit(acc("6100"), 800, ""),
            Line::debit(acc("2710"), 200, ""),
            Line::credit(acc("2400"), 1000, ""),
        ]);
        assert!(p.validate().is_ok());
        assert_eq!(p.total(), 1000);
    }
}
