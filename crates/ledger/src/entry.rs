use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerpilot_core::{AccountCode, EntryId, Period, TenantId};

use crate::line::Line;

/// How a posted entry came into existence.
///
/// Closed enumeration: one shared entry shape with a source tag, instead of
/// one table per voucher kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// Auto-posted by the escalation router (score above threshold).
    Auto,
    /// Opening balance carried into the period.
    OpeningBalance,
    /// Human approved a queued proposal unchanged.
    ManualApproval,
    /// Human corrected a queued proposal before posting.
    ManualCorrection,
    /// Reversal of a previously posted entry.
    Reversal,
}

impl core::fmt::Display for SourceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SourceType::Auto => "auto",
            SourceType::OpeningBalance => "opening-balance",
            SourceType::ManualApproval => "manual-approval",
            SourceType::ManualCorrection => "manual-correction",
            SourceType::Reversal => "reversal",
        };
        f.write_str(s)
    }
}

/// One line of a committed entry. Same shape as [`Line`]; a separate type so
/// committed records cannot be confused with not-yet-posted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLine {
    pub account: AccountCode,
    pub debit: i64,
    pub credit: i64,
    pub description: String,
}

impl From<Line> for EntryLine {
    fn from(line: Line) -> Self {
        Self {
            account: line.account,
            debit: line.debit,
            credit: line.credit,
            description: line.description,
        }
    }
}

impl EntryLine {
    /// The same line with debit and credit swapped (reversal shape).
    pub fn swapped(&self) -> Self {
        Self {
            account: self.account.clone(),
            debit: self.credit,
            credit: self.debit,
            description: self.description.clone(),
        }
    }
}

/// A committed ledger entry.
///
/// Append-only: once committed, lines never change. The single permitted
/// follow-up is a reversal, which creates a new entry and flips `reversed`
/// on this one. Both stay in the store forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub tenant_id: TenantId,
    pub period: Period,
    /// Strictly increasing per (tenant, period), gap-free.
    pub voucher_no: u64,
    pub date: NaiveDate,
    pub source: SourceType,
    pub lines: Vec<EntryLine>,
    pub reversed: bool,
    pub reversal_of: Option<EntryId>,
}

impl Entry {
    /// Total across the debit side (equals the credit side by invariant).
    pub fn total(&self) -> i128 {
        self.lines.iter().map(|l| l.debit as i128).sum()
    }

    pub fn touches_account(&self, account: &AccountCode) -> bool {
        self.lines.iter().any(|l| &l.account == account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_serializes_kebab_case() {
        let json = serde_json::to_string(&SourceType::OpeningBalance).unwrap();
        assert_eq!(json, "\"opening-balance\"");
        assert_eq!(SourceType::ManualCorrection.to_string(), "manual-correction");
    }

    #[test]
    fn swapped_line_exchanges_sides() {
        let line = EntryLine {
            account: AccountCode::new("1920").unwrap(),
            debit: 500,
            credit: 0,
            description: "bank".to_string(),
        };
        let swapped = line.swapped();
        assert_eq!(swapped.debit, 0);
        assert_eq!(swapped.credit, 500);
        assert_eq!(swapped.account, line.account);
    }
}
