//! Transaction-history snapshot types.
//!
//! History is handed in by the caller (the collaborator that owns posted
//! data); the scorer never reaches into storage itself. All derived
//! statistics are deterministic: ties break on ordered account sets, and the
//! math is plain mean/sample-stddev.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ledgerpilot_core::{AccountCode, CounterpartyId};
use ledgerpilot_ledger::Line;

/// One previously accepted entry for a counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEntry {
    pub counterparty: CounterpartyId,
    pub lines: Vec<Line>,
}

impl HistoricalEntry {
    fn account_set(&self) -> BTreeSet<AccountCode> {
        self.lines.iter().map(|l| l.account.clone()).collect()
    }

    fn total(&self) -> i64 {
        self.lines.iter().map(|l| l.debit).sum()
    }
}

/// The counterparty's dominant bookkeeping shape: the most frequent account
/// set, with each account's average share of the debit total.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalPattern {
    pub accounts: BTreeSet<AccountCode>,
    /// Average relative debit split per account, in [0, 1].
    pub split: BTreeMap<AccountCode, f64>,
}

/// Mean/spread of historical entry totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountStats {
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
}

/// Snapshot of accepted entries relevant to a scoring call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHistory {
    pub entries: Vec<HistoricalEntry>,
}

impl TransactionHistory {
    pub fn new(entries: Vec<HistoricalEntry>) -> Self {
        Self { entries }
    }

    fn for_counterparty<'a>(
        &'a self,
        counterparty: &'a CounterpartyId,
    ) -> impl Iterator<Item = &'a HistoricalEntry> {
        self.entries
            .iter()
            .filter(move |e| &e.counterparty == counterparty)
    }

    /// Number of prior accepted entries from this counterparty.
    pub fn accepted_count(&self, counterparty: &CounterpartyId) -> usize {
        self.for_counterparty(counterparty).count()
    }

    /// Dominant line pattern for the counterparty, if any history exists.
    ///
    /// Frequency ties break on the lexicographically smallest account set so
    /// repeated calls agree.
    pub fn modal_pattern(&self, counterparty: &CounterpartyId) -> Option<ModalPattern> {
        let mut by_set: BTreeMap<BTreeSet<AccountCode>, Vec<&HistoricalEntry>> = BTreeMap::new();
        for entry in self.for_counterparty(counterparty) {
            by_set.entry(entry.account_set()).or_default().push(entry);
        }

        let (accounts, entries) = by_set
            .into_iter()
            .max_by(|(set_a, a), (set_b, b)| {
                a.len().cmp(&b.len()).then(set_b.cmp(set_a))
            })?;

        let mut split: BTreeMap<AccountCode, f64> = BTreeMap::new();
        let mut counted = 0usize;
        for entry in &entries {
            let total = entry.total();
            if total <= 0 {
                continue;
            }
            counted += 1;
            for line in &entry.lines {
                if line.debit > 0 {
                    *split.entry(line.account.clone()).or_insert(0.0) +=
                        line.debit as f64 / total as f64;
                }
            }
        }
        if counted > 0 {
            for share in split.values_mut() {
                *share /= counted as f64;
            }
        }

        Some(ModalPattern { accounts, split })
    }

    /// Mean and sample standard deviation of the counterparty's totals.
    pub fn amount_stats(&self, counterparty: &CounterpartyId) -> Option<AmountStats> {
        let totals: Vec<f64> = self
            .for_counterparty(counterparty)
            .map(|e| e.total() as f64)
            .collect();
        if totals.is_empty() {
            return None;
        }

        let mean = totals.iter().sum::<f64>() / totals.len() as f64;
        let stddev = if totals.len() < 2 {
            0.0
        } else {
            let var = totals
                .iter()
                .map(|x| {
                    let d = x - mean;
                    d * d
                })
                .sum::<f64>()
                / ((totals.len() - 1) as f64);
            var.sqrt()
        };

        Some(AmountStats {
            mean,
            stddev,
            samples: totals.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(code: &str) -> AccountCode {
        AccountCode::new(code).unwrap()
    }

    fn counterparty() -> CounterpartyId {
        CounterpartyId::new("991234567").unwrap()
    }

    fn entry(debits: &[(&str, i64)], credit_amount: i64) -> HistoricalEntry {
        let mut lines: Vec<Line> = debits
            .iter()
            .map(|(code, amount)| Line::debit(acc(code), *amount, ""))
            .collect();
        lines.push(Line::credit(acc("2400"), credit_amount, ""));
        HistoricalEntry {
            counterparty: counterparty(),
            lines,
        }
    }

    #[test]
    fn modal_pattern_picks_the_most_frequent_account_set() {
        let history = TransactionHistory::new(vec![
            entry(&[("6100", 800), ("2710", 200)], 1000),
            entry(&[("6100", 400), ("2710", 100)], 500),
            entry(&[("6940", 300)], 300),
        ]);

        let modal = history.modal_pattern(&counterparty()).unwrap();
        let expected: BTreeSet<AccountCode> =
            [acc("6100"), acc("2710"), acc("2400")].into_iter().collect();
        assert_eq!(modal.accounts, expected);

        // 6100 carries 80% of the debit total in both modal entries.
        let share = modal.split.get(&acc("6100")).copied().unwrap();
        assert!((share - 0.8).abs() < 1e-9);
    }

    #[test]
    fn no_history_means_no_modal_pattern_and_no_stats() {
        let history = TransactionHistory::default();
        assert!(history.modal_pattern(&counterparty()).is_none());
        assert!(history.amount_stats(&counterparty()).is_none());
        assert_eq!(history.accepted_count(&counterparty()), 0);
    }

    #[test]
    fn amount_stats_use_sample_stddev() {
        let history = TransactionHistory::new(vec![
            entry(&[("6100", 100)], 100),
            entry(&[("6100", 200)], 200),
            entry(&[("6100", 300)], 300),
        ]);

        let stats = history.amount_stats(&counterparty()).unwrap();
        assert_eq!(stats.samples, 3);
        assert!((stats.mean - 200.0).abs() < 1e-9);
        assert!((stats.stddev - 100.0).abs() < 1e-9);
    }
}
