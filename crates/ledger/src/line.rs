use serde::{Deserialize, Serialize};

use ledgerpilot_core::{AccountCode, DomainError, DomainResult};

/// One side of a bookkeeping entry (immutable).
///
/// Amounts are in the smallest currency unit (e.g. øre/cents); integer
/// arithmetic only, so balance checks are exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub account: AccountCode,
    pub debit: i64,
    pub credit: i64,
    pub description: String,
}

impl Line {
    pub fn debit(account: AccountCode, amount: i64, description: impl Into<String>) -> Self {
        Self {
            account,
            debit: amount,
            credit: 0,
            description: description.into(),
        }
    }

    pub fn credit(account: AccountCode, amount: i64, description: impl Into<String>) -> Self {
        Self {
            account,
            debit: 0,
            credit: amount,
            description: description.into(),
        }
    }
}

/// Validate line shape and the balance invariant.
///
/// Anything arriving from the extraction collaborator passes through here
/// before it can reach the scorer or the ledger:
/// - the list must be non-empty
/// - amounts must be non-negative
/// - each line carries exactly one side (debit xor credit positive)
/// - total debits must equal total credits, exactly
pub fn validate_lines(lines: &[Line]) -> DomainResult<()> {
    if lines.is_empty() {
        return Err(DomainError::validation("entry must have at least one line"));
    }

    let mut debit_total: i128 = 0;
    let mut credit_total: i128 = 0;

    for (idx, line) in lines.iter().enumerate() {
        if line.debit < 0 || line.credit < 0 {
            return Err(DomainError::validation(format!(
                "line {idx}: amounts must not be negative"
            )));
        }
        match (line.debit > 0, line.credit > 0) {
            (true, true) => {
                return Err(DomainError::validation(format!(
                    "line {idx}: a line must be either debit or credit, not both"
                )));
            }
            (false, false) => {
                return Err(DomainError::validation(format!(
                    "line {idx}: a line must carry a debit or a credit amount"
                )));
            }
            _ => {}
        }
        debit_total += line.debit as i128;
        credit_total += line.credit as i128;
    }

    if debit_total != credit_total {
        return Err(DomainError::validation(format!(
            "lines do not balance: debit {debit_total} ≠ credit {credit_total}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(code: &str) -> AccountCode {
        AccountCode::new(code).unwrap()
    }

    #[test]
    fn balanced_lines_pass_validation() {
        let lines = vec![
            Line::debit(acc("6100"), 1000, "freight"),
            Line::credit(acc("2400"), 1000, "payable"),
        ];
        assert!(validate_lines(&lines).is_ok());
    }

    #[test]
    fn unbalanced_lines_report_both_totals() {
        let lines = vec![
            Line::debit(acc("6100"), 1000, ""),
            Line::credit(acc("2400"), 950, ""),
        ];
        let err = validate_lines(&lines).unwrap_err();
        match err {
            DomainError::Validation(msg) => {
                assert!(msg.contains("debit 1000"), "message was: {msg}");
                assert!(msg.contains("credit 950"), "message was: {msg}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_line_list_is_rejected() {
        assert!(validate_lines(&[]).is_err());
    }

    #[test]
    fn two_sided_and_zero_lines_are_rejected() {
        let both = vec![Line {
            account: acc("6100"),
            debit: 100,
            credit: 100,
            description: String::new(),
        }];
        assert!(validate_lines(&both).is_err());

        let neither = vec![Line {
            account: acc("6100"),
            debit: 0,
            credit: 0,
            description: String::new(),
        }];
        assert!(validate_lines(&neither).is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let lines = vec![
            Line {
                account: acc("6100"),
                debit: -100,
                credit: 0,
                description: String::new(),
            },
            Line::credit(acc("2400"), -100, ""),
        ];
        assert!(validate_lines(&lines).is_err());
    }
}
