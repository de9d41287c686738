use serde::{Deserialize, Serialize};

use ledgerpilot_core::PatternId;

/// A scoring signal factor. Closed set; each factor has a fixed point cap
/// and the caps sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Factor {
    CounterpartyFamiliarity,
    HistoricalSimilarity,
    AmountValidation,
    PatternMatch,
    AmountReasonableness,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::CounterpartyFamiliarity,
        Factor::HistoricalSimilarity,
        Factor::AmountValidation,
        Factor::PatternMatch,
        Factor::AmountReasonableness,
    ];

    pub fn cap(&self) -> u8 {
        match self {
            Factor::CounterpartyFamiliarity => 30,
            Factor::HistoricalSimilarity => 30,
            Factor::AmountValidation => 20,
            Factor::PatternMatch => 15,
            Factor::AmountReasonableness => 5,
        }
    }
}

impl core::fmt::Display for Factor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Factor::CounterpartyFamiliarity => "counterparty familiarity",
            Factor::HistoricalSimilarity => "historical similarity",
            Factor::AmountValidation => "amount validation",
            Factor::PatternMatch => "pattern match",
            Factor::AmountReasonableness => "amount reasonableness",
        };
        f.write_str(s)
    }
}

/// One factor's contribution to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub points: u8,
}

/// A computed trust score for a proposal.
///
/// Pure value: never mutated, recomputed from scratch when the pattern store
/// changes. `matched_pattern` carries the pattern that influenced the score
/// so later approvals/corrections can confirm or contradict it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub total: u8,
    pub breakdown: Vec<FactorScore>,
    pub rationale: String,
    pub matched_pattern: Option<PatternId>,
}

impl Score {
    /// Assemble a score from factor contributions. The total is the clamped
    /// integer sum; the rationale concatenates one phrase per non-zero
    /// factor.
    pub fn from_breakdown(
        breakdown: Vec<FactorScore>,
        phrases: Vec<String>,
        matched_pattern: Option<PatternId>,
    ) -> Self {
        let sum: u32 = breakdown.iter().map(|f| u32::from(f.points)).sum();
        Self {
            total: sum.min(100) as u8,
            breakdown,
            rationale: phrases.join("; "),
            matched_pattern,
        }
    }

    /// The factor that scored lowest relative to its cap.
    ///
    /// Drives the issue category when a proposal is escalated. Absent a
    /// matched pattern the pattern factor is skipped — most proposals have
    /// no pattern, and "no pattern" is not the reviewable problem. Ties
    /// resolve in declaration order of [`Factor::ALL`].
    pub fn weakest_factor(&self) -> Factor {
        self.breakdown
            .iter()
            .filter(|f| f.factor != Factor::PatternMatch || self.matched_pattern.is_some())
            .min_by_key(|f| u32::from(f.points) * 100 / u32::from(f.factor.cap()))
            .map(|f| f.factor)
            .unwrap_or(Factor::CounterpartyFamiliarity)
    }

    pub fn points_for(&self, factor: Factor) -> u8 {
        self.breakdown
            .iter()
            .find(|f| f.factor == factor)
            .map(|f| f.points)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(points: [u8; 5]) -> Vec<FactorScore> {
        Factor::ALL
            .iter()
            .zip(points)
            .map(|(factor, points)| FactorScore {
                factor: *factor,
                points,
            })
            .collect()
    }

    #[test]
    fn caps_sum_to_one_hundred() {
        let total: u32 = Factor::ALL.iter().map(|f| u32::from(f.cap())).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn total_is_clamped_to_one_hundred() {
        let score = Score::from_breakdown(breakdown([30, 30, 20, 15, 5]), vec![], None);
        assert_eq!(score.total, 100);
    }

    #[test]
    fn weakest_factor_is_relative_to_cap() {
        // Pattern match 3/15 (20%) is weaker than familiarity 15/30 (50%).
        let score = Score::from_breakdown(
            breakdown([15, 30, 20, 3, 5]),
            vec![],
            Some(PatternId::new()),
        );
        assert_eq!(score.weakest_factor(), Factor::PatternMatch);
    }

    #[test]
    fn weakest_factor_skips_the_pattern_factor_when_nothing_matched() {
        let score = Score::from_breakdown(breakdown([15, 30, 20, 0, 5]), vec![], None);
        assert_eq!(score.weakest_factor(), Factor::CounterpartyFamiliarity);
    }
}
