//! Reduction of findings and assessment into a 1-10 lead score.

use serde::{Deserialize, Serialize};

use crate::models::{AIAssessment, Finding, Severity};

pub const MAX_SCORE: u8 = 10;
pub const MIN_SCORE: u8 = 1;

/// Penalty weights. The only knobs that influence the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub fail_penalty: u32,
    pub warn_penalty: u32,
    pub bad_lead_penalty: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            fail_penalty: 2,
            warn_penalty: 1,
            bad_lead_penalty: 1,
        }
    }
}

impl ScoringPolicy {
    pub fn penalty_for(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Fail => self.fail_penalty,
            Severity::Warn => self.warn_penalty,
            Severity::Info => 0,
        }
    }
}

/// Score with the default policy.
pub fn aggregate(findings: &[Finding], assessment: &AIAssessment) -> u8 {
    aggregate_with(&ScoringPolicy::default(), findings, assessment)
}

pub fn aggregate_with(policy: &ScoringPolicy, findings: &[Finding], assessment: &AIAssessment) -> u8 {
    let mut penalty: u32 = findings
        .iter()
        .map(|f| policy.penalty_for(f.severity))
        .fold(0, u32::saturating_add);

    if !assessment.is_good_lead {
        penalty = penalty.saturating_add(policy.bad_lead_penalty);
    }

    let raw = i64::from(MAX_SCORE) - i64::from(penalty);
    raw.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8
}
