use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::{self, ScoringPolicy};

/// Raw outcome of fetching a single page.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub final_url: String,
    pub html: String,
    pub status_code: u16,
    pub elapsed_ms: u64,
    pub is_https: bool,
    pub ssl_valid: bool,
}

/// Facts pulled out of a page's HTML. Derived purely from the markup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedContent {
    pub business_name: Option<String>,
    pub phone_number: Option<String>,
    pub text_sample: String,
    pub title: Option<String>,
    pub h1: Option<String>,
    /// The page renders some text, independent of the sample budget.
    pub has_visible_text: bool,
    pub has_viewport_meta: bool,
    pub has_title_tag: bool,
    pub has_meta_description: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Fail,
}

/// One check's verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub check_id: String,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn pass(check_id: &str, message: impl Into<String>) -> Self {
        Self {
            check_id: check_id.to_string(),
            passed: true,
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn issue(check_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check_id: check_id.to_string(),
            passed: false,
            severity,
            message: message.into(),
        }
    }
}

pub type TechnicalFindings = Vec<Finding>;

/// Validated qualitative review returned by the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIAssessment {
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub is_good_lead: bool,
    pub lead_rationale: String,
}

/// Full outcome of one analysis. The score is only ever computed from the
/// findings and assessment, so it has no setter.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    url: String,
    score: u8,
    findings: TechnicalFindings,
    assessment: AIAssessment,
    extracted: ExtractedContent,
    analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(
        url: impl Into<String>,
        findings: TechnicalFindings,
        assessment: AIAssessment,
        extracted: ExtractedContent,
        policy: &ScoringPolicy,
    ) -> Self {
        let score = scoring::aggregate_with(policy, &findings, &assessment);
        Self {
            url: url.into(),
            score,
            findings,
            assessment,
            extracted,
            analyzed_at: Utc::now(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn assessment(&self) -> &AIAssessment {
        &self.assessment
    }

    pub fn extracted(&self) -> &ExtractedContent {
        &self.extracted
    }

    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    /// Failed findings, most severe first. Ties keep battery order.
    pub fn issues_by_severity(&self) -> Vec<&Finding> {
        let mut issues: Vec<&Finding> = self.findings.iter().filter(|f| !f.passed).collect();
        issues.sort_by(|a, b| b.severity.cmp(&a.severity));
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifacts {
    pub rebuild_prompt: String,
    pub outreach_email: String,
    pub outreach_dm: String,
}

/// Display band for a score, used by callers for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            7.. => ScoreBand::High,
            4..=6 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}
