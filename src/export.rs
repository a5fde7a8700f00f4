//! Plain-text report for clipboard or downstream document rendering.

use std::fmt::Write;

use crate::models::{AnalysisResult, Artifacts, ScoreBand};

pub fn plain_text_report(result: &AnalysisResult, artifacts: &Artifacts) -> String {
    let mut out = String::new();
    let assessment = result.assessment();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Website Analysis Results for {}", result.url());
    let _ = writeln!(out, "Analyzed: {}", result.analyzed_at().format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(
        out,
        "Score: {}/10 ({:?})",
        result.score(),
        ScoreBand::from_score(result.score())
    );

    out.push_str("\nIssues Found:\n");
    let issues = result.issues_by_severity();
    if issues.is_empty() {
        out.push_str("Excellent! This website passes all basic checks.\n");
    }
    for finding in issues {
        let _ = writeln!(out, "• {}", finding.message);
    }

    let verdict = if assessment.is_good_lead { "Yes" } else { "No" };
    let _ = writeln!(out, "\nLead Qualification: {}", verdict);
    let _ = writeln!(out, "{}", assessment.lead_rationale);
    let _ = writeln!(out, "\nSummary:\n{}", assessment.summary);

    let _ = writeln!(out, "\nSite Rebuild Prompt:\n{}", artifacts.rebuild_prompt.trim_end());
    let _ = writeln!(out, "\nOutreach Email:\n{}", artifacts.outreach_email.trim_end());
    let _ = writeln!(out, "\nOutreach DM:\n{}", artifacts.outreach_dm.trim_end());
    out
}
