//! Outreach artifacts rendered from an analysis by plain placeholder substitution.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use crate::models::{AnalysisResult, Artifacts, ExtractedContent, Severity};

pub const TOP_ISSUES: usize = 3;

pub const NAME_PLACEHOLDER: &str = "your business";
pub const PHONE_PLACEHOLDER: &str = "call for details";
pub const NO_ISSUES: &str = "No major issues found";
const DEFAULT_BUSINESS_TYPE: &str = "Local Business";
const DEFAULT_LOCATION: &str = "Local Area";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(\w+)\}").expect("Failed to compile placeholder pattern")
});

const REBUILD_PROMPT_TEMPLATE: &str = "\
Build a modern, mobile-first website for {business_name}, a {business_type} serving the {location}.
Current domain: {domain}
Phone: {phone}

The current site scored {score}/10. Fix these problems first:
{issues}

Requirements:
- Responsive layout with a viewport meta tag and fast load times (under 3 seconds)
- Served over HTTPS
- Descriptive page title and meta description for local search
- Click-to-call phone number in the header and footer
- Clear call-to-action above the fold (\"Get a free estimate\")
- Services, About, Testimonials and Contact sections
";

const OUTREACH_EMAIL_TEMPLATE: &str = "\
Subject: A few quick wins for the {business_name} website

Hi {business_name} team,

I took a look at {domain} and put together a short review. The site scored {score}/10, and a few things stood out that are likely costing you calls:

{issues}

Most visitors now find local businesses on their phones, and issues like these send them to a competitor before they ever reach out. The good news is they are all straightforward to fix.

I would be happy to share the full report or sketch out what an updated site could look like, no strings attached. Would a quick call this week work?

Phone: {phone}

Best regards,
";

const OUTREACH_DM_TEMPLATE: &str = "\
Hey {business_name}! I came across {domain} and noticed a couple of things that might be costing you customers: {issues_inline}. I help local businesses fix exactly this kind of thing. Happy to send over a free quick review if it is useful. (Phone: {phone})";

pub fn render(result: &AnalysisResult, extracted: &ExtractedContent) -> Artifacts {
    // Advisory notes and checks that could not run stay out of customer-facing text.
    let issues: Vec<&str> = result
        .issues_by_severity()
        .into_iter()
        .filter(|f| f.severity > Severity::Info)
        .take(TOP_ISSUES)
        .map(|f| f.message.as_str())
        .collect();

    let issues_block = if issues.is_empty() {
        format!("- {}", NO_ISSUES)
    } else {
        issues.iter().map(|m| format!("- {}", m)).collect::<Vec<_>>().join("\n")
    };
    let issues_inline = if issues.is_empty() {
        NO_ISSUES.to_lowercase()
    } else {
        issues
            .iter()
            .map(|m| m.trim_end_matches('.').to_lowercase())
            .collect::<Vec<_>>()
            .join("; ")
    };

    let business_name = non_empty(extracted.business_name.as_deref()).unwrap_or(NAME_PLACEHOLDER);
    let phone = non_empty(extracted.phone_number.as_deref()).unwrap_or(PHONE_PLACEHOLDER);
    let domain = domain_of(result.url());
    let score = result.score().to_string();
    let business_type = business_type(&extracted.text_sample);

    // One pass over the template: substituted values are never rescanned.
    let fill = |template: &str| {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "business_name" => business_name.to_string(),
                "business_type" => business_type.to_string(),
                "location" => DEFAULT_LOCATION.to_string(),
                "domain" => domain.clone(),
                "phone" => phone.to_string(),
                "score" => score.clone(),
                "issues_inline" => issues_inline.clone(),
                "issues" => issues_block.clone(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    };

    Artifacts {
        rebuild_prompt: fill(REBUILD_PROMPT_TEMPLATE),
        outreach_email: fill(OUTREACH_EMAIL_TEMPLATE),
        outreach_dm: fill(OUTREACH_DM_TEMPLATE),
    }
}

/// Rough trade classification from page wording.
pub fn business_type(text: &str) -> &'static str {
    const RULES: &[(&[&str], &str)] = &[
        (&["plumb", "pipe", "drain"], "Plumbing Company"),
        (&["electric", "wiring"], "Electrical Company"),
        (&["roof", "gutter", "shingle"], "Roofing Company"),
        (&["hvac", "furnace", "air condition"], "HVAC Company"),
        (&["lawn", "landscap", "garden"], "Landscaping Company"),
    ];

    let text = text.to_lowercase();
    RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| text.contains(w)))
        .map(|(_, kind)| *kind)
        .unwrap_or(DEFAULT_BUSINESS_TYPE)
}

fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| "your website".to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AIAssessment, Finding, Severity};
    use crate::scoring::ScoringPolicy;

    fn result(findings: Vec<Finding>, extracted: ExtractedContent) -> AnalysisResult {
        let assessment = AIAssessment {
            summary: "s".into(),
            strengths: vec![],
            weaknesses: vec![],
            is_good_lead: true,
            lead_rationale: "r".into(),
        };
        AnalysisResult::new(
            "https://www.acmeplumbing.com/",
            findings,
            assessment,
            extracted,
            &ScoringPolicy::default(),
        )
    }

    #[test]
    fn test_phone_is_rendered_when_present() {
        let extracted = ExtractedContent {
            business_name: Some("Acme Plumbing".into()),
            phone_number: Some("(612) 555-0134".into()),
            ..Default::default()
        };
        let artifacts = render(&result(vec![], extracted.clone()), &extracted);
        for text in [&artifacts.rebuild_prompt, &artifacts.outreach_email, &artifacts.outreach_dm] {
            assert!(text.contains("(612) 555-0134"));
            assert!(text.contains("Acme Plumbing"));
            assert!(!text.contains('{'));
        }
    }

    #[test]
    fn test_placeholders_when_fields_missing() {
        let extracted = ExtractedContent::default();
        let artifacts = render(&result(vec![], extracted.clone()), &extracted);
        for text in [&artifacts.rebuild_prompt, &artifacts.outreach_email, &artifacts.outreach_dm] {
            assert!(text.contains("Phone: call for details"));
            assert!(text.contains(NAME_PLACEHOLDER));
        }
        assert!(artifacts.outreach_email.contains(NO_ISSUES));
    }

    #[test]
    fn test_top_three_issues_by_severity() {
        let findings = vec![
            Finding::issue("a", Severity::Warn, "Warn one."),
            Finding::issue("b", Severity::Info, "Note only."),
            Finding::issue("c", Severity::Fail, "Fail one."),
            Finding::issue("d", Severity::Warn, "Warn two."),
            Finding::issue("e", Severity::Warn, "Warn three."),
        ];
        let extracted = ExtractedContent::default();
        let artifacts = render(&result(findings, extracted.clone()), &extracted);

        let email = &artifacts.outreach_email;
        assert!(email.contains("- Fail one.\n- Warn one.\n- Warn two."));
        assert!(!email.contains("Warn three."));
        assert!(!email.contains("Note only."));
        assert!(email.contains("acmeplumbing.com"));
        assert!(email.contains("5/10"));
    }

    #[test]
    fn test_page_text_is_not_rescanned_for_placeholders() {
        let extracted = ExtractedContent {
            business_name: Some("Acme {score} {phone} {issues}".into()),
            ..Default::default()
        };
        let artifacts = render(&result(vec![], extracted.clone()), &extracted);
        assert!(artifacts.outreach_dm.starts_with("Hey Acme {score} {phone} {issues}!"));
        assert!(artifacts.outreach_email.contains("Hi Acme {score} {phone} {issues} team"));
        assert!(artifacts.outreach_dm.contains("(Phone: call for details)"));
    }

    #[test]
    fn test_info_findings_stay_out_of_outreach() {
        let findings = vec![
            Finding::issue("page_speed", Severity::Info, "Check could not run: warn threshold 9000ms exceeds fail threshold 1000ms"),
            Finding::issue("social_proof", Severity::Info, "No social proof or testimonials visible."),
            Finding::issue("contact_info", Severity::Warn, "No visible phone number found."),
        ];
        let extracted = ExtractedContent::default();
        let artifacts = render(&result(findings, extracted.clone()), &extracted);

        for text in [&artifacts.rebuild_prompt, &artifacts.outreach_email, &artifacts.outreach_dm] {
            assert!(!text.contains("Check could not run"));
            assert!(!text.contains("social proof"));
        }
        assert!(artifacts.outreach_email.contains("- No visible phone number found."));
    }

    #[test]
    fn test_business_type_heuristic() {
        assert_eq!(business_type("Emergency DRAIN cleaning"), "Plumbing Company");
        assert_eq!(business_type("Shingle replacement"), "Roofing Company");
        assert_eq!(business_type("Fresh bagels daily"), DEFAULT_BUSINESS_TYPE);
    }
}
