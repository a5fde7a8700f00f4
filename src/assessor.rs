//! Qualitative review of a site through a language model.
//!
//! The model's reply is untrusted: it is parsed against a strict schema and
//! anything that does not fit is rejected as `invalid_response`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AssessmentError, AssessmentErrorKind};
use crate::llm::{CompletionError, CompletionService};
use crate::models::{AIAssessment, ExtractedContent, Finding, Severity};

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(750);

/// Shape the model is asked to produce. `is_good_lead` is the only field with
/// a default: an unknown lead is never a good lead.
#[derive(Deserialize)]
struct RawAssessment {
    summary: String,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    #[serde(default)]
    is_good_lead: Option<bool>,
    lead_rationale: String,
}

#[derive(Clone)]
pub struct Assessor {
    service: Arc<dyn CompletionService>,
    timeout: Duration,
    retry_backoff: Duration,
}

impl Assessor {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            timeout: DEFAULT_AI_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub async fn assess(
        &self,
        extracted: &ExtractedContent,
        findings: &[Finding],
        model: &str,
    ) -> Result<AIAssessment, AssessmentError> {
        let prompt = build_prompt(extracted, findings);
        debug!(model, prompt_chars = prompt.len(), "Requesting AI assessment");

        let reply = match self.service.complete(model, &prompt, self.timeout).await {
            Ok(reply) => reply,
            Err(err) if err.is_transient() => {
                warn!(error = %err, "Transient AI failure, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.service
                    .complete(model, &prompt, self.timeout)
                    .await
                    .map_err(|err| {
                        if err.is_transient() {
                            AssessmentError::new(AssessmentErrorKind::TransientExhausted, err.to_string())
                        } else {
                            to_assessment_error(err)
                        }
                    })?
            }
            Err(err) => return Err(to_assessment_error(err)),
        };

        let assessment = parse_assessment(&reply)?;
        info!(is_good_lead = assessment.is_good_lead, "AI assessment complete");
        Ok(assessment)
    }
}

fn to_assessment_error(err: CompletionError) -> AssessmentError {
    let kind = match &err {
        CompletionError::Auth(_) => AssessmentErrorKind::Auth,
        CompletionError::Quota(_) => AssessmentErrorKind::Quota,
        CompletionError::BadRequest(_) => AssessmentErrorKind::BadRequest,
        CompletionError::Malformed(_) => AssessmentErrorKind::InvalidResponse,
        CompletionError::RateLimited(_)
        | CompletionError::Server { .. }
        | CompletionError::Timeout
        | CompletionError::Network(_) => AssessmentErrorKind::TransientExhausted,
    };
    AssessmentError::new(kind, err.to_string())
}

pub fn build_prompt(extracted: &ExtractedContent, findings: &[Finding]) -> String {
    let name = extracted.business_name.as_deref().unwrap_or("Unknown business");
    let rendered_findings = render_findings(findings);

    let mut prompt = String::with_capacity(extracted.text_sample.len() + rendered_findings.len() + 1200);
    prompt.push_str(
        "You are evaluating a local business website as a lead for website redesign services.\n\
         Businesses with a poor web presence (missing contact info, poor mobile experience, slow \
         loading, unprofessional appearance, DIY site builders) are prime candidates.\n\n",
    );
    prompt.push_str("Business name: ");
    prompt.push_str(name);
    prompt.push_str("\n\nTechnical findings:\n");
    prompt.push_str(&rendered_findings);
    prompt.push_str("\nPage text sample:\n\"\"\"\n");
    prompt.push_str(&extracted.text_sample);
    prompt.push_str(
        "\n\"\"\"\n\nRespond with only a JSON object with exactly these keys:\n\
         {\"summary\": string, \"strengths\": [string], \"weaknesses\": [string], \
         \"is_good_lead\": boolean, \"lead_rationale\": string}\n\
         The lead_rationale should be 2-3 sentences on how these issues are likely costing \
         the business customers.",
    );
    prompt
}

fn render_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| {
            let tag = match (f.passed, f.severity) {
                (true, _) => "PASS",
                (false, Severity::Fail) => "FAIL",
                (false, Severity::Warn) => "WARN",
                (false, Severity::Info) => "NOTE",
            };
            format!("- [{}] {}: {}\n", tag, f.check_id, f.message)
        })
        .collect()
}

/// Validate a model reply into an assessment. Tolerates markdown code fences
/// and prose around the JSON object, nothing else.
pub fn parse_assessment(reply: &str) -> Result<AIAssessment, AssessmentError> {
    let invalid = |detail: String| AssessmentError::new(AssessmentErrorKind::InvalidResponse, detail);

    let start = reply.find('{').ok_or_else(|| invalid("no JSON object in reply".into()))?;
    let end = reply.rfind('}').ok_or_else(|| invalid("no JSON object in reply".into()))?;
    if end < start {
        return Err(invalid("no JSON object in reply".into()));
    }

    let raw: RawAssessment =
        serde_json::from_str(&reply[start..=end]).map_err(|e| invalid(e.to_string()))?;

    if raw.summary.trim().is_empty() {
        return Err(invalid("summary is empty".into()));
    }

    Ok(AIAssessment {
        summary: raw.summary.trim().to_string(),
        strengths: raw.strengths,
        weaknesses: raw.weaknesses,
        is_good_lead: raw.is_good_lead.unwrap_or(false),
        lead_rationale: raw.lead_rationale.trim().to_string(),
    })
}
