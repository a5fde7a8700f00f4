//! Fixed battery of heuristic checks over a fetched page.
//!
//! Every registered check yields exactly one finding. A check that errors or
//! panics is reported as an `info` finding so the rest of the battery still runs.

use std::panic::{self, AssertUnwindSafe};

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::extractor::{self, business_name_from_title};
use crate::models::{ExtractedContent, FetchResult, Finding, Severity, TechnicalFindings};

/// Load-time cutoffs in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedThresholds {
    pub warn_ms: u64,
    pub fail_ms: u64,
}

impl Default for SpeedThresholds {
    fn default() -> Self {
        Self {
            warn_ms: 3000,
            fail_ms: 8000,
        }
    }
}

const GENERIC_TITLES: &[&str] = &[
    "home",
    "index",
    "welcome",
    "untitled",
    "untitled document",
    "new page",
    "default",
];

const CTA_PHRASES: &[&str] = &[
    "call now",
    "contact us",
    "get a quote",
    "get quote",
    "free estimate",
    "schedule",
    "book now",
    "hire",
    "order",
];

const SOCIAL_PROOF_WORDS: &[&str] = &[
    "review",
    "testimonial",
    "customer",
    "client",
    "rating",
    "feedback",
    "recommend",
];

const SITE_BUILDERS: &[&str] = &["weebly", "wix", "squarespace", "godaddy"];

const PROFESSIONAL_WORDS: &[&str] = &[
    "services",
    "about",
    "experience",
    "professional",
    "licensed",
    "insured",
    "certified",
    "quality",
    "expert",
];

/// Distinct professional terms a page needs to read as an established business.
const MIN_PROFESSIONAL_WORDS: usize = 4;

const PLACEHOLDER_PHRASES: &[&str] = &["under construction", "coming soon"];

/// Visible text shorter than this reads as a stub page.
const MIN_CONTENT_CHARS: usize = 500;

const CONTACT_WORDS: &[&str] = &["contact", "phone", "call", "email", "@", "address"];

/// Inputs shared by every check. Page text is parsed at most once.
pub struct CheckContext<'a> {
    pub fetch: &'a FetchResult,
    pub extracted: &'a ExtractedContent,
    pub speed: SpeedThresholds,
    page_text: OnceCell<String>,
}

impl<'a> CheckContext<'a> {
    pub fn new(fetch: &'a FetchResult, extracted: &'a ExtractedContent, speed: SpeedThresholds) -> Self {
        Self {
            fetch,
            extracted,
            speed,
            page_text: OnceCell::new(),
        }
    }

    /// Lowercased visible text of the whole page.
    fn page_text(&self) -> &str {
        self.page_text
            .get_or_init(|| extractor::page_text(&self.fetch.html).to_lowercase())
    }
}

pub type CheckFn = fn(&CheckContext<'_>) -> Result<Finding, String>;

/// Registration order is the findings order.
pub const BATTERY: &[(&str, CheckFn)] = &[
    ("ssl_check", ssl_check),
    ("mobile_friendly", mobile_friendly),
    ("page_speed", page_speed),
    ("seo_title", seo_title),
    ("seo_meta_description", seo_meta_description),
    ("contact_info", contact_info),
    ("call_to_action", call_to_action),
    ("social_proof", social_proof),
    ("images_media", images_media),
    ("site_builder", site_builder),
    ("professional_content", professional_content),
    ("placeholder_site", placeholder_site),
    ("contact_channels", contact_channels),
];

pub fn run_checks(fetch: &FetchResult, extracted: &ExtractedContent) -> TechnicalFindings {
    run_checks_with(fetch, extracted, SpeedThresholds::default())
}

pub fn run_checks_with(
    fetch: &FetchResult,
    extracted: &ExtractedContent,
    speed: SpeedThresholds,
) -> TechnicalFindings {
    let ctx = CheckContext::new(fetch, extracted, speed);
    BATTERY
        .iter()
        .map(|(id, check)| run_isolated(id, *check, &ctx))
        .collect()
}

fn run_isolated(id: &str, check: CheckFn, ctx: &CheckContext<'_>) -> Finding {
    match panic::catch_unwind(AssertUnwindSafe(|| check(ctx))) {
        Ok(Ok(finding)) => finding,
        Ok(Err(reason)) => {
            warn!(check = id, reason = %reason, "Check could not run");
            Finding::issue(id, Severity::Info, format!("Check could not run: {}", reason))
        }
        Err(_) => {
            warn!(check = id, "Check panicked");
            Finding::issue(id, Severity::Info, "Check could not run: internal error")
        }
    }
}

pub fn is_generic_title(title: &str) -> bool {
    match business_name_from_title(title) {
        None => true,
        Some(name) => {
            let name = name.to_lowercase();
            name.chars().count() < 4 || GENERIC_TITLES.contains(&name.as_str())
        }
    }
}

fn ssl_check(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "ssl_check";
    Ok(match (ctx.fetch.is_https, ctx.fetch.ssl_valid) {
        (true, true) => Finding::pass(ID, "Site is served over HTTPS with a valid certificate."),
        (false, _) => Finding::issue(ID, Severity::Fail, "No SSL (site not served over HTTPS)."),
        (true, false) => Finding::issue(ID, Severity::Fail, "SSL certificate is invalid or expired."),
    })
}

fn mobile_friendly(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "mobile_friendly";
    Ok(if ctx.extracted.has_viewport_meta {
        Finding::pass(ID, "Mobile viewport meta tag present.")
    } else {
        Finding::issue(ID, Severity::Warn, "Missing mobile viewport meta tag (not mobile-friendly).")
    })
}

fn page_speed(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "page_speed";
    let SpeedThresholds { warn_ms, fail_ms } = ctx.speed;
    if warn_ms > fail_ms {
        return Err(format!("warn threshold {}ms exceeds fail threshold {}ms", warn_ms, fail_ms));
    }

    let elapsed = ctx.fetch.elapsed_ms;
    let seconds = elapsed as f64 / 1000.0;
    Ok(if elapsed > fail_ms {
        Finding::issue(
            ID,
            Severity::Fail,
            format!("Page load time {:.1}s (far slower than {:.1}s).", seconds, fail_ms as f64 / 1000.0),
        )
    } else if elapsed > warn_ms {
        Finding::issue(
            ID,
            Severity::Warn,
            format!("Page load time {:.1}s (slower than {:.1}s).", seconds, warn_ms as f64 / 1000.0),
        )
    } else {
        Finding::pass(ID, format!("Page loaded in {:.1}s.", seconds))
    })
}

fn seo_title(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "seo_title";
    Ok(match ctx.extracted.title.as_deref() {
        _ if !ctx.extracted.has_title_tag => {
            Finding::issue(ID, Severity::Fail, "Missing page title (poor SEO).")
        }
        Some(title) if !is_generic_title(title) => Finding::pass(ID, "Descriptive page title present."),
        _ => Finding::issue(ID, Severity::Fail, "Generic or empty page title (poor SEO)."),
    })
}

fn seo_meta_description(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "seo_meta_description";
    Ok(if ctx.extracted.has_meta_description {
        Finding::pass(ID, "Meta description present.")
    } else {
        Finding::issue(ID, Severity::Warn, "Missing meta description (poor search snippets).")
    })
}

fn contact_info(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "contact_info";
    Ok(match &ctx.extracted.phone_number {
        Some(phone) => Finding::pass(ID, format!("Phone number visible: {}.", phone)),
        None => Finding::issue(ID, Severity::Warn, "No visible phone number found."),
    })
}

fn call_to_action(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "call_to_action";
    let text = ctx.page_text();
    Ok(if CTA_PHRASES.iter().any(|p| text.contains(p)) {
        Finding::pass(ID, "Call-to-action present.")
    } else {
        Finding::issue(ID, Severity::Info, "No clear call-to-action found.")
    })
}

fn social_proof(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "social_proof";
    let text = ctx.page_text();
    Ok(if SOCIAL_PROOF_WORDS.iter().any(|w| text.contains(w)) {
        Finding::pass(ID, "Social proof present.")
    } else {
        Finding::issue(ID, Severity::Info, "No social proof or testimonials visible.")
    })
}

fn images_media(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "images_media";
    Ok(if extractor::image_count(&ctx.fetch.html) >= 2 {
        Finding::pass(ID, "Page includes images.")
    } else {
        Finding::issue(ID, Severity::Info, "Few or no images found (poor visual appeal).")
    })
}

fn site_builder(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "site_builder";
    let text = ctx.page_text();
    Ok(match SITE_BUILDERS.iter().find(|b| text.contains(*b)) {
        Some(builder) => Finding::issue(
            ID,
            Severity::Info,
            format!("Appears to be built with a DIY site builder ({}).", builder),
        ),
        None => Finding::pass(ID, "No DIY site builder detected."),
    })
}

fn professional_content(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "professional_content";
    let text = ctx.page_text();
    let count = PROFESSIONAL_WORDS.iter().filter(|w| text.contains(*w)).count();
    Ok(if count >= MIN_PROFESSIONAL_WORDS {
        Finding::pass(ID, "Content uses professional business language.")
    } else {
        Finding::issue(ID, Severity::Info, "Content lacks sufficient professional business language.")
    })
}

fn placeholder_site(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "placeholder_site";
    let text = ctx.page_text();
    if let Some(phrase) = PLACEHOLDER_PHRASES.iter().find(|p| text.contains(*p)) {
        return Ok(Finding::issue(
            ID,
            Severity::Info,
            format!("Page looks unfinished (\"{}\").", phrase),
        ));
    }

    let chars = text.chars().count();
    Ok(if chars < MIN_CONTENT_CHARS {
        Finding::issue(
            ID,
            Severity::Info,
            format!("Minimal content ({} characters of visible text).", chars),
        )
    } else {
        Finding::pass(ID, "Page has substantial content.")
    })
}

fn contact_channels(ctx: &CheckContext<'_>) -> Result<Finding, String> {
    const ID: &str = "contact_channels";
    let text = ctx.page_text();
    Ok(if CONTACT_WORDS.iter().any(|w| text.contains(w)) {
        Finding::pass(ID, "Contact information visible.")
    } else {
        Finding::issue(ID, Severity::Info, "Limited contact information visible.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch(html: &str, elapsed_ms: u64, is_https: bool, ssl_valid: bool) -> FetchResult {
        FetchResult {
            final_url: "https://example.com/".into(),
            html: html.into(),
            status_code: 200,
            elapsed_ms,
            is_https,
            ssl_valid,
        }
    }

    fn finding<'a>(findings: &'a [Finding], id: &str) -> &'a Finding {
        findings.iter().find(|f| f.check_id == id).expect("finding present")
    }

    #[test]
    fn test_one_finding_per_check_in_order() {
        for html in ["", "<<<>>>", "<html><title>x", "\u{0}\u{1}garbage"] {
            let page = fetch(html, 0, false, false);
            let extracted = extractor::extract(html);
            let findings = run_checks(&page, &extracted);
            let ids: Vec<&str> = findings.iter().map(|f| f.check_id.as_str()).collect();
            let expected: Vec<&str> = BATTERY.iter().map(|(id, _)| *id).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_ssl_check_distinguishes_cases() {
        let extracted = ExtractedContent::default();
        let ok = run_checks(&fetch("", 0, true, true), &extracted);
        assert!(finding(&ok, "ssl_check").passed);

        let plain = run_checks(&fetch("", 0, false, false), &extracted);
        assert_eq!(finding(&plain, "ssl_check").severity, Severity::Fail);

        let expired = run_checks(&fetch("", 0, true, false), &extracted);
        let f = finding(&expired, "ssl_check");
        assert_eq!(f.severity, Severity::Fail);
        assert!(f.message.contains("certificate"));
    }

    #[test]
    fn test_page_speed_thresholds() {
        let extracted = ExtractedContent::default();
        let speed = |ms| finding(&run_checks(&fetch("", ms, true, true), &extracted), "page_speed").clone();

        assert!(speed(500).passed);
        assert!(speed(3000).passed);
        assert_eq!(speed(3001).severity, Severity::Warn);
        assert_eq!(speed(8000).severity, Severity::Warn);
        assert_eq!(speed(9000).severity, Severity::Fail);
    }

    #[test]
    fn test_inverted_thresholds_become_info_finding() {
        let thresholds = SpeedThresholds {
            warn_ms: 9000,
            fail_ms: 1000,
        };
        let findings = run_checks_with(&fetch("", 5000, true, true), &ExtractedContent::default(), thresholds);
        let f = finding(&findings, "page_speed");
        assert!(!f.passed);
        assert_eq!(f.severity, Severity::Info);
        assert!(f.message.starts_with("Check could not run"));
        assert_eq!(findings.len(), BATTERY.len());
    }

    #[test]
    fn test_panicking_check_is_contained() {
        fn boom(_: &CheckContext<'_>) -> Result<Finding, String> {
            panic!("boom")
        }
        let page = fetch("", 0, true, true);
        let extracted = ExtractedContent::default();
        let ctx = CheckContext::new(&page, &extracted, SpeedThresholds::default());
        let f = run_isolated("boom", boom, &ctx);
        assert_eq!(f.check_id, "boom");
        assert_eq!(f.severity, Severity::Info);
    }

    #[test]
    fn test_generic_titles() {
        assert!(is_generic_title("Home"));
        assert!(is_generic_title("  "));
        assert!(is_generic_title("Welcome | Home"));
        assert!(is_generic_title("Untitled Document"));
        assert!(is_generic_title("ABC"));
        assert!(!is_generic_title("Acme Plumbing | Home"));
    }

    #[test]
    fn test_seo_title_and_contact() {
        let html = "<html><head><title>Home</title></head><body></body></html>";
        let extracted = extractor::extract(html);
        let findings = run_checks(&fetch(html, 0, true, true), &extracted);
        assert_eq!(finding(&findings, "seo_title").severity, Severity::Fail);
        assert_eq!(finding(&findings, "contact_info").severity, Severity::Warn);
        assert_eq!(finding(&findings, "seo_meta_description").severity, Severity::Warn);
        assert_eq!(finding(&findings, "mobile_friendly").severity, Severity::Warn);
    }

    #[test]
    fn test_advisory_checks_never_penalize() {
        let html = "<html><body><p>Built with Wix</p></body></html>";
        let findings = run_checks(&fetch(html, 0, true, true), &extractor::extract(html));
        for id in [
            "call_to_action",
            "social_proof",
            "images_media",
            "site_builder",
            "professional_content",
            "placeholder_site",
            "contact_channels",
        ] {
            assert_eq!(finding(&findings, id).severity, Severity::Info);
        }
        assert!(!finding(&findings, "site_builder").passed);
    }

    #[test]
    fn test_professional_content_needs_four_terms() {
        let sparse = "<p>Quality work by an expert team.</p>";
        let findings = run_checks(&fetch(sparse, 0, true, true), &extractor::extract(sparse));
        assert!(!finding(&findings, "professional_content").passed);

        let rich = "<p>About us: licensed and insured professional services.</p>";
        let findings = run_checks(&fetch(rich, 0, true, true), &extractor::extract(rich));
        assert!(finding(&findings, "professional_content").passed);
    }

    #[test]
    fn test_placeholder_site_signals() {
        let long_text = "We repair furnaces and boilers across the metro. ".repeat(15);

        let construction = format!("<p>Site under construction.</p><p>{}</p>", long_text);
        let findings = run_checks(&fetch(&construction, 0, true, true), &extractor::extract(&construction));
        let f = finding(&findings, "placeholder_site");
        assert!(!f.passed);
        assert!(f.message.contains("under construction"));

        let stub = "<p>Coming later.</p>";
        let findings = run_checks(&fetch(stub, 0, true, true), &extractor::extract(stub));
        let f = finding(&findings, "placeholder_site");
        assert!(!f.passed);
        assert!(f.message.starts_with("Minimal content"));

        let full = format!("<p>{}</p>", long_text);
        let findings = run_checks(&fetch(&full, 0, true, true), &extractor::extract(&full));
        assert!(finding(&findings, "placeholder_site").passed);
    }

    #[test]
    fn test_contact_channels() {
        let email = "<p>Write to hello@bakery.example</p>";
        let findings = run_checks(&fetch(email, 0, true, true), &extractor::extract(email));
        assert!(finding(&findings, "contact_channels").passed);

        let silent = "<p>Fresh bread daily.</p>";
        let findings = run_checks(&fetch(silent, 0, true, true), &extractor::extract(silent));
        let f = finding(&findings, "contact_channels");
        assert!(!f.passed);
        assert_eq!(f.severity, Severity::Info);
    }
}
