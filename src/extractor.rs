use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::models::ExtractedContent;

pub const DEFAULT_MAX_TEXT_SAMPLE_CHARS: usize = 2000;

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to parse title selector")
});

static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1").expect("Failed to parse h1 selector")
});

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta").expect("Failed to parse meta selector")
});

static TEL_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to parse link selector")
});

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img[src]").expect("Failed to parse img selector")
});

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?1[\s.\-]?)?\(?([2-9]\d{2})\)?[\s.\-]?(\d{3})[\s.\-]?(\d{4})")
        .expect("Failed to compile phone pattern")
});

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Title segments that say nothing about the business.
const TITLE_NOISE: &[&str] = &[
    "home",
    "homepage",
    "home page",
    "welcome",
    "index",
    "official site",
    "official website",
];

const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: ", " · ", " » "];

/// Extract with the default text budget and no page URL.
pub fn extract(html: &str) -> ExtractedContent {
    extract_from_page(html, None, DEFAULT_MAX_TEXT_SAMPLE_CHARS)
}

/// Extract facts from a page. Never fails: malformed markup yields empty fields.
/// `page_url` feeds the business-name fallback when neither title nor h1 help.
pub fn extract_from_page(html: &str, page_url: Option<&str>, max_text_chars: usize) -> ExtractedContent {
    let document = Html::parse_document(html);

    let title_element = document.select(&TITLE_SELECTOR).next();
    let title = title_element
        .map(element_text)
        .filter(|t| !t.is_empty());
    let h1 = document
        .select(&H1_SELECTOR)
        .map(element_text)
        .find(|t| !t.is_empty());

    let (has_viewport_meta, has_meta_description) = meta_flags(&document);

    let text = visible_text(&document);
    let phone_number = find_phone(&text).or_else(|| tel_link_phone(&document));

    let business_name = title
        .as_deref()
        .and_then(business_name_from_title)
        .or_else(|| h1.clone())
        .or_else(|| page_url.and_then(business_name_from_url));

    ExtractedContent {
        business_name,
        phone_number,
        text_sample: text.chars().take(max_text_chars).collect(),
        title,
        h1,
        has_visible_text: !text.is_empty(),
        has_viewport_meta,
        has_title_tag: title_element.is_some(),
        has_meta_description,
    }
}

/// All rendered text of a page, whitespace collapsed.
pub fn page_text(html: &str) -> String {
    visible_text(&Html::parse_document(html))
}

/// Number of `<img>` tags carrying a `src`.
pub fn image_count(html: &str) -> usize {
    Html::parse_document(html).select(&IMG_SELECTOR).count()
}

/// Strip separator-delimited noise such as "| Home" from a title.
pub fn business_name_from_title(title: &str) -> Option<String> {
    let mut segments = vec![title.to_string()];
    for sep in TITLE_SEPARATORS {
        segments = segments
            .iter()
            .flat_map(|s| s.split(sep).map(str::to_string).collect::<Vec<_>>())
            .collect();
    }

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty() && !TITLE_NOISE.contains(&s.to_lowercase().as_str()))
}

/// "https://www.acme-plumbing.com/about" -> "Acme Plumbing".
pub fn business_name_from_url(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let label = host.split('.').next()?;
    if label.is_empty() || label.parse::<u8>().is_ok() {
        return None;
    }

    let name = label
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

/// First North-American number in `text`, formatted as `(XXX) XXX-XXXX`.
pub fn find_phone(text: &str) -> Option<String> {
    PHONE_PATTERN.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();
        if before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(format!("({}) {}-{}", &caps[1], &caps[2], &caps[3]))
    })
}

fn tel_link_phone(document: &Html) -> Option<String> {
    document
        .select(&TEL_LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.trim().strip_prefix("tel:"))
        .find_map(find_phone)
}

fn meta_flags(document: &Html) -> (bool, bool) {
    let mut viewport = false;
    let mut description = false;
    for meta in document.select(&META_SELECTOR) {
        match meta.value().attr("name").map(|n| n.trim().to_ascii_lowercase()) {
            Some(name) if name == "viewport" => viewport = true,
            Some(name) if name == "description" => description = true,
            _ => {}
        }
    }
    (viewport, description)
}

fn visible_text(document: &Html) -> String {
    let mut chunks: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            chunks.push(&**text);
        }
    }
    collapse_whitespace(&chunks.join(" "))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Acme Plumbing | Home</title>
  <meta name="viewport" content="width=device-width">
  <meta name="Description" content="Plumbers in Minneapolis">
  <style>.x { color: red }</style>
</head>
<body>
  <h1>Fast, friendly plumbers</h1>
  <p>Call us at 612.555.0134 for a free estimate.</p>
  <script>var phone = "999-999-9999";</script>
</body>
</html>"#;

    #[test]
    fn test_extract_full_page() {
        let content = extract(PAGE);
        assert_eq!(content.business_name.as_deref(), Some("Acme Plumbing"));
        assert_eq!(content.phone_number.as_deref(), Some("(612) 555-0134"));
        assert_eq!(content.title.as_deref(), Some("Acme Plumbing | Home"));
        assert_eq!(content.h1.as_deref(), Some("Fast, friendly plumbers"));
        assert!(content.has_viewport_meta);
        assert!(content.has_title_tag);
        assert!(content.has_meta_description);
        assert!(content.text_sample.contains("free estimate"));
        assert!(!content.text_sample.contains("color: red"));
        assert!(!content.text_sample.contains("var phone"));
    }

    #[test]
    fn test_extract_empty_html() {
        let content = extract("");
        assert_eq!(content.business_name, None);
        assert_eq!(content.phone_number, None);
        assert_eq!(content.title, None);
        assert!(content.text_sample.is_empty());
        assert!(!content.has_visible_text);
        assert!(!content.has_viewport_meta);
        assert!(!content.has_title_tag);
        assert!(!content.has_meta_description);
    }

    #[test]
    fn test_extract_malformed_html() {
        let content = extract("<html><body><p>Unclosed <div><h1>Joe's Roofing<title>");
        assert_eq!(content.h1.as_deref(), Some("Joe's Roofing"));
        assert_eq!(content.phone_number, None);
    }

    #[test]
    fn test_business_name_falls_back_to_h1_then_domain() {
        let html = "<html><head><title>Home</title></head><body><h1>Bright Electric</h1></body></html>";
        assert_eq!(extract(html).business_name.as_deref(), Some("Bright Electric"));

        let bare = "<html><body><p>hello</p></body></html>";
        let content = extract_from_page(bare, Some("https://www.green-lawn-care.com/"), 100);
        assert_eq!(content.business_name.as_deref(), Some("Green Lawn Care"));
    }

    #[test]
    fn test_text_sample_is_truncated() {
        let body = "word ".repeat(1000);
        let html = format!("<html><body><p>{}</p></body></html>", body);
        let content = extract_from_page(&html, None, 50);
        assert_eq!(content.text_sample.chars().count(), 50);

        let unsampled = extract_from_page(&html, None, 0);
        assert!(unsampled.text_sample.is_empty());
        assert!(unsampled.has_visible_text);
    }

    #[test]
    fn test_find_phone_formats() {
        assert_eq!(find_phone("(612) 555-0134").as_deref(), Some("(612) 555-0134"));
        assert_eq!(find_phone("612-555-0134").as_deref(), Some("(612) 555-0134"));
        assert_eq!(find_phone("6125550134").as_deref(), Some("(612) 555-0134"));
        assert_eq!(find_phone("+1 612 555 0134").as_deref(), Some("(612) 555-0134"));
        assert_eq!(find_phone("order 161255501349"), None);
        assert_eq!(find_phone("no digits here"), None);
    }

    #[test]
    fn test_phone_from_tel_link() {
        let html = r#"<html><body><a href="tel:+16125550134">Call</a></body></html>"#;
        assert_eq!(extract(html).phone_number.as_deref(), Some("(612) 555-0134"));
    }

    #[test]
    fn test_business_name_from_title_separators() {
        assert_eq!(business_name_from_title("Home - Bob's Bakery").as_deref(), Some("Bob's Bakery"));
        assert_eq!(business_name_from_title("Welcome | Home"), None);
    }

    #[test]
    fn test_image_count() {
        let html = r#"<img src="a.png"><img><img src="b.png">"#;
        assert_eq!(image_count(html), 2);
    }
}
