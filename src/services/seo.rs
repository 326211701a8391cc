//! Content metadata extraction for published articles.
//!
//! Deterministic text heuristics over a title and HTML body:
//! word-frequency keywords, topic-pattern tags, display-length meta
//! fields, a URL slug, and a reading time. No network or database
//! access; every input (including empty strings) produces well-defined
//! output.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Reading speed assumption.
pub const WORDS_PER_MINUTE: usize = 200;

/// Total keyword cap (bigrams and unigrams merged).
pub const MAX_KEYWORDS: usize = 15;

/// Bigrams considered before unigrams fill the remainder.
pub const MAX_BIGRAMS: usize = 8;

/// A bigram must repeat to count as a phrase.
pub const MIN_BIGRAM_COUNT: usize = 2;

/// Total tag cap (topic patterns first, then keyword-derived).
pub const MAX_TAGS: usize = 10;

/// Top keywords promoted to tags.
pub const KEYWORD_TAG_COUNT: usize = 5;

/// Meta titles at or under this length pass through unchanged.
pub const META_TITLE_LIMIT: usize = 60;

/// Overlong meta titles are cut to this length before the ellipsis.
pub const META_TITLE_CUT: usize = 50;

/// A space must sit past this position to be a pretty cut point.
pub const META_TITLE_MIN_SPACE: usize = 30;

/// Meta description budget (155 minus the ellipsis reserve).
pub const META_DESCRIPTION_LIMIT: usize = 152;

/// Sentence-built descriptions shorter than this fall back to a hard cut.
pub const META_DESCRIPTION_MIN: usize = 50;

/// Summary length cap.
pub const SUMMARY_LIMIT: usize = 300;

/// A space within this window of the cap is preferred as the cut point.
pub const SUMMARY_SPACE_WINDOW: usize = 50;

/// A first paragraph shorter than this pulls in the second.
pub const SECOND_PARAGRAPH_THRESHOLD: usize = 100;

static SCRIPT_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").unwrap());

static BLOCK_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(p|div|li|blockquote|h[1-6])>|<br\s*/?>").unwrap());

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]{3,}").unwrap());

/// Words excluded from keyword extraction. Tokens under three
/// characters never reach this list.
static STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see", "two",
    "way", "who", "its", "did", "let", "she", "too", "use", "that", "with", "have", "this",
    "will", "your", "from", "they", "know", "want", "been", "good", "much", "some", "time",
    "very", "when", "come", "here", "just", "like", "long", "make", "many", "more", "most",
    "only", "over", "such", "take", "than", "them", "well", "were", "what", "about", "after",
    "also", "into", "other", "their", "there", "these", "which", "would", "could", "should",
    "does", "each", "while", "where", "being", "both", "between", "under", "never", "because",
    "through", "during", "before", "against", "above", "below", "again", "then", "once",
];

/// Topic patterns checked against title and body. A match contributes
/// its label as a tag, in this order.
static TOPIC_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bjava\s?script\b|\bes6\b|\bnode(\.js)?\b", "JavaScript"),
        (r"\btype\s?script\b", "TypeScript"),
        (r"\b(ai|artificial intelligence|machine learning|llm)\b", "AI"),
        (r"\b(mobile|ios|android)\b", "Mobile"),
        (r"\b(security|encryption|vulnerabilit)", "Security"),
        (r"\bseo\b|search engine optimi", "SEO"),
        (r"\b(tutorial|how to|guide)\b", "Tutorial"),
        (r"\b(web design|ux|ui design)\b", "Web Design"),
        (r"\b(performance|optimization|page speed)\b", "Performance"),
        (r"\b(cloud|aws|azure|serverless)\b", "Cloud"),
        (r"\b(ecommerce|e-commerce|online store)\b", "E-commerce"),
        (r"\b(accessibility|a11y|wcag)\b", "Accessibility"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(&format!("(?i){}", pattern)).unwrap(), label))
    .collect()
});

/// Derived metadata for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub meta_title: String,
    pub meta_description: String,
    pub summary: String,
    pub slug: String,
    pub reading_time_minutes: u32,
}

/// Extract all derived metadata for an article.
pub fn analyze(title: &str, html_body: &str) -> SeoMetadata {
    let text = strip_html(html_body);
    let flat = flatten_whitespace(&text);

    let keywords = extract_keywords(title, &flat);
    let tags = extract_tags(title, &flat, &keywords);

    SeoMetadata {
        meta_title: build_meta_title(title),
        meta_description: build_meta_description(&flat),
        summary: build_summary(&text),
        slug: slugify(title),
        reading_time_minutes: reading_time(&flat),
        keywords,
        tags,
    }
}

// ============================================================================
// HTML handling
// ============================================================================

/// Reduce HTML to plain text, keeping paragraph breaks as blank lines.
pub fn strip_html(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_RE.replace_all(html, " ");
    let with_breaks = BLOCK_BREAK_RE.replace_all(&without_scripts, "\n\n");
    let without_tags = TAG_RE.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&without_tags);

    // Collapse whitespace inside each paragraph, drop empty blocks
    let mut paragraphs = Vec::new();
    for block in decoded.split("\n\n") {
        let flat = block.split_whitespace().collect::<Vec<_>>().join(" ");
        if !flat.is_empty() {
            paragraphs.push(flat);
        }
    }
    paragraphs.join("\n\n")
}

fn decode_entities(text: &str) -> String {
    // &amp; must go last so it cannot re-expand other entities
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn flatten_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Keywords and tags
// ============================================================================

/// Frequency-ranked keywords. The title counts three times relative
/// to the body; repeated two-word phrases outrank single words.
pub fn extract_keywords(title: &str, body: &str) -> Vec<String> {
    let corpus = format!("{} {} {} {}", title, title, title, body).to_lowercase();

    let tokens: Vec<&str> = WORD_RE
        .find_iter(&corpus)
        .map(|m| m.as_str())
        .filter(|word| !STOP_WORDS.contains(word))
        .collect();

    // (count, first occurrence) keeps ranking deterministic on ties
    let mut word_counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, word) in tokens.iter().enumerate() {
        word_counts.entry(word).or_insert((0, idx)).0 += 1;
    }

    let mut phrase_counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, pair) in tokens.windows(2).enumerate() {
        let phrase = format!("{} {}", pair[0], pair[1]);
        phrase_counts.entry(phrase).or_insert((0, idx)).0 += 1;
    }

    let mut words: Vec<(&str, usize, usize)> = word_counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let mut phrases: Vec<(String, usize, usize)> = phrase_counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= MIN_BIGRAM_COUNT)
        .map(|(phrase, (count, first))| (phrase, count, first))
        .collect();
    phrases.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let mut keywords = Vec::new();
    let mut seen = HashSet::new();

    for (phrase, _, _) in phrases.into_iter().take(MAX_BIGRAMS) {
        if seen.insert(phrase.clone()) {
            keywords.push(phrase);
        }
    }
    for (word, _, _) in words.into_iter().take(MAX_KEYWORDS) {
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
        if seen.insert(word.to_string()) {
            keywords.push(word.to_string());
        }
    }

    keywords
}

/// Topic-pattern tags first, then the top keywords title-cased.
pub fn extract_tags(title: &str, body: &str, keywords: &[String]) -> Vec<String> {
    let haystack = format!("{} {}", title, body);

    let mut tags: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (pattern, label) in TOPIC_PATTERNS.iter() {
        if pattern.is_match(&haystack) && seen.insert((*label).to_string()) {
            tags.push((*label).to_string());
        }
    }

    for keyword in keywords.iter().take(KEYWORD_TAG_COUNT) {
        if tags.len() >= MAX_TAGS {
            break;
        }
        let tag = title_case(keyword);
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }

    tags.truncate(MAX_TAGS);
    tags
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Display fields
// ============================================================================

/// Meta title: pass through when short enough, otherwise cut at the
/// last space past the minimum, or hard-cut when none qualifies.
pub fn build_meta_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.chars().count() <= META_TITLE_LIMIT {
        return trimmed.to_string();
    }

    let cut: String = trimmed.chars().take(META_TITLE_CUT).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > META_TITLE_MIN_SPACE => format!("{}...", &cut[..idx]),
        _ => format!("{}...", cut),
    }
}

/// Meta description: whole leading sentences while they fit the
/// budget; fall back to a hard cut when too little accumulates.
pub fn build_meta_description(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut description = String::new();
    for sentence in split_sentences(text) {
        let candidate_len = if description.is_empty() {
            sentence.chars().count()
        } else {
            description.chars().count() + 1 + sentence.chars().count()
        };
        if candidate_len > META_DESCRIPTION_LIMIT {
            break;
        }
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(&sentence);
    }

    if description.chars().count() >= META_DESCRIPTION_MIN {
        return description;
    }

    let cut: String = text.chars().take(META_DESCRIPTION_LIMIT).collect();
    format!("{}...", cut)
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Summary: the first paragraph, plus the second when the first runs
/// short, capped at the limit with a space-preferring cut.
pub fn build_summary(text: &str) -> String {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let Some(first) = paragraphs.first() else {
        return String::new();
    };

    let mut summary = (*first).to_string();
    if summary.chars().count() < SECOND_PARAGRAPH_THRESHOLD {
        if let Some(second) = paragraphs.get(1) {
            summary.push(' ');
            summary.push_str(second);
        }
    }

    if summary.chars().count() <= SUMMARY_LIMIT {
        return summary;
    }

    let cut: String = summary.chars().take(SUMMARY_LIMIT).collect();
    match cut.rfind(' ') {
        Some(idx) if idx >= SUMMARY_LIMIT - SUMMARY_SPACE_WINDOW => {
            format!("{}...", &cut[..idx])
        }
        _ => format!("{}...", cut),
    }
}

/// Convert text to a URL-safe slug.
///
/// Collision handling against existing slugs is the caller's concern;
/// this returns the candidate only.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Reading time in whole minutes, rounded up. Empty text reads in zero.
pub fn reading_time(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World! 2024"), "hello-world-2024");
        assert_eq!(slugify("  My Article  "), "my-article");
        assert_eq!(slugify("Test--Article"), "test-article");
        assert_eq!(slugify("Special!@#$%Characters"), "specialcharacters");
        assert_eq!(slugify("Already-Slugified"), "already-slugified");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_reading_time() {
        let body = vec!["word"; 400].join(" ");
        assert_eq!(reading_time(&body), 2);

        let body = vec!["word"; 401].join(" ");
        assert_eq!(reading_time(&body), 3);

        assert_eq!(reading_time("one two three"), 1);
        assert_eq!(reading_time(""), 0);
    }

    #[test]
    fn test_strip_html_preserves_paragraphs() {
        let html = "<p>First paragraph.</p><p>Second paragraph.</p>";
        let text = strip_html(html);
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_strip_html_removes_scripts_and_styles() {
        let html = r#"<p>Visible.</p><script>alert("x");</script><style>p { color: red; }</style>"#;
        let text = strip_html(html);
        assert_eq!(text, "Visible.");
    }

    #[test]
    fn test_strip_html_decodes_entities() {
        let text = strip_html("<p>Fish &amp; Chips &lt;fresh&gt; &nbsp;daily</p>");
        assert_eq!(text, "Fish & Chips <fresh> daily");
    }

    #[test]
    fn test_empty_input_is_safe() {
        let metadata = analyze("", "");
        assert!(metadata.keywords.is_empty());
        assert!(metadata.tags.is_empty());
        assert_eq!(metadata.meta_title, "");
        assert_eq!(metadata.meta_description, "");
        assert_eq!(metadata.summary, "");
        assert_eq!(metadata.slug, "");
        assert_eq!(metadata.reading_time_minutes, 0);
    }

    #[test]
    fn test_determinism() {
        let title = "Improving Web Performance with Caching";
        let body = "<p>Caching improves web performance. Caching layers range from browser caching to CDN caching.</p>";
        assert_eq!(analyze(title, body), analyze(title, body));
    }

    #[test]
    fn test_title_words_outrank_body_words() {
        let keywords = extract_keywords(
            "Kubernetes networking",
            "deployment deployment pods containers services",
        );
        // Title terms count three times, so two body repeats lose
        let kubernetes_pos = keywords.iter().position(|k| k == "kubernetes").unwrap();
        let deployment_pos = keywords.iter().position(|k| k == "deployment").unwrap();
        assert!(kubernetes_pos < deployment_pos);
    }

    #[test]
    fn test_repeated_phrases_come_first() {
        let body = "web performance matters because web performance drives conversions and \
                    revenue growth across every funnel stage";
        let keywords = extract_keywords("", body);
        assert_eq!(keywords[0], "web performance");
    }

    #[test]
    fn test_stop_words_are_excluded() {
        let keywords = extract_keywords("The Most Important Thing", "the and with would about");
        assert!(keywords.iter().all(|k| !STOP_WORDS.contains(&k.as_str())));
        assert!(keywords.contains(&"important".to_string()));
    }

    #[test]
    fn test_keyword_cap() {
        let body = (0..40u8)
            .map(|i| {
                let first = (b'a' + i / 26) as char;
                let second = (b'a' + i % 26) as char;
                format!("topic{}{}", first, second)
            })
            .collect::<Vec<_>>()
            .join(" ");
        let keywords = extract_keywords("Lexicon", &body);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_tags_pattern_first_then_keywords() {
        let tags = extract_tags(
            "JavaScript Security Basics",
            "javascript security practices for modern javascript applications",
            &["javascript".to_string(), "security".to_string(), "practices".to_string()],
        );
        assert_eq!(&tags[..2], &["JavaScript", "Security"]);
        // Keyword-derived tags are title-cased and deduplicated against labels
        assert!(tags.contains(&"Practices".to_string()));
        assert!(tags.len() <= MAX_TAGS);
    }

    #[test]
    fn test_meta_title_short_passes_through() {
        assert_eq!(build_meta_title("Short Title"), "Short Title");
    }

    #[test]
    fn test_meta_title_cuts_at_space() {
        let title = "A Comprehensive Field Guide to Production Database Migrations in 2024";
        let meta = build_meta_title(title);
        assert!(meta.ends_with("..."));
        assert!(meta.chars().count() <= META_TITLE_CUT + 3);
        // Pretty cut lands on a word boundary
        assert!(!meta.trim_end_matches("...").ends_with(' '));
        assert_eq!(meta, "A Comprehensive Field Guide to Production...");
    }

    #[test]
    fn test_meta_description_accumulates_sentences() {
        let text = "First sentence here. Second sentence follows. Third one arrives later.";
        let description = build_meta_description(text);
        assert_eq!(
            description,
            "First sentence here. Second sentence follows. Third one arrives later."
        );
    }

    #[test]
    fn test_meta_description_stops_at_budget() {
        let first = "This opening sentence is deliberately written to be around ninety characters in length overall.";
        let second = "This follow-up sentence is also quite long and would push the running total well over the budget.";
        let text = format!("{} {}", first, second);
        let description = build_meta_description(&text);
        assert_eq!(description, first);
    }

    #[test]
    fn test_meta_description_fallback_hard_cut() {
        // No sentence fits the budget, so the text is cut directly
        let text = vec!["word"; 60].join(" ");
        let description = build_meta_description(&text);
        assert!(description.ends_with("..."));
        assert!(description.chars().count() <= META_DESCRIPTION_LIMIT + 3);
    }

    #[test]
    fn test_summary_pulls_second_paragraph_when_first_is_short() {
        let text = "Short opener.\n\nThe second paragraph carries the bulk of the detail.";
        assert_eq!(
            build_summary(text),
            "Short opener. The second paragraph carries the bulk of the detail."
        );
    }

    #[test]
    fn test_summary_keeps_long_first_paragraph_alone() {
        let first = vec!["alpha"; 30].join(" ");
        let text = format!("{}\n\nsecond paragraph", first);
        assert_eq!(build_summary(&text), first);
    }

    #[test]
    fn test_summary_truncates_with_ellipsis() {
        let text = vec!["alpha"; 120].join(" ");
        let summary = build_summary(&text);
        assert!(summary.ends_with("..."));
        assert!(summary.chars().count() <= SUMMARY_LIMIT + 3);
    }

    #[test]
    fn test_analyze_end_to_end() {
        let title = "JavaScript Performance Tuning";
        let body = "<p>JavaScript performance starts with measurement. Profile before changing code.</p>\
                    <p>Bundle size, caching, and lazy loading all shape page speed for javascript applications.</p>";

        let metadata = analyze(title, body);

        assert_eq!(metadata.slug, "javascript-performance-tuning");
        assert_eq!(metadata.meta_title, title);
        assert!(metadata.keywords.contains(&"javascript".to_string()));
        assert!(metadata.tags.contains(&"JavaScript".to_string()));
        assert!(metadata.tags.contains(&"Performance".to_string()));
        assert_eq!(metadata.reading_time_minutes, 1);
        assert!(!metadata.meta_description.is_empty());
        assert!(!metadata.summary.is_empty());
    }
}
