//! Page text preparation: HTML to plain text and spec-focused excerpts

use once_cell::sync::Lazy;
use regex::Regex;

/// Largest excerpt handed to the LLM, in characters
pub const MAX_EXCERPT_CHARS: usize = 6000;

/// Lines of context kept around each spec line
const CONTEXT_LINES: usize = 3;

const NAVIGATION_WORDS: [&str; 7] = ["menu", "nav", "header", "footer", "login", "cart", "checkout"];

const SPEC_KEYWORDS: [&str; 17] = [
    "specification",
    "specs",
    "technical",
    "diameter",
    "spine",
    "gpi",
    "weight",
    "grains",
    "carbon",
    "straightness",
    "tolerance",
    "material",
    "length",
    "features",
    "performance",
    "description",
    "details",
];

static NON_CONTENT_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["script", "style", "noscript", "svg"]
        .iter()
        .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok())
        .collect()
});
static COMMENTS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").ok());
static BREAK_TAGS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)<(br|/?(p|div|li|ul|ol|tr|table|h[1-6]|section|article|header|footer|nav|dt|dd))\b[^>]*>")
        .ok()
});
static CELL_TAGS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)</?(td|th)\b[^>]*>").ok());
static ANY_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]+>").ok());
static SPINE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b[2-7]\d{2}\b").ok());
static DIAMETER_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\b0\.[2-4]\d{2}\b").ok());
static GPI_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+\.\d+\s*gpi\b").ok());

fn replace_all(re: &Option<Regex>, text: &str, with: &str) -> String {
    match re {
        Some(re) => re.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

fn matches(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&deg;", "°")
        .replace("&amp;", "&")
}

/// Reduce an HTML page to readable lines of text
pub fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();
    for re in NON_CONTENT_BLOCKS.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }
    text = replace_all(&COMMENTS, &text, " ");
    text = replace_all(&BREAK_TAGS, &text, "\n");
    text = replace_all(&CELL_TAGS, &text, " ");
    text = replace_all(&ANY_TAG, &text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_spec_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    SPEC_KEYWORDS.iter().any(|k| lower.contains(k))
        || matches(&SPINE_PATTERN, line)
        || matches(&DIAMETER_PATTERN, line)
        || matches(&GPI_PATTERN, &lower)
}

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Pick the part of a page most likely to hold arrow specifications
///
/// Lines that mention spec keywords or look like spine, diameter or GPI
/// values are kept with three lines of context either side; navigation
/// lines never trigger a match. Without any match the page start is
/// assumed to be navigation and skipped.
pub fn extract_main_content(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut keep = vec![false; lines.len()];
    let mut any = false;

    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if NAVIGATION_WORDS.iter().any(|nav| lower.contains(nav)) {
            continue;
        }
        if is_spec_line(line) {
            any = true;
            let start = i.saturating_sub(CONTEXT_LINES);
            let end = (i + CONTEXT_LINES + 1).min(lines.len());
            keep[start..end].iter_mut().for_each(|k| *k = true);
        }
    }

    if any {
        let excerpt = lines
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(line, _)| *line)
            .collect::<Vec<_>>()
            .join("\n");
        return char_slice(&excerpt, 0, MAX_EXCERPT_CHARS);
    }

    if content.chars().count() > 2000 {
        char_slice(content, 2000, MAX_EXCERPT_CHARS)
    } else {
        char_slice(content, 0, 4000)
    }
}
