// src/ingest/html.rs
// Small regex-based helpers for pulling fields out of launch listing markup.
// They are tailored to flat card/list layouts, not a general HTML parser.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::normalize_text;

/// Split `html` into blocks, each running from one match of `start` to the
/// next one (the last block runs to the end of the document).
pub fn blocks<'a>(html: &'a str, start: &Regex) -> Vec<&'a str> {
    let starts: Vec<usize> = start.find_iter(html).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            &html[s..end]
        })
        .collect()
}

/// First capture group `group` of `re` in `block`, raw (not normalized).
pub fn capture<'a>(block: &'a str, re: &Regex, group: usize) -> Option<&'a str> {
    re.captures(block)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str())
}

/// Capture and normalize to display text; `None` if it ends up empty.
pub fn capture_text(block: &str, re: &Regex, group: usize) -> Option<String> {
    capture(block, re, group)
        .map(normalize_text)
        .filter(|s| !s.is_empty())
}

/// Visible text lines of a fragment: `<br>` and newlines separate lines,
/// tags are stripped, blank lines dropped.
pub fn text_lines(fragment: &str) -> Vec<String> {
    static RE_BR: OnceCell<Regex> = OnceCell::new();
    let re_br = RE_BR.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
    re_br
        .replace_all(fragment, "\n")
        .lines()
        .map(normalize_text)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Resolve an href found on `origin` (scheme + host, no trailing slash).
pub fn absolutize(origin: &str, href: &str) -> String {
    let href = html_escape::decode_html_entities(href.trim()).to_string();
    if href.starts_with("http://") || href.starts_with("https://") {
        href
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_split_on_each_start() {
        let re = Regex::new(r#"<li class="x">"#).unwrap();
        let html = r#"<ul><li class="x">a</li><li class="x">b</li></ul>"#;
        let b = blocks(html, &re);
        assert_eq!(b.len(), 2);
        assert!(b[0].contains(">a<") && !b[0].contains(">b<"));
        assert!(b[1].ends_with("</ul>"));
    }

    #[test]
    fn text_lines_split_on_br() {
        let l = text_lines("  Sat Aug 03, 2019 22:51 UTC <br/>\n  <b>SLC-40</b>, Florida \n\n");
        assert_eq!(l, vec!["Sat Aug 03, 2019 22:51 UTC", "SLC-40, Florida"]);
    }

    #[test]
    fn absolutize_variants() {
        let o = "https://site.test";
        assert_eq!(absolutize(o, "/launch/1"), "https://site.test/launch/1");
        assert_eq!(absolutize(o, "launch/1"), "https://site.test/launch/1");
        assert_eq!(absolutize(o, "//yt.test/e/1"), "https://yt.test/e/1");
        assert_eq!(absolutize(o, "https://a.test/?a=1&amp;b=2"), "https://a.test/?a=1&b=2");
    }
}
