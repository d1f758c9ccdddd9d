//! Best-effort markdown to plain text for bot answers.
//!
//! Only links, emphasis markers and heading markers are touched. Lists, code
//! blocks and tables pass through verbatim.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// `[text](url)`, where `url` may hold one level of balanced parentheses.
fn link_pattern() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r"\[(.*?)\]\(((?:[^()]*|\([^()]*\))*)\)").expect("link pattern is valid")
    })
}

fn heading_pattern() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"(?m)^#+\s+").expect("heading pattern is valid"))
}

/// Strip markdown syntax from `markdown`.
///
/// Order matters: links are rewritten first so a `*` inside link text is
/// still removed afterwards, and headings go last.
pub fn normalize(markdown: &str) -> String {
    let linked = link_pattern().replace_all(markdown, |caps: &Captures| {
        format!("{} ({})", &caps[1], &caps[2])
    });

    let plain = linked.replace("**", "").replace('*', "");

    heading_pattern().replace_all(&plain, "").into_owned()
}
