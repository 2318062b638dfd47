//! Removal of decorative wikitext markup from text spans.
//!
//! Bold/italic quote runs, `[[` `]]` link brackets and embedded HTML-ish tag
//! pairs (with everything between them) are dropped. For piped text such as
//! `cat|cats`, only the first alternative survives: after a `|` characters
//! are skipped up to the next stop character, and copying resumes there.
//!
//! Every pass only ever removes characters, so passes are repeated until the
//! text stops changing; the result is a fixed point of [`normalize_text`].

const VOID_TAGS: &[&str] = &["br", "hr", "wbr", "img"];

/// Characters that end a skipped `|alternative`.
fn is_stop_char(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation()
}

pub fn normalize_text(text: &str) -> String {
    let mut current = normalize_pass(text);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(text: &str) -> String {
    let text = strip_tags(text);
    let text = strip_emphasis(&text);
    let text = strip_link_decoration(&text);
    collapse_whitespace(&text)
}

/// Drop `<tag>...</tag>` pairs (nested), self-closing tags and comments.
fn strip_tags(text: &str) -> String {
    if !text.contains('<') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut depth: usize = 0;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with("<!--") {
            if let Some(end) = rest.find("-->") {
                i += end + 3;
                continue;
            }
        } else if rest.starts_with('<') {
            if let Some(close) = rest.find('>') {
                let body = &rest[1..close];
                if let Some(kind) = classify_tag(body) {
                    match kind {
                        TagKind::Open => depth += 1,
                        TagKind::Close => depth = depth.saturating_sub(1),
                        TagKind::SelfClosing => {}
                    }
                    i += close + 1;
                    continue;
                }
            }
        }
        let Some(c) = rest.chars().next() else { break };
        if depth == 0 {
            out.push(c);
        }
        i += c.len_utf8();
    }
    out
}

enum TagKind {
    Open,
    Close,
    SelfClosing,
}

fn classify_tag(body: &str) -> Option<TagKind> {
    if let Some(name) = body.strip_prefix('/') {
        return name
            .starts_with(|c: char| c.is_ascii_alphabetic())
            .then_some(TagKind::Close);
    }
    if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    if body.ends_with('/') {
        return Some(TagKind::SelfClosing);
    }
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if VOID_TAGS.contains(&name.as_str()) {
        Some(TagKind::SelfClosing)
    } else {
        Some(TagKind::Open)
    }
}

/// Remove `''italic''` / `'''bold'''` markers: any run of 2+ apostrophes.
fn strip_emphasis(text: &str) -> String {
    if !text.contains("''") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\'' {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.peek() == Some(&'\'') {
            chars.next();
            run += 1;
        }
        if run == 1 {
            out.push('\'');
        }
    }
    out
}

/// Remove `[[`/`]]` and keep only the first alternative of `a|b`.
fn strip_link_decoration(text: &str) -> String {
    if !text.contains("[[") && !text.contains("]]") && !text.contains('|') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut skipping = false;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with("[[") || rest.starts_with("]]") {
            skipping = false;
            i += 2;
            continue;
        }
        let Some(c) = rest.chars().next() else { break };
        i += c.len_utf8();
        if c == '|' {
            skipping = true;
            continue;
        }
        if skipping {
            if !is_stop_char(c) {
                continue;
            }
            skipping = false;
        }
        out.push(c);
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_bold_and_italic() {
        assert_eq!(normalize_text("'''bold''' and ''italic''"), "bold and italic");
    }

    #[test]
    fn keeps_single_apostrophes() {
        assert_eq!(normalize_text("don't o'clock"), "don't o'clock");
    }

    #[test]
    fn removes_link_brackets() {
        assert_eq!(normalize_text("a [[cat]] sat"), "a cat sat");
    }

    #[test]
    fn piped_link_keeps_first_alternative() {
        assert_eq!(normalize_text("two [[cat|cats]] sat"), "two cat sat");
    }

    #[test]
    fn pipe_skip_resumes_at_stop_char() {
        assert_eq!(normalize_text("cat|cats, dogs"), "cat, dogs");
        assert_eq!(normalize_text("a|b-c"), "a-c");
        assert_eq!(normalize_text("a|b/c"), "a/c");
        assert_eq!(normalize_text("a|b#c"), "a#c");
    }

    #[test]
    fn drops_tag_pair_content() {
        assert_eq!(
            normalize_text("A cat.<ref>Some book, p. 3</ref> Meow."),
            "A cat. Meow."
        );
    }

    #[test]
    fn nested_tags_tracked() {
        assert_eq!(
            normalize_text("x<ref>a<sup>b</sup>c</ref>y"),
            "xy"
        );
    }

    #[test]
    fn self_closing_and_void_tags() {
        assert_eq!(normalize_text(r#"a<ref name="x"/> b<br>c"#), "a bc");
    }

    #[test]
    fn comments_removed() {
        assert_eq!(normalize_text("a <!-- hidden --> b"), "a b");
    }

    #[test]
    fn lone_angle_brackets_are_text() {
        assert_eq!(normalize_text("1 < 2 and 3 > 2"), "1 < 2 and 3 > 2");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_text("  a \t b\n "), "a b");
    }

    #[test]
    fn fixed_point_on_constructed_markup() {
        // Removing the tag pair glues two quote runs together.
        let once = normalize_text("'<b>x</b>'word");
        assert_eq!(once, "word");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn idempotent_on_samples() {
        for sample in [
            "'''[[cat|Cats]]''' are <ref>x</ref> nice|ly",
            "[[a]]]]|[[b",
            "''''''",
            "<b><i>deep</i></b> text",
        ] {
            let once = normalize_text(sample);
            assert_eq!(normalize_text(&once), once, "sample {:?}", sample);
        }
    }
}
