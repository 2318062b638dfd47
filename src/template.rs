//! Template invocations and inline rendering of wikitext to plain text.

use crate::error::Diagnostics;
use crate::normalize::normalize_text;
use crate::scanner::{DelimiterScanner, Group, Region, RegionHandler};

/// Parsed wikilink: `[[target#anchor|display]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wikilink {
    pub target: String,
    pub anchor: Option<String>,
    pub display: Option<String>,
}

impl Wikilink {
    pub fn parse(inner: &str) -> Self {
        let (link, display) = match inner.split_once('|') {
            Some((link, display)) => (link, Some(display.trim().to_string())),
            None => (inner, None),
        };
        let (target, anchor) = match link.split_once('#') {
            Some((target, anchor)) => (target, Some(anchor.trim().to_string())),
            None => (link, None),
        };
        Wikilink {
            target: target.trim().to_string(),
            anchor,
            display,
        }
    }

    /// First alternative: the target, or the display text for same-page
    /// `[[#anchor|display]]` links.
    pub fn text(&self) -> &str {
        if self.target.is_empty() {
            self.display.as_deref().unwrap_or("")
        } else {
            &self.target
        }
    }

    /// Category, file and image links render to nothing.
    pub fn is_metadata(&self) -> bool {
        let target = self.target.to_ascii_lowercase();
        ["category:", "file:", "image:"]
            .iter()
            .any(|prefix| target.starts_with(prefix))
    }
}

/// `{{name|arg|key=value|...}}` with arguments left as raw wikitext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCall {
    pub name: String,
    pub args: Vec<String>,
}

impl TemplateCall {
    pub fn parse(scanner: &DelimiterScanner<'_>, inner: &str) -> Self {
        let mut parts = scanner.split_top_level(inner, b'|').into_iter();
        let name = parts.next().unwrap_or_default().trim().to_string();
        let args = parts.map(|p| p.trim().to_string()).collect();
        TemplateCall { name, args }
    }

    /// Dispatch key: lowercase, underscores as spaces.
    pub fn key(&self) -> String {
        self.name.to_lowercase().replace('_', " ")
    }

    /// Drop the leading language-code argument of modern templates
    /// (`{{plural of|en|cat}}`). Older `{{plural of|cat}}` calls are left alone.
    pub fn strip_language_code(&mut self, code: Option<&str>) {
        let Some(code) = code else { return };
        let matches = self
            .args
            .first()
            .map(|first| first.eq_ignore_ascii_case(code))
            .unwrap_or(false);
        if matches {
            self.args.remove(0);
        }
    }

    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .map(String::as_str)
            .filter(|arg| !is_named_arg(arg))
    }

    pub fn named(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| {
            let (k, v) = arg.split_once('=')?;
            (is_named_arg(arg) && k.trim() == key).then_some(v.trim())
        })
    }
}

/// `key=value` arguments; the key is a short identifier.
pub fn is_named_arg(arg: &str) -> bool {
    match arg.split_once('=') {
        Some((key, _)) => {
            let key = key.trim();
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    }
}

const LINK_TEMPLATES: &[&str] = &[
    "l", "link", "l-self", "ll", "m", "mention", "m-self", "w", "wikipedia", "pedia",
];
const PAREN_TEMPLATES: &[&str] = &[
    "gloss", "gl", "q", "qual", "qualifier", "i", "qf", "sense", "s",
];
const FIRST_ARG_TEMPLATES: &[&str] = &["taxlink", "taxfmt", "vern", "nowrap", "nobr"];

/// Requests and bookkeeping markers that carry no gloss text.
const MAINTENANCE_TEMPLATES: &[&str] = &[
    "rfdef",
    "rfv",
    "rfv-sense",
    "rfd-sense",
    "rfex",
    "rfc",
    "rfc-sense",
    "rfclarify",
    "rfquote",
    "rfquotek",
    "attention",
    "defdate",
    "senseid",
    "sid",
    "anchor",
];

pub fn is_inline_template(key: &str) -> bool {
    LINK_TEMPLATES.contains(&key)
        || PAREN_TEMPLATES.contains(&key)
        || FIRST_ARG_TEMPLATES.contains(&key)
        || MAINTENANCE_TEMPLATES.contains(&key)
}

/// Plain-text rendering of a known inline template, `None` when unknown.
fn render_template(key: &str, args: &[String]) -> Option<String> {
    let non_empty = |i: usize| args.get(i).filter(|a| !a.trim().is_empty());
    if LINK_TEMPLATES.contains(&key) {
        let text = non_empty(1).or_else(|| non_empty(0)).cloned().unwrap_or_default();
        Some(text)
    } else if PAREN_TEMPLATES.contains(&key) {
        let inner: Vec<&str> = args
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if inner.is_empty() {
            Some(String::new())
        } else {
            Some(format!("({})", inner.join(", ")))
        }
    } else if FIRST_ARG_TEMPLATES.contains(&key) {
        Some(args.first().cloned().unwrap_or_default())
    } else if MAINTENANCE_TEMPLATES.contains(&key) {
        Some(String::new())
    } else {
        None
    }
}

/// Region handler that turns templates and links into readable text.
/// Unknown templates pass through as their own resolved content.
pub struct InlineRenderer<'c> {
    lang_code: Option<&'c str>,
}

impl<'c> InlineRenderer<'c> {
    pub fn new(lang_code: Option<&'c str>) -> Self {
        InlineRenderer { lang_code }
    }
}

impl RegionHandler for InlineRenderer<'_> {
    fn render(
        &mut self,
        scanner: &DelimiterScanner<'_>,
        region: &Region<'_>,
        diags: &mut Diagnostics,
    ) -> String {
        match region.group {
            Group::Link => {
                let inner = scanner.resolve_with(region.inner, self, diags);
                let link = Wikilink::parse(&inner);
                if link.is_metadata() {
                    String::new()
                } else {
                    link.text().to_string()
                }
            }
            Group::Template => {
                let mut call = TemplateCall::parse(scanner, region.inner);
                call.strip_language_code(self.lang_code);
                let key = call.key();
                let args: Vec<String> = call
                    .positional()
                    .map(|arg| scanner.resolve_with(arg, self, diags))
                    .collect();
                match render_template(&key, &args) {
                    Some(text) => text,
                    None => scanner.resolve_with(region.inner, self, diags),
                }
            }
        }
    }
}

/// Render a wikitext span to normalized plain text.
pub fn render_text(
    scanner: &DelimiterScanner<'_>,
    text: &str,
    lang_code: Option<&str>,
    diags: &mut Diagnostics,
) -> String {
    let mut renderer = InlineRenderer::new(lang_code);
    let resolved = scanner.resolve_with(text, &mut renderer, diags);
    normalize_text(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        let mut diags = Diagnostics::new();
        render_text(&DelimiterScanner::wikitext(), text, Some("en"), &mut diags)
    }

    // ─────────────────────────────────────────────────────────────
    // Wikilink
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn wikilink_all_parts() {
        let link = Wikilink::parse("Man#Etymology 2|Man");
        assert_eq!(link.target, "Man");
        assert_eq!(link.anchor, Some("Etymology 2".to_string()));
        assert_eq!(link.display, Some("Man".to_string()));
    }

    #[test]
    fn wikilink_text_prefers_target() {
        assert_eq!(Wikilink::parse("isle|Isle").text(), "isle");
        assert_eq!(Wikilink::parse("#English|here").text(), "here");
    }

    #[test]
    fn wikilink_metadata() {
        assert!(Wikilink::parse("Category:English nouns").is_metadata());
        assert!(!Wikilink::parse("cat").is_metadata());
    }

    // ─────────────────────────────────────────────────────────────
    // TemplateCall
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn template_call_nested_args() {
        let scanner = DelimiterScanner::wikitext();
        let call = TemplateCall::parse(&scanner, "lb|en|[[a|b]]|{{q|x|y}}|sort=z");
        assert_eq!(call.name, "lb");
        assert_eq!(call.args, vec!["en", "[[a|b]]", "{{q|x|y}}", "sort=z"]);
        assert_eq!(call.named("sort"), Some("z"));
        assert_eq!(call.positional().count(), 3);
    }

    #[test]
    fn strip_language_code_only_when_present() {
        let scanner = DelimiterScanner::wikitext();
        let mut modern = TemplateCall::parse(&scanner, "plural of|en|cat");
        modern.strip_language_code(Some("en"));
        assert_eq!(modern.args, vec!["cat"]);

        let mut old = TemplateCall::parse(&scanner, "plural of|cat");
        old.strip_language_code(Some("en"));
        assert_eq!(old.args, vec!["cat"]);
    }

    #[test]
    fn key_is_lowercase_with_spaces() {
        let scanner = DelimiterScanner::wikitext();
        assert_eq!(TemplateCall::parse(&scanner, "Plural_of|x").key(), "plural of");
    }

    #[test]
    fn named_arg_detection() {
        assert!(is_named_arg("or=f"));
        assert!(is_named_arg("lang=en"));
        assert!(!is_named_arg("cat"));
        assert!(!is_named_arg("1+1=2"));
    }

    // ─────────────────────────────────────────────────────────────
    // Inline rendering
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn renders_links() {
        assert_eq!(render("A small [[cat|cats]] or [[dog]]."), "A small cat or dog.");
    }

    #[test]
    fn drops_category_links() {
        assert_eq!(render("A cat.[[Category:en:Cats]]"), "A cat.");
    }

    #[test]
    fn renders_mention_templates() {
        assert_eq!(render("Like {{m|en|feline}}."), "Like feline.");
        assert_eq!(render("Like {{l|en|cat|cats}}."), "Like cats.");
        assert_eq!(render("See {{w|Felis catus}}."), "See Felis catus.");
    }

    #[test]
    fn renders_parenthesized_templates() {
        assert_eq!(render("{{q|informal}} A cat"), "(informal) A cat");
        assert_eq!(render("A cat {{gloss|animal}}"), "A cat (animal)");
    }

    #[test]
    fn maintenance_templates_vanish() {
        assert_eq!(render("A cat. {{rfex|en}}"), "A cat.");
    }

    #[test]
    fn unknown_template_passes_through() {
        assert_eq!(render("{{foo}} bar"), "foo bar");
    }

    #[test]
    fn nested_link_inside_template() {
        assert_eq!(render("{{gloss|a [[small]] cat}}"), "(a small cat)");
    }

    #[test]
    fn markup_inside_rendered_text_is_normalized() {
        assert_eq!(render("'''{{m|en|cat}}''' <ref>x</ref>"), "cat");
    }
}
