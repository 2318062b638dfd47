//! Leading definition annotations such as `{{plural of|en|cat}}`.
//!
//! A registry maps each keyword to a handler. Most entries are "form of"
//! glosses (`Plural of cat`) described purely by data; the rest are small
//! functions. New keywords are added with [`AnnotationResolver::register`]
//! without touching the dispatch code.

use std::collections::HashMap;

use once_cell::sync::OnceCell;

use crate::error::{Diagnostic, Diagnostics};
use crate::template::is_named_arg;

/// One annotation call: normalized arguments (language code already
/// removed) and the definition text that follows the annotation.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub keyword: &'a str,
    pub args: &'a [String],
    pub text: &'a str,
}

impl<'a> Invocation<'a> {
    fn positional(&self, n: usize) -> &'a str {
        self.args
            .iter()
            .map(String::as_str)
            .filter(|arg| !is_named_arg(arg))
            .nth(n)
            .unwrap_or("")
    }

    fn has_named(&self, key: &str) -> bool {
        self.args.iter().any(|arg| {
            arg.split_once('=')
                .map(|(k, _)| k.trim() == key)
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationResult {
    pub gloss: String,
    pub tags: Vec<String>,
}

impl AnnotationResult {
    fn new(gloss: impl Into<String>, tags: &[&str]) -> Self {
        AnnotationResult {
            gloss: gloss.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

pub type HandlerFn = fn(&Invocation<'_>) -> AnnotationResult;

#[derive(Clone, Copy)]
pub enum Handler {
    /// `"{label} {first argument}"`, followed by any remaining text.
    FormOf {
        label: &'static str,
        tags: &'static [&'static str],
    },
    /// Sense bookkeeping; leaves the definition text untouched.
    SenseMarker,
    Custom(HandlerFn),
}

impl Handler {
    fn apply(&self, invocation: &Invocation<'_>) -> AnnotationResult {
        match self {
            Handler::FormOf { label, tags } => {
                let gloss = format!("{} {}", label, invocation.positional(0));
                AnnotationResult::new(with_text(gloss.trim_end(), invocation.text), tags)
            }
            Handler::SenseMarker => AnnotationResult::new(invocation.text, &[]),
            Handler::Custom(f) => f(invocation),
        }
    }
}

/// Append trailing definition text, without a space before punctuation.
fn with_text(gloss: &str, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        gloss.to_string()
    } else if gloss.is_empty() {
        text.to_string()
    } else if text.starts_with(|c: char| c.is_ascii_punctuation() && c != '(') {
        format!("{}{}", gloss, text)
    } else {
        format!("{} {}", gloss, text)
    }
}

const FORM_OF: &[(&[&str], &str, &[&str])] = &[
    (&["alternate form of"], "Alternate form of", &["alt form"]),
    (
        &["alternative form of", "alt form", "alt form of"],
        "Alternative form of",
        &["alt form"],
    ),
    (&["eye dialect of"], "Eye dialect of", &["dialect"]),
    (
        &["alternative spelling of", "alt sp", "alt spelling of"],
        "Alternative spelling of",
        &["alt spelling"],
    ),
    (&["misspelling of"], "Misspelling of", &["misspelling"]),
    (&["initialism of"], "Initialism of", &["initialism"]),
    (&["acronym of"], "Acronym of", &["acronym"]),
    (&["plural of"], "Plural of", &["plural"]),
    (&["present participle of"], "Present participle of", &["participle", "present"]),
    (&["past participle of"], "Past participle of", &["participle", "past"]),
    (&["comparative of", "en-comparative of"], "Comparative of", &["comparative"]),
    (&["superlative of", "en-superlative of"], "Superlative of", &["superlative"]),
    (&["abbreviation of", "abbr of"], "Abbreviation of", &["abbreviation"]),
    (
        &["third-person singular of", "en-third-person singular of"],
        "Third-person singular of",
        &["third-person", "singular"],
    ),
    (
        &["archaic spelling of"],
        "Archaic alternative spelling of",
        &["archaic", "alt spelling"],
    ),
    (&["obsolete form of"], "Obsolete form of", &["obsolete", "alt form"]),
    (&["obsolete spelling of"], "Obsolete spelling of", &["obsolete", "alt spelling"]),
    (&["inflection of"], "Inflection of", &["inflection"]),
    (
        &["past tense of", "en-past of", "en-simple past of", "simple past of"],
        "Past tense of",
        &["past tense"],
    ),
];

const SENSE_MARKERS: &[&str] = &["senseid", "sid", "rfv-sense", "rfd-sense", "anchor"];

fn non_gloss(invocation: &Invocation<'_>) -> AnnotationResult {
    let gloss = format!("{} {}", invocation.positional(0), invocation.text.trim());
    AnnotationResult::new(gloss.trim(), &["non-gloss"])
}

fn taxonomic_rank(invocation: &Invocation<'_>) -> AnnotationResult {
    let name = invocation.positional(0);
    let rank = invocation.positional(1);
    if rank.is_empty() {
        return AnnotationResult::new(with_text(name, invocation.text), &[]);
    }
    let gloss = format!("Of the {} {}", rank, name);
    AnnotationResult::new(with_text(gloss.trim_end(), invocation.text), &[rank])
}

fn surname(invocation: &Invocation<'_>) -> AnnotationResult {
    AnnotationResult::new(with_text("Surname", invocation.text), &["surname"])
}

fn gender_tags(code: &str) -> &'static [&'static str] {
    match code.to_ascii_lowercase().as_str() {
        "m" | "male" => &["male"],
        "f" | "female" => &["female"],
        "unisex" => &["male", "female"],
        _ => &[],
    }
}

fn given_name(invocation: &Invocation<'_>) -> AnnotationResult {
    if invocation.has_named("or") {
        let gloss = with_text("Given name (male or female)", invocation.text);
        return AnnotationResult::new(gloss, &["given name", "male", "female"]);
    }
    let gender = invocation.positional(0);
    let mut result = AnnotationResult::new("", &["given name"]);
    let tags = gender_tags(gender);
    if tags.is_empty() && !gender.is_empty() {
        result.tags.push(gender.to_string());
    }
    result.tags.extend(tags.iter().map(|t| t.to_string()));
    let described = match tags {
        [] if gender.is_empty() => "Given name".to_string(),
        [] => format!("Given name ({})", gender),
        _ => format!("Given name ({})", tags.join(" or ")),
    };
    result.gloss = with_text(&described, invocation.text);
    result
}

fn historical_given_name(invocation: &Invocation<'_>) -> AnnotationResult {
    let bearer = invocation.positional(1);
    let gloss = if bearer.is_empty() {
        "Historic given name".to_string()
    } else {
        format!("Historic given name, used by {}", bearer)
    };
    AnnotationResult::new(with_text(&gloss, invocation.text), &["given name", "historic"])
}

const CUSTOM: &[(&[&str], HandlerFn)] = &[
    (&["non-gloss definition", "n-g", "ngd"], non_gloss),
    (&["taxlink"], taxonomic_rank),
    (&["surname"], surname),
    (&["given name"], given_name),
    (&["historical given name"], historical_given_name),
];

static BUILTIN: OnceCell<AnnotationResolver> = OnceCell::new();

#[derive(Clone)]
pub struct AnnotationResolver {
    handlers: HashMap<String, Handler>,
}

impl Default for AnnotationResolver {
    fn default() -> Self {
        Self::with_builtin_handlers()
    }
}

impl AnnotationResolver {
    /// An empty registry.
    pub fn empty() -> Self {
        AnnotationResolver { handlers: HashMap::new() }
    }

    pub fn with_builtin_handlers() -> Self {
        let mut resolver = Self::empty();
        for (keywords, label, tags) in FORM_OF {
            for keyword in *keywords {
                resolver.insert(
                    keyword,
                    Handler::FormOf {
                        label: *label,
                        tags: *tags,
                    },
                );
            }
        }
        for keyword in SENSE_MARKERS {
            resolver.insert(keyword, Handler::SenseMarker);
        }
        for (keywords, f) in CUSTOM {
            for keyword in *keywords {
                resolver.insert(keyword, Handler::Custom(*f));
            }
        }
        resolver
    }

    /// Shared, immutable registry with the built-in handlers.
    pub fn builtin() -> &'static AnnotationResolver {
        BUILTIN.get_or_init(Self::with_builtin_handlers)
    }

    fn insert(&mut self, keyword: &str, handler: Handler) {
        self.handlers.insert(keyword.to_lowercase(), handler);
    }

    pub fn register(&mut self, keyword: &str, handler: HandlerFn) {
        self.insert(keyword, Handler::Custom(handler));
    }

    pub fn is_known(&self, keyword: &str) -> bool {
        self.handlers.contains_key(&keyword.to_lowercase())
    }

    pub fn is_sense_marker(&self, keyword: &str) -> bool {
        matches!(
            self.handlers.get(&keyword.to_lowercase()),
            Some(Handler::SenseMarker)
        )
    }

    pub fn resolve(&self, keyword: &str, args: &[String], diags: &mut Diagnostics) -> AnnotationResult {
        self.resolve_in(keyword, args, "", diags)
    }

    /// Resolve an annotation that precedes `text` on a definition line.
    /// Unknown keywords pass through as opaque text: the keyword and its
    /// positional arguments, then `text`, with no tags.
    pub fn resolve_in(
        &self,
        keyword: &str,
        args: &[String],
        text: &str,
        diags: &mut Diagnostics,
    ) -> AnnotationResult {
        let key = keyword.to_lowercase();
        let invocation = Invocation { keyword: &key, args, text };
        match self.handlers.get(&key) {
            Some(handler) => handler.apply(&invocation),
            None => {
                diags.report(Diagnostic::UnknownAnnotation(keyword.to_string()));
                let opaque: Vec<&str> = std::iter::once(keyword.trim())
                    .chain(
                        args.iter()
                            .map(|arg| arg.trim())
                            .filter(|arg| !arg.is_empty() && !is_named_arg(arg)),
                    )
                    .collect();
                AnnotationResult {
                    gloss: with_text(&opaque.join(" "), text),
                    tags: Vec::new(),
                }
            }
        }
    }
}
