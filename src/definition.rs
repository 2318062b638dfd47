//! Parsing of `# ...` definition lines.
//!
//! ```text
//! # {{lb|en|chiefly|UK}} {{plural of|en|[[cat]]}} {{q|informal}}
//!   └ labels ──────────┘ └ annotation ─────────┘ └ trailing label
//! ```
//!
//! Leading label and qualifier templates are peeled off first, then at most
//! one annotation template. Trailing label templates are peeled off the end.
//! Whatever remains is the gloss text, rendered to plain text.

use crate::annotations::AnnotationResolver;
use crate::document::Definition;
use crate::error::{Diagnostic, Diagnostics};
use crate::labels::group_labels;
use crate::normalize::normalize_text;
use crate::scanner::{DelimiterScanner, Group, Region};
use crate::template::{is_inline_template, render_text, TemplateCall};

const LABEL_TEMPLATES: &[&str] = &["lb", "lbl", "label", "context", "cx", "tlb"];
const QUALIFIER_TEMPLATES: &[&str] = &["q", "qual", "qualifier", "i"];

/// Body of a definition line, or `None` for sub-definitions (`##`),
/// examples (`#:`) and quotations (`#*`).
pub fn definition_body(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?;
    if rest.starts_with(['#', ':', '*']) {
        return None;
    }
    Some(rest.trim())
}

enum Peeled {
    Labels(Vec<String>),
    SenseMarker,
    Annotation(TemplateCall),
    Stop,
}

pub struct DefinitionParser<'a> {
    scanner: DelimiterScanner<'static>,
    annotations: &'a AnnotationResolver,
    lang_code: Option<&'a str>,
    attach_labels: bool,
}

impl<'a> DefinitionParser<'a> {
    pub fn new(lang_code: Option<&'a str>) -> Self {
        DefinitionParser {
            scanner: DelimiterScanner::wikitext(),
            annotations: AnnotationResolver::builtin(),
            lang_code,
            attach_labels: true,
        }
    }

    pub fn with_annotations(mut self, annotations: &'a AnnotationResolver) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn attach_labels(mut self, attach: bool) -> Self {
        self.attach_labels = attach;
        self
    }

    /// Parse a full line including its `#` marker.
    pub fn parse_line(&self, line: &str, diags: &mut Diagnostics) -> Option<Definition> {
        self.parse_body(definition_body(line)?, diags)
    }

    /// Parse the text after the `#` marker. Lines that leave no gloss text
    /// are reported and dropped.
    pub fn parse_body(&self, body: &str, diags: &mut Diagnostics) -> Option<Definition> {
        let mut tokens: Vec<String> = Vec::new();
        let mut annotation = None;
        let mut rest = body.trim();

        while let Some((region, after)) = self.scanner.leading_region(rest) {
            match self.classify(&region, true, diags) {
                Peeled::Labels(found) => tokens.extend(found),
                Peeled::SenseMarker => {}
                Peeled::Annotation(call) => {
                    annotation = Some(call);
                    rest = after.trim_start();
                    break;
                }
                Peeled::Stop => break,
            }
            rest = after.trim_start();
        }

        let mut trailing: Vec<Vec<String>> = Vec::new();
        while let Some((before, region)) = self.scanner.trailing_region(rest) {
            match self.classify(&region, false, diags) {
                Peeled::Labels(found) => trailing.push(found),
                Peeled::SenseMarker => {}
                Peeled::Annotation(_) | Peeled::Stop => break,
            }
            rest = before.trim_end();
        }
        tokens.extend(trailing.into_iter().rev().flatten());

        let rendered = self.render(rest, diags);
        let (text, tags) = match annotation {
            Some(call) => {
                let args: Vec<String> = call.args.iter().map(|a| self.render(a, diags)).collect();
                let result = self.annotations.resolve_in(&call.key(), &args, &rendered, diags);
                (normalize_text(&result.gloss), result.tags)
            }
            None => (rendered, Vec::new()),
        };

        if text.is_empty() {
            diags.report(Diagnostic::EmptyDefinition(body.to_string()));
            return None;
        }

        let labels = if self.attach_labels {
            let mut labels = group_labels(&tokens, diags);
            for tag in tags {
                if !tag.is_empty() && !labels.contains(&tag) {
                    labels.push(tag);
                }
            }
            labels
        } else {
            Vec::new()
        };

        Some(Definition { text, labels })
    }

    /// Decide what an edge template contributes. Annotations are only taken
    /// from the leading edge.
    fn classify(&self, region: &Region<'_>, leading: bool, diags: &mut Diagnostics) -> Peeled {
        if region.group != Group::Template || !region.terminated {
            return Peeled::Stop;
        }
        let mut call = TemplateCall::parse(&self.scanner, region.inner);
        call.strip_language_code(self.lang_code);
        let key = call.key();
        if LABEL_TEMPLATES.contains(&key.as_str()) || QUALIFIER_TEMPLATES.contains(&key.as_str()) {
            let tokens = call
                .positional()
                .map(|arg| self.label_token(arg, diags))
                .filter(|t| !t.is_empty())
                .collect();
            Peeled::Labels(tokens)
        } else if self.annotations.is_sense_marker(&key) {
            Peeled::SenseMarker
        } else if !leading || is_inline_template(&key) {
            Peeled::Stop
        } else {
            Peeled::Annotation(call)
        }
    }

    fn render(&self, text: &str, diags: &mut Diagnostics) -> String {
        render_text(&self.scanner, text, self.lang_code, diags)
    }

    fn label_token(&self, arg: &str, diags: &mut Diagnostics) -> String {
        let rendered = self.render(arg, diags);
        if rendered.contains("{{") || rendered.contains("}}") {
            normalize_text(&rendered.replace("{{", "").replace("}}", ""))
        } else {
            rendered
        }
    }
}
