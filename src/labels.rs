//! Grouping of definition label tokens.
//!
//! `{{lb|en|chiefly|UK|Australia}}` arrives here as the flat token list
//! `["chiefly", "UK", "Australia"]` and leaves as `["chiefly: UK, Australia"]`.
//! Three kinds of special token are recognized, checked in this order:
//! leading qualifiers (`usually plural`), combining markers (`_`, `and`, `or`)
//! and list openers (`chiefly`, `mainly`, ...).

use crate::error::{Diagnostic, Diagnostics};

/// Prefix the next token: `usually` + `plural` → `usually plural`.
const LEADING_QUALIFIERS: &[&str] = &[
    "sometimes",
    "usually",
    "now",
    "often",
    "also",
    "rarely",
    "originally",
    "formerly",
    "typically",
    "frequently",
    "very",
    "somewhat",
    "slightly",
    "possibly",
    "extremely",
    "strongly",
    "only",
];

/// Merge the previous label with the next token, using the given joiner.
const COMBINERS: &[(&str, &str)] = &[("_", " "), ("and", " and "), ("or", " or ")];

/// Start a titled list that collects plain tokens.
const LIST_OPENERS: &[&str] = &[
    "chiefly",
    "mainly",
    "mostly",
    "primarily",
    "especially",
    "including",
    "excluding",
    "except",
];

fn is_leading_qualifier(token: &str) -> bool {
    LEADING_QUALIFIERS.iter().any(|q| q.eq_ignore_ascii_case(token))
}

fn combiner(token: &str) -> Option<&'static str> {
    COMBINERS
        .iter()
        .find(|(marker, _)| marker.eq_ignore_ascii_case(token))
        .map(|(_, joiner)| *joiner)
}

fn is_list_opener(token: &str) -> bool {
    LIST_OPENERS.iter().any(|o| o.eq_ignore_ascii_case(token))
}

struct TitledList<'a> {
    title: &'a str,
    items: Vec<&'a str>,
}

impl TitledList<'_> {
    fn into_label(self) -> String {
        if self.items.is_empty() {
            self.title.to_string()
        } else {
            format!("{}: {}", self.title, self.items.join(", "))
        }
    }
}

fn flush(list: &mut Option<TitledList<'_>>, labels: &mut Vec<String>) {
    if let Some(list) = list.take() {
        labels.push(list.into_label());
    }
}

/// Group normalized label tokens. Empty tokens are ignored.
pub fn group_labels<S: AsRef<str>>(tokens: &[S], diags: &mut Diagnostics) -> Vec<String> {
    let tokens: Vec<&str> = tokens
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect();

    let mut labels: Vec<String> = Vec::new();
    let mut list: Option<TitledList<'_>> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];

        if is_leading_qualifier(token) {
            flush(&mut list, &mut labels);
            match tokens.get(i + 1) {
                Some(next) => {
                    labels.push(format!("{} {}", token, next));
                    i += 2;
                }
                None => {
                    diags.report(Diagnostic::DanglingQualifier(token.to_string()));
                    labels.push(token.to_string());
                    i += 1;
                }
            }
        } else if let Some(joiner) = combiner(token) {
            flush(&mut list, &mut labels);
            let previous = labels.pop().unwrap_or_default();
            match tokens.get(i + 1) {
                Some(next) => {
                    let merged = format!("{}{}{}", previous, joiner, next);
                    labels.push(merged.trim().to_string());
                    i += 2;
                }
                None => {
                    diags.report(Diagnostic::DanglingCombiner(token.to_string()));
                    if !previous.is_empty() {
                        labels.push(previous);
                    }
                    i += 1;
                }
            }
        } else if is_list_opener(token) {
            flush(&mut list, &mut labels);
            list = Some(TitledList { title: token, items: Vec::new() });
            i += 1;
        } else {
            match list.as_mut() {
                Some(list) => list.items.push(token),
                None => labels.push(token.to_string()),
            }
            i += 1;
        }
    }

    flush(&mut list, &mut labels);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(tokens: &[&str]) -> (Vec<String>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let labels = group_labels(tokens, &mut diags);
        (labels, diags)
    }

    #[test]
    fn plain_tokens_stand_alone() {
        let (labels, diags) = group(&["archaic", "slang"]);
        assert_eq!(labels, vec!["archaic", "slang"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn list_opener_collects_until_end() {
        let (labels, _) = group(&["chiefly", "UK", "Australia"]);
        assert_eq!(labels, vec!["chiefly: UK, Australia"]);
    }

    #[test]
    fn leading_qualifier_takes_next() {
        let (labels, _) = group(&["usually", "plural"]);
        assert_eq!(labels, vec!["usually plural"]);
    }

    #[test]
    fn qualifier_closes_open_list() {
        let (labels, _) = group(&["chiefly", "US", "usually", "informal", "slang"]);
        assert_eq!(labels, vec!["chiefly: US", "usually informal", "slang"]);
    }

    #[test]
    fn qualifier_consumes_special_token_verbatim() {
        let (labels, _) = group(&["now", "chiefly", "dialectal"]);
        assert_eq!(labels, vec!["now chiefly", "dialectal"]);
    }

    #[test]
    fn trailing_qualifier_reported() {
        let (labels, diags) = group(&["slang", "sometimes"]);
        assert_eq!(labels, vec!["slang", "sometimes"]);
        assert_eq!(
            diags.iter().collect::<Vec<_>>(),
            vec![&Diagnostic::DanglingQualifier("sometimes".to_string())]
        );
    }

    #[test]
    fn underscore_joins_previous_and_next() {
        let (labels, _) = group(&["British", "_", "informal", "rare"]);
        assert_eq!(labels, vec!["British informal", "rare"]);
    }

    #[test]
    fn or_keeps_its_word() {
        let (labels, _) = group(&["rare", "or", "archaic"]);
        assert_eq!(labels, vec!["rare or archaic"]);
    }

    #[test]
    fn combiner_without_previous_label() {
        let (labels, diags) = group(&["_", "informal"]);
        assert_eq!(labels, vec!["informal"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn combiner_after_list_merges_flushed_list() {
        let (labels, _) = group(&["chiefly", "UK", "_", "slang"]);
        assert_eq!(labels, vec!["chiefly: UK slang"]);
    }

    #[test]
    fn trailing_combiner_reported() {
        let (labels, diags) = group(&["dated", "_"]);
        assert_eq!(labels, vec!["dated"]);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn opener_without_items_is_bare_title() {
        let (labels, _) = group(&["especially"]);
        assert_eq!(labels, vec!["especially"]);
    }

    #[test]
    fn empty_tokens_ignored() {
        let (labels, _) = group(&["", " ", "obsolete"]);
        assert_eq!(labels, vec!["obsolete"]);
    }

    #[test]
    fn special_tokens_case_insensitive() {
        let (labels, _) = group(&["Chiefly", "Scotland"]);
        assert_eq!(labels, vec!["Chiefly: Scotland"]);
    }
}
