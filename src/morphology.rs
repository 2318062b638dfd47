//! Plural rule codes (`{{en-noun|es}}`, `{{en-noun|~}}`, ...) and the
//! countability classification derived from them.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::normalize::normalize_text;
use crate::template::is_named_arg;

lazy_static! {
    // Part-of-speech identifier that may lead the code list: en-noun, ang-verb
    static ref IDENTIFIER_CODE: Regex = Regex::new(r"^\w{2,3}-(?:noun|verb)$").unwrap();
    static ref TABLES: Vec<MorphologyTable> = vec![MorphologyTable {
        language_code: "en",
        plural_line: Regex::new(r"^\{\{en-noun\s*(?:\||\}\})").unwrap(),
    }];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Countability {
    No,
    Yes,
    Sometimes,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphologyResult {
    pub countability: Countability,
    pub forms: Vec<String>,
}

impl MorphologyResult {
    /// Forms worth recording: only countable nouns carry a plural.
    pub fn plural(&self) -> Option<&[String]> {
        let countable = matches!(
            self.countability,
            Countability::Yes | Countability::Sometimes
        );
        (countable && !self.forms.is_empty()).then_some(self.forms.as_slice())
    }
}

/// Per-language plural rules. Only languages with a table get plural
/// tracking.
pub struct MorphologyTable {
    pub language_code: &'static str,
    plural_line: Regex,
}

impl MorphologyTable {
    pub fn for_language(code: &str) -> Option<&'static MorphologyTable> {
        TABLES.iter().find(|t| t.language_code.eq_ignore_ascii_case(code))
    }

    /// Whether `line` is this language's noun headword template.
    pub fn is_plural_line(&self, line: &str) -> bool {
        self.plural_line.is_match(line.trim_start())
    }

    pub fn resolve<S: AsRef<str>>(&self, headword: &str, codes: &[S]) -> MorphologyResult {
        resolve(headword, codes)
    }
}

/// Rule codes with the leading identifier, named arguments and empty codes
/// removed.
pub fn rule_codes<S: AsRef<str>>(codes: &[S]) -> Vec<&str> {
    let mut codes: Vec<&str> = codes.iter().map(|c| c.as_ref().trim()).collect();
    if codes.first().map(|c| IDENTIFIER_CODE.is_match(c)).unwrap_or(false) {
        codes.remove(0);
    }
    codes.retain(|c| !c.is_empty() && !is_named_arg(c));
    codes
}

pub fn resolve<S: AsRef<str>>(headword: &str, codes: &[S]) -> MorphologyResult {
    let codes = rule_codes(codes);
    if codes.is_empty() {
        return MorphologyResult {
            countability: Countability::Yes,
            forms: vec![format!("{}s", headword)],
        };
    }

    let mut countability = Countability::No;
    let mut forms = Vec::new();
    fn raise(countability: &mut Countability) {
        if *countability == Countability::No {
            *countability = Countability::Yes;
        }
    }

    for code in &codes {
        match *code {
            "s" | "+" => {
                forms.push(format!("{}s", headword));
                raise(&mut countability);
            }
            "es" => {
                forms.push(format!("{}es", headword));
                raise(&mut countability);
            }
            "~" => {
                countability = Countability::Sometimes;
                if codes.len() == 1 {
                    forms.push(format!("{}s", headword));
                }
            }
            "-" => {
                if countability == Countability::Yes {
                    countability = Countability::Sometimes;
                }
            }
            "?" | "!" => countability = Countability::Unknown,
            literal => {
                let form = normalize_text(literal);
                if !form.is_empty() {
                    forms.push(form);
                    raise(&mut countability);
                }
            }
        }
    }

    MorphologyResult { countability, forms }
}
