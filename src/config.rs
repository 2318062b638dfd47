//! Parser configuration.
//!
//! Every field is optional; a YAML file only names what it changes:
//!
//! ```yaml
//! languages: [English, French]
//! sections: [Noun, Verb, Synonyms]
//! max_documents: null
//! language_codes:
//!   Old English: ang
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use lazy_static::lazy_static;
use serde::Deserialize;

use crate::document::{base_section_name, classify_section, SectionKind};
use crate::error::ParseError;

/// Emission cap used when nothing else is configured.
pub const DEFAULT_MAX_DOCUMENTS: usize = 25;

lazy_static! {
    static ref LANGUAGE_CODES: HashMap<&'static str, &'static str> = [
        ("English", "en"),
        ("Translingual", "mul"),
        ("French", "fr"),
        ("German", "de"),
        ("Spanish", "es"),
        ("Italian", "it"),
        ("Portuguese", "pt"),
        ("Dutch", "nl"),
        ("Swedish", "sv"),
        ("Danish", "da"),
        ("Norwegian Bokmål", "nb"),
        ("Finnish", "fi"),
        ("Polish", "pl"),
        ("Czech", "cs"),
        ("Russian", "ru"),
        ("Ukrainian", "uk"),
        ("Greek", "el"),
        ("Ancient Greek", "grc"),
        ("Latin", "la"),
        ("Old English", "ang"),
        ("Middle English", "enm"),
        ("Scots", "sco"),
        ("Irish", "ga"),
        ("Welsh", "cy"),
        ("Japanese", "ja"),
        ("Chinese", "zh"),
        ("Korean", "ko"),
        ("Arabic", "ar"),
        ("Hebrew", "he"),
        ("Turkish", "tr"),
        ("Hindi", "hi"),
        ("Esperanto", "eo"),
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Languages to keep. Empty keeps every language.
    pub languages: BTreeSet<String>,
    /// Sections to keep. `None` keeps the part-of-speech sections, an empty
    /// list keeps every section.
    pub sections: Option<BTreeSet<String>>,
    /// Stop after this many emitted documents. `None` is unlimited.
    pub max_documents: Option<usize>,
    pub track_plurals: bool,
    /// Store derived plural forms instead of the raw rule codes.
    pub solve_plurals: bool,
    pub track_definitions: bool,
    pub attach_labels: bool,
    pub headwords_only: bool,
    /// Extra language name → template code pairs.
    pub language_codes: HashMap<String, String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            languages: BTreeSet::from(["English".to_string()]),
            sections: None,
            max_documents: Some(DEFAULT_MAX_DOCUMENTS),
            track_plurals: true,
            solve_plurals: true,
            track_definitions: true,
            attach_labels: true,
            headwords_only: false,
            language_codes: HashMap::new(),
        }
    }
}

impl ParserConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ParseError> {
        let config: ParserConfig = serde_yaml::from_str(contents)
            .map_err(|e| ParseError::Config(format!("failed to parse config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ParseError> {
        let mut file = File::open(path).map_err(|e| {
            ParseError::Config(format!("failed to open config file {:?}: {}", path, e))
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_yaml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        if let Some(name) = self.languages.iter().find(|l| l.trim().is_empty()) {
            return Err(ParseError::Config(format!("empty language name {:?}", name)));
        }
        if let Some(sections) = &self.sections {
            if sections.iter().any(|s| s.trim().is_empty()) {
                return Err(ParseError::Config("empty section name".to_string()));
            }
        }
        if let Some((name, _)) = self.language_codes.iter().find(|(_, code)| code.trim().is_empty()) {
            return Err(ParseError::Config(format!("language {:?} has an empty code", name)));
        }
        Ok(())
    }

    pub fn accepts_language(&self, name: &str) -> bool {
        self.languages.is_empty() || self.languages.contains(name)
    }

    /// Numbered sections (`Etymology 2`) also match their unnumbered name.
    pub fn accepts_section(&self, name: &str) -> bool {
        match &self.sections {
            None => classify_section(name) == SectionKind::PartOfSpeech,
            Some(sections) if sections.is_empty() => true,
            Some(sections) => {
                sections.contains(name) || sections.contains(base_section_name(name))
            }
        }
    }

    /// With exactly one language the language layer is left out of output.
    pub fn flatten(&self) -> bool {
        self.languages.len() == 1
    }

    pub fn language_code(&self, name: &str) -> Option<&str> {
        self.language_codes
            .get(name)
            .map(String::as_str)
            .or_else(|| LANGUAGE_CODES.get(name).copied())
    }
}
