//! Output tree: headword → language → section → content.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::morphology::Countability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Carries definitions and, for nouns, plural information.
    PartOfSpeech,
    /// Bulleted cross-reference lists.
    List,
    /// Anything else; normalized lines are kept as-is.
    Raw,
}

const PART_OF_SPEECH_SECTIONS: &[&str] = &[
    "Noun",
    "Proper noun",
    "Verb",
    "Adjective",
    "Adverb",
    "Pronoun",
    "Preposition",
    "Postposition",
    "Conjunction",
    "Interjection",
    "Determiner",
    "Article",
    "Numeral",
    "Particle",
    "Participle",
    "Classifier",
    "Counter",
    "Prefix",
    "Suffix",
    "Infix",
    "Interfix",
    "Affix",
    "Circumfix",
    "Phrase",
    "Prepositional phrase",
    "Proverb",
    "Idiom",
    "Contraction",
    "Symbol",
    "Letter",
    "Abbreviation",
    "Initialism",
    "Acronym",
];

const LIST_SECTIONS: &[&str] = &[
    "Synonyms",
    "Antonyms",
    "Hypernyms",
    "Hyponyms",
    "Meronyms",
    "Holonyms",
    "Troponyms",
    "Coordinate terms",
    "Derived terms",
    "Related terms",
    "Compounds",
    "Descendants",
    "Alternative forms",
    "Abbreviations",
    "Collocations",
    "Homophones",
    "Anagrams",
    "See also",
    "Translations",
];

/// `Etymology 2` → `Etymology`.
pub fn base_section_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() == name.len() {
        name
    } else {
        trimmed.trim_end()
    }
}

pub fn classify_section(name: &str) -> SectionKind {
    let base = base_section_name(name);
    let matches = |table: &[&str]| table.iter().any(|s| s.eq_ignore_ascii_case(base));
    if matches(PART_OF_SPEECH_SECTIONS) {
        SectionKind::PartOfSpeech
    } else if matches(LIST_SECTIONS) {
        SectionKind::List
    } else {
        SectionKind::Raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefinitionSection {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<Definition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countable: Option<Countability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plural: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionBody {
    Definitions(DefinitionSection),
    List(Vec<String>),
    Raw(Vec<String>),
}

impl SectionBody {
    pub fn for_kind(kind: SectionKind) -> Self {
        match kind {
            SectionKind::PartOfSpeech => SectionBody::Definitions(DefinitionSection::default()),
            SectionKind::List => SectionBody::List(Vec::new()),
            SectionKind::Raw => SectionBody::Raw(Vec::new()),
        }
    }

    pub fn kind(&self) -> SectionKind {
        match self {
            SectionBody::Definitions(_) => SectionKind::PartOfSpeech,
            SectionBody::List(_) => SectionKind::List,
            SectionBody::Raw(_) => SectionKind::Raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub body: SectionBody,
}

/// Sections in the order they were opened, names unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl SectionMap {
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Position of section `name`, opening it with the shape of `kind` if
    /// it does not exist yet. An existing section keeps its body.
    pub fn open(&mut self, name: &str, kind: SectionKind) -> usize {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            return index;
        }
        self.sections.push(Section {
            name: name.to_string(),
            body: SectionBody::for_kind(kind),
        });
        self.sections.len() - 1
    }

    pub fn get_index(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(&section.name, &section.body)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub name: String,
    pub sections: SectionMap,
}

impl Language {
    pub fn new(name: &str) -> Self {
        Language {
            name: name.to_string(),
            sections: SectionMap::default(),
        }
    }
}

/// One entry. With `flattened` set, sections live directly on the document
/// and `languages` stays empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub headword: String,
    pub languages: Vec<Language>,
    pub sections: SectionMap,
    pub flattened: bool,
}

impl Document {
    pub fn new(headword: &str, flattened: bool) -> Self {
        Document {
            headword: headword.to_string(),
            languages: Vec::new(),
            sections: SectionMap::default(),
            flattened,
        }
    }

    pub fn language(&self, name: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.name == name)
    }

    /// Section lookup across both layouts; the first language wins.
    pub fn section(&self, name: &str) -> Option<&Section> {
        if self.flattened {
            self.sections.get(name)
        } else {
            self.languages.iter().find_map(|l| l.sections.get(name))
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len() + self.languages.iter().map(|l| l.sections.len()).sum::<usize>()
    }
}

/// Serializes the entry content, without the headword: either the section
/// map or a language → section map object.
impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.flattened {
            return self.sections.serialize(serializer);
        }
        let mut map = serializer.serialize_map(Some(self.languages.len()))?;
        for language in &self.languages {
            map.serialize_entry(&language.name, &language.sections)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification() {
        assert_eq!(classify_section("Noun"), SectionKind::PartOfSpeech);
        assert_eq!(classify_section("proper noun"), SectionKind::PartOfSpeech);
        assert_eq!(classify_section("Synonyms"), SectionKind::List);
        assert_eq!(classify_section("Etymology 1"), SectionKind::Raw);
        assert_eq!(classify_section("Noun 2"), SectionKind::PartOfSpeech);
    }

    #[test]
    fn base_name_strips_numbering() {
        assert_eq!(base_section_name("Etymology 12"), "Etymology");
        assert_eq!(base_section_name("Noun"), "Noun");
        assert_eq!(base_section_name("123"), "");
    }

    #[test]
    fn reopening_a_section_continues_it() {
        let mut map = SectionMap::default();
        let first = map.open("Noun", SectionKind::PartOfSpeech);
        map.open("Synonyms", SectionKind::List);
        let again = map.open("Noun", SectionKind::PartOfSpeech);
        assert_eq!(first, again);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn flattened_document_json() {
        let mut doc = Document::new("cat", true);
        let index = doc.sections.open("Noun", SectionKind::PartOfSpeech);
        if let Some(Section { body: SectionBody::Definitions(defs), .. }) =
            doc.sections.get_index_mut(index)
        {
            defs.definitions.push(Definition {
                text: "A small feline.".to_string(),
                labels: vec![],
            });
            defs.countable = Some(Countability::Yes);
            defs.plural = Some(vec!["cats".to_string()]);
        }
        let index = doc.sections.open("Synonyms", SectionKind::List);
        if let Some(Section { body: SectionBody::List(items), .. }) =
            doc.sections.get_index_mut(index)
        {
            items.push("moggy".to_string());
        }

        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "Noun": {
                    "definitions": [{"text": "A small feline."}],
                    "countable": "yes",
                    "plural": ["cats"]
                },
                "Synonyms": ["moggy"]
            })
        );
    }

    #[test]
    fn per_language_document_json() {
        let mut doc = Document::new("chat", false);
        let mut french = Language::new("French");
        french.sections.open("Verb", SectionKind::PartOfSpeech);
        doc.languages.push(french);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"French": {"Verb": {}}})
        );
        assert_eq!(doc.section_count(), 1);
        assert!(doc.section("Verb").is_some());
    }

    #[test]
    fn section_order_is_preserved() {
        let mut doc = Document::new("x", true);
        for name in ["Verb", "Noun", "Adjective"] {
            doc.sections.open(name, SectionKind::PartOfSpeech);
        }
        let json = serde_json::to_string(&doc).unwrap();
        let verb = json.find("Verb").unwrap();
        let noun = json.find("Noun").unwrap();
        let adjective = json.find("Adjective").unwrap();
        assert!(verb < noun && noun < adjective);
    }
}
