//! The entry → language → section state machine.
//!
//! [`DocumentBuilder`] pulls events from a [`LineSource`] and yields one
//! [`Document`] per entry that opened at least one accepted section. Lines
//! are classified in priority order: language boundary (`----` or a new
//! `==Language==` title), section title (`===Name===` and deeper), then
//! section content according to the section's kind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::annotations::AnnotationResolver;
use crate::config::ParserConfig;
use crate::definition::{definition_body, DefinitionParser};
use crate::document::{
    base_section_name, classify_section, Document, Language, SectionBody, SectionKind, SectionMap,
};
use crate::error::{Diagnostics, ParseError};
use crate::morphology::{resolve, rule_codes, MorphologyTable};
use crate::scanner::{DelimiterScanner, Group};
use crate::source::{LineSource, SourceEvent};
use crate::template::{render_text, TemplateCall};

lazy_static! {
    static ref LANGUAGE_TITLE: Regex = Regex::new(r"^==\s*([^=]+?)\s*==\s*$").unwrap();
    static ref SECTION_TITLE: Regex = Regex::new(r"^={3,}\s*([^=]+?)\s*={3,}\s*$").unwrap();
}

/// Column templates whose arguments are list items.
const COLUMN_TEMPLATES: &[&str] = &[
    "col", "col2", "col3", "col4", "col5", "col-auto", "der2", "der3", "der4", "der5", "rel2",
    "rel3", "rel4", "rel5",
];

/// Section whose plural line is tracked.
const PLURAL_SECTION: &str = "Noun";

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub entries_seen: usize,
    pub entries_emitted: usize,
    /// Entries without any accepted section.
    pub entries_discarded: usize,
    /// Entries whose headword names a meta page (`Category:...`).
    pub meta_skipped: usize,
    pub lines_consumed: usize,
    pub diagnostics: usize,
    pub stopped_early: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    AwaitingLanguage,
    AwaitingSection,
    InSection(OpenSection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenSection {
    index: usize,
    kind: SectionKind,
    tracks_plural: bool,
    plural_found: bool,
}

/// State for the entry currently being read.
struct OpenEntry {
    document: Document,
    position: Position,
    /// Index into `document.languages`; unused when flattened.
    language: usize,
    lang_code: Option<String>,
    has_content: bool,
    skip_entry: bool,
    skip_language: bool,
    skip_section: bool,
}

impl OpenEntry {
    fn new(headword: &str, flattened: bool) -> Self {
        OpenEntry {
            document: Document::new(headword, flattened),
            position: Position::AwaitingLanguage,
            language: 0,
            lang_code: None,
            has_content: false,
            skip_entry: false,
            skip_language: false,
            skip_section: false,
        }
    }

    fn sections(&mut self) -> Option<&mut SectionMap> {
        if self.document.flattened {
            Some(&mut self.document.sections)
        } else {
            self.document
                .languages
                .get_mut(self.language)
                .map(|l| &mut l.sections)
        }
    }

    fn section_body(&mut self, index: usize) -> Option<&mut SectionBody> {
        self.sections()?.get_index_mut(index).map(|s| &mut s.body)
    }

    fn close_language(&mut self) {
        self.position = Position::AwaitingLanguage;
        self.skip_language = false;
        self.skip_section = false;
    }
}

/// Called with the running counters every `every` entries read.
struct Progress {
    every: usize,
    callback: Box<dyn FnMut(&RunStats)>,
}

pub struct DocumentBuilder<S: LineSource> {
    source: S,
    config: ParserConfig,
    annotations: AnnotationResolver,
    scanner: DelimiterScanner<'static>,
    diags: Diagnostics,
    entry: Option<OpenEntry>,
    stats: RunStats,
    stop: Arc<AtomicBool>,
    progress: Option<Progress>,
    finished: bool,
}

impl<S: LineSource> DocumentBuilder<S> {
    pub fn new(source: S, config: ParserConfig) -> Self {
        DocumentBuilder {
            source,
            config,
            annotations: AnnotationResolver::builtin().clone(),
            scanner: DelimiterScanner::wikitext(),
            diags: Diagnostics::new(),
            entry: None,
            stats: RunStats::default(),
            stop: Arc::new(AtomicBool::new(false)),
            progress: None,
            finished: false,
        }
    }

    pub fn with_annotations(mut self, annotations: AnnotationResolver) -> Self {
        self.annotations = annotations;
        self
    }

    /// Report the counters every `every` entries read, whether or not they
    /// are emitted. An interval of 0 disables reporting.
    pub fn with_progress(
        mut self,
        every: usize,
        callback: impl FnMut(&RunStats) + 'static,
    ) -> Self {
        self.progress = (every > 0).then(|| Progress {
            every,
            callback: Box::new(callback),
        });
        self
    }

    /// Setting the returned flag stops the run before the next event. The
    /// entry being read at that point is dropped, never emitted partially.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    fn budget_spent(&self) -> bool {
        self.config
            .max_documents
            .map(|max| self.stats.entries_emitted >= max)
            .unwrap_or(false)
    }

    fn handle(&mut self, event: SourceEvent) -> Option<Document> {
        match event {
            SourceEvent::EntryStart { headword } => {
                let previous = self.finish_entry();
                self.begin_entry(&headword);
                previous
            }
            SourceEvent::EntryEnd => self.finish_entry(),
            SourceEvent::Line(line) => {
                self.stats.lines_consumed += 1;
                self.process_line(&line);
                None
            }
        }
    }

    fn begin_entry(&mut self, headword: &str) {
        self.stats.entries_seen += 1;
        if let Some(progress) = self.progress.as_mut() {
            if self.stats.entries_seen % progress.every == 0 {
                (progress.callback)(&self.stats);
            }
        }
        let mut entry = OpenEntry::new(headword, self.config.flatten());
        if headword.contains(':') {
            debug!("skipping meta entry {:?}", headword);
            self.stats.meta_skipped += 1;
            entry.skip_entry = true;
        }
        self.entry = Some(entry);
    }

    /// Drop the open entry without emitting it, keeping its diagnostic count.
    fn abandon_entry(&mut self) {
        self.entry = None;
        self.stats.diagnostics += self.diags.clear();
    }

    /// Close the open entry, returning its document if it qualifies.
    fn finish_entry(&mut self) -> Option<Document> {
        let entry = self.entry.take()?;
        self.stats.diagnostics += self.diags.clear();
        if entry.skip_entry {
            return None;
        }
        if !entry.has_content {
            self.stats.entries_discarded += 1;
            return None;
        }
        self.stats.entries_emitted += 1;
        Some(entry.document)
    }

    fn process_line(&mut self, line: &str) {
        let DocumentBuilder {
            config,
            annotations,
            scanner,
            diags,
            entry,
            ..
        } = self;
        let Some(entry) = entry.as_mut() else { return };
        let line = line.trim();
        if line.is_empty() || entry.skip_entry {
            return;
        }

        if line == "----" {
            entry.close_language();
            return;
        }
        if let Some(caps) = LANGUAGE_TITLE.captures(line) {
            open_language(config, entry, &caps[1]);
            return;
        }
        if entry.skip_language || entry.position == Position::AwaitingLanguage {
            return;
        }
        if let Some(caps) = SECTION_TITLE.captures(line) {
            open_section(config, entry, &caps[1]);
            return;
        }
        if entry.skip_section || config.headwords_only {
            return;
        }
        let Position::InSection(section) = entry.position else { return };

        let lang_code = entry.lang_code.clone();
        let lang_code = lang_code.as_deref();
        match section.kind {
            SectionKind::PartOfSpeech => {
                if definition_body(line).is_some() {
                    if !config.track_definitions {
                        return;
                    }
                    let parser = DefinitionParser::new(lang_code)
                        .with_annotations(annotations)
                        .attach_labels(config.attach_labels);
                    if let Some(definition) = parser.parse_line(line, diags) {
                        if let Some(SectionBody::Definitions(body)) = entry.section_body(section.index) {
                            body.definitions.push(definition);
                        }
                    }
                } else if section.tracks_plural && !section.plural_found {
                    let Some(table) = lang_code.and_then(MorphologyTable::for_language) else {
                        return;
                    };
                    if !table.is_plural_line(line) {
                        return;
                    }
                    record_plural(config, scanner, entry, section, line);
                }
            }
            SectionKind::List => {
                let items = list_items(scanner, line, lang_code, diags);
                if let Some(SectionBody::List(list)) = entry.section_body(section.index) {
                    list.extend(items);
                }
            }
            SectionKind::Raw => {
                let text = render_text(scanner, line, lang_code, diags);
                if text.is_empty() {
                    return;
                }
                if let Some(SectionBody::Raw(lines)) = entry.section_body(section.index) {
                    lines.push(text);
                }
            }
        }
    }
}

fn open_language(config: &ParserConfig, entry: &mut OpenEntry, name: &str) {
    entry.close_language();
    if !config.accepts_language(name) {
        debug!("{}: skipping language {}", entry.document.headword, name);
        entry.skip_language = true;
        return;
    }
    if !entry.document.flattened {
        entry.language = match entry.document.languages.iter().position(|l| l.name == name) {
            Some(index) => index,
            None => {
                entry.document.languages.push(Language::new(name));
                entry.document.languages.len() - 1
            }
        };
    }
    entry.lang_code = config.language_code(name).map(str::to_string);
    entry.position = Position::AwaitingSection;
}

fn open_section(config: &ParserConfig, entry: &mut OpenEntry, name: &str) {
    entry.skip_section = false;
    if !config.accepts_section(name) {
        debug!("{}: skipping section {}", entry.document.headword, name);
        entry.skip_section = true;
        entry.position = Position::AwaitingSection;
        return;
    }
    let kind = classify_section(name);
    let Some(sections) = entry.sections() else {
        entry.position = Position::AwaitingSection;
        return;
    };
    let index = sections.open(name, kind);
    // A reopened section keeps the plural it already found.
    let plural_found = matches!(
        sections.get_index(index).map(|s| &s.body),
        Some(SectionBody::Definitions(body)) if body.countable.is_some() || body.plural.is_some()
    );
    entry.has_content = true;
    entry.position = Position::InSection(OpenSection {
        index,
        kind,
        tracks_plural: config.track_plurals && base_section_name(name) == PLURAL_SECTION,
        plural_found,
    });
}

fn record_plural(
    config: &ParserConfig,
    scanner: &DelimiterScanner<'static>,
    entry: &mut OpenEntry,
    mut section: OpenSection,
    line: &str,
) {
    let Some((region, _)) = scanner.leading_region(line) else { return };
    if region.group != Group::Template {
        return;
    }
    let call = TemplateCall::parse(scanner, region.inner);
    let mut codes = Vec::with_capacity(call.args.len() + 1);
    codes.push(call.name.clone());
    codes.extend(call.args.iter().cloned());

    // Raw rule codes are stored uninterpreted, so no countability either.
    let (countable, plural) = if config.solve_plurals {
        let result = resolve(&entry.document.headword, &codes);
        let plural = result.plural().map(|forms| forms.to_vec());
        (Some(result.countability), plural)
    } else {
        let raw: Vec<String> = rule_codes(&codes).into_iter().map(str::to_string).collect();
        (None, (!raw.is_empty()).then_some(raw))
    };

    section.plural_found = true;
    entry.position = Position::InSection(section);
    if let Some(SectionBody::Definitions(body)) = entry.section_body(section.index) {
        body.countable = countable;
        body.plural = plural;
    }
}

/// Items contributed by one line of a list section.
fn list_items(
    scanner: &DelimiterScanner<'static>,
    line: &str,
    lang_code: Option<&str>,
    diags: &mut Diagnostics,
) -> Vec<String> {
    if let Some((region, _)) = scanner.leading_region(line) {
        if region.group == Group::Template && region.terminated {
            let mut call = TemplateCall::parse(scanner, region.inner);
            if COLUMN_TEMPLATES.contains(&call.key().as_str()) {
                call.strip_language_code(lang_code);
                return call
                    .positional()
                    .map(|arg| render_text(scanner, arg, lang_code, diags))
                    .filter(|item| !item.is_empty())
                    .collect();
            }
        }
    }
    if !line.starts_with(['*', '|']) {
        return Vec::new();
    }
    let item = line.trim_start_matches(['*', '|', ':', '#']).trim();
    let text = render_text(scanner, item, lang_code, diags);
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}

impl<S: LineSource> Iterator for DocumentBuilder<S> {
    type Item = Result<Document, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.budget_spent() {
                info!("document limit reached after {} entries", self.stats.entries_seen);
                self.abandon_entry();
                self.finished = true;
                return None;
            }
            if self.stop.load(Ordering::Relaxed) {
                info!("stop requested; dropping the open entry");
                self.abandon_entry();
                self.stats.stopped_early = true;
                self.finished = true;
                return None;
            }
            match self.source.next_event() {
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                Ok(None) => {
                    self.finished = true;
                    return self.finish_entry().map(Ok);
                }
                Ok(Some(event)) => {
                    if let Some(document) = self.handle(event) {
                        return Some(Ok(document));
                    }
                }
            }
        }
    }
}
