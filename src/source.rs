//! Entry-framed line sources.
//!
//! The builder never sees file handles or XML: it pulls [`SourceEvent`]s
//! from a [`LineSource`]. [`XmlDumpSource`] reads a MediaWiki XML dump
//! (`pages-articles.xml`, optionally through a bz2 decoder) and
//! [`MemorySource`] serves pages held in memory.

use std::collections::VecDeque;
use std::io::BufRead;

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    EntryStart { headword: String },
    Line(String),
    EntryEnd,
}

pub trait LineSource {
    /// Next event, `Ok(None)` once the input is exhausted.
    fn next_event(&mut self) -> Result<Option<SourceEvent>, ParseError>;
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, ParseError> {
        (**self).next_event()
    }
}

lazy_static! {
    static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]*)</title>").unwrap();
    static ref TEXT_OPEN: Regex = Regex::new(r"^<text\b[^>]*?(/?)>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#[0-9]+|#x[0-9A-Fa-f]+|[a-z]+);").unwrap();
}

/// Replace XML character references and the predefined entities.
/// Unknown entities are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) = name.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = name.strip_prefix('#') {
                        dec.parse().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Framing {
    Outside,
    InPage { headword: Option<String> },
    InText { headword: String },
}

pub struct XmlDumpSource<R: BufRead> {
    reader: R,
    state: Framing,
    pending: VecDeque<SourceEvent>,
    line_number: usize,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl<R: BufRead> XmlDumpSource<R> {
    pub fn new(reader: R) -> Self {
        XmlDumpSource {
            reader,
            state: Framing::Outside,
            pending: VecDeque::new(),
            line_number: 0,
            buffer: Vec::with_capacity(4096),
            exhausted: false,
        }
    }

    /// Physical lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn framing_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Framing {
            line: self.line_number,
            message: message.into(),
        }
    }

    fn read_line(&mut self) -> Result<Option<String>, ParseError> {
        self.buffer.clear();
        let read = self.reader.read_until(b'\n', &mut self.buffer)?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        let line = String::from_utf8_lossy(&self.buffer);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn push_text(&mut self, text: &str) {
        self.pending.push_back(SourceEvent::Line(decode_entities(text)));
    }

    /// Feed one physical line through the page framing.
    fn frame(&mut self, line: String) -> Result<(), ParseError> {
        match std::mem::replace(&mut self.state, Framing::Outside) {
            Framing::Outside => {
                self.state = if line.trim() == "<page>" {
                    Framing::InPage { headword: None }
                } else {
                    Framing::Outside
                };
            }
            Framing::InPage { headword } => {
                let trimmed = line.trim();
                if trimmed == "<page>" {
                    return Err(self.framing_error("<page> opened inside another page"));
                }
                if trimmed == "</page>" {
                    if headword.is_some() {
                        self.pending.push_back(SourceEvent::EntryEnd);
                    }
                    return Ok(());
                }
                if let Some(caps) = TITLE_PATTERN.captures(trimmed) {
                    if headword.is_some() {
                        return Err(self.framing_error("second <title> in one page"));
                    }
                    let title: String = decode_entities(&caps[1]).nfc().collect();
                    self.pending.push_back(SourceEvent::EntryStart {
                        headword: title.clone(),
                    });
                    self.state = Framing::InPage { headword: Some(title) };
                    return Ok(());
                }
                if let Some(caps) = TEXT_OPEN.captures(trimmed) {
                    let Some(headword) = headword else {
                        return Err(self.framing_error("<text> before <title>"));
                    };
                    let self_closing = &caps[1] == "/";
                    let content = &trimmed[caps[0].len()..];
                    if self_closing {
                        self.state = Framing::InPage { headword: Some(headword) };
                    } else if let Some(end) = content.find("</text>") {
                        let text = content[..end].to_string();
                        self.push_text(&text);
                        self.state = Framing::InPage { headword: Some(headword) };
                    } else {
                        let text = content.to_string();
                        self.push_text(&text);
                        self.state = Framing::InText { headword };
                    }
                    return Ok(());
                }
                self.state = Framing::InPage { headword };
            }
            Framing::InText { headword } => match line.find("</text>") {
                Some(end) => {
                    self.push_text(&line[..end]);
                    self.state = Framing::InPage { headword: Some(headword) };
                }
                None => {
                    self.push_text(&line);
                    self.state = Framing::InText { headword };
                }
            },
        }
        Ok(())
    }
}

impl<R: BufRead> LineSource for XmlDumpSource<R> {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, ParseError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.exhausted {
                return Ok(None);
            }
            match self.read_line()? {
                Some(line) => self.frame(line)?,
                None => {
                    self.exhausted = true;
                    if self.state != Framing::Outside {
                        return Err(self.framing_error("input ended inside a page"));
                    }
                }
            }
        }
    }
}

/// Pages held in memory, one `(headword, wikitext)` pair each.
#[derive(Debug, Default)]
pub struct MemorySource {
    events: VecDeque<SourceEvent>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages<I, H, T>(pages: I) -> Self
    where
        I: IntoIterator<Item = (H, T)>,
        H: Into<String>,
        T: AsRef<str>,
    {
        let mut source = Self::new();
        for (headword, text) in pages {
            source.push_page(headword, text.as_ref());
        }
        source
    }

    pub fn push_page(&mut self, headword: impl Into<String>, text: &str) {
        self.events.push_back(SourceEvent::EntryStart {
            headword: headword.into(),
        });
        self.events
            .extend(text.lines().map(|line| SourceEvent::Line(line.to_string())));
        self.events.push_back(SourceEvent::EntryEnd);
    }
}

impl LineSource for MemorySource {
    fn next_event(&mut self) -> Result<Option<SourceEvent>, ParseError> {
        Ok(self.events.pop_front())
    }
}
