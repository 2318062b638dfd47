//! Output sinks for emitted documents.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::document::Document;
use crate::error::ParseError;

pub trait DocumentSink {
    fn accept(&mut self, document: Document) -> Result<(), ParseError>;

    /// Write anything still buffered. Called once, after the last document.
    fn finish(&mut self) -> Result<(), ParseError>;
}

/// One JSON object keyed by headword. A later document with the same
/// headword replaces the earlier one in place.
pub struct CompactJsonSink<W: Write> {
    writer: W,
    documents: Vec<Document>,
    index: HashMap<String, usize>,
}

impl<W: Write> CompactJsonSink<W> {
    pub fn new(writer: W) -> Self {
        CompactJsonSink {
            writer,
            documents: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

struct Keyed<'a>(&'a [Document]);

impl Serialize for Keyed<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for document in self.0 {
            map.serialize_entry(&document.headword, document)?;
        }
        map.end()
    }
}

impl<W: Write> DocumentSink for CompactJsonSink<W> {
    fn accept(&mut self, document: Document) -> Result<(), ParseError> {
        match self.index.get(&document.headword) {
            Some(&slot) => self.documents[slot] = document,
            None => {
                self.index.insert(document.headword.clone(), self.documents.len());
                self.documents.push(document);
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        serde_json::to_writer(&mut self.writer, &Keyed(&self.documents))?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Record<'a> {
    word: &'a str,
    entry: &'a Document,
}

/// One `{"word": ..., "entry": ...}` record per line, written as it arrives.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    fn accept(&mut self, document: Document) -> Result<(), ParseError> {
        let record = Record {
            word: &document.headword,
            entry: &document,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Newline-delimited headwords, each written once.
pub struct HeadwordListSink<W: Write> {
    writer: W,
    seen: HashSet<String>,
}

impl<W: Write> HeadwordListSink<W> {
    pub fn new(writer: W) -> Self {
        HeadwordListSink {
            writer,
            seen: HashSet::new(),
        }
    }
}

impl<W: Write> DocumentSink for HeadwordListSink<W> {
    fn accept(&mut self, document: Document) -> Result<(), ParseError> {
        if self.seen.insert(document.headword.clone()) {
            writeln!(self.writer, "{}", document.headword)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.writer.flush()?;
        Ok(())
    }
}
