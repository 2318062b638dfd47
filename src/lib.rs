//! Wiktionary wikitext → structured documents.
//!
//! ```no_run
//! use wikiparse::{DocumentBuilder, MemorySource, ParserConfig};
//!
//! let source = MemorySource::from_pages([("cat", "==English==\n===Noun===\n# A [[feline]].")]);
//! for document in DocumentBuilder::new(source, ParserConfig::default()) {
//!     let document = document.unwrap();
//!     println!("{}: {}", document.headword, serde_json::to_string(&document).unwrap());
//! }
//! ```

pub mod annotations;
pub mod builder;
pub mod config;
pub mod definition;
pub mod document;
pub mod error;
pub mod labels;
pub mod morphology;
pub mod normalize;
pub mod scanner;
pub mod sink;
pub mod source;
pub mod template;

pub use annotations::{AnnotationResolver, AnnotationResult};
pub use builder::{DocumentBuilder, RunStats};
pub use config::ParserConfig;
pub use definition::DefinitionParser;
pub use document::{Definition, Document, Language, Section, SectionBody, SectionKind};
pub use error::{Diagnostic, Diagnostics, ParseError};
pub use labels::group_labels;
pub use morphology::{Countability, MorphologyResult};
pub use normalize::normalize_text;
pub use scanner::{DelimiterScanner, DelimiterTable, Group};
pub use sink::{CompactJsonSink, DocumentSink, HeadwordListSink, JsonLinesSink};
pub use source::{LineSource, MemorySource, SourceEvent, XmlDumpSource};
