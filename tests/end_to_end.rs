//! Dump → documents → sink, through the public API only.

use std::collections::BTreeSet;
use std::io::Cursor;

use serde_json::json;
use wikiparse::{
    CompactJsonSink, Document, DocumentBuilder, DocumentSink, HeadwordListSink, ParseError,
    ParserConfig, XmlDumpSource,
};

const DUMP: &str = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/">
  <siteinfo>
    <sitename>Wiktionary</sitename>
  </siteinfo>
  <page>
    <title>Wiktionary:Welcome</title>
    <ns>4</ns>
    <revision>
      <text bytes="12" xml:space="preserve">==English==
===Noun===
# Not a word.</text>
    </revision>
  </page>
  <page>
    <title>cat</title>
    <ns>0</ns>
    <revision>
      <text bytes="400" xml:space="preserve">==English==
===Etymology===
From {{inh|en|enm|cat}}.

===Noun===
{{en-noun}}
# A small [[domesticated]] [[feline]].&lt;ref&gt;A book&lt;/ref&gt;
# {{lb|en|chiefly|UK|Australia}} {{l|en|moggy|Moggy}}; a pet.
#: ''The cat sat on the mat.''

====Synonyms====
* {{l|en|feline}}

===Verb===
# {{lb|en|nautical|transitive}} To hoist (an anchor).

----

==French==

===Noun===
{{fr-noun|m}}
# Not kept.</text>
    </revision>
  </page>
  <page>
    <title>cats</title>
    <ns>0</ns>
    <revision>
      <text bytes="60" xml:space="preserve">==English==
===Noun===
{{head|en|noun form}}
# {{plural of|en|cat}}</text>
    </revision>
  </page>
  <page>
    <title>chat</title>
    <ns>0</ns>
    <revision>
      <text bytes="60" xml:space="preserve">==French==
===Noun===
# cat</text>
    </revision>
  </page>
  <page>
    <title>sheep</title>
    <ns>0</ns>
    <revision>
      <text bytes="60" xml:space="preserve">==English==
===Noun===
{{en-noun|sheep|-}}
# A woolly [[ruminant]].
# {{lb|en|usually|plural}} {{senseid|en|Q7368}} A timid person.</text>
    </revision>
  </page>
</mediawiki>
"#;

fn parse(config: ParserConfig) -> (Vec<Document>, wikiparse::RunStats) {
    let source = XmlDumpSource::new(Cursor::new(DUMP.as_bytes()));
    let mut builder = DocumentBuilder::new(source, config);
    let docs = builder
        .by_ref()
        .collect::<Result<Vec<_>, ParseError>>()
        .unwrap();
    (docs, builder.stats().clone())
}

#[test]
fn default_run_produces_english_parts_of_speech() {
    let (docs, stats) = parse(ParserConfig::default());

    let headwords: Vec<&str> = docs.iter().map(|d| d.headword.as_str()).collect();
    assert_eq!(headwords, vec!["cat", "cats", "sheep"]);
    assert_eq!(stats.entries_seen, 5);
    assert_eq!(stats.meta_skipped, 1);
    assert_eq!(stats.entries_discarded, 1);
    assert_eq!(stats.entries_emitted, 3);
    assert!(!stats.stopped_early);

    let cat = serde_json::to_value(&docs[0]).unwrap();
    assert_eq!(
        cat,
        json!({
            "Noun": {
                "definitions": [
                    {"text": "A small domesticated feline."},
                    {"text": "Moggy; a pet.", "labels": ["chiefly: UK, Australia"]}
                ],
                "countable": "yes",
                "plural": ["cats"]
            },
            "Verb": {
                "definitions": [
                    {"text": "To hoist (an anchor).", "labels": ["nautical", "transitive"]}
                ]
            }
        })
    );

    let cats = serde_json::to_value(&docs[1]).unwrap();
    assert_eq!(
        cats,
        json!({"Noun": {"definitions": [{"text": "Plural of cat", "labels": ["plural"]}]}})
    );

    let sheep = serde_json::to_value(&docs[2]).unwrap();
    assert_eq!(
        sheep,
        json!({
            "Noun": {
                "definitions": [
                    {"text": "A woolly ruminant."},
                    {"text": "A timid person.", "labels": ["usually plural"]}
                ],
                "countable": "sometimes",
                "plural": ["sheep"]
            }
        })
    );
}

#[test]
fn multiple_languages_keep_the_language_layer() {
    let config = ParserConfig {
        languages: BTreeSet::from(["English".to_string(), "French".to_string()]),
        sections: Some(BTreeSet::from(["Noun".to_string(), "Synonyms".to_string()])),
        max_documents: None,
        ..Default::default()
    };
    let (docs, _) = parse(config);
    let headwords: Vec<&str> = docs.iter().map(|d| d.headword.as_str()).collect();
    assert_eq!(headwords, vec!["cat", "cats", "chat", "sheep"]);

    let cat = serde_json::to_value(&docs[0]).unwrap();
    assert_eq!(cat["English"]["Synonyms"], json!(["feline"]));
    assert_eq!(
        cat["French"]["Noun"],
        json!({"definitions": [{"text": "Not kept."}]})
    );
    assert!(cat["English"].get("Verb").is_none());
}

#[test]
fn limit_stops_early() {
    let config = ParserConfig {
        max_documents: Some(1),
        ..Default::default()
    };
    let (docs, stats) = parse(config);
    assert_eq!(docs.len(), 1);
    assert_eq!(stats.entries_emitted, 1);
    assert_eq!(stats.entries_seen, 2);
}

#[test]
fn compact_sink_output() {
    let (docs, _) = parse(ParserConfig::default());
    let mut out = Vec::new();
    {
        let mut sink = CompactJsonSink::new(&mut out);
        for doc in docs {
            sink.accept(doc).unwrap();
        }
        sink.finish().unwrap();
    }
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["cat", "cats", "sheep"]);
    assert_eq!(value["cats"]["Noun"]["definitions"][0]["text"], "Plural of cat");
}

#[test]
fn headwords_only_run() {
    let config = ParserConfig {
        headwords_only: true,
        ..Default::default()
    };
    let (docs, _) = parse(config);
    let mut out = Vec::new();
    {
        let mut sink = HeadwordListSink::new(&mut out);
        for doc in docs {
            sink.accept(doc).unwrap();
        }
        sink.finish().unwrap();
    }
    assert_eq!(String::from_utf8(out).unwrap(), "cat\ncats\nsheep\n");
}

#[test]
fn broken_framing_ends_the_run() {
    let dump = "<page>\n<title>a</title>\n<text>==English==\n===Noun===\n# A.</text>\n</page>\n<page>\n<text>oops</text>\n</page>\n";
    let source = XmlDumpSource::new(Cursor::new(dump.as_bytes()));
    let mut builder = DocumentBuilder::new(source, ParserConfig::default());
    assert_eq!(builder.next().unwrap().unwrap().headword, "a");
    match builder.next() {
        Some(Err(ParseError::Framing { line, .. })) => assert_eq!(line, 8),
        other => panic!("expected framing error, got {:?}", other),
    }
    assert!(builder.next().is_none());
}
