use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wikiparse::{
    CompactJsonSink, DocumentBuilder, DocumentSink, HeadwordListSink, JsonLinesSink, ParserConfig,
    RunStats, XmlDumpSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One JSON object keyed by headword
    Compact,
    /// One JSON record per line
    Jsonl,
}

#[derive(Parser)]
#[command(name = "wiktionary-parse")]
#[command(about = "Parse a Wiktionary XML dump into word > language > section JSON")]
struct Args {
    /// Input XML file (.xml or .xml.bz2)
    input: PathBuf,

    /// Output file
    output: PathBuf,

    /// YAML configuration file; the flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Language to keep (repeatable)
    #[arg(short, long = "language")]
    languages: Vec<String>,

    /// Keep every language
    #[arg(long, conflicts_with = "languages")]
    all_languages: bool,

    /// Section to keep (repeatable, default: parts of speech)
    #[arg(short, long = "section")]
    sections: Vec<String>,

    /// Keep every section
    #[arg(long, conflicts_with = "sections")]
    all_sections: bool,

    /// Maximum number of documents to write
    #[arg(long)]
    limit: Option<usize>,

    /// Write every qualifying document
    #[arg(long, conflicts_with = "limit")]
    unlimited: bool,

    /// Write only the qualifying headwords, one per line
    #[arg(long)]
    headwords_only: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Compact)]
    format: Format,

    /// Leave labels off definitions
    #[arg(long)]
    no_labels: bool,

    /// Skip plural and countability tracking
    #[arg(long)]
    no_plurals: bool,

    /// Keep raw plural rule codes instead of derived forms
    #[arg(long)]
    raw_plurals: bool,

    /// Skip definitions
    #[arg(long)]
    no_definitions: bool,

    /// Quiet mode - no progress or summary
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<ParserConfig> {
    let mut config = match &args.config {
        Some(path) => ParserConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ParserConfig::default(),
    };

    if args.all_languages {
        config.languages.clear();
    } else if !args.languages.is_empty() {
        config.languages = args.languages.iter().cloned().collect();
    }
    if args.all_sections {
        config.sections = Some(Default::default());
    } else if !args.sections.is_empty() {
        config.sections = Some(args.sections.iter().cloned().collect());
    }
    if args.unlimited {
        config.max_documents = None;
    } else if args.limit.is_some() {
        config.max_documents = args.limit;
    }
    config.headwords_only |= args.headwords_only;
    config.attach_labels &= !args.no_labels;
    config.track_plurals &= !args.no_plurals;
    config.solve_plurals &= !args.raw_plurals;
    config.track_definitions &= !args.no_definitions;

    config.validate()?;
    Ok(config)
}

fn open_input(path: &PathBuf) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader: Box<dyn BufRead> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(256 * 1024, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(256 * 1024, file))
    };
    Ok(reader)
}

fn open_sink(args: &Args, config: &ParserConfig) -> Result<Box<dyn DocumentSink>> {
    let output = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let writer = BufWriter::with_capacity(256 * 1024, output);
    let sink: Box<dyn DocumentSink> = if config.headwords_only {
        Box::new(HeadwordListSink::new(writer))
    } else {
        match args.format {
            Format::Compact => Box::new(CompactJsonSink::new(writer)),
            Format::Jsonl => Box::new(JsonLinesSink::new(writer)),
        }
    };
    Ok(sink)
}

fn print_stats(stats: &RunStats, elapsed: Duration) {
    println!();
    println!("============================================================");
    println!("Entries seen: {}", stats.entries_seen);
    println!("Documents written: {}", stats.entries_emitted);
    println!("Entries without accepted sections: {}", stats.entries_discarded);
    println!("Meta entries skipped: {}", stats.meta_skipped);
    println!("------------------------------------------------------------");
    println!("Lines consumed: {}", stats.lines_consumed);
    println!("Diagnostics: {}", stats.diagnostics);
    if stats.stopped_early {
        println!("Stopped early: yes");
    }
    println!("Time: {}m {}s", elapsed.as_secs() / 60, elapsed.as_secs() % 60);
    println!(
        "Rate: {:.0} entries/sec",
        stats.entries_seen as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("============================================================");
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = load_config(&args)?;
    let reader = open_input(&args.input)?;
    let mut sink = open_sink(&args, &config)?;

    if !args.quiet {
        println!("Input: {}", args.input.display());
        println!("Output: {}", args.output.display());
        match config.max_documents {
            Some(max) => println!("Limit: {} documents", max),
            None => println!("Limit: none"),
        }
        println!();
    }

    let start_time = Instant::now();
    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .context("progress template")?,
        );
        pb
    };

    let progress = pb.clone();
    let mut builder = DocumentBuilder::new(XmlDumpSource::new(reader), config).with_progress(
        1000,
        move |stats| {
            let elapsed = start_time.elapsed().as_secs_f64();
            progress.set_message(format!(
                "Entries: {} | Written: {} | Lines: {} | Rate: {:.0} entries/s",
                stats.entries_seen,
                stats.entries_emitted,
                stats.lines_consumed,
                stats.entries_seen as f64 / elapsed.max(f64::EPSILON)
            ));
            progress.tick();
        },
    );
    let mut failure = None;
    for result in builder.by_ref() {
        match result {
            Ok(document) => {
                if let Err(e) = sink.accept(document) {
                    failure = Some(e);
                    break;
                }
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    pb.finish_and_clear();

    if failure.is_none() {
        if let Err(e) = sink.finish() {
            failure = Some(e);
        }
    }

    let stats = builder.stats();
    info!(
        emitted = stats.entries_emitted,
        seen = stats.entries_seen,
        lines = stats.lines_consumed,
        diagnostics = stats.diagnostics,
        "parse finished"
    );
    if !args.quiet {
        print_stats(stats, start_time.elapsed());
    }

    if let Some(e) = failure {
        warn!("run ended with an error after {} lines", stats.lines_consumed);
        return Err(e.into());
    }
    Ok(())
}
