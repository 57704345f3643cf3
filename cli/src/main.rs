use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use morpheval::{
    evaluate_conf, parse_corpus, CategorySummary, EvalConfigBuilder, MetricsEntry, Reporter,
    Sentence, TableOptions,
};
use serde::Serialize;
use serde_jsonlines::JsonLinesWriter;
use std::fs::read_to_string;
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    /// Aligned table, one metric per line
    #[default]
    Table,
    /// One JSON object per metric, then one per category average
    Jsonl,
}

/// Precision, recall and F1 of the UPOS tags, morphological features and root attachment of a
/// predicted CoNLL-U corpus against a gold one.
#[derive(Debug, Parser)]
#[command(name = "morpheval", version)]
struct Args {
    /// Gold (.conllu)
    #[arg(short, long)]
    gold: PathBuf,
    /// Predictions (.conllu)
    #[arg(short, long)]
    pred: PathBuf,
    /// Sort by F1
    #[arg(short, long)]
    sort: bool,
    /// Print errors
    #[arg(short, long)]
    errors: bool,
    /// Max line width
    #[arg(short, long)]
    width: Option<usize>,
    /// Filter words (upos=NOUN;Gender=Masc)
    #[arg(short, long)]
    filter: Option<String>,
    /// Use multiple cores for the metrics computations
    #[arg(long)]
    parallel: bool,
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Record<'a> {
    Metric(&'a MetricsEntry),
    Summary(&'a CategorySummary),
}

fn read_corpus(path: &Path) -> Result<Vec<Sentence>> {
    let content =
        read_to_string(path).with_context(|| format!("can't read {}", path.display()))?;
    let sentences =
        parse_corpus(&content).with_context(|| format!("can't parse {}", path.display()))?;
    info!(path = %path.display(), sentences = sentences.len(), "loaded corpus");
    Ok(sentences)
}

fn write_jsonl(reporter: &Reporter) -> Result<()> {
    let mut writer = JsonLinesWriter::new(stdout().lock());
    writer.write_all(reporter.entries().iter().map(Record::Metric))?;
    writer.write_all(reporter.summaries().iter().map(Record::Summary))?;
    writer.flush()?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut builder = EvalConfigBuilder::new().parallel(args.parallel);
    if let Some(filter) = &args.filter {
        info!("Filter: {}", filter);
        builder = builder.filter_str(filter)?;
    }
    let config = builder.build();

    let gold = read_corpus(&args.gold)?;
    let pred = read_corpus(&args.pred)?;
    let reporter = evaluate_conf(&gold, &pred, &config)?;

    match args.format {
        Format::Table => {
            let options = TableOptions::default()
                .sort_by_f1(args.sort)
                .show_errors(args.errors)
                .max_width(args.width);
            let mut out = stdout().lock();
            out.write_all(reporter.render(&options).as_bytes())?;
            out.flush()?;
        }
        Format::Jsonl => write_jsonl(&reporter)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
