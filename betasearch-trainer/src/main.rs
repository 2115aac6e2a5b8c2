use anyhow::{bail, Context, Result};
use betasearch_core::persist::{save_artifacts, ArtifactPaths};
use betasearch_core::{
    build_corpus, phrase_spot_check, read_phrases, self_rank_distribution,
    EmbeddingProvider, PhraseCheck, RouteId, RouteRecord, SelfRankReport, TfIdfConfig,
    TfIdfProvider,
};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "betasearch-trainer")]
#[command(about = "Train a route-description embedding space and validate it", long_about = None)]
struct Cli {
    /// Input route records: a JSON/JSONL file or a directory of them
    #[arg(long)]
    input: String,
    /// Output artifact directory
    #[arg(long)]
    output: String,
    /// Drop terms that appear in fewer documents than this
    #[arg(long, default_value_t = 2)]
    min_doc_freq: usize,
    /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
    #[arg(long, default_value_t = false)]
    smoothed_idf: bool,
    /// How many training documents the self-rank check re-embeds
    #[arg(long, default_value_t = 1000)]
    sample_size: usize,
    /// Seed for the self-rank sample draw
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Optional file of spot-check phrases, one per line
    #[arg(long)]
    phrases: Option<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    train(&cli)
}

fn train(cli: &Cli) -> Result<()> {
    let records = load_records(Path::new(&cli.input))?;
    tracing::info!(num_records = records.len(), input = %cli.input, "loaded route records");

    let (corpus, identity_map) =
        build_corpus(records.iter().map(|r| (r.route_id, r.description.as_slice())))?;
    println!("{} initial descriptions", corpus.len());
    println!();

    let config = TfIdfConfig {
        min_doc_freq: cli.min_doc_freq,
        smoothed_idf: cli.smoothed_idf,
    };
    tracing::info!(?config, "training");
    let space = TfIdfProvider::new(config).train(&corpus)?;

    let snapshot: HashMap<RouteId, RouteRecord> = records
        .into_iter()
        .filter(|r| !r.description.is_empty())
        .map(|r| (r.route_id, r))
        .collect();

    let paths = ArtifactPaths::new(&cli.output);
    save_artifacts(&paths, &space, &identity_map, &snapshot)?;
    tracing::info!(output = %cli.output, "artifacts saved");

    let report = self_rank_distribution(&space, &corpus, cli.sample_size, cli.seed)?;
    print_self_rank_table(&report);

    if let Some(phrases_path) = &cli.phrases {
        let phrases = read_phrases(phrases_path)
            .with_context(|| format!("reading phrases from {phrases_path}"))?;
        let checks = phrase_spot_check(&space, &identity_map, &phrases)?;
        print_phrase_checks(&checks, &snapshot);
    }
    Ok(())
}

fn print_self_rank_table(report: &SelfRankReport) {
    println!("SANITY CHECK AGAINST TRAINING DATA:");
    println!("------------------------------------");
    println!("{:<10} {:<10} {:<15}", "rank", "count", "cumulative sum");
    println!("------------------------------------");
    for row in report.histogram.rows() {
        println!("{:<10} {:<10} {:<15}", row.rank, row.count, row.cumulative);
    }
    println!("------------------------------------");
    println!();
}

fn print_phrase_checks(checks: &[PhraseCheck], records: &HashMap<RouteId, RouteRecord>) {
    let rule = "-".repeat(119);
    println!("TEST PHRASE COMPARISONS:");
    println!("{rule}");
    for check in checks {
        println!("TEST: \"{}\"", check.phrase);
        for (i, (route_id, _score)) in check.top.iter().enumerate() {
            let first_line = records
                .get(route_id)
                .and_then(|r| r.description.first())
                .map(String::as_str)
                .unwrap_or("");
            println!("MOST SIMILAR {i}: {first_line}");
        }
        println!("{rule}");
    }
}

fn load_records(input: &Path) -> Result<Vec<RouteRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input path {} does not exist", input.display());
    }

    let mut records = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    Ok(records)
}

fn read_jsonl(file: &Path, records: &mut Vec<RouteRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RouteRecord = serde_json::from_str(&line)
            .with_context(|| format!("parsing record in {}", file.display()))?;
        records.push(record);
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<RouteRecord>) -> Result<()> {
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                records.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => {
            records.push(serde_json::from_value(json)?);
        }
        _ => bail!("{} holds neither a record nor an array of them", file.display()),
    }
    Ok(())
}
