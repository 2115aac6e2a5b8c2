use anyhow::Result;
use betasearch_core::persist::{load_artifacts, ArtifactPaths};
use betasearch_core::{
    QueryResult, RouteRecord, SearchContext, TfIdfSpace, DEFAULT_TOPN,
};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "betasearch")]
#[command(about = "Find climbing routes from a hypothetical description", long_about = None)]
struct Cli {
    /// Artifact directory written by the trainer
    #[arg(long, default_value = "./artifacts")]
    artifacts: String,
    /// A hypothetical route description
    #[arg(short = 'd', long)]
    description: String,
    /// The number of results to return
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOPN)]
    topn: usize,
    /// Emit results as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let paths = ArtifactPaths::new(&cli.artifacts);
    let (space, identity_map, records, meta) = load_artifacts::<TfIdfSpace>(&paths)?;
    tracing::info!(
        num_documents = meta.num_documents,
        created_at = %meta.created_at,
        "artifacts loaded"
    );
    let context = SearchContext::new(space, identity_map, records)?;

    let result = context.search(&cli.description, cli.topn)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_search_results(&result);
    }
    Ok(())
}

fn print_search_results(result: &QueryResult<RouteRecord>) {
    let rule = "-".repeat(100);
    let query = result.first().map(|m| m.query.as_str()).unwrap_or("");
    println!("Results for the query: \"{query}\"");
    println!("{} routes returned", result.len());
    println!();

    for (i, m) in result.iter().enumerate() {
        let record = &m.record;
        let grade = record.grade();
        println!("{rule}");
        println!("RESULT {i} (similarity = {:.2}):", m.score);
        println!("{} ({grade}), {}", record.route_name, record.type_string);
        if let Some(sector) = &record.parent_sector {
            match record.parent_loc {
                Some((lon, lat)) => println!("{sector} ({lat}, {lon})"),
                None => println!("{sector}"),
            }
        }
        println!();
        println!("DESCRIPTION:");
        for line in wrap_chars(&record.description_text(), 100) {
            println!("{line}");
        }
        println!("{rule}");
        println!();
    }
}

/// Split into chunks of at most `width` characters, like a terminal wrap
/// with no word awareness.
fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_cuts_at_width() {
        let wrapped = wrap_chars(&"x".repeat(250), 100);
        assert_eq!(wrapped.len(), 3);
        assert_eq!(wrapped[0].len(), 100);
        assert_eq!(wrapped[2].len(), 50);
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        let wrapped = wrap_chars(&"é".repeat(120), 100);
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[0].chars().count(), 100);
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert!(wrap_chars("", 100).is_empty());
    }
}
