use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use twsearch_common::observability::{LogConfig, init_logging};
use twsearch_config::{CredentialsLoader, DEFAULT_CONFIG_FILE};
use twsearch_social::twitter::client::DEFAULT_LANG;
use twsearch_social::twitter::{SearchResult, TwitterSearcher};

mod progress;

use progress::StderrProgress;

/// Search recent tweets and print their text with creation dates.
#[derive(Debug, Parser)]
#[command(name = "twsearch", version)]
struct Cli {
    /// Search query, sent to the API unchanged.
    query: String,

    /// Raw statuses to fetch before retweets are dropped.
    count: usize,

    /// Credentials file (JSON, YAML or TOML).
    #[arg(short, long, env = "TWSEARCH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Two-letter language filter.
    #[arg(long, default_value = DEFAULT_LANG)]
    lang: String,

    /// Pause between pages, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    delay_ms: u64,

    /// Print a JSON array instead of tab-separated lines.
    #[arg(long)]
    json: bool,

    /// Also write log events to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    date: String,
    text: &'a str,
}

fn row<'a>((text, date): (&'a str, OffsetDateTime)) -> Result<Row<'a>> {
    Ok(Row {
        date: date.format(&Rfc3339)?,
        text,
    })
}

fn render(result: &SearchResult, json: bool) -> Result<String> {
    let rows = result.iter().map(row).collect::<Result<Vec<_>>>()?;
    if json {
        return Ok(serde_json::to_string_pretty(&rows)?);
    }
    Ok(rows
        .iter()
        .map(|r| format!("{}\t{}", r.date, r.text.replace('\n', "\\n")))
        .collect::<Vec<_>>()
        .join("\n"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(LogConfig {
        app_name: "twsearch",
        emit_stderr: cli.verbose,
        ..LogConfig::default()
    })?;
    tracing::debug!(log_path = %log_path.display(), "logging initialised");

    let credentials = CredentialsLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("loading credentials from {}", cli.config.display()))?;

    let progress = Arc::new(StderrProgress::default());
    let searcher = TwitterSearcher::new(&credentials)?
        .with_language(cli.lang.as_str())
        .with_page_delay(Duration::from_millis(cli.delay_ms))
        .with_progress(progress.clone());

    let result = searcher.search(&cli.query, cli.count).await?;
    tracing::info!(
        query = %cli.query,
        fetched = progress.fetched(),
        kept = result.len(),
        "search finished"
    );

    println!("{}", render(&result, cli.json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> SearchResult {
        SearchResult {
            texts: vec!["first line\nsecond".into(), "plain".into()],
            dates: vec![
                datetime!(2018-10-10 20:19:24 UTC),
                datetime!(2018-10-10 20:19:00 UTC),
            ],
        }
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["twsearch", "AtCoder", "3"]).unwrap();
        assert_eq!(cli.query, "AtCoder");
        assert_eq!(cli.count, 3);
        assert_eq!(cli.lang, "ja");
        assert_eq!(cli.delay_ms, 2000);
        assert!(!cli.json);
    }

    #[test]
    fn cli_rejects_negative_count() {
        assert!(Cli::try_parse_from(["twsearch", "AtCoder", "-3"]).is_err());
    }

    #[test]
    fn tsv_output_escapes_newlines() {
        let out = render(&sample(), false).unwrap();
        assert_eq!(
            out,
            "2018-10-10T20:19:24Z\tfirst line\\nsecond\n2018-10-10T20:19:00Z\tplain"
        );
    }

    #[test]
    fn json_output_is_an_array_of_rows() {
        let out = render(&sample(), true).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v[0]["text"], "first line\nsecond");
        assert_eq!(v[1]["date"], "2018-10-10T20:19:00Z");
    }
}
