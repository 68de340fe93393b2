//! Main execution logic for bw-emit.

use anyhow::{Context, Result};
use bw_query::QuerySet;
use bw_reader_jsonl::DecoderConfig;
use bw_source::{BucketAlias, SourceConfig, open_source};
use bw_traits::{ObjectSource, RecordCallback};
use bw_types::FormatStyle;
use bw_walker::{ExcludeFilter, StatsSnapshot, WalkOptions, WalkTarget, walk_all};
use std::io::{BufWriter, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::Cli;
use crate::output::{OutputMode, RecordSink};

/// Outcome of a run.
pub struct RunSummary {
    pub stats: StatsSnapshot,
    pub written: u64,
    pub errors: u64,
}

/// Build the source configuration from the arguments.
pub fn source_config(args: &Cli) -> SourceConfig {
    let mut config = SourceConfig::new(&args.region);

    if let Some(endpoint) = &args.s3_endpoint {
        config = config.with_endpoint(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&args.access_key, &args.secret_key) {
        config = config.with_credentials(access_key, secret_key, args.session_token.clone());
    }
    if let Some(bucket) = &args.alias_bucket {
        config = config.with_alias(BucketAlias::new(
            args.alias_schemes.iter().map(String::as_str),
            bucket,
            &args.alias_region,
        ));
    }

    config
}

/// Build the decoder configuration from the arguments.
pub fn decoder_config(args: &Cli) -> DecoderConfig {
    let config = DecoderConfig::new()
        .with_compression(args.compression())
        .with_validation(args.validate_json || args.format_json);

    match (args.format_json, args.pretty) {
        (false, _) => config,
        (true, false) => config.with_format(FormatStyle::Compact),
        (true, true) => config.with_format(FormatStyle::Pretty),
    }
}

/// Build the object filter from the arguments.
pub fn exclude_filter(args: &Cli) -> bw_error::Result<ExcludeFilter> {
    Ok(ExcludeFilter::new(args.exclusions())?.with_match_full_path(args.exclude_full_path))
}

/// Targets for the prefixes named on the command line.
///
/// With no prefixes the whole bucket URI is walked.
pub fn targets(bucket_uri: &str, base_prefix: &str, prefixes: &[String]) -> Vec<WalkTarget> {
    if prefixes.is_empty() {
        return vec![WalkTarget::new(bucket_uri, base_prefix)];
    }
    prefixes
        .iter()
        .map(|p| WalkTarget::under(bucket_uri, base_prefix, p))
        .collect()
}

/// Stop `cancel` on the first Ctrl-C; exit immediately on the second.
fn install_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Failed to listen for Ctrl-C");
            return;
        }
        eprintln!("\nInterrupt received, finishing in-flight records...");
        eprintln!("Press Ctrl+C again to force exit immediately.");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nForced exit!");
            std::process::exit(130);
        }
    });
}

/// Execute bw-emit with the provided arguments.
pub async fn execute(args: Cli) -> Result<RunSummary> {
    let query_set = QuerySet::parse(&args.queries, args.query_mode.into())
        .context("Invalid --query")?;
    let filter = exclude_filter(&args).context("Invalid --exclude")?;

    let mode = if !args.writes_records() {
        OutputMode::Discard
    } else if args.json {
        OutputMode::JsonArray
    } else {
        OutputMode::Lines
    };
    let sink = Arc::new(RecordSink::new(BufWriter::new(std::io::stdout()), mode));
    let callback: Arc<dyn RecordCallback> = sink.clone();

    let options = WalkOptions::new(&args.bucket_uri, callback)
        .with_workers(args.workers)
        .with_object_filter(Arc::new(filter))
        .with_query_set(query_set)
        .with_decoder(decoder_config(&args))
        .with_invalid_records(args.invalid_records.into());
    options.validate()?;

    info!(options = ?options, "Configured walk");

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    let (source, base_prefix) = open_source(&args.bucket_uri, &source_config(&args))
        .await
        .with_context(|| format!("Failed to open '{}'", args.bucket_uri))?;
    let targets = targets(&args.bucket_uri, &base_prefix, &args.prefixes);

    sink.begin().context("Failed to write output")?;
    let result = walk_all(&cancel, &options, source.clone(), &targets).await;

    if let Err(e) = source.close().await {
        warn!(error = %e, "Failed to close source");
    }
    sink.finish().context("Failed to write output")?;
    std::io::stdout().flush().ok();

    let stats = result?;
    Ok(RunSummary {
        stats,
        written: sink.written(),
        errors: sink.errors(),
    })
}
