//! bw-emit CLI
//!
//! Streams the JSONL records of a bucket to stdout.

use bw_cli_common::{format_bytes, format_duration_secs, format_number, init_logging};
use clap::Parser;

mod args;
mod output;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so stdout carries only records
    init_logging(args.log_level)?;

    let show_stats = args.stats;
    let summary = run::execute(args).await?;
    let stats = &summary.stats;

    if show_stats {
        eprintln!();
        eprintln!("Walk completed:");
        eprintln!("  Objects listed:    {}", format_number(stats.objects_listed));
        eprintln!("  Objects excluded:  {}", format_number(stats.objects_filtered));
        eprintln!("  Objects read:      {}", format_number(stats.objects_opened));
        eprintln!("  Objects failed:    {}", format_number(stats.objects_failed));
        eprintln!("  Records read:      {}", format_number(stats.records_read));
        eprintln!("  Records matched:   {}", format_number(stats.records_matched));
        eprintln!("  Records written:   {}", format_number(summary.written));
        if stats.records_invalid > 0 || stats.records_skipped > 0 {
            eprintln!(
                "  Records invalid:   {} ({} skipped)",
                format_number(stats.records_invalid),
                format_number(stats.records_skipped)
            );
        }
        eprintln!("  Bytes read:        {}", format_bytes(stats.bytes_read));
        eprintln!("  Peak open objects: {}", stats.peak_open);

        if let Some(duration) = stats.duration() {
            eprintln!(
                "  Duration:          {}",
                format_duration_secs(duration.num_milliseconds())
            );
        }
        if let Some(rate) = stats.records_per_second().filter(|r| *r > 0.0) {
            eprintln!("  Throughput:        {} records/sec", format_number(rate as u64));
        }
        if let Some(mbps) = stats.read_throughput_mbps().filter(|r| *r > 0.0) {
            eprintln!("                     {:.1} MB/s read", mbps);
        }
        if summary.errors > 0 {
            eprintln!("  Errors reported:   {}", format_number(summary.errors));
        }
    }

    if stats.cancelled {
        eprintln!("Walk interrupted");
        std::process::exit(130);
    }

    Ok(())
}
