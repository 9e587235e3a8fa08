use std::io::{stderr, stdout, Write};
use std::process::exit;
use std::time::Instant;

use anyhow::Result;
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use transaction_consistency::config::Config;
use transaction_consistency::ingest::read_transactions;
use transaction_consistency::matching::{default_chain, MatchResult, Unmatched};
use transaction_consistency::models::{GeneralizedTransaction, ProviderTransaction, StoredTransaction};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: transaction-consistency [upstream].csv [stored].csv [log_level:optional] > [output].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: LOG_LEVEL or error)");
        exit(1);
    }

    let config = Config::from_env();
    let log_level = args.get(3).unwrap_or(&config.log_level);

    setup_logging(parse_log_level(log_level));
    config.log_warnings();

    let upstream = read_transactions::<ProviderTransaction>(&args[1])?;
    let stored = read_transactions::<StoredTransaction>(&args[2])?;

    if upstream.skipped + stored.skipped > 0 {
        warn!("Skipped [{}] upstream and [{}] stored rows that could not be read", upstream.skipped, stored.skipped);
    }

    let matcher = default_chain(config.matching.timestamp_cutover);

    let timer = Instant::now();
    let result = matcher.reconcile(upstream.records, stored.records);
    let duration = timer.elapsed();

    info!(
        "Reconciled in {duration:?}: [{}] matched, [{}] upstream and [{}] stored unmatched",
        result.matched.len(),
        result.unmatched_upstream.len(),
        result.unmatched_stored.len()
    );

    write_results_to_stdout(&result)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{level}', defaulting to 'error'");
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    // stdout carries the report, so logs go to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

#[derive(Serialize)]
struct ReportRow<'a> {
    kind: &'a str,
    external_id: &'a str,
    transaction_id: &'a str,
    amount: String,
    detail: &'a str
}

fn write_results_to_stdout(result: &MatchResult) -> Result<()> {
    let mut output = WriterBuilder::new()
        .has_headers(false)
        .from_writer(stdout().lock());

    output.write_record(["kind", "external_id", "transaction_id", "amount", "detail"])?;

    for pair in &result.matched {
        output.serialize(ReportRow {
            kind: "matched",
            external_id: pair.upstream.external_id().unwrap_or_default(),
            transaction_id: transaction_id(&pair.stored),
            amount: amount(&pair.upstream),
            detail: &pair.matched_by
        })?;
    }

    write_unmatched(&mut output, "unmatched_upstream", &result.unmatched_upstream)?;
    write_unmatched(&mut output, "unmatched_stored", &result.unmatched_stored)?;

    output.flush()?;

    Ok(())
}

fn write_unmatched<W: Write>(output: &mut Writer<W>, kind: &str, unmatched: &[Unmatched]) -> Result<()> {
    for entry in unmatched {
        output.serialize(ReportRow {
            kind,
            external_id: entry.transaction.external_id().unwrap_or_default(),
            transaction_id: transaction_id(&entry.transaction),
            amount: amount(&entry.transaction),
            detail: entry.reason.as_str()
        })?;
    }

    Ok(())
}

fn transaction_id(transaction: &GeneralizedTransaction) -> &str {
    transaction.as_stored()
        .map(|stored| stored.transaction_id.as_str())
        .unwrap_or_default()
}

fn amount(transaction: &GeneralizedTransaction) -> String {
    transaction.amount_in_cents()
        .map(|cents| cents.to_string())
        .unwrap_or_default()
}
