use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use rfm_segmentation::cli::Args;
use rfm_segmentation::config::AppConfig;
use rfm_segmentation::{
    customers_in, fingerprint, load_csv, suggest_reference_date, summarize_segments, telemetry,
    write_customer_ids, write_results_csv, ScoringPipeline, SegmentClassifier,
};

fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load()?;

    let level = if args.verbose { "debug" } else { config.log_level.as_str() };
    telemetry::init(level)?;

    run(&args, &config)
}

fn run(args: &Args, config: &AppConfig) -> Result<()> {
    // 1. Load transactions
    let records = load_csv(&args.input)?;
    info!(records = records.len(), input = ?args.input, "loaded transactions");

    // 2. Reference date: explicit, or latest invoice day + offset
    let offset = args.offset_days.unwrap_or(config.reference_offset_days);
    let reference_date = match args.parse_reference_date()? {
        Some(date) => date,
        None => suggest_reference_date(&records, offset)
            .context("Input contains no transactions; cannot derive a reference date")?,
    };
    info!(%reference_date, "using reference date");

    // 3. Segment rules
    let classifier = match args.rules.as_ref().or(config.segment_rules.as_ref()) {
        Some(path) => SegmentClassifier::from_file(path)?,
        None => SegmentClassifier::standard(),
    };
    let extract = args.parse_extract_segment()?;

    // 4. Score
    let customers = ScoringPipeline::with_classifier(classifier)
        .run(records, reference_date)
        .context("Scoring failed")?;

    // 5. Export
    write_results_csv(&args.output, &customers)?;
    info!(
        customers = customers.len(),
        output = ?args.output,
        fingerprint = %fingerprint(&customers),
        "wrote results"
    );

    if let (Some(segment), Some(path)) = (extract, args.extract_output.as_ref()) {
        let ids = customers_in(&customers, segment);
        write_customer_ids(path, &format!("{segment}_id"), &ids)?;
        info!(%segment, customers = ids.len(), output = ?path, "wrote segment extract");
    }

    if args.summary {
        println!("📊 {} customers scored (reference date {})", customers.len(), reference_date.date());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for summary in summarize_segments(&customers).context("Failed to summarize segments")? {
            println!("{}", summary.summary());
        }
    }

    Ok(())
}
