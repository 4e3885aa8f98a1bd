use clap::Parser;
use std::sync::Arc;
use trend_harvest::utils::clock::{format_millis, SystemClock};
use trend_harvest::utils::logger::{self, Logger};
use trend_harvest::{HarvestConfig, Platform, TrendingEngine};

/// 抓取單一平台並印出結果，不寫入任何檔案
#[derive(Debug, Parser)]
#[command(name = "inspect_platform")]
#[command(about = "Fetch one platform and print its normalized records")]
struct InspectArgs {
    platform: Platform,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, default_value = "10")]
    limit: usize,

    #[arg(long, help = "Print records as JSON")]
    json: bool,

    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = InspectArgs::parse();
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => HarvestConfig::from_file(path)?,
        None => HarvestConfig::default(),
    };

    let engine =
        TrendingEngine::from_config(&config, Arc::new(SystemClock), Logger::new("inspect"))?;
    let report = engine.fetch(Some(&[args.platform])).await;

    let Some(outcome) = report.outcome(args.platform) else {
        anyhow::bail!("{} is not registered", args.platform);
    };

    if !outcome.succeeded() {
        eprintln!(
            "❌ {}: {}",
            args.platform,
            outcome.error_message().unwrap_or("unknown error")
        );
        std::process::exit(1);
    }

    let records: Vec<_> = outcome.records().iter().take(args.limit).collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "📡 {}: {} records at {} ({}ms)",
        args.platform,
        outcome.records().len(),
        format_millis(outcome.fetched_at()),
        report.duration_millis()
    );
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>3}. {} [{}]",
            i + 1,
            record.title,
            record.hot_text.as_deref().unwrap_or("-")
        );
        if let Some(url) = &record.url {
            println!("     {}", url);
        }
    }

    Ok(())
}
