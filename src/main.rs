use clap::Parser;
use std::sync::Arc;
use trend_harvest::domain::model::FetchReport;
use trend_harvest::utils::clock::{format_date, SystemClock};
use trend_harvest::utils::logger::{self, Logger};
use trend_harvest::utils::monitor::CycleMonitor;
use trend_harvest::{CliConfig, TrendingEngine};

const DRY_RUN_PREVIEW: usize = 3;

fn print_report(report: &FetchReport, preview: usize) {
    for outcome in report.outcomes() {
        if outcome.succeeded() {
            println!("✅ {}: {} records", outcome.platform(), outcome.records().len());
            for (i, record) in outcome.records().iter().take(preview).enumerate() {
                match &record.hot_text {
                    Some(hot) => println!("   {}. {} ({})", i + 1, record.title, hot),
                    None => println!("   {}. {}", i + 1, record.title),
                }
            }
        } else {
            println!(
                "❌ {}: {}",
                outcome.platform(),
                outcome.error_message().unwrap_or("unknown error")
            );
        }
    }
    println!(
        "📊 {} succeeded, {} failed, {} records in {}ms",
        report.succeeded_platforms(),
        report.failed_platforms(),
        report.total_records(),
        report.duration_millis()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting trend-harvest");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_settings() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let engine = TrendingEngine::from_config(&config, Arc::new(SystemClock), Logger::default())?;

    let selected = engine.scheduler().selection(cli.requested_platforms());
    if selected.is_empty() {
        tracing::error!("❌ No platforms selected; enable one in the config or pass --platforms");
        eprintln!("❌ No platforms to fetch");
        std::process::exit(1);
    }

    let monitor = CycleMonitor::new(cli.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }
    monitor.log_phase("Before cycle");

    let failed = if cli.dry_run {
        let report = engine.fetch(Some(&selected)).await;
        print_report(&report, DRY_RUN_PREVIEW);
        report.has_failures()
    } else {
        let summary = engine.run(Some(&selected)).await;
        print_report(&summary.report, 0);
        println!(
            "💾 {} artifact(s) written for {}, {} failed",
            summary.persist.written,
            format_date(summary.date),
            summary.persist.failures.len()
        );
        for failure in &summary.persist.failures {
            eprintln!(
                "❌ {:?} ({}): {}",
                failure.artifact,
                failure.platform.map(|p| p.as_str()).unwrap_or("*"),
                failure.message
            );
        }
        if !summary.removed_dates.is_empty() {
            println!("🧹 Removed {} expired snapshot day(s)", summary.removed_dates.len());
        }
        summary.has_failures()
    };

    monitor.log_phase("After cycle");

    if failed {
        tracing::warn!("⚠️ Cycle finished with failures");
        std::process::exit(1);
    }

    tracing::info!("✅ Cycle completed successfully");
    Ok(())
}
