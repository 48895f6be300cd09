use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::{env, process};
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use vitiscraper::{Config, Pipeline, Report};

fn print_usage_and_exit(prog: &str) -> ! {
    eprintln!("Usage:");
    eprintln!("  {prog} <report> <year>   fetch one report, print JSON");
    eprintln!("  {prog} all <year>        fetch every report published for <year>");
    eprintln!("  {prog} list              list report slugs");
    process::exit(2);
}

fn parse_year(prog: &str, raw: Option<String>) -> Result<i32> {
    let raw = raw.unwrap_or_else(|| print_usage_and_exit(prog));
    raw.parse()
        .with_context(|| format!("year {raw:?} is not a number"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) parse args ───────────────────────────────────────────────
    let mut args = env::args();
    let prog = args.next().unwrap_or_else(|| "vitiscraper".into());
    let command = args.next().unwrap_or_else(|| print_usage_and_exit(&prog));

    if command == "list" {
        for report in Report::ALL {
            let years = report.years();
            println!(
                "{:<36} {}..={}  {}",
                report.slug(),
                years.start(),
                years.end(),
                report.label()
            );
        }
        return Ok(());
    }

    let year = parse_year(&prog, args.next())?;

    // ─── 3) configure ────────────────────────────────────────────────
    let cfg = Config::load().context("loading configuration")?;
    info!(base_url = %cfg.base_url, max_attempts = cfg.retry.max_attempts, "startup");
    let pipeline = Pipeline::from_config(&cfg)?;
    let start = Instant::now();

    // ─── 4) run ──────────────────────────────────────────────────────
    if command == "all" {
        let results = pipeline.fetch_all(year).await;
        let mut out = Map::new();
        let mut failures = 0;
        for (report, result) in results {
            let value = match result {
                Ok(record) => serde_json::to_value(record)?,
                Err(e) => {
                    error!(
                        report = %report,
                        attempts = ?e.attempts(),
                        error = %e,
                        "report failed"
                    );
                    failures += 1;
                    json!({ "error": e.to_string() })
                }
            };
            out.insert(report.slug().to_string(), value);
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
        info!(year, failures, elapsed = ?start.elapsed(), "all done");
        return Ok(());
    }

    let report = Report::from_slug(&command).with_context(|| {
        format!("unknown report {command:?}; run `{prog} list` for the available slugs")
    })?;
    let record = pipeline
        .fetch_report(report, year)
        .await
        .with_context(|| format!("fetching {report} for {year}"))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    info!(report = %report, year, elapsed = ?start.elapsed(), "done");
    Ok(())
}
