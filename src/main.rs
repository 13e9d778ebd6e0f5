use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use crossref_harvester::application::{CrawlingPipeline, ReportExporter};
use crossref_harvester::infrastructure::{
    CrawlerConfig, LoggingProgressSink, ReqwestTransport, init_logging_with_config,
    load_input_file,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input JSON with the parts to resolve (`{"goods": [...]}` or a bare array)
    input: PathBuf,

    /// Report path; defaults to a timestamped file in the output directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Also dump the raw results as JSON
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Override the number of items resolved at once
    #[arg(long)]
    concurrency: Option<usize>,
}

fn load_config(args: &Args) -> Result<CrawlerConfig> {
    let mut config = match &args.config {
        Some(path) => CrawlerConfig::load(Some(path)),
        None => CrawlerConfig::load_default_location(),
    }
    .context("Failed to load configuration")?;

    if let Some(concurrency) = args.concurrency {
        config.pipeline.concurrency = concurrency;
        config.validate().context("Invalid --concurrency")?;
    }
    Ok(config)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    init_logging_with_config(&config.logging).context("Failed to initialize logging")?;

    let items = load_input_file(&args.input)
        .await
        .with_context(|| format!("Failed to load input {}", args.input.display()))?;

    let transport = Arc::new(ReqwestTransport::new(&config.site.user_agent)?);
    let pipeline = CrawlingPipeline::from_config(&config, transport)?;
    let report = pipeline.run(items, Some(&LoggingProgressSink)).await;
    let results = report.in_input_order();

    if let Some(json_path) = &args.json_out {
        let json = serde_json::to_string_pretty(&results)?;
        tokio::fs::write(json_path, json)
            .await
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("Raw results written to {:?}", json_path);
    }

    let exporter = ReportExporter::from_config(&config);
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| exporter.default_report_path());
    let written = exporter
        .export(&results, &path)
        .context("Failed to export report")?;

    println!("{}", written.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
