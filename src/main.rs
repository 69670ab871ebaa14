use analysis_service::{AnalysisReport, AnalysisSession, CycleReport, RefreshConfig, RefreshLoop};
use anyhow::Context;
use clap::Parser;
use commentpulse_core::{
    parse_video_identifier, AggregateSummary, AppConfig, ClassifiedComment, CoreError, ErrorExt,
    SentimentLabel,
};
use sentiment_engine::{HuggingFaceModel, SentimentClassifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use youtube_client::{ApiUsage, RetryConfig, YouTubeApiClient};

const DEFAULT_CONFIG_FILE: &str = "commentpulse.toml";
const DEFAULT_LOG_FILTER: &str =
    "commentpulse=info,youtube_client=info,sentiment_engine=info,analysis_service=info";

#[derive(Debug, Parser)]
#[command(
    name = "commentpulse",
    version,
    about = "Sentiment of a YouTube video's top-level comments"
)]
struct Cli {
    /// Video id or any YouTube watch/short link
    #[arg(value_name = "VIDEO")]
    video: String,

    /// TOML configuration file (defaults to ./commentpulse.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Upper bound on comments fetched per run or cycle
    #[arg(long, value_name = "N")]
    max_comments: Option<usize>,

    /// Classify only a random sample of N unique comments (one-shot mode)
    #[arg(long, value_name = "N", conflicts_with = "watch")]
    sample: Option<usize>,

    /// Keep refreshing until Ctrl-C, classifying only new comments
    #[arg(long, default_value_t = false)]
    watch: bool,

    /// Seconds between refresh cycles in watch mode
    #[arg(long, value_name = "SECS", requires = "watch")]
    interval: Option<u64>,

    /// Print JSON instead of a text summary
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Tag each comment with a decorative emotion
    #[arg(long, default_value_t = false)]
    emotions: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli).map_err(friendly)?;

    let api_key = config
        .youtube_api_key
        .clone()
        .context("YOUTUBE_API_KEY is not set")?;
    let client = YouTubeApiClient::new(api_key, config.request_timeout())
        .map_err(friendly)?
        .with_retry_config(RetryConfig::youtube().with_max_retries(config.fetch_retries));
    let model =
        HuggingFaceModel::from_config(&config.model, config.request_timeout()).map_err(friendly)?;
    let classifier = SentimentClassifier::from_config(model, &config.model).map_err(friendly)?;

    info!(
        "Using model {} ({})",
        config.model.name,
        classifier.scheme().as_str()
    );

    if cli.watch {
        watch_video(&cli, &config, client, classifier).await
    } else {
        let session =
            AnalysisSession::new(client, classifier, config.max_comments, config.page_size)
                .with_sample_size(config.sample_size);
        let report = session.analyze(&cli.video).await.map_err(friendly)?;
        print_report(&report, cli.json)
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, CoreError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => AppConfig::from_file(DEFAULT_CONFIG_FILE)?,
        None => AppConfig::default(),
    };

    config.apply_env()?;
    if let Some(max_comments) = cli.max_comments {
        config.max_comments = max_comments;
    }
    if let Some(sample) = cli.sample {
        config.sample_size = Some(sample);
    }
    if let Some(interval) = cli.interval {
        config.refresh_interval_secs = interval;
    }
    if cli.emotions {
        config.model.decorative_emotions = true;
    }

    config.validate()?;
    Ok(config)
}

async fn watch_video(
    cli: &Cli,
    config: &AppConfig,
    client: YouTubeApiClient,
    classifier: SentimentClassifier<HuggingFaceModel>,
) -> anyhow::Result<()> {
    let video_id = parse_video_identifier(&cli.video).map_err(friendly)?;
    let mut refresh = RefreshLoop::new(
        client,
        classifier,
        video_id,
        RefreshConfig::from_app_config(config),
    );

    let (report_tx, mut report_rx) = mpsc::channel::<CycleReport>(8);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let cancel_tx = Arc::new(cancel_tx);

    let ctrl_c_cancel = Arc::clone(&cancel_tx);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                let _ = ctrl_c_cancel.send(true);
            }
            Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
        }
    });

    let json = cli.json;
    let printer = async move {
        while let Some(report) = report_rx.recv().await {
            print_cycle(&report, json)?;
        }
        Ok::<(), anyhow::Error>(())
    };

    info!(
        "Watching {} every {}s",
        refresh.video_id(),
        config.refresh_interval_secs
    );
    let (loop_result, print_result) = tokio::join!(refresh.run(report_tx, cancel_rx), printer);
    drop(cancel_tx);

    loop_result.map_err(friendly)?;
    print_result
}

fn friendly(error: CoreError) -> anyhow::Error {
    let message = format!("{} [{}]", error.user_friendly_message(), error.error_code());
    anyhow::Error::new(error).context(message)
}

fn print_report(report: &AnalysisReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "Video {}: {} comments fetched, {} unique",
        report.video_id, report.fetched, report.unique
    );
    if report.records.len() < report.unique {
        println!("  Sampled {} of {} unique comments", report.records.len(), report.unique);
    }
    print_records(&report.records);
    print_summary(&report.summary);
    if let Some(usage) = &report.api_usage {
        print_usage(usage);
    }
    Ok(())
}

fn print_cycle(report: &CycleReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    println!(
        "Cycle {} at {}: {} fetched, {} new",
        report.cycle,
        report.started_at.format("%H:%M:%S"),
        report.fetched,
        report.new_records
    );
    print_records(&report.records);
    print_summary(&report.summary);
    if let Some(usage) = &report.api_usage {
        print_usage(usage);
    }
    Ok(())
}

fn print_records(records: &[ClassifiedComment]) {
    for record in records {
        let emotion = record
            .emotion
            .map(|e| format!(" ({:?})", e))
            .unwrap_or_default();
        println!(
            "  [{:<8} {:.2}]{} {}",
            record.label,
            record.confidence,
            emotion,
            record.comment.replace('\n', " ")
        );
    }
}

fn print_usage(usage: &ApiUsage) {
    println!(
        "  API: {} requests ({} failed, {} retries), {} quota units, avg {}ms",
        usage.requests,
        usage.failed_requests,
        usage.retries,
        usage.quota_units_used,
        usage.average_response_ms
    );
}

fn print_summary(summary: &AggregateSummary) {
    for label in SentimentLabel::ALL {
        println!(
            "  {:<8} {:>5}  {:>5.1}%  mean confidence {:.2}",
            label,
            summary.count(label),
            summary.share(label) * 100.0,
            summary.mean_confidence.get(&label).copied().unwrap_or(0.0)
        );
    }
    match summary.majority {
        Some(label) => println!("  Majority: {} of {}", label, summary.total),
        None => println!("  No comments classified"),
    }
}
