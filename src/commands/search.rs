use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use creator_scout::config::Config;
use creator_scout::crawler::{
    KeywordOutcome, KeywordPipeline, KeywordReport, RateLimitedFetcher, TikHubClient,
};
use creator_scout::metrics;
use creator_scout::models::RunState;
use creator_scout::storage::CheckpointManager;

/// Pause between consecutive keywords
const KEYWORD_PAUSE: Duration = Duration::from_secs(2);

/// Options shared by `search` and `resume`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub target: Option<usize>,
    pub skip_enrich: bool,
    pub metrics_file: Option<PathBuf>,
}

pub async fn search(
    config: Config,
    keywords: Vec<String>,
    options: RunOptions,
) -> Result<Vec<KeywordReport>> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        anyhow::bail!("At least one non-empty keyword is required");
    }

    let target = options.target.unwrap_or(config.scan.default_target).max(1);
    let pipeline = build_pipeline(&config, options.skip_enrich)?;
    let stop = stop_signal();

    println!("Creator Search");
    println!("==============");
    println!("Keywords: {}", keywords.join(", "));
    println!("Target per keyword: {target}");
    println!("Output directory: {}", config.output.dir.display());

    let mut reports = Vec::with_capacity(keywords.len());
    for (i, keyword) in keywords.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(KEYWORD_PAUSE).await;
        }
        if *stop.borrow() {
            tracing::warn!(keyword = %keyword, "Stop requested, skipping remaining keywords");
            break;
        }

        println!("\n[{}/{}] Searching: {keyword}", i + 1, keywords.len());
        let report = pipeline
            .run(RunState::new(keyword), target, &stop)
            .await
            .with_context(|| format!("Keyword run failed: {keyword}"))?;
        print_report(&report);
        reports.push(report);
    }

    finish(&reports, options.metrics_file.as_deref())?;
    Ok(reports)
}

pub async fn resume(
    config: Config,
    checkpoint: PathBuf,
    options: RunOptions,
) -> Result<Vec<KeywordReport>> {
    println!("Resuming search from checkpoint: {}", checkpoint.display());

    let manager = CheckpointManager::new(&config.output.dir)
        .context("Failed to open checkpoint directory")?;
    let saved = manager
        .load_path(&checkpoint)
        .with_context(|| format!("Failed to load checkpoint: {}", checkpoint.display()))?;

    println!("\nCheckpoint");
    println!("----------");
    println!("Keyword: {}", saved.keyword);
    println!("Searches so far: {}", saved.search_count);
    println!("Collected: {}", saved.collected);
    println!("Offset: {}", saved.state.offset);
    println!("Saved at: {}", saved.saved_at.to_rfc3339());

    let target = options.target.unwrap_or(config.scan.default_target).max(1);
    let pipeline = build_pipeline(&config, options.skip_enrich)?;
    let stop = stop_signal();

    let mut state = saved.state;
    state.touch();
    let report = pipeline
        .run(state, target, &stop)
        .await
        .with_context(|| format!("Resumed run failed: {}", saved.keyword))?;
    print_report(&report);

    let reports = vec![report];
    finish(&reports, options.metrics_file.as_deref())?;
    Ok(reports)
}

fn build_pipeline(config: &Config, skip_enrich: bool) -> Result<KeywordPipeline> {
    config.validate().context("Invalid configuration")?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics unavailable");
    }

    let fetcher = RateLimitedFetcher::new(config).context("Failed to create fetcher")?;
    let client = TikHubClient::new(fetcher, config);
    let checkpoints =
        CheckpointManager::with_interval(&config.output.dir, config.output.checkpoint_interval)
            .context("Failed to create checkpoint directory")?;

    Ok(KeywordPipeline::new(Arc::new(client), config)
        .with_checkpoints(checkpoints)
        .skip_enrich(skip_enrich))
}

/// Stop flag flipped by Ctrl-C
fn stop_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current step and exporting");
            let _ = tx.send(true);
        }
    });
    rx
}

fn print_report(report: &KeywordReport) {
    let status = match report.outcome {
        KeywordOutcome::Success => "SUCCESS",
        KeywordOutcome::Empty => "EMPTY",
        KeywordOutcome::Partial => "PARTIAL",
    };

    println!("  Status: {status}");
    println!(
        "  Searches: {}, videos: {}, creators seen: {}",
        report.stats.searches, report.stats.videos_seen, report.stats.creators_seen
    );
    println!(
        "  Creators: {} (enriched: {}, failed: {}, skipped: {})",
        report.creators, report.enriched, report.failed, report.skipped
    );
    if let Some(csv) = &report.artifacts.csv_path {
        println!("  Table: {}", csv.display());
    }
    println!("  Report: {}", report.artifacts.report_path.display());
    if let Some(checkpoint) = &report.checkpoint {
        println!("  Checkpoint: {}", checkpoint.display());
    }
}

fn finish(reports: &[KeywordReport], metrics_file: Option<&Path>) -> Result<()> {
    let total: usize = reports.iter().map(|r| r.creators).sum();
    println!("\nDone: {} keyword(s), {total} creator(s) exported", reports.len());

    if let Some(path) = metrics_file {
        let text = metrics::encode_metrics()
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {e}"))?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write metrics file: {}", path.display()))?;
        tracing::info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}
