mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use relay_core::SiteProfile;
use relay_engine::{
    AtomicFileWriter, AttachmentResolver, FeedCursorWalker, FetchSettings, FileWatermarkStore,
    PostExtractor, ReqwestFetcher, SyncOrchestrator, TelegramDelivery,
};
use relay_logging::{relay_error, relay_info};

use crate::config::AppConfig;

fn main() -> ExitCode {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            return ExitCode::from(2);
        }
    };
    logging::initialize(config.log_destination);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            relay_error!("Sync run failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig) -> Result<()> {
    let profile = Arc::new(SiteProfile::default());
    let fetcher = Arc::new(
        ReqwestFetcher::new(FetchSettings::default(), &config.session())
            .context("building the upstream HTTP client")?,
    );
    let resolver = AttachmentResolver::new(
        fetcher.clone(),
        profile.clone(),
        AtomicFileWriter::new(config.downloads_dir.clone()),
    );
    let extractor = PostExtractor::new(
        fetcher.clone(),
        resolver,
        profile.clone(),
        config.group_id.clone(),
        config.display_tz,
    );
    let walker = FeedCursorWalker::new(
        fetcher,
        profile,
        config.group_id.clone(),
        config.lookahead_pages,
    );
    let delivery = TelegramDelivery::new(
        &config.telegram_api_base,
        &config.bot_token,
        config.chat_id.clone(),
    )
    .context("building the bot client")?;
    let store = FileWatermarkStore::new(config.watermark_file.clone());

    let orchestrator = SyncOrchestrator::new(
        walker,
        extractor,
        Arc::new(delivery),
        Arc::new(store),
        config.sync_settings(),
        Arc::new(|| chrono::Utc::now().timestamp()),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting the async runtime")?;
    relay_info!("Syncing group {}", config.group_id);
    let report = runtime.block_on(orchestrator.run_once())?;
    relay_info!(
        "Delivered {} of {} new posts ({} unparsed, {} failed)",
        report.delivered,
        report.discovered,
        report.unparsed,
        report.failed_deliveries
    );
    Ok(())
}
