use std::sync::Arc;

use relay_core::{render_message, AttachmentDescriptor, DeliveryTracker, SyncWatermark, Timestamp};
use relay_logging::{relay_error, relay_info, relay_warn};

use crate::extract::PostExtractor;
use crate::persist::WatermarkStore;
use crate::walker::FeedCursorWalker;
use crate::{DeliveryError, SyncError};

/// Receiver of finished posts, e.g. a chat bot.
#[async_trait::async_trait]
pub trait Delivery: Send + Sync {
    /// Send `message` and then, if present, `attachment` as a follow-up.
    async fn deliver(
        &self,
        message: &str,
        attachment: &AttachmentDescriptor,
    ) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// How far back the first run reaches, in seconds.
    pub lookback_secs: i64,
    /// Extra margin subtracted from the first-run watermark, in seconds.
    pub leeway_secs: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookback_secs: 30 * 60,
            leeway_secs: 0,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    pub discovered: usize,
    pub delivered: usize,
    /// Posts sent as the time + link fallback because extraction failed.
    pub unparsed: usize,
    pub failed_deliveries: usize,
    /// Watermark persisted at the end of the run, if it moved.
    pub watermark: Option<SyncWatermark>,
}

pub struct SyncOrchestrator {
    walker: FeedCursorWalker,
    extractor: PostExtractor,
    delivery: Arc<dyn Delivery>,
    store: Arc<dyn WatermarkStore>,
    settings: SyncSettings,
    now: Arc<dyn Fn() -> Timestamp + Send + Sync>,
}

impl SyncOrchestrator {
    pub fn new(
        walker: FeedCursorWalker,
        extractor: PostExtractor,
        delivery: Arc<dyn Delivery>,
        store: Arc<dyn WatermarkStore>,
        settings: SyncSettings,
        now: Arc<dyn Fn() -> Timestamp + Send + Sync>,
    ) -> Self {
        Self {
            walker,
            extractor,
            delivery,
            store,
            settings,
            now,
        }
    }

    fn starting_watermark(&self) -> SyncWatermark {
        let fallback = || {
            SyncWatermark::lookback_default(
                (self.now)(),
                self.settings.lookback_secs,
                self.settings.leeway_secs,
            )
        };
        match self.store.load() {
            Ok(Some(watermark)) => watermark,
            Ok(None) => {
                let watermark = fallback();
                relay_info!("No stored watermark; starting from {}", watermark.timestamp());
                watermark
            }
            Err(err) => {
                let watermark = fallback();
                relay_warn!(
                    "Stored watermark unreadable ({}); starting from {}",
                    err,
                    watermark.timestamp()
                );
                watermark
            }
        }
    }

    /// One sync pass. Per-post failures are counted, not fatal; the
    /// watermark only moves when something was delivered.
    pub async fn run_once(&self) -> Result<RunReport, SyncError> {
        let watermark = self.starting_watermark();
        let mut stubs = self.walker.collect_new_stubs(watermark).await?;
        stubs.reverse();

        let mut report = RunReport {
            discovered: stubs.len(),
            ..RunReport::default()
        };
        let mut tracker = DeliveryTracker::default();

        for stub in &stubs {
            let record = match self.extractor.try_extract(stub).await {
                Ok(record) => record,
                Err(err) => {
                    relay_warn!("Post {} could not be parsed: {}", stub.id, err);
                    report.unparsed += 1;
                    self.extractor.unparsed(stub)
                }
            };

            let message = render_message(&record);
            match self.delivery.deliver(&message, &record.attachment).await {
                Ok(()) => {
                    relay_info!("Delivered post {} ({})", record.id, record.formatted_time);
                    tracker.record_delivered(record.publish_time);
                }
                Err(err) => {
                    relay_error!("Delivery of post {} failed: {}", record.id, err);
                    report.failed_deliveries += 1;
                }
            }
        }

        report.delivered = tracker.delivered();
        report.watermark = tracker.next_watermark(watermark);
        if let Some(next) = report.watermark {
            if let Err(err) = self.store.save(next) {
                relay_error!(
                    "Delivered {} posts but could not persist watermark {}: {}",
                    report.delivered,
                    next.timestamp(),
                    err
                );
                return Err(SyncError::Persistence(err));
            }
        }

        relay_info!(
            "Run complete: {} discovered, {} delivered, {} unparsed, {} failed",
            report.discovered,
            report.delivered,
            report.unparsed,
            report.failed_deliveries
        );
        Ok(report)
    }
}
