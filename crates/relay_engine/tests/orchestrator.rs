mod common;

use std::sync::{Arc, Mutex};

use common::{html, init_logging, listing_page, post_page, GROUP_ID};
use pretty_assertions::assert_eq;
use relay_core::{AttachmentDescriptor, SiteProfile, SyncWatermark};
use relay_engine::{
    AtomicFileWriter, AttachmentResolver, Delivery, DeliveryError, FeedCursorWalker,
    FetchSettings, PersistError, PostExtractor, ReqwestFetcher, Session, SyncError,
    SyncOrchestrator, SyncSettings, WatermarkStore,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOW: i64 = 10_000;

#[derive(Default)]
struct RecordingDelivery {
    sent: Mutex<Vec<(String, AttachmentDescriptor)>>,
    fail_containing: Option<String>,
}

#[async_trait::async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(
        &self,
        message: &str,
        attachment: &AttachmentDescriptor,
    ) -> Result<(), DeliveryError> {
        if let Some(needle) = &self.fail_containing {
            if message.contains(needle.as_str()) {
                return Err(DeliveryError::new("chat unavailable"));
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), attachment.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct MemoryStore {
    value: Mutex<Option<SyncWatermark>>,
    saves: Mutex<Vec<SyncWatermark>>,
    fail_save: bool,
}

impl MemoryStore {
    fn starting_at(watermark: i64) -> Self {
        Self {
            value: Mutex::new(Some(SyncWatermark(watermark))),
            ..Self::default()
        }
    }
}

impl WatermarkStore for MemoryStore {
    fn load(&self) -> Result<Option<SyncWatermark>, PersistError> {
        Ok(*self.value.lock().unwrap())
    }

    fn save(&self, watermark: SyncWatermark) -> Result<(), PersistError> {
        if self.fail_save {
            return Err(PersistError::OutputDir("read-only volume".to_string()));
        }
        self.saves.lock().unwrap().push(watermark);
        *self.value.lock().unwrap() = Some(watermark);
        Ok(())
    }
}

fn orchestrator(
    server: &MockServer,
    downloads: &TempDir,
    delivery: Arc<RecordingDelivery>,
    store: Arc<MemoryStore>,
) -> SyncOrchestrator {
    let mut profile = SiteProfile::with_base_url(server.uri());
    profile.asset_hosts = vec!["127.0.0.1".to_string()];
    let profile = Arc::new(profile);
    let fetcher = Arc::new(ReqwestFetcher::new(FetchSettings::default(), &Session::new()).unwrap());
    let resolver = AttachmentResolver::new(
        fetcher.clone(),
        profile.clone(),
        AtomicFileWriter::new(downloads.path().to_path_buf()),
    );
    let extractor = PostExtractor::new(
        fetcher.clone(),
        resolver,
        profile.clone(),
        GROUP_ID,
        chrono_tz::UTC,
    );
    let walker = FeedCursorWalker::new(fetcher, profile, GROUP_ID, 1);
    SyncOrchestrator::new(
        walker,
        extractor,
        delivery,
        store,
        SyncSettings::default(),
        Arc::new(|| NOW),
    )
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_post(server: &MockServer, id: &str, body: &str) {
    mount(
        server,
        &format!("/groups/{GROUP_ID}/permalink/{id}"),
        html(post_page(&format!("Author {id}"), body, "")),
    )
    .await;
}

#[tokio::test]
async fn delivers_oldest_first_and_isolates_failed_extraction() {
    init_logging();
    let server = MockServer::start().await;
    mount(
        &server,
        "/groups/99",
        html(listing_page(
            &[("13", 7_000), ("11", 5_000), ("12", 6_000), ("10", 100)],
            Some("/listing/2"),
        )),
    )
    .await;
    mount_post(&server, "11", "<p>first</p>").await;
    mount(
        &server,
        "/groups/99/permalink/12",
        ResponseTemplate::new(500),
    )
    .await;
    mount_post(&server, "13", "<p>third</p>").await;

    let downloads = TempDir::new().unwrap();
    let delivery = Arc::new(RecordingDelivery::default());
    let store = Arc::new(MemoryStore::starting_at(1_000));
    let report = orchestrator(&server, &downloads, delivery.clone(), store.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.discovered, 3);
    assert_eq!(report.delivered, 3);
    assert_eq!(report.unparsed, 1);
    assert_eq!(report.failed_deliveries, 0);
    assert_eq!(report.watermark, Some(SyncWatermark(7_000)));
    assert_eq!(*store.saves.lock().unwrap(), vec![SyncWatermark(7_000)]);

    let sent = delivery.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert!(sent[0].0.contains("Author 11") && sent[0].0.ends_with("first"));
    let permalink_12 = format!("{}/groups/99/permalink/12", server.uri());
    assert_eq!(
        sent[1].0,
        format!("<b>Time:</b> Thu, Jan 1 1:40 AM\n<a href=\"{permalink_12}\">Open post</a>")
    );
    assert_eq!(sent[1].1, AttachmentDescriptor::None);
    assert!(sent[2].0.contains("Author 13") && sent[2].0.ends_with("third"));
}

#[tokio::test]
async fn failed_download_sends_fallback_and_run_continues() {
    init_logging();
    let server = MockServer::start().await;
    mount(
        &server,
        "/groups/99",
        html(listing_page(&[("52", 3_000), ("51", 2_000), ("50", 5)], None)),
    )
    .await;
    mount(&server, "/file/plan.pdf", ResponseTemplate::new(403)).await;
    let trailing = format!(
        r#"<div><a href="{}/file/plan.pdf">plan.pdf</a></div>"#,
        server.uri()
    );
    mount(
        &server,
        "/groups/99/permalink/51",
        html(post_page("Author 51", "<p>see plan</p>", &trailing)),
    )
    .await;
    mount_post(&server, "52", "<p>after</p>").await;

    let downloads = TempDir::new().unwrap();
    let delivery = Arc::new(RecordingDelivery::default());
    let store = Arc::new(MemoryStore::starting_at(1_000));
    let report = orchestrator(&server, &downloads, delivery.clone(), store.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.discovered, 2);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.unparsed, 1);
    assert_eq!(report.watermark, Some(SyncWatermark(3_000)));

    let sent = delivery.sent.lock().unwrap();
    let permalink_51 = format!("{}/groups/99/permalink/51", server.uri());
    assert_eq!(
        sent[0],
        (
            format!("<b>Time:</b> Thu, Jan 1 12:33 AM\n<a href=\"{permalink_51}\">Open post</a>"),
            AttachmentDescriptor::None
        )
    );
    assert!(sent[1].0.contains("Author 52") && sent[1].0.ends_with("after"));
}

#[tokio::test]
async fn failed_delivery_does_not_move_watermark_past_last_success() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/groups/99",
        html(listing_page(&[("21", 2_000), ("22", 3_000), ("20", 5)], None)),
    )
    .await;
    mount_post(&server, "21", "<p>ok</p>").await;
    mount_post(&server, "22", "<p>boom</p>").await;

    let downloads = TempDir::new().unwrap();
    let delivery = Arc::new(RecordingDelivery {
        fail_containing: Some("boom".to_string()),
        ..RecordingDelivery::default()
    });
    let store = Arc::new(MemoryStore::starting_at(1_000));
    let report = orchestrator(&server, &downloads, delivery, store.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed_deliveries, 1);
    assert_eq!(*store.saves.lock().unwrap(), vec![SyncWatermark(2_000)]);
}

#[tokio::test]
async fn nothing_new_leaves_watermark_untouched() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/groups/99",
        html(listing_page(&[("1", 500), ("2", 400)], None)),
    )
    .await;

    let downloads = TempDir::new().unwrap();
    let delivery = Arc::new(RecordingDelivery::default());
    let store = Arc::new(MemoryStore::starting_at(1_000));
    let report = orchestrator(&server, &downloads, delivery.clone(), store.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.discovered, 0);
    assert_eq!(report.watermark, None);
    assert!(store.saves.lock().unwrap().is_empty());
    assert!(delivery.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn first_run_uses_lookback_window() {
    let server = MockServer::start().await;
    // lookback 30 minutes from NOW puts the watermark at 8_200
    mount(
        &server,
        "/groups/99",
        html(listing_page(&[("31", 9_000), ("30", 8_200)], None)),
    )
    .await;
    mount_post(&server, "31", "<p>fresh</p>").await;

    let downloads = TempDir::new().unwrap();
    let delivery = Arc::new(RecordingDelivery::default());
    let store = Arc::new(MemoryStore::default());
    let report = orchestrator(&server, &downloads, delivery.clone(), store.clone())
        .run_once()
        .await
        .unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(*store.value.lock().unwrap(), Some(SyncWatermark(9_000)));
}

#[tokio::test]
async fn watermark_write_failure_is_surfaced_after_delivery() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/groups/99",
        html(listing_page(&[("41", 2_000), ("40", 5)], None)),
    )
    .await;
    mount_post(&server, "41", "<p>hello</p>").await;

    let downloads = TempDir::new().unwrap();
    let delivery = Arc::new(RecordingDelivery::default());
    let store = Arc::new(MemoryStore {
        value: Mutex::new(Some(SyncWatermark(1_000))),
        fail_save: true,
        ..MemoryStore::default()
    });
    let err = orchestrator(&server, &downloads, delivery.clone(), store)
        .run_once()
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Persistence(_)), "{err}");
    assert_eq!(delivery.sent.lock().unwrap().len(), 1);
}
