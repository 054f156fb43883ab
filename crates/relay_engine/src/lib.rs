//! Relay engine: fetching, page parsing, attachment resolution and the sync
//! run that ties them to a delivery target.
mod attachment;
mod decode;
mod dom;
mod extract;
mod fetch;
mod filename;
mod listing;
mod orchestrator;
mod persist;
mod telegram;
mod types;
mod walker;

pub use attachment::AttachmentResolver;
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use dom::{to_markup, MAX_MARKUP_DEPTH};
pub use extract::{parse_post_page, PostExtractor, PostPage};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, Session};
pub use filename::attachment_filename;
pub use listing::{parse_listing_page, ListingPage};
pub use orchestrator::{Delivery, RunReport, SyncOrchestrator, SyncSettings};
pub use persist::{
    ensure_output_dir, AtomicFileWriter, FileWatermarkStore, PersistError, WatermarkStore,
};
pub use telegram::{TelegramDelivery, DEFAULT_API_BASE};
pub use types::{
    AttachmentError, DeliveryError, ExtractionError, FailureKind, FetchError, FetchMetadata,
    FetchOutput, SyncError,
};
pub use walker::FeedCursorWalker;
