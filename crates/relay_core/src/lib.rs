//! Relay core: markup flattening, URL classification, pagination state and
//! message rendering. No I/O happens here.
mod flatten;
mod markup;
mod message;
mod site;
mod time;
mod types;
mod walk;
mod watermark;

pub use flatten::{flatten, flatten_element, flatten_for_html};
pub use markup::{Element, MarkupNode};
pub use message::{escape_html, fallback_message, render_message, MESSAGE_CHAR_LIMIT};
pub use site::{asset_filename, AttachmentTarget, SiteProfile, DEFAULT_BASE_URL};
pub use time::{format_publish_time, DEFAULT_DISPLAY_TZ};
pub use types::{AttachmentDescriptor, PostRecord, PostStub, Timestamp};
pub use walk::{FeedWalk, WalkStep, DEFAULT_LOOKAHEAD_PAGES};
pub use watermark::{DeliveryTracker, InvalidWatermark, SyncWatermark};
