use std::sync::Arc;

use relay_core::{FeedWalk, PostStub, SiteProfile, SyncWatermark, WalkStep};
use relay_logging::{relay_debug, relay_info};

use crate::fetch::Fetcher;
use crate::listing::parse_listing_page;
use crate::SyncError;

/// Walks the group listing page by page until the lookahead budget past the
/// watermark is spent.
pub struct FeedCursorWalker {
    fetcher: Arc<dyn Fetcher>,
    profile: Arc<SiteProfile>,
    group_id: String,
    lookahead_pages: u32,
}

impl FeedCursorWalker {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        profile: Arc<SiteProfile>,
        group_id: impl Into<String>,
        lookahead_pages: u32,
    ) -> Self {
        Self {
            fetcher,
            profile,
            group_id: group_id.into(),
            lookahead_pages,
        }
    }

    /// Stubs published after `watermark`, newest first. Any listing fetch
    /// failure, or a feed that ends before the budget is spent, aborts the
    /// walk: coverage could not be established.
    pub async fn collect_new_stubs(
        &self,
        watermark: SyncWatermark,
    ) -> Result<Vec<PostStub>, SyncError> {
        let mut walk = FeedWalk::with_lookahead(watermark.timestamp(), self.lookahead_pages);
        let mut page_url = self.profile.group_url(&self.group_id);

        loop {
            let html = self
                .fetcher
                .fetch_document(&page_url)
                .await
                .map_err(|source| SyncError::Fetch {
                    url: page_url.clone(),
                    source,
                })?;
            let page = parse_listing_page(&html).map_err(|detail| SyncError::MarkupShape {
                url: page_url.clone(),
                detail,
            })?;
            relay_debug!(
                "Listing page {} has {} stories (budget {})",
                walk.pages_seen() + 1,
                page.stubs.len(),
                walk.lookahead_budget()
            );

            if walk.observe_page(page.stubs) == WalkStep::Finished {
                break;
            }

            let Some(next) = page.next_href else {
                return Err(SyncError::FeedExhausted {
                    pages: walk.pages_seen(),
                    remaining: walk.lookahead_budget(),
                });
            };
            page_url = self.profile.absolute(&next);
        }

        let pages = walk.pages_seen();
        let fresh = walk.into_new_stubs();
        relay_info!(
            "Walked {} listing pages, {} posts newer than {}",
            pages,
            fresh.len(),
            watermark.timestamp()
        );
        Ok(fresh)
    }
}
