use std::collections::HashMap;

use crate::{PostStub, Timestamp};

pub const DEFAULT_LOOKAHEAD_PAGES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStep {
    /// Fetch the page behind the current page's "more" link.
    FetchNext,
    Finished,
}

/// Pagination state for one walk over the group listing.
///
/// The listing is not strictly ordered by time, so the walk keeps going for
/// `lookahead` pages whose oldest post is already at or before the watermark.
#[derive(Debug, Clone)]
pub struct FeedWalk {
    watermark: Timestamp,
    lookahead_budget: u32,
    pages_seen: usize,
    stubs: HashMap<String, PostStub>,
}

impl FeedWalk {
    pub fn new(watermark: Timestamp) -> Self {
        Self::with_lookahead(watermark, DEFAULT_LOOKAHEAD_PAGES)
    }

    /// A budget of zero would end the walk before the first page; it is
    /// raised to one.
    pub fn with_lookahead(watermark: Timestamp, lookahead: u32) -> Self {
        Self {
            watermark,
            lookahead_budget: lookahead.max(1),
            pages_seen: 0,
            stubs: HashMap::new(),
        }
    }

    pub fn watermark(&self) -> Timestamp {
        self.watermark
    }

    pub fn lookahead_budget(&self) -> u32 {
        self.lookahead_budget
    }

    pub fn pages_seen(&self) -> usize {
        self.pages_seen
    }

    pub fn is_finished(&self) -> bool {
        self.lookahead_budget == 0
    }

    /// Record the stubs of one listing page. Order within the page carries no
    /// meaning. A page without stubs never spends budget.
    pub fn observe_page(&mut self, page: Vec<PostStub>) -> WalkStep {
        if self.is_finished() {
            return WalkStep::Finished;
        }
        self.pages_seen += 1;

        let page_min = page.iter().map(|stub| stub.publish_time).min();
        for stub in page {
            self.stubs.insert(stub.id.clone(), stub);
        }

        if matches!(page_min, Some(min) if min <= self.watermark) {
            self.lookahead_budget -= 1;
        }

        if self.is_finished() {
            WalkStep::Finished
        } else {
            WalkStep::FetchNext
        }
    }

    /// Stubs newer than the watermark, newest first.
    pub fn into_new_stubs(self) -> Vec<PostStub> {
        let watermark = self.watermark;
        let mut fresh: Vec<PostStub> = self
            .stubs
            .into_values()
            .filter(|stub| stub.publish_time > watermark)
            .collect();
        fresh.sort_by(|a, b| {
            b.publish_time
                .cmp(&a.publish_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        fresh
    }
}
