use crate::Timestamp;

/// "Everything at or before this instant has been delivered."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SyncWatermark(pub Timestamp);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a decimal timestamp: {0:?}")]
pub struct InvalidWatermark(pub String);

impl SyncWatermark {
    /// First-run watermark: `now - lookback - leeway`.
    pub fn lookback_default(now: Timestamp, lookback_secs: i64, leeway_secs: i64) -> Self {
        Self(now.saturating_sub(lookback_secs).saturating_sub(leeway_secs))
    }

    pub fn timestamp(self) -> Timestamp {
        self.0
    }

    /// Parse the persisted ASCII decimal form; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, InvalidWatermark> {
        raw.trim()
            .parse::<Timestamp>()
            .map(Self)
            .map_err(|_| InvalidWatermark(raw.trim().to_string()))
    }

    pub fn to_persisted(self) -> String {
        format!("{}\n", self.0)
    }
}

/// Tracks the newest publish time among successfully delivered posts.
#[derive(Debug, Clone, Default)]
pub struct DeliveryTracker {
    last_delivered: Option<Timestamp>,
    delivered: usize,
}

impl DeliveryTracker {
    pub fn record_delivered(&mut self, publish_time: Timestamp) {
        self.delivered += 1;
        self.last_delivered = Some(match self.last_delivered {
            Some(current) => current.max(publish_time),
            None => publish_time,
        });
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// The watermark to persist; `None` when nothing was delivered.
    pub fn next_watermark(&self, previous: SyncWatermark) -> Option<SyncWatermark> {
        self.last_delivered
            .map(|last| SyncWatermark(last.max(previous.timestamp())))
    }
}
