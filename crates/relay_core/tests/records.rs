use pretty_assertions::assert_eq;
use relay_core::{
    escape_html, fallback_message, format_publish_time, render_message, AttachmentDescriptor, DeliveryTracker,
    PostRecord, PostStub, SyncWatermark, DEFAULT_DISPLAY_TZ, MESSAGE_CHAR_LIMIT,
};

fn record(body: &str, attachment: AttachmentDescriptor) -> PostRecord {
    PostRecord {
        id: "7".to_string(),
        url: "https://mbasic.facebook.com/groups/1/permalink/7".to_string(),
        publish_time: 1_704_193_440,
        formatted_time: "Tue, Jan 2 4:34 PM".to_string(),
        header: "Asha posted in Class of 2024".to_string(),
        body: body.to_string(),
        attachment,
        parse_succeeded: true,
    }
}

#[test]
fn formats_time_in_display_zone() {
    assert_eq!(format_publish_time(0, DEFAULT_DISPLAY_TZ), "Thu, Jan 1 5:30 AM");
    assert_eq!(
        format_publish_time(1_704_193_440, DEFAULT_DISPLAY_TZ),
        "Tue, Jan 2 4:34 PM"
    );
    assert_eq!(
        format_publish_time(1_704_193_440, chrono_tz::UTC),
        "Tue, Jan 2 11:04 AM"
    );
}

#[test]
fn renders_header_time_body_and_link() {
    let rec = record(
        "Hello",
        AttachmentDescriptor::Link {
            url: "https://example.com".to_string(),
            caption: "Example".to_string(),
        },
    );
    assert_eq!(
        render_message(&rec),
        "<a href=\"https://mbasic.facebook.com/groups/1/permalink/7\">Asha posted in Class of 2024</a>\n\
         <b>Time:</b> Tue, Jan 2 4:34 PM\n\nHello\n\n<a href='https://example.com'>Example</a>"
    );
}

#[test]
fn message_at_limit_passes_and_above_falls_back() {
    let base = render_message(&record("", AttachmentDescriptor::None));
    let fill = MESSAGE_CHAR_LIMIT - base.chars().count();

    let at_limit = record(&"é".repeat(fill), AttachmentDescriptor::None);
    let rendered = render_message(&at_limit);
    assert_eq!(rendered.chars().count(), MESSAGE_CHAR_LIMIT);
    assert!(rendered.ends_with('é'));

    let over = record(&"é".repeat(fill + 1), AttachmentDescriptor::None);
    assert_eq!(render_message(&over), fallback_message(&over));
}

#[test]
fn unparsed_record_renders_time_and_link() {
    let stub = PostStub::new("9", 10);
    let rec = PostRecord::unparsed(&stub, "https://x.test/p/9".to_string(), "Thu".to_string());
    assert!(!rec.parse_succeeded);
    assert_eq!(
        render_message(&rec),
        "<b>Time:</b> Thu\n<a href=\"https://x.test/p/9\">Open post</a>"
    );
}

#[test]
fn watermark_round_trips_through_persisted_text() {
    assert_eq!(SyncWatermark::parse(" 1700000000\n"), Ok(SyncWatermark(1_700_000_000)));
    assert!(SyncWatermark::parse("yesterday").is_err());
    assert_eq!(SyncWatermark(42).to_persisted(), "42\n");
    assert_eq!(
        SyncWatermark::lookback_default(10_000, 1_800, 60),
        SyncWatermark(8_140)
    );
}

#[test]
fn tracker_only_moves_forward() {
    let previous = SyncWatermark(100);
    let mut tracker = DeliveryTracker::default();
    assert_eq!(tracker.next_watermark(previous), None);
    tracker.record_delivered(150);
    tracker.record_delivered(120);
    assert_eq!(tracker.delivered(), 2);
    assert_eq!(tracker.next_watermark(previous), Some(SyncWatermark(150)));
    assert_eq!(
        tracker.next_watermark(SyncWatermark(200)),
        Some(SyncWatermark(200))
    );
}

#[test]
fn header_caption_and_urls_are_escaped() {
    let mut rec = record(
        "body",
        AttachmentDescriptor::Link {
            url: "https://example.com/?a=1&b='2'".to_string(),
            caption: "Tips & <tricks>".to_string(),
        },
    );
    rec.header = "Q&A \"live\"".to_string();
    assert_eq!(
        render_message(&rec),
        "<a href=\"https://mbasic.facebook.com/groups/1/permalink/7\">Q&amp;A &quot;live&quot;</a>\n\
         <b>Time:</b> Tue, Jan 2 4:34 PM\n\nbody\n\n\
         <a href='https://example.com/?a=1&amp;b=&#39;2&#39;'>Tips &amp; &lt;tricks&gt;</a>"
    );
    assert_eq!(escape_html("plain"), "plain");
}
