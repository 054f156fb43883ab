use crate::{AttachmentDescriptor, PostRecord};

/// Longest message text the destination will render.
pub const MESSAGE_CHAR_LIMIT: usize = 4095;

/// Message text for a record. Unparsed records and messages above
/// [`MESSAGE_CHAR_LIMIT`] characters become the time + link fallback.
pub fn render_message(record: &PostRecord) -> String {
    if !record.parse_succeeded {
        return fallback_message(record);
    }

    let mut message = format!(
        "<a href=\"{url}\">{header}</a>\n<b>Time:</b> {time}\n\n{body}",
        url = escape_html(&record.url),
        header = escape_html(&record.header),
        time = record.formatted_time,
        body = record.body,
    );
    if let AttachmentDescriptor::Link { url, caption } = &record.attachment {
        message.push_str(&format!(
            "\n\n<a href='{}'>{}</a>",
            escape_html(url),
            escape_html(caption)
        ));
    }

    if message.chars().count() > MESSAGE_CHAR_LIMIT {
        fallback_message(record)
    } else {
        message
    }
}

pub fn fallback_message(record: &PostRecord) -> String {
    format!(
        "<b>Time:</b> {time}\n<a href=\"{url}\">Open post</a>",
        time = record.formatted_time,
        url = escape_html(&record.url),
    )
}

/// Escape text for an HTML-formatted message, attribute values included.
/// `record.body` is expected to be escaped already, see
/// [`crate::flatten_for_html`].
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
