use std::path::PathBuf;

/// Epoch seconds.
pub type Timestamp = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostStub {
    pub id: String,
    pub publish_time: Timestamp,
}

impl PostStub {
    pub fn new(id: impl Into<String>, publish_time: Timestamp) -> Self {
        Self {
            id: id.into(),
            publish_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentDescriptor {
    None,
    Link { url: String, caption: String },
    Image { url: String },
    /// Bytes at `local_path` are already on disk.
    File {
        local_path: PathBuf,
        original_filename: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: String,
    pub url: String,
    pub publish_time: Timestamp,
    pub formatted_time: String,
    pub header: String,
    /// Flattened message body; text is HTML-escaped, emphasis markers are not.
    pub body: String,
    pub attachment: AttachmentDescriptor,
    pub parse_succeeded: bool,
}

impl PostRecord {
    /// The record for a post that exists but could not be rendered.
    pub fn unparsed(stub: &PostStub, url: String, formatted_time: String) -> Self {
        Self {
            id: stub.id.clone(),
            url,
            publish_time: stub.publish_time,
            formatted_time,
            header: String::new(),
            body: String::new(),
            attachment: AttachmentDescriptor::None,
            parse_succeeded: false,
        }
    }
}
