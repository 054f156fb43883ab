use std::sync::Arc;

use relay_core::{AttachmentDescriptor, AttachmentTarget, Element, SiteProfile};
use relay_logging::{relay_debug, relay_info, relay_warn};
use scraper::Html;

use crate::dom::selector;
use crate::filename::attachment_filename;
use crate::fetch::Fetcher;
use crate::persist::AtomicFileWriter;
use crate::AttachmentError;

/// Turns the node that follows a post body into a typed attachment.
///
/// Everything except a failed file download degrades to the best descriptor
/// available; a failed download is reported so the post can be flagged.
#[derive(Clone)]
pub struct AttachmentResolver {
    fetcher: Arc<dyn Fetcher>,
    profile: Arc<SiteProfile>,
    downloads: AtomicFileWriter,
}

impl AttachmentResolver {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        profile: Arc<SiteProfile>,
        downloads: AtomicFileWriter,
    ) -> Self {
        Self {
            fetcher,
            profile,
            downloads,
        }
    }

    pub async fn resolve(
        &self,
        node: Option<&Element>,
    ) -> Result<AttachmentDescriptor, AttachmentError> {
        let Some(container) = node else {
            return Ok(AttachmentDescriptor::None);
        };
        let Some(link) = container.find_first("a") else {
            relay_debug!("Attachment node <{}> has no hyperlink", container.tag);
            return Ok(AttachmentDescriptor::None);
        };
        let Some(href) = link.attr("href") else {
            return Ok(AttachmentDescriptor::None);
        };

        match self.profile.classify_href(href) {
            AttachmentTarget::External(url) => {
                let caption = link
                    .stripped_strings()
                    .first()
                    .map(|text| text.to_string())
                    .unwrap_or_default();
                Ok(AttachmentDescriptor::Link { url, caption })
            }
            AttachmentTarget::Asset(url) => self.download(&url).await,
            AttachmentTarget::Photo { photo_id } => Ok(self.photo(container, photo_id).await),
            AttachmentTarget::Unsupported => {
                relay_debug!("Ignoring attachment link {}", href);
                Ok(AttachmentDescriptor::None)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<AttachmentDescriptor, AttachmentError> {
        let filename = attachment_filename(url);
        let output = self
            .fetcher
            .fetch_bytes(url)
            .await
            .map_err(|source| AttachmentError::Download {
                url: url.to_string(),
                source,
            })?;
        let local_path = self
            .downloads
            .write_bytes(&filename, &output.bytes)
            .map_err(|source| AttachmentError::Store {
                filename: filename.clone(),
                source,
            })?;
        relay_info!(
            "Stored attachment {} ({} bytes) at {:?}",
            filename,
            output.metadata.byte_len,
            local_path
        );
        Ok(AttachmentDescriptor::File {
            local_path,
            original_filename: filename,
        })
    }

    async fn photo(&self, container: &Element, photo_id: Option<String>) -> AttachmentDescriptor {
        let full_size = match photo_id {
            Some(id) => self.full_size_image(&id).await,
            None => {
                relay_warn!("Photo link without an id; using the preview image");
                None
            }
        };
        let url = full_size.or_else(|| {
            container
                .find_first("img")
                .and_then(|img| img.attr("src"))
                .map(str::to_string)
        });
        match url {
            Some(url) => AttachmentDescriptor::Image { url },
            None => {
                relay_warn!("Photo attachment has neither a full-size link nor a preview");
                AttachmentDescriptor::None
            }
        }
    }

    async fn full_size_image(&self, photo_id: &str) -> Option<String> {
        let page_url = self.profile.full_size_photo_url(photo_id);
        let html = match self.fetcher.fetch_document(&page_url).await {
            Ok(html) => html,
            Err(err) => {
                relay_warn!("Full-size photo page {} failed: {}", page_url, err);
                return None;
            }
        };
        let href = first_link_href(&html);
        if href.is_none() {
            relay_warn!("Full-size photo page {} has no link", page_url);
        }
        href.map(|href| self.profile.absolute(&href))
    }
}

fn first_link_href(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let link_sel = selector("a[href]")?;
    doc.select(&link_sel)
        .filter_map(|link| link.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(ToOwned::to_owned)
}
