use std::sync::Arc;

use chrono_tz::Tz;
use relay_core::{
    flatten_for_html, format_publish_time, AttachmentDescriptor, Element, PostRecord, PostStub,
    SiteProfile,
};
use relay_logging::{relay_debug, relay_warn};
use scraper::Html;

use crate::attachment::AttachmentResolver;
use crate::dom::{
    find_by_attr, next_element_sibling, previous_element_sibling, selector, text_of, to_markup,
};
use crate::fetch::Fetcher;
use crate::ExtractionError;

/// Provenance marker of top-level story content on a permalink page.
const STORY_MARKER_ATTR: &str = "data-ft";
const STORY_MARKER_VALUE: &str = r#"{"tn":"*s"}"#;
const HEADER_SELECTOR: &str = "table>tbody>tr>td:nth-child(2)>div>h3";

/// The parts of a permalink page the record is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub header: String,
    pub content: Element,
    /// Element directly after the content container, if any.
    pub trailing: Option<Element>,
}

/// Locate the story container and its neighbours on a permalink page.
pub fn parse_post_page(html: &str) -> Result<PostPage, String> {
    let doc = Html::parse_document(html);
    let content = find_by_attr(&doc, STORY_MARKER_ATTR, STORY_MARKER_VALUE)
        .ok_or_else(|| "story content marker not found".to_string())?;

    let header_sel =
        selector(HEADER_SELECTOR).ok_or_else(|| "header selector failed to parse".to_string())?;
    let header = previous_element_sibling(content)
        .and_then(|meta| meta.select(&header_sel).next())
        .map(text_of)
        .ok_or_else(|| "header block before story content not found".to_string())?;

    Ok(PostPage {
        header,
        content: to_markup(content),
        trailing: next_element_sibling(content).map(to_markup),
    })
}

pub struct PostExtractor {
    fetcher: Arc<dyn Fetcher>,
    resolver: AttachmentResolver,
    profile: Arc<SiteProfile>,
    group_id: String,
    display_tz: Tz,
}

impl PostExtractor {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        resolver: AttachmentResolver,
        profile: Arc<SiteProfile>,
        group_id: impl Into<String>,
        display_tz: Tz,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            profile,
            group_id: group_id.into(),
            display_tz,
        }
    }

    pub fn permalink(&self, stub: &PostStub) -> String {
        self.profile.permalink_url(&self.group_id, &stub.id)
    }

    /// Always yields a record; failures give the minimal unparsed record.
    pub async fn extract(&self, stub: &PostStub) -> PostRecord {
        match self.try_extract(stub).await {
            Ok(record) => record,
            Err(err) => {
                relay_warn!("Post {} could not be parsed: {}", stub.id, err);
                self.unparsed(stub)
            }
        }
    }

    pub fn unparsed(&self, stub: &PostStub) -> PostRecord {
        PostRecord::unparsed(
            stub,
            self.permalink(stub),
            format_publish_time(stub.publish_time, self.display_tz),
        )
    }

    pub async fn try_extract(&self, stub: &PostStub) -> Result<PostRecord, ExtractionError> {
        let url = self.permalink(stub);
        relay_debug!("Extracting post {} from {}", stub.id, url);

        let html = self
            .fetcher
            .fetch_document(&url)
            .await
            .map_err(|source| ExtractionError::Fetch {
                url: url.clone(),
                source,
            })?;
        let page = parse_post_page(&html).map_err(|detail| ExtractionError::MarkupShape {
            url: url.clone(),
            detail,
        })?;

        let attachment: AttachmentDescriptor = self
            .resolver
            .resolve(page.trailing.as_ref())
            .await
            .map_err(|source| ExtractionError::Resolution {
                post_id: stub.id.clone(),
                source,
            })?;

        Ok(PostRecord {
            id: stub.id.clone(),
            url,
            publish_time: stub.publish_time,
            formatted_time: format_publish_time(stub.publish_time, self.display_tz),
            header: page.header,
            body: flatten_for_html(&page.content),
            attachment,
            parse_succeeded: true,
        })
    }
}
