use relay_core::PostStub;
use relay_logging::relay_warn;
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;

use crate::dom::selector;

const STORIES_CONTAINER: &str = "#m_group_stories_container";
const STORY_SELECTOR: &str = "#m_group_stories_container>div>div";
const MORE_LINK_SELECTOR: &str = "#m_group_stories_container>div:nth-child(2)>a";

/// One page of the group listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPage {
    pub stubs: Vec<PostStub>,
    /// Raw href of the "see more posts" link, usually site-relative.
    pub next_href: Option<String>,
}

/// The `data-ft` tracking blob carried by every story in the listing.
#[derive(Debug, Deserialize)]
struct StoryMeta {
    #[serde(default)]
    top_level_post_id: Value,
    #[serde(default)]
    page_insights: serde_json::Map<String, Value>,
}

/// Read the stubs and the "more" link of one listing page. Fails only when
/// the stories container itself is missing; individual stories that cannot
/// be read are skipped.
pub fn parse_listing_page(html: &str) -> Result<ListingPage, String> {
    let doc = Html::parse_document(html);
    let (Some(container_sel), Some(story_sel), Some(more_sel)) = (
        selector(STORIES_CONTAINER),
        selector(STORY_SELECTOR),
        selector(MORE_LINK_SELECTOR),
    ) else {
        return Err("listing selectors failed to parse".to_string());
    };

    if doc.select(&container_sel).next().is_none() {
        return Err(format!("no {STORIES_CONTAINER} element"));
    }

    let stubs = doc
        .select(&story_sel)
        .filter_map(|story| {
            let raw = story.value().attr("data-ft")?;
            match stub_from_meta(raw) {
                Some(stub) => Some(stub),
                None => {
                    relay_warn!("Skipping story with unreadable metadata: {}", raw);
                    None
                }
            }
        })
        .collect();

    let next_href = doc
        .select(&more_sel)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(ToOwned::to_owned);

    Ok(ListingPage { stubs, next_href })
}

fn stub_from_meta(raw: &str) -> Option<PostStub> {
    let meta: StoryMeta = serde_json::from_str(raw).ok()?;
    let id = scalar_string(&meta.top_level_post_id)?;
    let publish_time = meta.page_insights.values().find_map(|insight| {
        insight
            .get("post_context")
            .and_then(|context| context.get("publish_time"))
            .and_then(scalar_i64)
    })?;
    Some(PostStub::new(id, publish_time))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
