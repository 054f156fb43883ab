#![allow(dead_code)]

use wiremock::ResponseTemplate;

pub const GROUP_ID: &str = "99";

pub fn init_logging() {
    relay_logging::initialize_for_tests();
}

pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

/// A group listing page with one story per `(id, publish_time)` and an
/// optional "see more posts" href.
pub fn listing_page(stories: &[(&str, i64)], more_href: Option<&str>) -> String {
    let stories: String = stories
        .iter()
        .map(|(id, time)| {
            format!(
                r#"<div data-ft='{{"top_level_post_id":"{id}","page_id":"{GROUP_ID}","page_insights":{{"{GROUP_ID}":{{"post_context":{{"publish_time":{time}}}}}}}}}'><p>story {id}</p></div>"#
            )
        })
        .collect();
    let more = more_href
        .map(|href| format!(r#"<div><a href="{href}">See more posts</a></div>"#))
        .unwrap_or_default();
    format!(
        r#"<html><body><div id="m_group_stories_container"><div>{stories}</div>{more}</div></body></html>"#
    )
}

/// A permalink page: header block, story content, and what follows it.
pub fn post_page(header: &str, content_html: &str, trailing_html: &str) -> String {
    format!(
        r#"<html><body><div id="m_story_permalink_view"><div><div><table><tbody><tr><td><img src="/avatar.jpg"></td><td><div><h3>{header}</h3></div></td></tr></tbody></table></div><div data-ft='{{"tn":"*s"}}'>{content_html}</div>{trailing_html}</div></div></body></html>"#
    )
}
