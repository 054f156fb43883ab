use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://mbasic.facebook.com";

/// URL shapes of the upstream group site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub base_url: String,
    /// Hosts serving the outbound "leaving the site" redirect page.
    pub redirect_hosts: Vec<String>,
    /// Query parameter of the redirect page carrying the real destination.
    pub redirect_param: String,
    /// Hosts serving uploaded files.
    pub asset_hosts: Vec<String>,
    pub photo_path_prefix: String,
    pub photo_id_param: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            redirect_hosts: vec!["lm.facebook.com".to_string(), "l.facebook.com".to_string()],
            redirect_param: "u".to_string(),
            asset_hosts: vec!["lookaside.fbsbx.com".to_string()],
            photo_path_prefix: "/photo".to_string(),
            photo_id_param: "fbid".to_string(),
        }
    }
}

/// What the first hyperlink of an attachment node points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentTarget {
    /// Absolute external link, outbound redirect already unwrapped.
    External(String),
    /// Absolute link to an uploaded file.
    Asset(String),
    /// Relative photo link; the id is `None` when the query lacks it.
    Photo { photo_id: Option<String> },
    Unsupported,
}

impl SiteProfile {
    /// Profile rooted at another base URL, e.g. a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn group_url(&self, group_id: &str) -> String {
        self.absolute(&format!("/groups/{group_id}"))
    }

    pub fn permalink_url(&self, group_id: &str, post_id: &str) -> String {
        self.absolute(&format!("/groups/{group_id}/permalink/{post_id}"))
    }

    pub fn full_size_photo_url(&self, photo_id: &str) -> String {
        self.absolute(&format!(
            "/photo/view_full_size/?{}={}",
            self.photo_id_param,
            urlencoding::encode(photo_id)
        ))
    }

    /// Site-relative hrefs are appended to the base URL; absolute ones pass through.
    pub fn absolute(&self, href: &str) -> String {
        if is_absolute_http(href) {
            return href.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }

    /// Rewrite an outbound redirect URL to its destination. Anything that is
    /// not a redirect, or a redirect without a usable destination, is
    /// returned unchanged.
    pub fn unwrap_redirect(&self, url: &str) -> String {
        let Ok(parsed) = Url::parse(url) else {
            return url.to_string();
        };
        if !host_matches(&parsed, &self.redirect_hosts) {
            return url.to_string();
        }
        parsed
            .query_pairs()
            .find(|(key, _)| key == self.redirect_param.as_str())
            .map(|(_, value)| value.into_owned())
            .filter(|target| !target.is_empty())
            .unwrap_or_else(|| url.to_string())
    }

    pub fn is_asset_url(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|parsed| host_matches(&parsed, &self.asset_hosts))
            .unwrap_or(false)
    }

    pub fn classify_href(&self, href: &str) -> AttachmentTarget {
        let href = href.trim();
        if is_absolute_http(href) {
            let effective = self.unwrap_redirect(href);
            if self.is_asset_url(&effective) {
                return AttachmentTarget::Asset(effective);
            }
            return AttachmentTarget::External(effective);
        }
        if href.starts_with(&self.photo_path_prefix) {
            return AttachmentTarget::Photo {
                photo_id: self.query_param(href, &self.photo_id_param),
            };
        }
        AttachmentTarget::Unsupported
    }

    fn query_param(&self, href: &str, name: &str) -> Option<String> {
        let parsed = Url::parse(&self.absolute(href)).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}

/// Last path segment of `url`, percent-decoded. `None` when the path ends in
/// a slash or the segment is not valid UTF-8 after decoding.
pub fn asset_filename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;
    let name = decoded.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn is_absolute_http(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn host_matches(url: &Url, hosts: &[String]) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    hosts.iter().any(|pattern| {
        host.eq_ignore_ascii_case(pattern)
            || host
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", pattern.to_ascii_lowercase()))
    })
}
