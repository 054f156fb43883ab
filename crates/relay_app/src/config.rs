use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use relay_core::{DEFAULT_DISPLAY_TZ, DEFAULT_LOOKAHEAD_PAGES};
use relay_engine::{Session, SyncSettings, DEFAULT_API_BASE};

use crate::logging::LogDestination;

/// Session cookies read from the environment under their own names.
const COOKIE_NAMES: [&str; 5] = ["c_user", "datr", "fr", "sb", "xs"];

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub group_id: String,
    pub bot_token: String,
    pub chat_id: String,
    pub telegram_api_base: String,
    pub cookies: Vec<(String, String)>,
    pub user_agent: Option<String>,
    pub lookback_minutes: i64,
    pub leeway_secs: i64,
    pub lookahead_pages: u32,
    pub downloads_dir: PathBuf,
    pub watermark_file: PathBuf,
    pub display_tz: Tz,
    pub log_destination: LogDestination,
}

impl AppConfig {
    /// Load configuration from environment variables, after a `.env` file
    /// if one is present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let cookies = COOKIE_NAMES
            .iter()
            .filter_map(|name| lookup(name).map(|value| (name.to_string(), value)))
            .collect();

        Ok(Self {
            group_id: required("GROUP_ID")?,
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            chat_id: required("TELEGRAM_CHAT_ID")?,
            telegram_api_base: lookup("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            cookies,
            user_agent: lookup("USER_AGENT").filter(|agent| !agent.trim().is_empty()),
            lookback_minutes: parse_or(&lookup, "INTERVAL", 30)?,
            leeway_secs: parse_or(&lookup, "LEEWAY_SECONDS", 0)?,
            lookahead_pages: parse_or(&lookup, "LOOKAHEAD_PAGES", DEFAULT_LOOKAHEAD_PAGES)?,
            downloads_dir: lookup("DOWNLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./downloads")),
            watermark_file: lookup("WATERMARK_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./last_synced")),
            display_tz: match lookup("DISPLAY_TZ") {
                Some(name) => name
                    .trim()
                    .parse::<Tz>()
                    .map_err(|err| anyhow::anyhow!("DISPLAY_TZ {name:?} is not a timezone: {err}"))?,
                None => DEFAULT_DISPLAY_TZ,
            },
            log_destination: match lookup("RELAY_LOG") {
                Some(raw) => raw.parse()?,
                None => LogDestination::Terminal,
            },
        })
    }

    pub fn session(&self) -> Session {
        let session = self
            .cookies
            .iter()
            .fold(Session::new(), |session, (name, value)| {
                session.with_cookie(name.clone(), value.clone())
            });
        match &self.user_agent {
            Some(agent) => session.with_user_agent(agent.clone()),
            None => session,
        }
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            lookback_secs: self.lookback_minutes * 60,
            leeway_secs: self.leeway_secs,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        None => Ok(default),
    }
}
