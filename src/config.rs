use std::path::PathBuf;

use chrono_tz::Tz;

use crate::utils;

pub const DEFAULT_TOTAL_EVENTS: u64 = 3_000_000;
pub const DEFAULT_TICKETMASTER_BASE_URL: &str = "https://app.ticketmaster.com/discovery/v2";
const DEFAULT_TIMEZONE: Tz = chrono_tz::UTC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ticketmaster,
    Synthetic,
}

impl ProviderKind {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ticketmaster" | "live" => ProviderKind::Ticketmaster,
            _ => ProviderKind::Synthetic,
        }
    }
}

/// Process-wide settings, resolved once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub requested_provider: ProviderKind,
    pub ticketmaster_api_key: String,
    pub ticketmaster_base_url: String,
    pub total_events: u64,
    pub timezone: Tz,
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            requested_provider: ProviderKind::Synthetic,
            ticketmaster_api_key: String::new(),
            ticketmaster_base_url: DEFAULT_TICKETMASTER_BASE_URL.to_string(),
            total_events: DEFAULT_TOTAL_EVENTS,
            timezone: DEFAULT_TIMEZONE,
            data_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let requested_provider = lookup("EVENTS_PROVIDER")
            .map(|value| ProviderKind::parse(&value))
            .unwrap_or(ProviderKind::Synthetic);
        let ticketmaster_api_key = lookup("TICKETMASTER_API_KEY")
            .map(|key| key.trim().to_string())
            .unwrap_or_default();
        let ticketmaster_base_url = lookup("TICKETMASTER_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_TICKETMASTER_BASE_URL.to_string());
        let total_events = lookup("MOCK_TOTAL_EVENTS")
            .as_deref()
            .and_then(parse_total_events)
            .unwrap_or(DEFAULT_TOTAL_EVENTS);
        let timezone = lookup("EVENTS_TIMEZONE")
            .and_then(|name| name.trim().parse::<Tz>().ok())
            .unwrap_or(DEFAULT_TIMEZONE);
        let data_dir = lookup("EVENTS_DATA_DIR")
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Self {
            requested_provider,
            ticketmaster_api_key,
            ticketmaster_base_url,
            total_events,
            timezone,
            data_dir,
        }
    }

    /// Live mode needs both the selector and a key; an empty key falls back to synthetic.
    pub fn provider(&self) -> ProviderKind {
        match self.requested_provider {
            ProviderKind::Ticketmaster if !self.ticketmaster_api_key.is_empty() => {
                ProviderKind::Ticketmaster
            }
            _ => ProviderKind::Synthetic,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join(utils::DATABASE_FILE),
            None => utils::database_path(),
        }
    }
}

fn parse_total_events(raw: &str) -> Option<u64> {
    let value = raw.trim().parse::<f64>().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    // Saturating float-to-int cast; fractional sizes still admit the partial record.
    Some(value.ceil() as u64)
}
