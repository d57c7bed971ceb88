//! Deterministic stand-in for a remote catalogue of millions of events.
//!
//! Every record is a pure function of its absolute index (plus the caller's
//! filter overrides), so paging, refresh and deep links into the catalogue
//! need no storage at all.

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use super::base;
use super::{EventProvider, ProviderError};
use crate::config::{AppConfig, DEFAULT_TOTAL_EVENTS};
use crate::models::{Event, EventCategory, EventPage, EventQuery};

const SAMPLE_CITIES: [&str; 6] = [
    "San Francisco",
    "New York",
    "Austin",
    "Seattle",
    "Chicago",
    "Los Angeles",
];
const SAMPLE_VENUES: [&str; 5] = [
    "Civic Hall",
    "Studio 12",
    "Riverside Park",
    "Downtown Co-Working",
    "Harbor Stage",
];
const IMAGE_BASE: &str = "https://images.unsplash.com/photo-1521334726092-b509a19597c1?auto=format&fit=crop&w=1600&q=80";
const DESCRIPTION: &str = "Synthetic event generated locally for development. Configure Ticketmaster to use real nearby events.";
const EVENT_URL: &str = "https://example.com";
const SPREAD_DAYS: u64 = 120;
const FIRST_SLOT_HOUR: u64 = 18;
const SLOT_COUNT: u64 = 4;

static MOCK_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^mock-(0|[1-9]\d*)$").expect("valid mock id regex"));

pub fn mock_id(index: u64) -> String {
    format!("mock-{index}")
}

/// Recovers the absolute index from a canonical `mock-<index>` id (no leading zeros).
pub fn parse_mock_id(id: &str) -> Option<u64> {
    MOCK_ID_RE
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
}

fn pick<T: Copy>(items: &[T], index: u64) -> T {
    // Lists are tiny constants, so the remainder always fits in usize.
    items[(index % items.len() as u64) as usize]
}

#[derive(Debug, Clone)]
pub struct SyntheticCatalog {
    total: u64,
    anchor: NaiveDate,
    timezone: Tz,
}

impl SyntheticCatalog {
    pub fn new(total: u64, timezone: Tz) -> Self {
        let anchor = Utc::now().with_timezone(&timezone).date_naive();
        Self::with_anchor(total, anchor, timezone)
    }

    /// Start times are laid out relative to `anchor`, fixed for the catalogue's lifetime.
    pub fn with_anchor(total: u64, anchor: NaiveDate, timezone: Tz) -> Self {
        let total = if total == 0 {
            DEFAULT_TOTAL_EVENTS
        } else {
            total
        };
        Self {
            total,
            anchor,
            timezone,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.total_events, config.timezone)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn generate_page(&self, query: &EventQuery, page: u64, page_size: u64) -> EventPage {
        let start = page.saturating_mul(page_size);
        if start >= self.total {
            return EventPage::empty();
        }

        let end = self.total.min(start.saturating_add(page_size));
        let events = (start..end).map(|index| self.event_at(index, query)).collect();

        EventPage {
            events,
            has_more: end < self.total,
        }
    }

    pub fn event_at(&self, index: u64, query: &EventQuery) -> Event {
        let category = query
            .category
            .unwrap_or_else(|| pick(&EventCategory::ALL, index));
        let city = query
            .trimmed_city()
            .map(str::to_string)
            .unwrap_or_else(|| pick(&SAMPLE_CITIES, index).to_string());
        let title = match query.trimmed_keyword() {
            Some(keyword) => format!("{keyword} • {} #{index}", category.label()),
            None => format!("{} Event #{index}", category.label()),
        };

        Event {
            id: mock_id(index),
            title,
            description: Some(DESCRIPTION.to_string()),
            starts_at_iso: self.starts_at(index),
            venue_name: Some(pick(&SAMPLE_VENUES, index).to_string()),
            city: Some(city),
            address: Some(format!("{} Market St", index % 999 + 1)),
            image_url: Some(format!("{IMAGE_BASE}&sig={}", index % 1000 + 1)),
            category,
            url: Some(EVENT_URL.to_string()),
        }
    }

    /// Regenerates the record behind a `mock-<index>` id, unfiltered.
    pub fn lookup(&self, id: &str) -> Option<Event> {
        let index = parse_mock_id(id)?;
        self.generate_page(&EventQuery::default(), index, 1)
            .events
            .into_iter()
            .next()
    }

    fn starts_at(&self, index: u64) -> String {
        let date = self
            .anchor
            .checked_add_days(Days::new(index % SPREAD_DAYS))
            .unwrap_or(self.anchor);
        let hour = (FIRST_SLOT_HOUR + index % SLOT_COUNT) as u32;
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();
        base::local_to_iso(date, time, self.timezone)
    }
}

#[async_trait]
impl EventProvider for SyntheticCatalog {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn list_page(
        &self,
        query: &EventQuery,
        page: u32,
        page_size: u32,
    ) -> Result<EventPage, ProviderError> {
        Ok(self.generate_page(query, u64::from(page), u64::from(page_size)))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Event>, ProviderError> {
        Ok(self.lookup(id))
    }
}
