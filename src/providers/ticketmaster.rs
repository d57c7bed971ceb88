use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::base;
use super::{EventProvider, ProviderError};
use crate::config::{AppConfig, DEFAULT_TICKETMASTER_BASE_URL};
use crate::models::{Event, EventCategory, EventPage, EventQuery};

const DEFAULT_PAGE_SIZE: u32 = 30;
const DEFAULT_LOCAL_TIME: &str = "19:00:00";
const UNTITLED: &str = "Untitled Event";

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("event-finder/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<SearchEmbedded>,
}

#[derive(Debug, Deserialize)]
struct SearchEmbedded {
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(default)]
    id: String,
    name: Option<String>,
    url: Option<String>,
    #[serde(default)]
    images: Vec<RawImage>,
    dates: Option<RawDates>,
    info: Option<String>,
    please_note: Option<String>,
    #[serde(default)]
    classifications: Vec<RawClassification>,
    #[serde(rename = "_embedded")]
    embedded: Option<RawEventEmbedded>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: Option<String>,
    width: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawDates {
    start: Option<RawStart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStart {
    date_time: Option<String>,
    local_date: Option<String>,
    local_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    segment: Option<RawNamed>,
    genre: Option<RawNamed>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEventEmbedded {
    #[serde(default)]
    venues: Vec<RawVenue>,
}

#[derive(Debug, Deserialize)]
struct RawVenue {
    name: Option<String>,
    city: Option<RawNamed>,
    address: Option<RawAddress>,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAddress {
    line1: Option<String>,
}

/// Search parameters as the Discovery API understands them; paging is optional.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: EventQuery,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Internal category to Discovery "segment". Food and tech have no
/// equivalent and stay unfiltered upstream.
pub fn segment_for(category: EventCategory) -> Option<&'static str> {
    match category {
        EventCategory::Music => Some("Music"),
        EventCategory::Art => Some("Arts & Theatre"),
        EventCategory::Fitness => Some("Sports"),
        EventCategory::Food | EventCategory::Tech => None,
    }
}

/// Free-text segment/genre to internal category; anything unrecognised is tech.
pub fn map_category(segment: Option<&str>) -> EventCategory {
    let s = segment.unwrap_or_default().to_lowercase();
    if s.contains("music") {
        EventCategory::Music
    } else if s.contains("sports") || s.contains("fitness") {
        EventCategory::Fitness
    } else if s.contains("arts") || s.contains("theatre") {
        EventCategory::Art
    } else if s.contains("miscellaneous") || s.contains("food") {
        EventCategory::Food
    } else {
        EventCategory::Tech
    }
}

pub struct TicketmasterClient {
    api_key: String,
    base_url: String,
    fallback_timezone: Tz,
    client: Client,
}

impl TicketmasterClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_TICKETMASTER_BASE_URL.to_string(),
            fallback_timezone: chrono_tz::UTC,
            client: CLIENT.clone(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.ticketmaster_api_key.clone())
            .with_base_url(&config.ticketmaster_base_url)
            .with_fallback_timezone(config.timezone)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Zone for local dates of venues whose payload carries none.
    pub fn with_fallback_timezone(mut self, tz: Tz) -> Self {
        self.fallback_timezone = tz;
        self
    }

    pub fn search_url(&self, params: &SearchParams) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}/events.json", self.base_url))
            .map_err(|err| ProviderError::InvalidRequest(err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("apikey", &self.api_key);
            pairs.append_pair(
                "size",
                &params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).to_string(),
            );
            if let Some(page) = params.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(keyword) = params.query.trimmed_keyword() {
                pairs.append_pair("keyword", keyword);
            }
            if let Some(city) = params.query.trimmed_city() {
                pairs.append_pair("city", city);
            }
            if let Some(segment) = params.query.category.and_then(segment_for) {
                pairs.append_pair("segmentName", segment);
            }
        }
        Ok(url)
    }

    pub fn event_url(&self, id: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}/events", self.base_url))
            .map_err(|err| ProviderError::InvalidRequest(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest("base url cannot hold a path".into()))?
            .push(id);
        url.query_pairs_mut().append_pair("apikey", &self.api_key);
        Ok(url)
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Event>, ProviderError> {
        let url = self.search_url(params)?;
        tracing::debug!(page = ?params.page, size = ?params.page_size, "ticketmaster search");
        let body = self.fetch(url).await?;
        let payload: SearchResponse =
            serde_json::from_str(&body).map_err(|err| ProviderError::Parse(err.to_string()))?;

        let forced = params.query.category;
        Ok(payload
            .embedded
            .map(|embedded| embedded.events)
            .unwrap_or_default()
            .into_iter()
            .filter(|raw| {
                let keep = !raw.id.trim().is_empty();
                if !keep {
                    tracing::warn!("skipping ticketmaster event without an id");
                }
                keep
            })
            .map(|raw| self.map_event(raw, forced))
            .collect())
    }

    /// Fails with `ProviderError::Status` (404 included) when the lookup is unsuccessful.
    pub async fn get_by_id(&self, id: &str) -> Result<Event, ProviderError> {
        let url = self.event_url(id)?;
        tracing::debug!(id, "ticketmaster lookup");
        let body = self.fetch(url).await?;
        let mut raw: RawEvent =
            serde_json::from_str(&body).map_err(|err| ProviderError::Parse(err.to_string()))?;
        if raw.id.trim().is_empty() {
            raw.id = id.to_string();
        }
        Ok(self.map_event(raw, None))
    }

    async fn fetch(&self, url: Url) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ProviderError::Http(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
            });
        }
        response
            .text()
            .await
            .map_err(|err| ProviderError::Http(err.to_string()))
    }

    fn map_event(&self, raw: RawEvent, forced: Option<EventCategory>) -> Event {
        let venue = raw
            .embedded
            .and_then(|embedded| embedded.venues.into_iter().next());
        let venue_tz = venue
            .as_ref()
            .and_then(|v| v.timezone.as_deref())
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(self.fallback_timezone);
        let segment = raw.classifications.first().and_then(|c| {
            c.segment
                .as_ref()
                .and_then(|s| s.name.as_deref())
                .or_else(|| c.genre.as_ref().and_then(|g| g.name.as_deref()))
        });
        let category = forced.unwrap_or_else(|| map_category(segment));
        let image_url = pick_best_image(&raw.images);
        let starts_at_iso = start_iso(raw.dates.and_then(|d| d.start), venue_tz);

        let (venue_name, city, address) = match venue {
            Some(v) => (
                v.name,
                v.city.and_then(|c| c.name),
                v.address.and_then(|a| a.line1),
            ),
            None => (None, None, None),
        };

        Event {
            id: raw.id,
            title: base::non_empty(raw.name).unwrap_or_else(|| UNTITLED.to_string()),
            description: base::non_empty(raw.info).or_else(|| base::non_empty(raw.please_note)),
            starts_at_iso,
            venue_name,
            city,
            address,
            image_url,
            category,
            url: raw.url,
        }
    }
}

fn pick_best_image(images: &[RawImage]) -> Option<String> {
    // min_by_key keeps the first of equally wide images.
    images
        .iter()
        .filter_map(|image| {
            let url = image.url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
            Some((url, image.width.unwrap_or(0)))
        })
        .min_by_key(|(_, width)| Reverse(*width))
        .map(|(url, _)| url.to_string())
}

fn start_iso(start: Option<RawStart>, tz: Tz) -> String {
    let Some(start) = start else {
        return base::to_iso(Utc::now());
    };
    if let Some(date_time) = start.date_time.filter(|dt| !dt.trim().is_empty()) {
        return date_time;
    }
    let date = start
        .local_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
    let time = start
        .local_time
        .as_deref()
        .unwrap_or(DEFAULT_LOCAL_TIME)
        .trim()
        .to_string();
    let time = NaiveTime::parse_from_str(&time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&time, "%H:%M"))
        .ok()
        .or_else(|| NaiveTime::from_hms_opt(19, 0, 0));

    match (date, time) {
        (Some(date), Some(time)) => base::local_to_iso(date, time, tz),
        _ => base::to_iso(Utc::now()),
    }
}

#[async_trait]
impl EventProvider for TicketmasterClient {
    fn name(&self) -> &'static str {
        "ticketmaster"
    }

    async fn list_page(
        &self,
        query: &EventQuery,
        page: u32,
        page_size: u32,
    ) -> Result<EventPage, ProviderError> {
        let events = self
            .search(&SearchParams {
                query: query.clone(),
                page: Some(page),
                page_size: Some(page_size),
            })
            .await?;
        // No total count upstream: a full page is taken to mean more may follow,
        // so an exactly-full last page reports has_more = true.
        let has_more = page_size > 0 && events.len() == page_size as usize;
        Ok(EventPage { events, has_more })
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Event>, ProviderError> {
        match TicketmasterClient::get_by_id(self, id).await {
            Ok(event) => Ok(Some(event)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
