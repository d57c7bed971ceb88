use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Music,
    Tech,
    Fitness,
    Food,
    Art,
}

impl EventCategory {
    /// Fixed enumeration order; synthetic records round-robin through it by index.
    pub const ALL: [EventCategory; 5] = [
        EventCategory::Music,
        EventCategory::Tech,
        EventCategory::Fitness,
        EventCategory::Food,
        EventCategory::Art,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::Music => "music",
            EventCategory::Tech => "tech",
            EventCategory::Fitness => "fitness",
            EventCategory::Food => "food",
            EventCategory::Art => "art",
        }
    }

    pub fn label(self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category `{0}` (expected one of music, tech, fitness, food, art)")]
pub struct ParseCategoryError(String);

impl FromStr for EventCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EventCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(wanted.to_string()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String, // provider-scoped, stable across fetches
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "startsAtISO")]
    pub starts_at_iso: String,
    pub venue_name: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub category: EventCategory,
    pub url: Option<String>,
}

impl Event {
    pub fn location(&self) -> Option<String> {
        match (self.venue_name.as_deref(), self.city.as_deref()) {
            (Some(venue), Some(city)) => Some(format!("{venue}, {city}")),
            (Some(venue), None) => Some(venue.to_string()),
            (None, Some(city)) => Some(city.to_string()),
            (None, None) => None,
        }
    }
}

/// Optional filters shared by every provider.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EventQuery {
    pub keyword: Option<String>,
    pub category: Option<EventCategory>,
    pub city: Option<String>,
}

impl EventQuery {
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn category(mut self, category: EventCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn trimmed_keyword(&self) -> Option<&str> {
        non_blank(self.keyword.as_deref())
    }

    pub fn trimmed_city(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub events: Vec<Event>,
    pub has_more: bool,
}

impl EventPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_categories_case_insensitively() {
        assert_eq!("Music".parse::<EventCategory>().ok(), Some(EventCategory::Music));
        assert_eq!(" art ".parse::<EventCategory>().ok(), Some(EventCategory::Art));
        assert!("sports".parse::<EventCategory>().is_err());
    }

    #[test]
    fn event_serializes_with_wire_field_names() {
        let event = Event {
            id: "mock-1".to_string(),
            title: "TECH Event #1".to_string(),
            description: None,
            starts_at_iso: "2025-01-01T18:00:00.000Z".to_string(),
            venue_name: Some("Studio 12".to_string()),
            city: None,
            address: None,
            image_url: None,
            category: EventCategory::Tech,
            url: None,
        };
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["startsAtISO"], "2025-01-01T18:00:00.000Z");
        assert_eq!(value["venueName"], "Studio 12");
        assert_eq!(value["category"], "tech");
        assert_eq!(event.location().as_deref(), Some("Studio 12"));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let query = EventQuery::default().keyword("   ").city(" Austin ");
        assert_eq!(query.trimmed_keyword(), None);
        assert_eq!(query.trimmed_city(), Some("Austin"));
    }
}
