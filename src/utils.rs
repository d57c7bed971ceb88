use chrono::{DateTime, Local, TimeZone};
use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DATABASE_FILE: &str = "event-finder.sqlite";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("event-finder")
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn database_path() -> PathBuf {
    data_root().join(DATABASE_FILE)
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), "failed to create parent directory: {err}");
        }
    }
}

/// Renders `Tue, Jan 13 · 7:00 PM` in the machine's local zone.
pub fn format_event_datetime(iso: &str) -> String {
    format_event_datetime_in(iso, &Local)
}

pub fn format_event_datetime_in<Z>(iso: &str, zone: &Z) -> String
where
    Z: TimeZone,
    Z::Offset: std::fmt::Display,
{
    match DateTime::parse_from_rfc3339(iso) {
        Ok(parsed) => parsed
            .with_timezone(zone)
            .format("%a, %b %-d · %-I:%M %p")
            .to_string(),
        Err(_) => iso.to_string(),
    }
}
