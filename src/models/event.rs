//! Event data structure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::locale;

/// An event listed on the source page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Identifier assigned by the listing (`id="event<N>"`)
    pub id: u64,

    /// Event name
    pub title: String,

    /// Day the event takes place
    pub date: NaiveDate,

    /// Start time as shown by the source (e.g. "19:30")
    pub start: Option<String>,

    /// End time as shown by the source
    pub end: Option<String>,

    /// Venue description
    pub location: String,

    /// Absolute URL of the event photo
    pub photo: Option<String>,
}

impl Event {
    /// Public URL of the event page, also used as the feed guid.
    pub fn link(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.id)
    }

    /// Date formatted the way the listing reads, e.g. "Montag, 15. Januar 2024".
    pub fn formatted_date(&self) -> String {
        locale::format_long_date(self.date)
    }

    /// "19:00 - 22:00", "19:00", or `None` when no time is known.
    pub fn time_window(&self) -> Option<String> {
        match (self.start.as_deref(), self.end.as_deref()) {
            (Some(start), Some(end)) => Some(format!("{start} - {end}")),
            (Some(start), None) => Some(start.to_string()),
            (None, Some(end)) => Some(format!("bis {end}")),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_event(id: u64) -> Event {
    Event {
        id,
        title: format!("Konzert {id}"),
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        start: Some("19:00".to_string()),
        end: Some("22:00".to_string()),
        location: "Halle 1".to_string(),
        photo: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link() {
        let event = sample_event(42);
        assert_eq!(
            event.link("https://www.wuppertal-live.de/"),
            "https://www.wuppertal-live.de/42"
        );
    }

    #[test]
    fn test_time_window() {
        let mut event = sample_event(1);
        assert_eq!(event.time_window().as_deref(), Some("19:00 - 22:00"));

        event.end = None;
        assert_eq!(event.time_window().as_deref(), Some("19:00"));

        event.start = None;
        assert_eq!(event.time_window(), None);
    }

    #[test]
    fn test_serde_roundtrip_keeps_absent_fields() {
        let mut event = sample_event(7);
        event.end = None;
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(json.contains("\"date\":\"2024-01-15\""));
    }
}
