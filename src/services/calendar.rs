use chrono::Duration;

use crate::db::models::Event;

// Events have no stored end time; assume a two-hour slot.
const DEFAULT_DURATION_HOURS: i64 = 2;

/// "Add to Google Calendar" deep link for an event.
pub fn google_calendar_url(event: &Event) -> String {
    let start = event.starts_at.format("%Y%m%dT%H%M%S");
    let end = (event.starts_at + Duration::hours(DEFAULT_DURATION_HOURS)).format("%Y%m%dT%H%M%S");
    let details = event.description.as_deref().unwrap_or("");

    format!(
        "https://calendar.google.com/calendar/render?action=TEMPLATE&text={}&dates={}/{}&details={}&location={}",
        urlencoding::encode(&event.title),
        start,
        end,
        urlencoding::encode(details),
        urlencoding::encode(&event.location),
    )
}

/// "Add to Yandex Calendar" deep link for an event.
pub fn yandex_calendar_url(event: &Event) -> String {
    let start = event.starts_at.format("%Y-%m-%dT%H:%M:%S");
    let end = (event.starts_at + Duration::hours(DEFAULT_DURATION_HOURS)).format("%Y-%m-%dT%H:%M:%S");
    let details = event.description.as_deref().unwrap_or("");

    format!(
        "https://calendar.yandex.ru/event?name={}&startTs={}&endTs={}&description={}&location={}",
        urlencoding::encode(&event.title),
        start,
        end,
        urlencoding::encode(details),
        urlencoding::encode(&event.location),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{EventCategory, EventFormat};
    use chrono::NaiveDate;

    fn event() -> Event {
        Event {
            id: 1,
            title: "Rust митап".to_string(),
            category: EventCategory::It,
            format: EventFormat::Offline,
            starts_at: NaiveDate::from_ymd_opt(2025, 1, 27)
                .unwrap()
                .and_hms_opt(19, 0, 0)
                .unwrap(),
            location: "Москва".to_string(),
            description: None,
            organizer_contact: "@organizer".to_string(),
            is_cancelled: false,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn google_link_spans_two_hours() {
        let url = google_calendar_url(&event());
        assert!(url.starts_with("https://calendar.google.com/calendar/render?action=TEMPLATE"));
        assert!(url.contains("dates=20250127T190000/20250127T210000"));
        // Cyrillic title is percent-encoded, никаких сырых пробелов.
        assert!(!url.contains(' '));
    }

    #[test]
    fn yandex_link_uses_iso_timestamps() {
        let url = yandex_calendar_url(&event());
        assert!(url.contains("startTs=2025-01-27T19:00:00"));
        assert!(url.contains("endTs=2025-01-27T21:00:00"));
    }
}
