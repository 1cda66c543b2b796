//! Rendering of outbound message bodies. Pure functions of the records:
//! no persistence, no side effects.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::db::models::{DueReminder, Event};

// Russian month names in genitive case, January first.
const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

// Weekday abbreviations, Monday first.
const WEEKDAYS_SHORT: [&str; 7] = ["пн", "вт", "ср", "чт", "пт", "сб", "вс"];

/// "27 января, пн, 19:00"
pub fn format_datetime(dt: NaiveDateTime) -> String {
    let month = MONTHS_GENITIVE[dt.month0() as usize];
    let weekday = WEEKDAYS_SHORT[dt.weekday().num_days_from_monday() as usize];
    format!(
        "{} {}, {}, {:02}:{:02}",
        dt.day(),
        month,
        weekday,
        dt.hour(),
        dt.minute()
    )
}

fn category_emoji(event: &Event) -> &'static str {
    match event.category {
        crate::db::models::EventCategory::It => "💻",
        crate::db::models::EventCategory::Sport => "🏃",
        crate::db::models::EventCategory::Books => "📚",
    }
}

fn format_emoji(event: &Event) -> &'static str {
    match event.format {
        crate::db::models::EventFormat::Online => "🌐",
        crate::db::models::EventFormat::Offline => "📍",
    }
}

/// Full event details for announcements and detail views.
pub fn event_detail(event: &Event) -> String {
    let mut lines = vec![
        format!("{} <b>{}</b>", category_emoji(event), event.title),
        String::new(),
        format!("📅 <b>Дата:</b> {}", format_datetime(event.starts_at)),
        format!("🏷 <b>Категория:</b> {}", event.category.display_name()),
        format!(
            "{} <b>Формат:</b> {}",
            format_emoji(event),
            event.format.display_name()
        ),
        format!("📍 <b>Место:</b> {}", event.location),
    ];

    if let Some(description) = &event.description {
        lines.push(String::new());
        lines.push(format!("📝 {}", description));
    }

    lines.push(String::new());
    lines.push(format!("👤 <b>Организатор:</b> {}", event.organizer_contact));

    lines.join("\n")
}

/// Announcement to category subscribers when an event is published.
pub fn new_event_announcement(event: &Event) -> String {
    format!("🎉 <b>Новое мероприятие!</b>\n\n{}", event_detail(event))
}

/// Notice to active registrants when an event is cancelled.
pub fn cancellation_notice(title: &str) -> String {
    format!(
        "❌ <b>Мероприятие отменено</b>\n\n\
         К сожалению, мероприятие <b>«{}»</b> было отменено.\n\n\
         Приносим извинения за неудобства.",
        title
    )
}

/// Organizer free-text broadcast to an event's registrants.
pub fn organizer_broadcast(title: &str, text: &str) -> String {
    format!(
        "📢 <b>Сообщение от организатора</b>\n\n📌 Мероприятие: <b>{}</b>\n\n{}",
        title, text
    )
}

/// 24-hour reminder: greets by name and asks to reconfirm attendance.
pub fn day_before_reminder(reminder: &DueReminder) -> String {
    format!(
        "{}, напоминание о мероприятии!\n\n{}\n{}\n\nВы все еще планируете посетить?",
        reminder.first_name,
        reminder.title,
        format_datetime(reminder.starts_at)
    )
}

/// 15-minute reminder: informational, includes the location.
pub fn soon_reminder(reminder: &DueReminder) -> String {
    format!(
        "Мероприятие через 15 минут!\n\n{}\n{}\n\n{}",
        reminder.title,
        format_datetime(reminder.starts_at),
        reminder.location
    )
}
