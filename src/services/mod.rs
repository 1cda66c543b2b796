pub mod calendar;
pub mod dispatch;
pub mod events;
pub mod init;
pub mod messages;
pub mod notifier;
pub mod registrations;
pub mod reminder_worker;
