pub mod event;
pub mod registration;
pub mod reminder;
pub mod user;

pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use reminder::ReminderRepository;
pub use user::UserRepository;
