//! Database models, one file per table.

pub mod event;
pub mod registration;
pub mod reminder;
pub mod user;

pub use self::event::*;
pub use self::registration::*;
pub use self::reminder::*;
pub use self::user::*;
