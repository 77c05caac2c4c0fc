pub mod daily;
pub mod memory;
mod reminder;
pub mod sqlite;

pub use daily::{DailyReminder, DailyReminderManager, DueDailyReminder};
pub use memory::InMemoryReminderStorage;
pub use reminder::{ReminderStorage, retention_cutoff};
pub use ticklr_models::reminder::NewReminder;
