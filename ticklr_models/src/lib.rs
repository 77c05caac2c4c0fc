pub mod clock;
pub mod display;
pub mod reminder;
pub mod settings;
pub mod time_input;

pub use chrono;
