pub mod events;
pub mod logger;
pub mod reporter;

pub use events::{Event, LogEntry, TurnEvent};
pub use logger::EventLog;
