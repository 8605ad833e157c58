pub mod calendar_extractor;

pub use calendar_extractor::{CalendarExtractor, CalendarState, EmptyReason, Extraction};
