pub mod loaders;
pub mod room;
pub mod schedule;

pub use loaders::{JsonFileStore, RecordStore};
pub use room::{RoomRecord, ScheduleState};
pub use schedule::{ScheduleEvent, WeekSchedule, WEEK_DAYS};
