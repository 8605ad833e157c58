pub mod room_ctx;
pub mod room_flow;

pub use room_ctx::RoomCtx;
pub use room_flow::{RoomFlow, ScrapeOutcome};
